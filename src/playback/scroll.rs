use std::cell::Cell;

/// Position of a log row inside its scrollable container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowGeometry {
    /// Offset from the top of the container's content, not the page.
    pub offset_top: f64,
    pub height: f64,
}

/// The scrollable log panel.
pub trait LogViewport {
    /// Geometry of the row showing event `index`, or `None` if that event
    /// is not currently displayed (e.g. filtered out).
    fn row_geometry(&self, index: usize) -> Option<RowGeometry>;
    fn viewport_height(&self) -> f64;
    fn content_height(&self) -> f64;
    fn scroll_to(&self, top: f64, smooth: bool);
}

/// Scroll offset that vertically centres `row`, clamped to the scrollable range.
pub fn centered_scroll_top(row: RowGeometry, viewport_height: f64, content_height: f64) -> f64 {
    let target = row.offset_top - (viewport_height - row.height) / 2.0;
    let max = (content_height - viewport_height).max(0.0);
    target.clamp(0.0, max)
}

/// Smooth-scroll the viewport so event `index` is centred.
/// Returns the offset scrolled to, or `None` if the row isn't displayed.
pub fn scroll_row_into_view(viewport: &dyn LogViewport, index: usize) -> Option<f64> {
    let row = viewport.row_geometry(index)?;
    let top = centered_scroll_top(row, viewport.viewport_height(), viewport.content_height());
    viewport.scroll_to(top, true);
    Some(top)
}

/// Viewport over fixed-height rows, one per displayed event.
#[derive(Debug, Clone)]
pub struct FixedRowViewport {
    /// Event index shown on each row, top to bottom.
    rows: Vec<usize>,
    row_height: f64,
    height: f64,
    scroll_top: Cell<f64>,
}

impl FixedRowViewport {
    pub fn new(rows: Vec<usize>, row_height: f64, height: f64) -> Self {
        Self {
            rows,
            row_height,
            height,
            scroll_top: Cell::new(0.0),
        }
    }

    pub fn scroll_top(&self) -> f64 {
        self.scroll_top.get()
    }
}

impl LogViewport for FixedRowViewport {
    fn row_geometry(&self, index: usize) -> Option<RowGeometry> {
        let pos = self.rows.iter().position(|&i| i == index)?;
        Some(RowGeometry {
            offset_top: pos as f64 * self.row_height,
            height: self.row_height,
        })
    }

    fn viewport_height(&self) -> f64 {
        self.height
    }

    fn content_height(&self) -> f64 {
        self.rows.len() as f64 * self.row_height
    }

    fn scroll_to(&self, top: f64, _smooth: bool) {
        self.scroll_top.set(top);
    }
}
