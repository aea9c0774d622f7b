//! Paginates the report onto fixed-size pages.
//!
//! All coordinates are millimetres from the page's top-left corner. A single
//! vertical cursor advances down the page and resets to the top margin on
//! every break; elements never overlap.

use super::chart::ChartSnapshot;
use super::markup::{self, Span};
use crate::events::shots::SHOT_TYPES;
use crate::events::{Analysis, CategoryFilter};

// A4 portrait
pub const PAGE_WIDTH: f64 = 210.0;
pub const PAGE_HEIGHT: f64 = 297.0;
pub const MARGIN: f64 = 15.0;
pub const PRINTABLE_WIDTH: f64 = PAGE_WIDTH - 2.0 * MARGIN;

pub const LINE_HEIGHT: f64 = 7.0;
pub const ROW_HEIGHT: f64 = 10.0;
pub const BODY_SIZE: f64 = 11.0;
pub const HEADING_SIZE: f64 = 16.0;
pub const CHART_WIDTH: f64 = 180.0;
pub const CHART_HEIGHT: f64 = 100.0;
pub const FIRST_COLUMN_WIDTH: f64 = 40.0;

/// Inset of cell text from the cell's left edge.
const CELL_PADDING: f64 = 2.0;
const PT_TO_MM: f64 = 25.4 / 72.0;

pub const SUMMARY_HEADING: &str = "AI Match Summary";
pub const VERIFIED_HEADING: &str = "Verified Analysis";
pub const LOG_HEADING: &str = "Event Log";
pub const TABLE_HEADING: &str = "Shot Summary";

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// `y` is the baseline.
    Text {
        x: f64,
        y: f64,
        size: f64,
        bold: bool,
        text: String,
    },
    /// The chart snapshot, `y` is the top edge.
    Image {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    /// Stroked cell border, `y` is the top edge.
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
}

impl Element {
    /// Lowest point the element reaches on its page.
    pub fn bottom(&self) -> f64 {
        match self {
            Self::Text { y, .. } => *y,
            Self::Image { y, height, .. } | Self::Rect { y, height, .. } => y + height,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub pages: Vec<Page>,
    /// Image referenced by every [`Element::Image`].
    pub chart: Option<ChartSnapshot>,
}

/// Approximate Helvetica advance width of `text`, in millimetres.
pub fn text_width(text: &str, size: f64, bold: bool) -> f64 {
    let em: f64 = text.chars().map(|c| char_em(c, bold)).sum();
    em * size * PT_TO_MM
}

fn char_em(c: char, bold: bool) -> f64 {
    let base = match c {
        ' ' | 'i' | 'j' | 'l' | 'I' | '.' | ',' | ':' | ';' | '!' | '|' | '\'' => 0.278,
        'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '-' => 0.333,
        'm' | 'M' | 'W' => 0.833,
        'w' => 0.722,
        c if c.is_ascii_uppercase() => 0.667,
        _ => 0.556,
    };
    if bold { base * 1.06 } else { base }
}

/// Baseline offset inside a line box.
fn baseline(top: f64) -> f64 {
    top + LINE_HEIGHT * 0.7
}

/// A whitespace-delimited word. Markup may change weight mid-word, so a
/// word is one or more pieces laid out with no gap between them.
struct Word {
    pieces: Vec<Span>,
}

impl Word {
    fn width(&self, size: f64) -> f64 {
        self.pieces.iter().map(|p| text_width(&p.text, size, p.bold)).sum()
    }

    /// Width of the space that precedes this word.
    fn space(&self, size: f64) -> f64 {
        let bold = self.pieces.first().is_some_and(|p| p.bold);
        text_width(" ", size, bold)
    }

    fn push(&mut self, c: char, bold: bool) {
        match self.pieces.last_mut() {
            Some(piece) if piece.bold == bold => piece.text.push(c),
            _ => self.pieces.push(Span {
                text: c.to_string(),
                bold,
            }),
        }
    }
}

/// Split spans into words on whitespace only; span boundaries inside a
/// word don't break it.
fn words(spans: &[Span]) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current = Word { pieces: Vec::new() };
    for span in spans {
        for c in span.text.chars() {
            if c.is_whitespace() {
                if !current.pieces.is_empty() {
                    words.push(std::mem::replace(&mut current, Word { pieces: Vec::new() }));
                }
            } else {
                current.push(c, span.bold);
            }
        }
    }
    if !current.pieces.is_empty() {
        words.push(current);
    }
    words
}

/// Greedy word wrap over mixed-weight spans. Words longer than `width` are
/// split across lines.
fn wrap(spans: &[Span], size: f64, width: f64) -> Vec<Vec<Word>> {
    let mut lines: Vec<Vec<Word>> = Vec::new();
    let mut line: Vec<Word> = Vec::new();
    let mut line_w = 0.0;

    for word in words(spans) {
        for piece in split_long(word, size, width) {
            let w = piece.width(size);
            let needed = if line.is_empty() { w } else { line_w + piece.space(size) + w };
            if needed > width && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
                line_w = w;
            } else {
                line_w = needed;
            }
            line.push(piece);
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn split_long(word: Word, size: f64, width: f64) -> Vec<Word> {
    if word.width(size) <= width {
        return vec![word];
    }
    let mut chunks = Vec::new();
    let mut current = Word { pieces: Vec::new() };
    let mut current_w = 0.0;
    for piece in &word.pieces {
        for c in piece.text.chars() {
            let w = text_width(c.encode_utf8(&mut [0; 4]), size, piece.bold);
            if current_w + w > width && !current.pieces.is_empty() {
                chunks.push(std::mem::replace(&mut current, Word { pieces: Vec::new() }));
                current_w = 0.0;
            }
            current.push(c, piece.bold);
            current_w += w;
        }
    }
    if !current.pieces.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Cursor over the page sequence.
struct PageWriter {
    pages: Vec<Page>,
    y: f64,
}

impl PageWriter {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y: MARGIN,
        }
    }

    fn page_break(&mut self) {
        self.pages.push(Page::default());
        self.y = MARGIN;
    }

    /// Break first if `height` won't fit below the cursor.
    fn ensure(&mut self, height: f64) {
        if self.y + height > PAGE_HEIGHT - MARGIN {
            self.page_break();
        }
    }

    fn push(&mut self, element: Element) {
        if let Some(page) = self.pages.last_mut() {
            page.elements.push(element);
        }
    }

    fn centered_heading(&mut self, text: &str) {
        let line_h = LINE_HEIGHT * 1.5;
        self.ensure(line_h);
        let w = text_width(text, HEADING_SIZE, true);
        self.push(Element::Text {
            x: (PAGE_WIDTH - w) / 2.0,
            y: self.y + line_h * 0.7,
            size: HEADING_SIZE,
            bold: true,
            text: text.to_string(),
        });
        self.y += line_h;
    }

    fn heading(&mut self, text: &str) {
        self.ensure(LINE_HEIGHT);
        self.push(Element::Text {
            x: MARGIN,
            y: baseline(self.y),
            size: BODY_SIZE + 2.0,
            bold: true,
            text: text.to_string(),
        });
        self.y += LINE_HEIGHT;
    }

    /// Reflow one paragraph at the printable width. An empty paragraph is
    /// a one-line gap.
    fn paragraph(&mut self, spans: &[Span]) {
        let lines = wrap(spans, BODY_SIZE, PRINTABLE_WIDTH);
        if lines.is_empty() {
            self.ensure(LINE_HEIGHT);
            self.y += LINE_HEIGHT;
            return;
        }
        for line in lines {
            self.ensure(LINE_HEIGHT);
            let y = baseline(self.y);

            // Consecutive pieces of the same weight share one text run; a
            // space is only drawn where the source had whitespace.
            let mut runs: Vec<(f64, Span)> = Vec::new();
            let mut x = MARGIN;
            for (i, word) in line.into_iter().enumerate() {
                let mut gap = if i > 0 { word.space(BODY_SIZE) } else { 0.0 };
                for piece in word.pieces {
                    let w = text_width(&piece.text, BODY_SIZE, piece.bold);
                    let merged = match runs.last_mut() {
                        Some((_, run)) if run.bold == piece.bold => {
                            if gap > 0.0 {
                                run.text.push(' ');
                            }
                            run.text.push_str(&piece.text);
                            true
                        }
                        _ => false,
                    };
                    if !merged {
                        runs.push((x + gap, piece));
                    }
                    x += gap + w;
                    gap = 0.0;
                }
            }

            for (x, run) in runs {
                self.push(run_element(x, y, run.bold, run.text));
            }
            self.y += LINE_HEIGHT;
        }
    }

    fn into_pages(self) -> Vec<Page> {
        self.pages
    }
}

fn run_element(x: f64, y: f64, bold: bool, text: String) -> Element {
    Element::Text {
        x,
        y,
        size: BODY_SIZE,
        bold,
        text,
    }
}

fn title_block(w: &mut PageWriter, analysis: &Analysis) {
    let summary = analysis.result.summary_text();
    let verified = analysis.result.verified_text();
    if summary.is_none() && verified.is_none() {
        return;
    }
    if let Some(summary) = summary {
        w.centered_heading(SUMMARY_HEADING);
        for para in markup::paragraphs(summary) {
            w.paragraph(&para);
        }
    }
    if let Some(verified) = verified {
        if summary.is_some() {
            w.y += LINE_HEIGHT / 2.0;
        }
        w.heading(VERIFIED_HEADING);
        for para in markup::paragraphs(verified) {
            w.paragraph(&para);
        }
    }
    w.y += LINE_HEIGHT;
}

fn chart_block(w: &mut PageWriter, chart: Option<&ChartSnapshot>) {
    if chart.is_none() {
        return;
    }
    w.ensure(CHART_HEIGHT);
    w.push(Element::Image {
        x: (PAGE_WIDTH - CHART_WIDTH) / 2.0,
        y: w.y,
        width: CHART_WIDTH,
        height: CHART_HEIGHT,
    });
    w.y += CHART_HEIGHT + LINE_HEIGHT;
}

/// Full event log, regardless of any UI filter.
fn event_log_block(w: &mut PageWriter, analysis: &Analysis) {
    w.heading(LOG_HEADING);
    for row in analysis.log_rows(CategoryFilter::All) {
        w.paragraph(&[Span {
            text: row.line(),
            bold: false,
        }]);
    }
    w.y += LINE_HEIGHT;
}

/// Grid of counts. The header and first rows start on a fresh page when
/// the table won't fit; later rows may break individually.
fn summary_table_block(w: &mut PageWriter, analysis: &Analysis) {
    let table_height = SHOT_TYPES.len() as f64 * ROW_HEIGHT;
    if w.y + LINE_HEIGHT + table_height > PAGE_HEIGHT - MARGIN {
        w.page_break();
    }
    w.heading(TABLE_HEADING);

    let players = analysis.roster.len();
    let player_w = if players > 0 {
        (PRINTABLE_WIDTH - FIRST_COLUMN_WIDTH) / players as f64
    } else {
        0.0
    };

    let header: Vec<String> = std::iter::once("Shot Type".to_string())
        .chain(analysis.roster.iter().map(|id| format!("Player {id}")))
        .collect();
    let size = cell_font_size(&header[1..], player_w);
    table_row(w, &header, player_w, size, true);

    for (shot, counts) in analysis.stats.iter() {
        w.ensure(ROW_HEIGHT);
        let cells: Vec<String> = std::iter::once(shot.to_string())
            .chain(counts.iter().map(u32::to_string))
            .collect();
        table_row(w, &cells, player_w, size, false);
    }
}

/// Body size, shrunk so the widest player header fits inside its cell.
fn cell_font_size(player_headers: &[String], player_w: f64) -> f64 {
    let widest = player_headers
        .iter()
        .map(|h| text_width(h, 1.0, true))
        .fold(0.0, f64::max);
    if widest == 0.0 {
        return BODY_SIZE;
    }
    ((player_w - 2.0 * CELL_PADDING) / widest).min(BODY_SIZE)
}

fn table_row(w: &mut PageWriter, cells: &[String], player_w: f64, size: f64, bold: bool) {
    let top = w.y;
    let mut x = MARGIN;
    for (i, cell) in cells.iter().enumerate() {
        let width = if i == 0 { FIRST_COLUMN_WIDTH } else { player_w };
        w.push(Element::Rect {
            x,
            y: top,
            width,
            height: ROW_HEIGHT,
        });
        w.push(Element::Text {
            x: x + CELL_PADDING,
            y: top + ROW_HEIGHT * 0.65,
            size,
            bold,
            text: cell.clone(),
        });
        x += width;
    }
    w.y += ROW_HEIGHT;
}

/// Lay out the whole report.
pub fn layout(analysis: &Analysis, chart: Option<&ChartSnapshot>) -> Document {
    let mut w = PageWriter::new();

    title_block(&mut w, analysis);
    chart_block(&mut w, chart);
    w.page_break();
    event_log_block(&mut w, analysis);
    summary_table_block(&mut w, analysis);

    let pages = w.into_pages();
    log::debug!("Laid out report on {} pages", pages.len());
    Document {
        pages,
        chart: chart.cloned(),
    }
}
