use image::{Rgb, RgbImage};

use super::ReportError;
use crate::events::{Analysis, PlayerStats};

/// Raster size of the bar chart, in pixels.
pub const CHART_PX_WIDTH: u32 = 900;
pub const CHART_PX_HEIGHT: u32 = 500;

const PADDING: u32 = 30;
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([60, 60, 60]);

/// One color per roster position, cycled.
const PALETTE: [[u8; 3]; 6] = [
    [54, 162, 235],
    [255, 99, 132],
    [75, 192, 192],
    [255, 159, 64],
    [153, 102, 255],
    [201, 203, 207],
];

/// A rasterized chart, 8-bit RGB, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSnapshot {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl From<RgbImage> for ChartSnapshot {
    fn from(img: RgbImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            rgb: img.into_raw(),
        }
    }
}

/// Produces the chart image embedded in the report.
#[allow(async_fn_in_trait)]
pub trait ChartSource {
    /// `Ok(None)` when there is no chart to show; the report skips the block.
    async fn snapshot(&self, analysis: &Analysis) -> Result<Option<ChartSnapshot>, ReportError>;
}

/// Grouped per-player bar chart: one group per shot type, one bar per player.
#[derive(Debug, Default, Clone, Copy)]
pub struct BarChart;

impl ChartSource for BarChart {
    async fn snapshot(&self, analysis: &Analysis) -> Result<Option<ChartSnapshot>, ReportError> {
        if analysis.roster.is_empty() {
            return Ok(None);
        }
        let stats = analysis.stats.clone();
        let players = analysis.roster.len();
        let img = tokio::task::spawn_blocking(move || render_bars(&stats, players))
            .await
            .map_err(|e| ReportError::Chart(e.to_string()))?;
        log::debug!("Rasterized chart {}x{}", img.width(), img.height());
        Ok(Some(img.into()))
    }
}

fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    let x_end = (x + w).min(img.width());
    let y_end = (y + h).min(img.height());
    for py in y..y_end {
        for px in x..x_end {
            img.put_pixel(px, py, color);
        }
    }
}

/// Draw the grouped bars. Bar heights scale to the largest count.
pub fn render_bars(stats: &PlayerStats, players: usize) -> RgbImage {
    let mut img = RgbImage::from_pixel(CHART_PX_WIDTH, CHART_PX_HEIGHT, BACKGROUND);

    let plot_w = CHART_PX_WIDTH - 2 * PADDING;
    let plot_h = CHART_PX_HEIGHT - 2 * PADDING;
    let baseline = CHART_PX_HEIGHT - PADDING;

    // Axes
    fill_rect(&mut img, PADDING, PADDING, 2, plot_h, AXIS);
    fill_rect(&mut img, PADDING, baseline, plot_w, 2, AXIS);

    let max = stats.max_count();
    if max == 0 || players == 0 {
        return img;
    }

    let groups = stats.iter().count() as u32;
    let group_w = plot_w / groups;
    let bar_w = (group_w * 4 / 5 / players as u32).max(1);
    let gap = group_w.saturating_sub(bar_w * players as u32) / 2;

    for (g, (_, counts)) in stats.iter().enumerate() {
        let group_x = PADDING + g as u32 * group_w + gap;
        for (p, &count) in counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let h = (plot_h as u64 * count as u64 / max as u64) as u32;
            let color = Rgb(PALETTE[p % PALETTE.len()]);
            fill_rect(&mut img, group_x + p as u32 * bar_w, baseline - h, bar_w, h, color);
        }
    }
    img
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::time_unit::TimestampFallback;
    use crate::model::{Event, MatchResult};

    fn analysis(events: &[(&str, i64)]) -> Analysis {
        let events = events
            .iter()
            .map(|&(label, track_id)| Event {
                label: label.to_string(),
                track_id,
                t0: Some(1.0),
                t1: None,
                score: None,
            })
            .collect();
        Analysis::new(
            MatchResult {
                events,
                ..Default::default()
            },
            TimestampFallback::T0,
        )
    }

    #[test]
    fn tallest_bar_reaches_top_of_plot() {
        let a = analysis(&[("smash", 1), ("smash", 1), ("lob", 2)]);
        let img = render_bars(&a.stats, a.roster.len());

        let plot_w = CHART_PX_WIDTH - 2 * PADDING;
        let group_w = plot_w / 12;
        let bar_w = group_w * 4 / 5 / 2;
        let gap = (group_w - bar_w * 2) / 2;
        // First bar of the first group (Smash, player 1), just below the top.
        let x = PADDING + gap + 1;
        assert_eq!(*img.get_pixel(x, PADDING + 1), Rgb(PALETTE[0]));
        assert_eq!(*img.get_pixel(x, PADDING - 1), BACKGROUND);
    }

    #[test]
    fn zero_counts_draw_only_axes() {
        let a = analysis(&[("weird_shot", 1)]);
        let img = render_bars(&a.stats, a.roster.len());
        assert_eq!(*img.get_pixel(CHART_PX_WIDTH / 2, CHART_PX_HEIGHT / 2), BACKGROUND);
        assert_eq!(*img.get_pixel(PADDING, CHART_PX_HEIGHT / 2), AXIS);
    }

    #[tokio::test]
    async fn empty_roster_has_no_chart() {
        let a = analysis(&[]);
        assert!(BarChart.snapshot(&a).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn snapshot_is_rgb_raster() {
        let a = analysis(&[("drop", 3)]);
        let snap = BarChart.snapshot(&a).await.unwrap().unwrap();
        assert_eq!((snap.width, snap.height), (CHART_PX_WIDTH, CHART_PX_HEIGHT));
        assert_eq!(snap.rgb.len(), (CHART_PX_WIDTH * CHART_PX_HEIGHT * 3) as usize);
    }
}
