pub mod shots;
pub mod time_unit;

use std::collections::BTreeSet;

use crate::model::{Event, MatchResult};
use shots::SHOT_TYPES;
use time_unit::{TimeUnit, TimestampFallback};

/// Per-shot-type, per-player counts.
///
/// Always `SHOT_TYPES.len()` rows of `roster.len()` counts each; pairs with
/// no events are zero, never missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerStats {
    rows: Vec<Vec<u32>>,
}

impl PlayerStats {
    fn zeroed(players: usize) -> Self {
        Self {
            rows: vec![vec![0; players]; SHOT_TYPES.len()],
        }
    }

    /// Counts for a shot type by taxonomy position, one per roster player.
    pub fn row(&self, shot_index: usize) -> &[u32] {
        &self.rows[shot_index]
    }

    /// Counts for a canonical shot name (any case / underscore form).
    pub fn get(&self, shot: &str) -> Option<&[u32]> {
        shots::shot_index(shot).map(|i| self.row(i))
    }

    /// Iterate `(shot name, counts)` in taxonomy order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[u32])> {
        SHOT_TYPES.iter().copied().zip(self.rows.iter().map(Vec::as_slice))
    }

    pub fn total(&self, shot_index: usize) -> u32 {
        self.rows[shot_index].iter().sum()
    }

    /// Largest single cell, used to scale the chart.
    pub fn max_count(&self) -> u32 {
        self.rows.iter().flatten().copied().max().unwrap_or(0)
    }
}

/// Row filter for the event log. Never affects playback sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    /// Index into [`SHOT_TYPES`].
    Shot(usize),
}

impl CategoryFilter {
    /// Parse `"all"` or a shot label. Returns `None` for unknown shots.
    pub fn parse(value: &str) -> Option<Self> {
        if shots::normalize_label(value) == "all" {
            return Some(Self::All);
        }
        shots::shot_index(value).map(Self::Shot)
    }

    pub fn matches(self, event: &Event) -> bool {
        match self {
            Self::All => true,
            Self::Shot(i) => shots::shot_index(&event.label) == Some(i),
        }
    }
}

/// One line of the event log, already converted for display.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    /// Position in the negative-filtered event list.
    pub index: usize,
    pub seconds: f64,
    pub label: String,
    pub track_id: i64,
}

impl LogRow {
    /// Time fixed to one decimal place.
    pub fn time_text(&self) -> String {
        format!("{:.1}", self.seconds)
    }

    /// `[12.3s] Smash by Player 2`
    pub fn line(&self) -> String {
        format!("[{}s] {} by Player {}", self.time_text(), self.label, self.track_id)
    }
}

/// Output of [`normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub events: Vec<Event>,
    pub roster: Vec<i64>,
    pub stats: PlayerStats,
}

/// Drop negative events, derive the roster and count shots per player.
pub fn normalize(raw: &[Event]) -> Normalized {
    let events: Vec<Event> = raw
        .iter()
        .filter(|e| !shots::is_negative(&e.label))
        .cloned()
        .collect();

    let roster: Vec<i64> = events
        .iter()
        .map(|e| e.track_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut stats = PlayerStats::zeroed(roster.len());
    for event in &events {
        let Some(shot) = shots::shot_index(&event.label) else {
            continue;
        };
        let Ok(player) = roster.binary_search(&event.track_id) else {
            continue;
        };
        stats.rows[shot][player] += 1;
    }

    log::debug!(
        "Normalized {} events ({} dropped as negative), {} players",
        events.len(),
        raw.len() - events.len(),
        roster.len()
    );

    Normalized {
        events,
        roster,
        stats,
    }
}

/// A loaded match with everything the views and exporters derive from it.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub result: MatchResult,
    pub events: Vec<Event>,
    pub roster: Vec<i64>,
    pub stats: PlayerStats,
    pub unit: TimeUnit,
    fallback: TimestampFallback,
}

impl Analysis {
    pub fn new(result: MatchResult, fallback: TimestampFallback) -> Self {
        let unit = time_unit::resolve(&result.events, fallback);
        log::info!(
            "Loaded {} events, timestamps in {}",
            result.events.len(),
            unit.as_str()
        );
        let Normalized {
            events,
            roster,
            stats,
        } = normalize(&result.events);
        Self {
            result,
            events,
            roster,
            stats,
            unit,
            fallback,
        }
    }

    /// Display time in seconds of the event at `index`.
    pub fn display_time(&self, index: usize) -> Option<f64> {
        self.events.get(index).map(|e| self.seconds_of(e))
    }

    /// Display times of every event, in log order.
    pub fn display_times(&self) -> Vec<f64> {
        self.events.iter().map(|e| self.seconds_of(e)).collect()
    }

    fn seconds_of(&self, event: &Event) -> f64 {
        self.unit.to_seconds(self.fallback.raw_time(event))
    }

    /// Log rows passing `filter`; indices still refer to the full list.
    pub fn log_rows(&self, filter: CategoryFilter) -> Vec<LogRow> {
        self.events
            .iter()
            .enumerate()
            .filter(|(_, e)| filter.matches(e))
            .map(|(index, e)| LogRow {
                index,
                seconds: self.seconds_of(e),
                label: shots::display_label(&e.label),
                track_id: e.track_id,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_event(label: &str, track_id: i64, t0: f64) -> Event {
        Event {
            label: label.to_string(),
            track_id,
            t0: Some(t0),
            t1: None,
            score: None,
        }
    }

    fn mixed_events() -> Vec<Event> {
        vec![
            make_event("smash", 7, 1.0),
            make_event("Net_Shot", 2, 2.0),
            make_event("negative", 9, 2.5),
            make_event("SMASH", 2, 3.0),
            make_event("weird_new_shot", 7, 4.0),
            make_event("clear", 7, 5.0),
            make_event("jump_smash", 2, 6.0),
        ]
    }

    #[test]
    fn negative_events_excluded_everywhere() {
        let raw = vec![make_event("Smash", 1, 1.0), make_event("negative", 1, 2.0)];
        let n = normalize(&raw);
        assert_eq!(n.events.len(), 1);
        assert_eq!(n.roster, vec![1]);
        assert_eq!(n.stats.get("Smash"), Some(&[1][..]));
    }

    #[test]
    fn negative_only_player_not_in_roster() {
        let n = normalize(&mixed_events());
        assert_eq!(n.roster, vec![2, 7]);
    }

    #[test]
    fn stats_shape_is_zero_filled() {
        let n = normalize(&mixed_events());
        assert_eq!(n.stats.iter().count(), SHOT_TYPES.len());
        for (_, counts) in n.stats.iter() {
            assert_eq!(counts.len(), 2);
        }
        assert_eq!(n.stats.get("Lob"), Some(&[0, 0][..]));
    }

    #[test]
    fn stats_counts_per_player() {
        let n = normalize(&mixed_events());
        assert_eq!(n.stats.get("Smash"), Some(&[1, 1][..]));
        assert_eq!(n.stats.get("Net Shot"), Some(&[1, 0][..]));
        assert_eq!(n.stats.get("Jump Smash"), Some(&[1, 0][..]));
        assert_eq!(n.stats.get("Clear"), Some(&[0, 1][..]));
    }

    #[test]
    fn stats_conservation() {
        let raw = mixed_events();
        let n = normalize(&raw);
        for (i, shot) in SHOT_TYPES.iter().enumerate() {
            let expected = n
                .events
                .iter()
                .filter(|e| shots::normalize_label(&e.label) == shots::normalize_label(shot))
                .count() as u32;
            assert_eq!(n.stats.total(i), expected, "shot {shot}");
        }
    }

    #[test]
    fn unmatched_labels_stay_in_log_but_not_stats() {
        let n = normalize(&mixed_events());
        let all: u32 = (0..SHOT_TYPES.len()).map(|i| n.stats.total(i)).sum();
        assert_eq!(n.events.len(), 6);
        assert_eq!(all, 5);
    }

    #[test]
    fn normalization_is_deterministic() {
        let raw = mixed_events();
        assert_eq!(normalize(&raw), normalize(&raw));
    }

    #[test]
    fn empty_input() {
        let n = normalize(&[]);
        assert!(n.events.is_empty());
        assert!(n.roster.is_empty());
        assert_eq!(n.stats.row(0), &[] as &[u32]);
        assert_eq!(n.stats.max_count(), 0);
    }

    #[test]
    fn log_rows_format_and_filter() {
        let result = MatchResult {
            events: mixed_events(),
            ..Default::default()
        };
        let analysis = Analysis::new(result, TimestampFallback::T0);
        assert_eq!(analysis.unit, TimeUnit::Seconds);

        let rows = analysis.log_rows(CategoryFilter::All);
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[1].line(), "[2.0s] Net Shot by Player 2");
        assert_eq!(rows[3].line(), "[4.0s] Weird New Shot by Player 7");

        let smashes = analysis.log_rows(CategoryFilter::parse("smash").unwrap());
        assert_eq!(smashes.len(), 2);
        assert_eq!(smashes[1].index, 2);
    }

    #[test]
    fn frame_timestamps_convert_to_seconds() {
        let result = MatchResult {
            events: vec![make_event("smash", 1, 450.0), make_event("lob", 2, 615.0)],
            ..Default::default()
        };
        let analysis = Analysis::new(result, TimestampFallback::T0);
        assert_eq!(analysis.unit, TimeUnit::Frames);
        assert_eq!(analysis.display_times(), vec![15.0, 20.5]);
        assert_eq!(analysis.log_rows(CategoryFilter::All)[1].time_text(), "20.5");
    }

    #[test]
    fn category_filter_parse() {
        assert_eq!(CategoryFilter::parse("ALL"), Some(CategoryFilter::All));
        assert_eq!(CategoryFilter::parse("net_shot"), Some(CategoryFilter::Shot(6)));
        assert_eq!(CategoryFilter::parse("bogus"), None);
    }
}
