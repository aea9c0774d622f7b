use serde::Deserialize;

use crate::model::Event;
use crate::FPS;

/// How many leading events the unit heuristic samples.
const SAMPLE_SIZE: usize = 5;

/// Sampled mean above which timestamps are taken to be frame numbers.
const FRAMES_THRESHOLD: f64 = 100.0;

/// Unit of the raw `t0`/`t1` timestamps in a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Frames,
    Seconds,
}

impl TimeUnit {
    /// Convert a raw timestamp in this unit to seconds.
    pub fn to_seconds(self, raw: f64) -> f64 {
        match self {
            Self::Frames => raw / FPS,
            Self::Seconds => raw,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Frames => "frames",
            Self::Seconds => "seconds",
        }
    }
}

/// Which fields supply an event's raw timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampFallback {
    /// `t0` only; a missing `t0` reads as 0.
    #[default]
    T0,
    /// `t0`, then `t1`, then 0.
    T0ThenT1,
}

impl TimestampFallback {
    pub fn raw_time(self, event: &Event) -> f64 {
        match self {
            Self::T0 => event.t0.unwrap_or(0.0),
            Self::T0ThenT1 => event.t0.or(event.t1).unwrap_or(0.0),
        }
    }
}

/// Infer whether event timestamps are frames or seconds.
///
/// Sums the raw time of the first five events and always divides by five,
/// even when fewer were sampled. Mean > 100 means frames. An empty
/// sequence resolves to frames.
pub fn resolve(events: &[Event], fallback: TimestampFallback) -> TimeUnit {
    if events.is_empty() {
        return TimeUnit::Frames;
    }
    let sum: f64 = events
        .iter()
        .take(SAMPLE_SIZE)
        .map(|e| fallback.raw_time(e))
        .sum();
    let mean = sum / SAMPLE_SIZE as f64;
    if mean > FRAMES_THRESHOLD {
        TimeUnit::Frames
    } else {
        TimeUnit::Seconds
    }
}
