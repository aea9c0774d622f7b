//! Keeps the event log and the video position in lock-step.
//!
//! Playback drives time → index (highlight the most recently passed event);
//! selecting a log row drives index → time (seek the video). Both write the
//! same cursor, last write wins.

pub mod scroll;
pub mod surface;

use std::cell::RefCell;
use std::rc::Rc;

use crate::events::Analysis;
use scroll::LogViewport;
use surface::{MediaSurface, Subscription};

/// Binding state of the synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// The result has no playable video; the synchronizer is inert.
    NoVideo,
    /// A video exists but no surface is attached yet.
    Unbound,
    Bound,
}

/// Index of the last event whose display time is `<= time`, or 0 when the
/// time precedes every event. `None` only when there are no events.
pub fn index_at(times: &[f64], time: f64) -> Option<usize> {
    if times.is_empty() {
        return None;
    }
    Some(times.iter().rposition(|&t| t <= time).unwrap_or(0))
}

struct Cursor {
    time: f64,
    index: usize,
    viewport: Option<Rc<dyn LogViewport>>,
}

impl Cursor {
    /// Move to `index`; returns the viewport to scroll if the index changed.
    fn move_to(&mut self, time: f64, index: usize) -> Option<Rc<dyn LogViewport>> {
        self.time = time;
        if self.index == index {
            return None;
        }
        self.index = index;
        self.viewport.clone()
    }
}

/// Apply a playback position to the cursor. Shared by the attached listener
/// and [`Synchronizer::on_time_update`].
fn advance(cursor: &RefCell<Cursor>, times: &[f64], time: f64) {
    let Some(index) = index_at(times, time) else {
        cursor.borrow_mut().time = time;
        return;
    };
    // Release the borrow before scrolling; the viewport is outside our state.
    let viewport = cursor.borrow_mut().move_to(time, index);
    if let Some(viewport) = viewport {
        scroll::scroll_row_into_view(viewport.as_ref(), index);
    }
}

struct Binding {
    source_id: String,
    surface: Rc<dyn MediaSurface>,
    subscription: Subscription,
}

pub struct Synchronizer {
    times: Rc<[f64]>,
    video_url: Option<String>,
    cursor: Rc<RefCell<Cursor>>,
    binding: Option<Binding>,
}

impl Synchronizer {
    /// `times` are display times in seconds, one per negative-filtered event.
    pub fn new(times: Vec<f64>, video_url: Option<String>) -> Self {
        Self {
            times: times.into(),
            video_url,
            cursor: Rc::new(RefCell::new(Cursor {
                time: 0.0,
                index: 0,
                viewport: None,
            })),
            binding: None,
        }
    }

    pub fn from_analysis(analysis: &Analysis) -> Self {
        Self::new(analysis.display_times(), analysis.result.video_url())
    }

    pub fn state(&self) -> SyncState {
        match (&self.video_url, &self.binding) {
            (None, _) => SyncState::NoVideo,
            (Some(_), None) => SyncState::Unbound,
            (Some(_), Some(_)) => SyncState::Bound,
        }
    }

    pub fn video_url(&self) -> Option<&str> {
        self.video_url.as_deref()
    }

    /// Attach the log panel that should follow the highlighted event.
    pub fn set_viewport(&self, viewport: Rc<dyn LogViewport>) {
        self.cursor.borrow_mut().viewport = Some(viewport);
    }

    /// Bind to a media surface.
    ///
    /// Re-binding the same source identity is a no-op; a different identity
    /// detaches the previous listener before attaching the new one.
    pub fn bind(&mut self, surface: Rc<dyn MediaSurface>) {
        if self.video_url.is_none() {
            log::debug!("No video in result, ignoring media surface");
            return;
        }
        let source_id = surface.source_id();
        if let Some(binding) = &self.binding {
            if binding.source_id == source_id {
                return;
            }
        }
        self.unbind();

        let cursor = Rc::clone(&self.cursor);
        let times = Rc::clone(&self.times);
        let subscription =
            surface.on_time_changed(Box::new(move |time| advance(&cursor, &times, time)));
        log::debug!("Bound time listener to source {source_id}");
        self.binding = Some(Binding {
            source_id,
            surface,
            subscription,
        });
    }

    /// Detach from the current surface, if any.
    pub fn unbind(&mut self) {
        if let Some(mut binding) = self.binding.take() {
            binding.subscription.cancel();
            log::debug!("Unbound time listener from source {}", binding.source_id);
        }
    }

    /// Feed a playback position (time → index).
    pub fn on_time_update(&self, time: f64) {
        advance(&self.cursor, &self.times, time);
    }

    /// Select log row `index` (index → time) and seek the bound surface.
    ///
    /// Returns the display time sought to, or `None` for an unknown index.
    pub fn select(&self, index: usize) -> Option<f64> {
        let time = *self.times.get(index)?;
        let viewport = self.cursor.borrow_mut().move_to(time, index);
        if let Some(viewport) = viewport {
            scroll::scroll_row_into_view(viewport.as_ref(), index);
        }
        if let Some(binding) = &self.binding {
            binding.surface.set_current_time(time);
        }
        Some(time)
    }

    pub fn current_time(&self) -> f64 {
        self.cursor.borrow().time
    }

    /// Highlighted event; `None` only when the result has no events.
    pub fn current_index(&self) -> Option<usize> {
        if self.times.is_empty() {
            None
        } else {
            Some(self.cursor.borrow().index)
        }
    }
}

impl Drop for Synchronizer {
    fn drop(&mut self) {
        self.unbind();
    }
}

#[cfg(test)]
mod tests {
    use super::scroll::FixedRowViewport;
    use super::surface::SimulatedTimeline;
    use super::*;

    const VIDEO: Option<&str> = Some("https://storage.googleapis.com/b/v.mp4");

    fn sync(times: &[f64]) -> Synchronizer {
        Synchronizer::new(times.to_vec(), VIDEO.map(String::from))
    }

    #[test]
    fn index_is_last_passed_event() {
        let times = [1.0, 2.5, 4.0, 7.0];
        assert_eq!(index_at(&times, 0.5), Some(0));
        assert_eq!(index_at(&times, 1.0), Some(0));
        assert_eq!(index_at(&times, 3.0), Some(1));
        assert_eq!(index_at(&times, 4.0), Some(2));
        assert_eq!(index_at(&times, 100.0), Some(3));
        assert_eq!(index_at(&[], 3.0), None);
    }

    #[test]
    fn playback_drives_index() {
        let mut s = sync(&[1.0, 2.5, 4.0]);
        let timeline = Rc::new(SimulatedTimeline::new("v1"));
        s.bind(timeline.clone());
        assert_eq!(s.state(), SyncState::Bound);

        timeline.advance_to(3.0);
        assert_eq!(s.current_index(), Some(1));
        assert_eq!(s.current_time(), 3.0);

        timeline.advance_to(10.0);
        assert_eq!(s.current_index(), Some(2));
    }

    #[test]
    fn select_seeks_and_round_trips() {
        let times = [1.0, 2.5, 4.0, 7.0];
        let mut s = sync(&times);
        let timeline = Rc::new(SimulatedTimeline::new("v1"));
        s.bind(timeline.clone());

        for (i, &t) in times.iter().enumerate() {
            assert_eq!(s.select(i), Some(t));
            assert_eq!(timeline.current_time(), t);
            assert_eq!(s.current_time(), t);
            s.on_time_update(t);
            assert_eq!(s.current_index(), Some(i));
        }
    }

    #[test]
    fn select_without_surface_is_guarded() {
        let s = sync(&[1.0, 2.0]);
        assert_eq!(s.state(), SyncState::Unbound);
        assert_eq!(s.select(1), Some(2.0));
        assert_eq!(s.current_index(), Some(1));
        assert_eq!(s.select(5), None);
    }

    #[test]
    fn no_video_is_inert() {
        let mut s = Synchronizer::new(vec![1.0], None);
        assert_eq!(s.state(), SyncState::NoVideo);
        let timeline = Rc::new(SimulatedTimeline::new("v1"));
        s.bind(timeline.clone());
        assert_eq!(timeline.listener_count(), 0);
        assert_eq!(s.state(), SyncState::NoVideo);
    }

    #[test]
    fn rebinding_same_source_attaches_once() {
        let mut s = sync(&[1.0]);
        let timeline = Rc::new(SimulatedTimeline::new("v1"));
        s.bind(timeline.clone());
        s.bind(timeline.clone());
        assert_eq!(timeline.listener_count(), 1);
    }

    #[test]
    fn new_source_detaches_previous() {
        let mut s = sync(&[1.0, 5.0]);
        let first = Rc::new(SimulatedTimeline::new("v1"));
        let second = Rc::new(SimulatedTimeline::new("v2"));

        s.bind(first.clone());
        s.bind(second.clone());
        assert_eq!(first.listener_count(), 0);
        assert_eq!(second.listener_count(), 1);

        // The old surface no longer drives the cursor.
        first.advance_to(6.0);
        assert_eq!(s.current_index(), Some(0));
        second.advance_to(6.0);
        assert_eq!(s.current_index(), Some(1));
    }

    #[test]
    fn unbind_is_idempotent_and_drop_detaches() {
        let timeline = Rc::new(SimulatedTimeline::new("v1"));
        {
            let mut s = sync(&[1.0]);
            s.bind(timeline.clone());
            s.unbind();
            s.unbind();
            assert_eq!(s.state(), SyncState::Unbound);
            s.bind(timeline.clone());
            assert_eq!(timeline.listener_count(), 1);
        }
        assert_eq!(timeline.listener_count(), 0);
    }

    #[test]
    fn index_change_scrolls_viewport() {
        let mut s = sync(&(0..20).map(|i| i as f64).collect::<Vec<_>>());
        let viewport = Rc::new(FixedRowViewport::new((0..20).collect(), 10.0, 50.0));
        s.set_viewport(viewport.clone());
        let timeline = Rc::new(SimulatedTimeline::new("v1"));
        s.bind(timeline.clone());

        timeline.advance_to(12.2);
        // Row 12 at 120: 120 - (50 - 10) / 2 = 100
        assert_eq!(viewport.scroll_top(), 100.0);

        s.select(3);
        assert_eq!(viewport.scroll_top(), 10.0);
    }

    #[test]
    fn category_filter_does_not_move_cursor() {
        use crate::events::time_unit::TimestampFallback;
        use crate::events::CategoryFilter;
        use crate::model::{Event, MatchResult, Outputs, VideoRef};

        let event = |label: &str, track_id: i64, t0: f64| Event {
            label: label.to_string(),
            track_id,
            t0: Some(t0),
            t1: None,
            score: None,
        };
        let analysis = Analysis::new(
            MatchResult {
                events: vec![
                    event("smash", 1, 1.0),
                    event("negative", 1, 1.5),
                    event("lob", 2, 2.0),
                    event("smash", 1, 3.0),
                ],
                outputs: Some(Outputs {
                    overlay_video: Some(VideoRef::Url("https://cdn.example.com/v.mp4".into())),
                }),
                ..Default::default()
            },
            TimestampFallback::T0,
        );

        // Only smashes are displayed: events 0 and 2.
        let shown: Vec<usize> = analysis
            .log_rows(CategoryFilter::parse("smash").unwrap())
            .iter()
            .map(|row| row.index)
            .collect();
        assert_eq!(shown, vec![0, 2]);

        let mut s = Synchronizer::from_analysis(&analysis);
        let viewport = Rc::new(FixedRowViewport::new(shown, 10.0, 10.0));
        s.set_viewport(viewport.clone());
        let timeline = Rc::new(SimulatedTimeline::new("v1"));
        s.bind(timeline.clone());

        // The lob is hidden but still the most recently passed event.
        timeline.advance_to(2.5);
        assert_eq!(s.current_index(), Some(1));
        assert_eq!(viewport.scroll_top(), 0.0);

        timeline.advance_to(3.5);
        assert_eq!(s.current_index(), Some(2));
        assert_eq!(viewport.scroll_top(), 10.0);
    }

    #[test]
    fn empty_events_have_no_index() {
        let s = sync(&[]);
        s.on_time_update(5.0);
        assert_eq!(s.current_index(), None);
        assert_eq!(s.current_time(), 5.0);
    }
}
