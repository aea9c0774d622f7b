use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Callback receiving the playback position in seconds.
pub type TimeListener = Box<dyn FnMut(f64)>;

/// Handle for an attached time listener. Detaches on [`cancel`](Self::cancel)
/// or drop, whichever comes first; detaching twice is a no-op.
pub struct Subscription {
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(detach: impl FnOnce() + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    pub fn cancel(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// A playable media element the synchronizer can read, seek and observe.
pub trait MediaSurface {
    /// Identity of the loaded source. A different id is a different binding.
    fn source_id(&self) -> String;
    fn current_time(&self) -> f64;
    fn set_current_time(&self, seconds: f64);
    /// Attach a listener for continuous position updates.
    fn on_time_changed(&self, listener: TimeListener) -> Subscription;
}

type ListenerList = RefCell<Vec<(u64, TimeListener)>>;

/// In-process timeline standing in for a media element.
///
/// Position only moves when [`advance_to`](Self::advance_to) or a seek is
/// called; every move is broadcast to the attached listeners.
pub struct SimulatedTimeline {
    source_id: String,
    time: Cell<f64>,
    next_id: Cell<u64>,
    listeners: Rc<ListenerList>,
}

impl SimulatedTimeline {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            time: Cell::new(0.0),
            next_id: Cell::new(0),
            listeners: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Move the playhead as playback would and notify listeners.
    pub fn advance_to(&self, seconds: f64) {
        self.time.set(seconds);
        for (_, listener) in self.listeners.borrow_mut().iter_mut() {
            listener(seconds);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl MediaSurface for SimulatedTimeline {
    fn source_id(&self) -> String {
        self.source_id.clone()
    }

    fn current_time(&self) -> f64 {
        self.time.get()
    }

    fn set_current_time(&self, seconds: f64) {
        self.advance_to(seconds);
    }

    fn on_time_changed(&self, listener: TimeListener) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push((id, listener));

        let listeners: Weak<ListenerList> = Rc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(list) = listeners.upgrade() {
                list.borrow_mut().retain(|(i, _)| *i != id);
            }
        })
    }
}
