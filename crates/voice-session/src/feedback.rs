//! Click feedback around user actions.
//!
//! UI handlers wrap each user-triggered operation in [`with_feedback`]
//! instead of relying on a decorator: the sink fires first, then the action.

use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedbackPolicy {
    Silent,
    #[default]
    Click,
}

/// Output device for feedback (sound, haptics, a counter in tests).
pub trait FeedbackSink: Send + Sync {
    fn click(&self);
}

/// Run `action`, preceded by a click when `policy` asks for one.
pub fn with_feedback<T>(
    policy: FeedbackPolicy,
    sink: &dyn FeedbackSink,
    action: impl FnOnce() -> T,
) -> T {
    if policy == FeedbackPolicy::Click {
        sink.click();
    }
    action()
}

/// Sink that only counts clicks.
#[derive(Debug, Default)]
pub struct ClickCounter {
    clicks: AtomicUsize,
}

impl ClickCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.clicks.load(Ordering::Relaxed)
    }
}

impl FeedbackSink for ClickCounter {
    fn click(&self) {
        self.clicks.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<&'static str>>);

    impl FeedbackSink for Recorder {
        fn click(&self) {
            self.0.lock().unwrap().push("click");
        }
    }

    #[test]
    fn test_click_precedes_action() {
        let rec = Recorder(Mutex::new(Vec::new()));
        let out = with_feedback(FeedbackPolicy::Click, &rec, || {
            rec.0.lock().unwrap().push("action");
            42
        });
        assert_eq!(out, 42);
        assert_eq!(*rec.0.lock().unwrap(), vec!["click", "action"]);
    }

    #[test]
    fn test_silent_policy() {
        let counter = ClickCounter::new();
        let out = with_feedback(FeedbackPolicy::Silent, &counter, || "done");
        assert_eq!(out, "done");
        assert_eq!(counter.count(), 0);
        with_feedback(FeedbackPolicy::Click, &counter, || ());
        with_feedback(FeedbackPolicy::default(), &counter, || ());
        assert_eq!(counter.count(), 2);
    }
}
