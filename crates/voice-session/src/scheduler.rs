//! Adaptive debounce and bookkeeping for outbound suggestion fetches.
//!
//! The scheduler never sleeps or spawns: callers report edits and timer
//! expiry with an explicit `now`, and get back what to do next. The tokio
//! driver and the tests feed it the same way.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use voice_core::client::SuggestionReply;
use voice_core::normalize::normalize;
use voice_core::reconcile::{reconcile_with, ReconcileOptions};
use voice_core::sentence::{split_last_few_sentences_for_llm, DEFAULT_LLM_THRESHOLD_CHARS};
use voice_core::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Added to the delay for every other edit inside `window`.
    pub step: Duration,
    pub cap: Duration,
    pub window: Duration,
    pub context_threshold_chars: usize,
    pub reconcile: ReconcileOptions,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            step: Duration::from_millis(150),
            cap: Duration::from_millis(300),
            window: Duration::from_millis(1000),
            context_threshold_chars: DEFAULT_LLM_THRESHOLD_CHARS,
            reconcile: ReconcileOptions::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            step: settings.scheduler.debounce_step(),
            cap: settings.scheduler.debounce_cap(),
            window: settings.scheduler.debounce_window(),
            context_threshold_chars: settings.scheduler.context_threshold_chars,
            reconcile: settings.reconcile_options(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    Idle,
    /// A debounce timer is armed.
    Pending,
    /// No timer, but at least one fetch has not settled.
    Fetching,
}

/// What the caller must do after an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleAction {
    /// (Re)arm the debounce timer; any previous deadline is superseded.
    Arm { deadline: Instant, delay: Duration },
    /// Buffer went blank: cancel every outstanding fetch.
    Abort,
}

/// Identifies one fetch. Results from before the last abort are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub id: u64,
    epoch: u64,
}

/// A fetch the caller should start now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlan {
    pub ticket: FetchTicket,
    /// Trailing sentences sent to the backend.
    pub tail: String,
}

/// Published suggestions derived from one settled fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettledSuggestions {
    pub sentences: Vec<String>,
    pub words: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settled {
    /// Result of a fetch that was aborted; nothing changes.
    Stale,
    /// `update` is `None` when the fetch failed.
    Done {
        loading: bool,
        update: Option<SettledSuggestions>,
    },
}

#[derive(Debug)]
pub struct SuggestionScheduler {
    config: SchedulerConfig,
    recent_edits: VecDeque<Instant>,
    deadline: Option<Instant>,
    in_flight: usize,
    next_id: u64,
    epoch: u64,
}

impl SuggestionScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            recent_edits: VecDeque::new(),
            deadline: None,
            in_flight: 0,
            next_id: 0,
            epoch: 0,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn phase(&self) -> SchedulerPhase {
        if self.deadline.is_some() {
            SchedulerPhase::Pending
        } else if self.in_flight > 0 {
            SchedulerPhase::Fetching
        } else {
            SchedulerPhase::Idle
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Report an edit that produced `text`.
    pub fn on_edit(&mut self, text: &str, now: Instant) -> ScheduleAction {
        if text.trim().is_empty() {
            self.abort();
            return ScheduleAction::Abort;
        }

        self.recent_edits.push_back(now);
        while let Some(&oldest) = self.recent_edits.front() {
            if now.saturating_duration_since(oldest) <= self.config.window {
                break;
            }
            self.recent_edits.pop_front();
        }

        let others = self.recent_edits.len().saturating_sub(1) as u32;
        let delay = self.config.step.saturating_mul(others).min(self.config.cap);
        let deadline = now + delay;
        self.deadline = Some(deadline);
        tracing::debug!(
            delay_ms = delay.as_millis() as u64,
            recent = self.recent_edits.len(),
            "scheduler: armed"
        );
        ScheduleAction::Arm { deadline, delay }
    }

    /// Drop the timer and forget every outstanding fetch.
    pub fn abort(&mut self) {
        if self.deadline.is_some() || self.in_flight > 0 {
            tracing::debug!(in_flight = self.in_flight, "scheduler: aborted");
        }
        self.deadline = None;
        self.in_flight = 0;
        self.epoch += 1;
    }

    /// Start a fetch for `text` if the timer has expired at `now`.
    pub fn fire_due(&mut self, text: &str, now: Instant) -> Option<FetchPlan> {
        match self.deadline {
            Some(deadline) if deadline <= now => {}
            _ => return None,
        }
        self.deadline = None;

        let (_, tail) = split_last_few_sentences_for_llm(text, self.config.context_threshold_chars);
        self.in_flight += 1;
        self.next_id += 1;
        let ticket = FetchTicket {
            id: self.next_id,
            epoch: self.epoch,
        };
        tracing::debug!(id = ticket.id, in_flight = self.in_flight, "scheduler: fetch");
        Some(FetchPlan { ticket, tail })
    }

    /// Account for a finished fetch and turn its reply into buffer texts.
    ///
    /// Sentences are merged against the tail of `current_text`, the buffer
    /// as it is now, which may have moved on since the fetch started.
    pub fn settle(
        &mut self,
        ticket: FetchTicket,
        reply: Option<SuggestionReply>,
        current_text: &str,
        last_edit_was_suggestion: bool,
    ) -> Settled {
        if ticket.epoch != self.epoch {
            tracing::debug!(id = ticket.id, "scheduler: stale result dropped");
            return Settled::Stale;
        }
        self.in_flight = self.in_flight.saturating_sub(1);
        let loading = self.in_flight > 0;

        let (context, tail) =
            split_last_few_sentences_for_llm(current_text, self.config.context_threshold_chars);
        let update = reply.map(|reply| SettledSuggestions {
            sentences: reply
                .sentences
                .iter()
                .map(|s| {
                    let merged = reconcile_with(&tail, s, self.config.reconcile);
                    normalize(&format!("{context}{merged}"), last_edit_was_suggestion)
                })
                .collect(),
            words: reply.words.iter().map(|w| normalize(w, false)).collect(),
        });
        tracing::debug!(
            id = ticket.id,
            in_flight = self.in_flight,
            ok = update.is_some(),
            "scheduler: settled"
        );
        Settled::Done { loading, update }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn delay_of(action: ScheduleAction) -> Duration {
        match action {
            ScheduleAction::Arm { delay, .. } => delay,
            ScheduleAction::Abort => panic!("unexpected abort"),
        }
    }

    #[test]
    fn test_delay_grows_and_caps() {
        let t0 = Instant::now();
        let mut s = SuggestionScheduler::new(SchedulerConfig::default());
        assert_eq!(delay_of(s.on_edit("a", t0)), ms(0));
        assert_eq!(delay_of(s.on_edit("ab", t0 + ms(100))), ms(150));
        assert_eq!(delay_of(s.on_edit("abc", t0 + ms(200))), ms(300));
        assert_eq!(delay_of(s.on_edit("abcd", t0 + ms(300))), ms(300));
    }

    #[test]
    fn test_window_prunes_old_edits() {
        let t0 = Instant::now();
        let mut s = SuggestionScheduler::new(SchedulerConfig::default());
        s.on_edit("a", t0);
        s.on_edit("ab", t0 + ms(100));
        assert_eq!(delay_of(s.on_edit("abc", t0 + ms(1500))), ms(0));
    }

    #[test]
    fn test_rearm_supersedes_deadline() {
        let t0 = Instant::now();
        let mut s = SuggestionScheduler::new(SchedulerConfig::default());
        s.on_edit("a", t0);
        s.on_edit("ab", t0 + ms(10));
        assert_eq!(s.deadline(), Some(t0 + ms(160)));
        assert!(s.fire_due("ab", t0 + ms(100)).is_none());
        s.on_edit("abc", t0 + ms(20));
        assert_eq!(s.deadline(), Some(t0 + ms(320)));
        assert!(s.fire_due("abc", t0 + ms(160)).is_none());
        assert!(s.fire_due("abc", t0 + ms(320)).is_some());
        assert_eq!(s.phase(), SchedulerPhase::Fetching);
    }

    #[test]
    fn test_blank_aborts() {
        let t0 = Instant::now();
        let mut s = SuggestionScheduler::new(SchedulerConfig::default());
        s.on_edit("Hi", t0);
        let plan = s.fire_due("Hi", t0).unwrap();
        assert!(s.is_loading());
        assert_eq!(s.on_edit("  ", t0 + ms(5)), ScheduleAction::Abort);
        assert!(!s.is_loading());
        assert_eq!(s.phase(), SchedulerPhase::Idle);
        let reply = SuggestionReply {
            sentences: vec!["Hi there.".into()],
            words: vec![],
        };
        assert_eq!(s.settle(plan.ticket, Some(reply), "", false), Settled::Stale);
    }

    #[test]
    fn test_loading_until_last_fetch_settles() {
        let t0 = Instant::now();
        let mut s = SuggestionScheduler::new(SchedulerConfig::default());
        s.on_edit("a", t0);
        let first = s.fire_due("a", t0).unwrap();
        s.on_edit("ab", t0 + ms(10));
        let second = s.fire_due("ab", t0 + ms(160)).unwrap();
        assert_eq!(s.in_flight(), 2);

        let Settled::Done { loading, .. } = s.settle(first.ticket, None, "ab", false) else {
            panic!("expected done");
        };
        assert!(loading);
        let Settled::Done { loading, update } = s.settle(second.ticket, None, "ab", false) else {
            panic!("expected done");
        };
        assert!(!loading);
        assert_eq!(update, None);
    }

    #[test]
    fn test_settle_reconciles_and_prefixes_context() {
        let t0 = Instant::now();
        let mut s = SuggestionScheduler::new(SchedulerConfig::default());
        let text = "This is the first sentence. This is the second one. And the";
        s.on_edit(text, t0);
        let plan = s.fire_due(text, t0).unwrap();
        assert_eq!(plan.tail, "This is the second one. And the");

        let reply = SuggestionReply {
            sentences: vec!["This is the second one. And the third.".into()],
            words: vec![" third".into()],
        };
        let Settled::Done { update, .. } = s.settle(plan.ticket, Some(reply), text, false) else {
            panic!("expected done");
        };
        let update = update.unwrap();
        assert_eq!(
            update.sentences,
            vec!["This is the first sentence. This is the second one. And the third."]
        );
        assert_eq!(update.words, vec!["third"]);
    }

    #[test]
    fn test_settle_uses_buffer_at_consumption_time() {
        let t0 = Instant::now();
        let mut s = SuggestionScheduler::new(SchedulerConfig::default());
        let before = "This is the second sentence here. And";
        s.on_edit(before, t0);
        let plan = s.fire_due(before, t0).unwrap();
        assert_eq!(plan.tail, before);

        // The user inserted a sentence in front while the fetch was running.
        let now = "One. This is the second sentence here. And";
        let reply = SuggestionReply {
            sentences: vec!["This is the second sentence here. And then.".into()],
            words: vec![],
        };
        let Settled::Done { update, .. } = s.settle(plan.ticket, Some(reply), now, false) else {
            panic!("expected done");
        };
        assert_eq!(
            update.unwrap().sentences,
            vec!["One. This is the second sentence here. And then."]
        );
    }

    #[test]
    fn test_settle_adopts_fix_past_stability_margin() {
        let t0 = Instant::now();
        let mut s = SuggestionScheduler::new(SchedulerConfig::default());
        let text = "I would like to order a cup of cofee and";
        s.on_edit(text, t0);
        let plan = s.fire_due(text, t0).unwrap();
        let reply = SuggestionReply {
            sentences: vec!["I would like to order a cup of coffee and a cake.".into()],
            words: vec![],
        };
        let Settled::Done { update, .. } = s.settle(plan.ticket, Some(reply), text, false) else {
            panic!("expected done");
        };
        assert_eq!(
            update.unwrap().sentences,
            // The typo sits inside the last ten chars of the tail, so the
            // suggested correction is taken along with the extension.
            vec!["I would like to order a cup of coffee and a cake."]
        );
    }
}
