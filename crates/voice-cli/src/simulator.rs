//! Keystroke-saving simulator.
//!
//! Replays a target sentence the way a user of the scanning keyboard would:
//! start with an initial phrase when one fits, then at every step take a
//! sentence suggestion that extends the matched tokens, else a word
//! suggestion, else type one character. Suggestions come from a real
//! [`SessionContext`], so the history index and reconciliation are in play.
//!
//! Scripts without spaces are replayed token by token over the language
//! profile's segmentation; typing a whole token counts as one character
//! input.

use std::ops::AddAssign;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;

use voice_core::client::{SuggestionClient, SuggestionReply, SuggestionRequest};
use voice_core::input_history::InputSource;
use voice_core::language::{LanguageProfile, Script};
use voice_core::unicode::katakana_to_hiragana;
use voice_session::feedback::{with_feedback, ClickCounter, FeedbackPolicy};
use voice_session::SessionContext;

/// Clock step between simulated edits; longer than any debounce delay.
const STEP: Duration = Duration::from_secs(2);

fn is_punctuation(c: char) -> bool {
    matches!(c, '.' | ',' | '!' | '?')
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Split on spaces, detaching trailing punctuation runs from their word.
pub fn tokenize(sentence: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for token in sentence.split(' ').filter(|t| !t.is_empty()) {
        let word = token.trim_end_matches(is_punctuation);
        if !word.is_empty() && word.len() < token.len() {
            tokens.push(word.to_string());
            tokens.push(token[word.len()..].to_string());
        } else {
            tokens.push(token.to_string());
        }
    }
    tokens
}

/// Number of leading tokens equal up to case.
pub fn common_prefix_len<A: AsRef<str>, B: AsRef<str>>(a: &[A], b: &[B]) -> usize {
    a.iter()
        .zip(b)
        .take_while(|(x, y)| eq_ignore_case(x.as_ref(), y.as_ref()))
        .count()
}

/// Join tokens with single spaces and a trailing space, gluing punctuation
/// runs to the preceding token.
pub fn join_tokens<S: AsRef<str>>(tokens: &[S]) -> String {
    let mut text = String::new();
    for (i, token) in tokens.iter().enumerate() {
        let token = token.as_ref();
        let glue = i > 0 && !token.is_empty() && token.chars().all(is_punctuation);
        if glue {
            text.pop();
        }
        text.push_str(token);
        text.push(' ');
    }
    if tokens.is_empty() {
        text.push(' ');
    }
    text
}

/// Longest target prefix reachable through one of `sentences`, if it goes
/// further than what is already typed.
pub fn select_sentence(
    target: &[String],
    typed: &[String],
    sentences: &[String],
) -> Option<Vec<String>> {
    let best = sentences
        .iter()
        .map(|s| common_prefix_len(target, &tokenize(s)))
        .max()
        .unwrap_or(0);
    (best > common_prefix_len(target, typed)).then(|| target[..best].to_vec())
}

/// The word suggestion that moves towards `target`: the next token when the
/// last typed token is complete, else `-` plus the rest of that token.
pub fn select_word(target: &[String], typed: &[String], words: &[String]) -> Option<String> {
    let last = typed.len().checked_sub(1)?;
    let goal = target.get(last)?;
    let wanted = if eq_ignore_case(goal, &typed[last]) {
        target.get(last + 1)?.clone()
    } else {
        let rest: String = goal.chars().skip(typed[last].chars().count()).collect();
        format!("-{rest}")
    };
    words.contains(&wanted).then_some(wanted)
}

/// Comparison key for segmented tokens: case and kana script folded.
fn fold(token: &str) -> String {
    katakana_to_hiragana(&token.to_lowercase())
}

/// Number of leading segmented tokens equal after [`fold`].
pub fn common_token_prefix_len<A: AsRef<str>, B: AsRef<str>>(a: &[A], b: &[B]) -> usize {
    a.iter()
        .zip(b)
        .take_while(|(x, y)| fold(x.as_ref()) == fold(y.as_ref()))
        .count()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SimulationStats {
    pub input_len: usize,
    pub initial_phrase_count: usize,
    /// Characters typed; each costs two clicks.
    pub char_count: usize,
    pub word_count: usize,
    /// Characters gained through word suggestions.
    pub word_len: i64,
    pub sentence_count: usize,
    /// Characters gained through sentence suggestions.
    pub sentence_len: i64,
}

impl AddAssign for SimulationStats {
    fn add_assign(&mut self, other: Self) {
        self.input_len += other.input_len;
        self.initial_phrase_count += other.initial_phrase_count;
        self.char_count += other.char_count;
        self.word_count += other.word_count;
        self.word_len += other.word_len;
        self.sentence_count += other.sentence_count;
        self.sentence_len += other.sentence_len;
    }
}

impl SimulationStats {
    /// Selections where typing a character counts as one.
    pub fn selections(&self) -> usize {
        self.char_count + self.word_count + self.sentence_count + self.initial_phrase_count
    }

    /// Clicks on the scanning keyboard: two per character.
    pub fn clicks(&self) -> usize {
        self.char_count * 2 + self.word_count + self.sentence_count + self.initial_phrase_count
    }

    pub fn chars_per_click(&self) -> f64 {
        ratio(self.input_len, self.clicks())
    }

    pub fn chars_per_selection(&self) -> f64 {
        ratio(self.input_len, self.selections())
    }

    pub fn suggestion_select_rate(&self) -> f64 {
        ratio(self.word_count + self.sentence_count, self.selections())
    }
}

fn ratio(a: usize, b: usize) -> f64 {
    if b == 0 {
        0.0
    } else {
        a as f64 / b as f64
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("empty target")]
    EmptyTarget,
    #[error("cannot reach target from {text:?}")]
    Stuck { text: String },
}

/// Client for offline runs: no AI, only the local history index.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineClient;

#[async_trait]
impl SuggestionClient for OfflineClient {
    async fn fetch_suggestions(&self, _request: &SuggestionRequest) -> Option<SuggestionReply> {
        None
    }
}

pub struct Simulator<'a> {
    session: SessionContext,
    client: &'a dyn SuggestionClient,
    clicks: ClickCounter,
    sentence_limit: usize,
    clock: Instant,
}

impl<'a> Simulator<'a> {
    pub fn new(session: SessionContext, client: &'a dyn SuggestionClient) -> Self {
        Self {
            session,
            client,
            clicks: ClickCounter::new(),
            sentence_limit: 2,
            clock: Instant::now(),
        }
    }

    /// How many sentence suggestions the simulated user looks at.
    pub fn with_sentence_limit(mut self, limit: usize) -> Self {
        self.sentence_limit = limit;
        self
    }

    /// Texts entered into the session so far, one click each.
    pub fn entered(&self) -> usize {
        self.clicks.count()
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn into_session(self) -> SessionContext {
        self.session
    }

    fn enter(&mut self, text: &str, source: InputSource) {
        self.clock += STEP;
        with_feedback(FeedbackPolicy::Click, &self.clicks, || {
            self.session.set_text(text, source, self.clock)
        });
    }

    /// Enter `text` into the session and collect what it would show.
    async fn suggest(&mut self, text: &str, source: InputSource) -> (Vec<String>, Vec<String>) {
        self.enter(text, source);
        if let Some(job) = self.session.fire_due(self.clock) {
            let reply = self.client.fetch_suggestions(&job.request).await;
            self.session.receive_suggestions(job.ticket, reply);
        }

        let mut sentences: Vec<String> = self
            .session
            .history_suggestion()
            .map(|c| c.value.clone())
            .into_iter()
            .collect();
        sentences.extend(
            self.session
                .sentence_suggestions()
                .iter()
                .take(self.sentence_limit)
                .map(|c| c.value.clone()),
        );
        (sentences, self.session.word_suggestions().to_vec())
    }

    pub async fn simulate(&mut self, target: &str) -> Result<SimulationStats, SimulationError> {
        match self.session.profile().script {
            Script::SpaceDelimited => self.simulate_spaced(target).await,
            Script::NoSpace | Script::CharacterCell => self.simulate_segmented(target).await,
        }
    }

    async fn simulate_spaced(&mut self, target: &str) -> Result<SimulationStats, SimulationError> {
        let first = target.chars().next().ok_or(SimulationError::EmptyTarget)?;
        let target_tokens = tokenize(target);
        let target_lower = target.to_lowercase();
        let mut stats = SimulationStats::default();
        self.clock += STEP;
        self.session.clear(self.clock);

        let phrase = self
            .session
            .initial_phrases()
            .iter()
            .find(|p| target_lower.starts_with(&p.to_lowercase()))
            .cloned();
        let (mut text, mut source) = match phrase {
            Some(phrase) => {
                tracing::debug!(%phrase, "initial phrase");
                stats.initial_phrase_count += 1;
                (format!("{phrase} "), InputSource::Snackbar)
            }
            None => {
                stats.char_count += 1;
                (first.to_string(), InputSource::Typed)
            }
        };

        // Every step adds a token, a character or a sentence; a target that
        // cannot be spelled out token by token would otherwise loop forever.
        let max_steps = target.chars().count() * 2 + 8;
        for _ in 0..max_steps {
            if text.to_lowercase().starts_with(&target_lower) {
                self.enter(&text, source);
                stats.input_len = text.chars().count();
                tracing::debug!(?stats, "target reached");
                return Ok(stats);
            }
            let typed = tokenize(&text);
            let text_len = text.chars().count() as i64;
            let (sentences, words) = self.suggest(&text, source).await;

            if let Some(selected) = select_sentence(&target_tokens, &typed, &sentences) {
                text = join_tokens(&selected);
                tracing::debug!(%text, "selected sentence");
                stats.sentence_count += 1;
                stats.sentence_len += text.chars().count() as i64 - text_len;
                source = InputSource::SuggestedSentence(0);
                continue;
            }

            if let Some(word) = select_word(&target_tokens, &typed, &words) {
                text = match word.strip_prefix('-') {
                    Some(rest) => {
                        let mut tokens = typed.clone();
                        if let Some(last) = tokens.last_mut() {
                            last.push_str(rest);
                        }
                        join_tokens(&tokens)
                    }
                    None => {
                        let mut tokens = typed.clone();
                        tokens.push(word.clone());
                        join_tokens(&tokens)
                    }
                };
                tracing::debug!(%word, "selected word");
                stats.word_count += 1;
                stats.word_len += text.chars().count() as i64 - text_len;
                source = InputSource::SuggestedWord;
                continue;
            }

            text = self.type_next_char(&target_tokens, typed, &mut stats)?;
            source = InputSource::Typed;
        }
        Err(SimulationError::Stuck { text })
    }

    async fn simulate_segmented(
        &mut self,
        target: &str,
    ) -> Result<SimulationStats, SimulationError> {
        let profile: LanguageProfile = *self.session.profile();
        let target_tokens = profile.segment(target);
        if target_tokens.is_empty() {
            return Err(SimulationError::EmptyTarget);
        }
        let mut stats = SimulationStats::default();
        self.clock += STEP;
        self.session.clear(self.clock);

        // Longest initial phrase whose tokens also start the target.
        let phrase_len = self
            .session
            .initial_phrases()
            .iter()
            .filter(|p| !p.is_empty() && target.starts_with(p.as_str()))
            .map(|p| profile.segment(p))
            .filter(|tokens| common_token_prefix_len(&target_tokens, tokens) == tokens.len())
            .map(|tokens| tokens.len())
            .max();
        let (mut matched, mut source) = match phrase_len {
            Some(len) => {
                stats.initial_phrase_count += 1;
                (len, InputSource::Snackbar)
            }
            None => {
                stats.char_count += 1;
                (1, InputSource::Typed)
            }
        };

        // `matched` grows by at least one token per step.
        while matched < target_tokens.len() {
            let text = profile.join(&target_tokens[..matched]);
            let text_len = text.chars().count() as i64;
            let (sentences, words) = self.suggest(&text, source).await;

            let best = sentences
                .iter()
                .map(|s| common_token_prefix_len(&target_tokens, &profile.segment(s)))
                .max()
                .unwrap_or(0);
            if best > matched {
                matched = best;
                let gained = profile.join(&target_tokens[..matched]).chars().count() as i64;
                tracing::debug!(tokens = matched, "selected sentence");
                stats.sentence_count += 1;
                stats.sentence_len += gained - text_len;
                source = InputSource::SuggestedSentence(0);
                continue;
            }

            let rest = &target_tokens[matched..];
            let word = words
                .iter()
                .map(|w| profile.segment(w.strip_prefix('-').unwrap_or(w.as_str())))
                .find(|tokens| {
                    !tokens.is_empty()
                        && tokens.len() <= rest.len()
                        && common_token_prefix_len(rest, tokens) == tokens.len()
                });
            if let Some(tokens) = word {
                matched += tokens.len();
                let gained = profile.join(&target_tokens[..matched]).chars().count() as i64;
                tracing::debug!(tokens = tokens.len(), "selected word");
                stats.word_count += 1;
                stats.word_len += gained - text_len;
                source = InputSource::SuggestedWord;
                continue;
            }

            tracing::trace!(token = %target_tokens[matched], "input token");
            matched += 1;
            stats.char_count += 1;
            source = InputSource::Typed;
        }

        let text = profile.join(&target_tokens);
        self.enter(&text, source);
        stats.input_len = text.chars().count();
        tracing::debug!(?stats, "target reached");
        Ok(stats)
    }

    fn type_next_char(
        &self,
        target: &[String],
        mut typed: Vec<String>,
        stats: &mut SimulationStats,
    ) -> Result<String, SimulationError> {
        let stuck = || SimulationError::Stuck {
            text: join_tokens(&typed),
        };
        let last = typed.len().checked_sub(1).ok_or_else(stuck)?;
        let goal = target.get(last).ok_or_else(stuck)?;

        let text = if eq_ignore_case(&typed[last], goal) {
            let next = target
                .get(last + 1)
                .and_then(|t| t.chars().next())
                .ok_or_else(stuck)?;
            tracing::trace!(%next, "input char");
            let mut tokens = typed.clone();
            tokens.push(next.to_string());
            join_tokens(&tokens).trim_end().to_string()
        } else {
            let next = goal
                .chars()
                .nth(typed[last].chars().count())
                .ok_or_else(stuck)?;
            tracing::trace!(%next, "input char");
            typed[last].push(next);
            let text = join_tokens(&typed).trim_end().to_string();
            // The space after a completed word is one more character.
            let completes_word = eq_ignore_case(&typed[last], goal)
                && target.len() > typed.len()
                && !target[last + 1].starts_with(is_punctuation);
            if completes_word {
                stats.char_count += 1;
            }
            text
        };
        stats.char_count += 1;
        Ok(text)
    }
}
