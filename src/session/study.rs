use std::time::{Duration, Instant};

use rand::Rng;

use crate::engine::quiz::quiz_options;
use crate::engine::scheduler::{self, Rating, Timestamp};
use crate::item::{ItemKey, PronunciationFeedback, Reviewable, ReviewableItem, SentenceData, WordData};
use crate::session::queue::{ReviewQueue, SessionStats};
use crate::session::recording::RecordingGate;
use crate::session::ticket::{RequestId, RequestTracker};
use crate::store::collections::ItemStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StudyMode {
    Flashcard,
    Typing,
    Quiz,
}

impl StudyMode {
    pub const ALL: [StudyMode; 3] = [StudyMode::Flashcard, StudyMode::Typing, StudyMode::Quiz];

    pub fn label(self) -> &'static str {
        match self {
            StudyMode::Flashcard => "Flashcard",
            StudyMode::Typing => "Typing",
            StudyMode::Quiz => "Quiz",
        }
    }

    pub fn from_digit(ch: char) -> Option<Self> {
        match ch {
            '1' => Some(StudyMode::Flashcard),
            '2' => Some(StudyMode::Typing),
            '3' => Some(StudyMode::Quiz),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CardFace {
    #[default]
    Front,
    Back,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StudyState {
    /// Nothing was due; there is nothing to review and no stats to report.
    Empty,
    ChoosingMode,
    Reviewing,
    /// A rating was just submitted; the next item is revealed by `complete_transition`.
    Transitioning,
    Complete,
    Exited,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum PronunciationStatus {
    #[default]
    Idle,
    Checking,
    Ready(PronunciationFeedback),
    Failed,
}

/// Transient state for the item on screen. Reset whenever the item changes.
#[derive(Clone, Debug, Default)]
pub struct ItemState {
    pub face: CardFace,
    pub input: String,
    pub answered: bool,
    pub correct: Option<bool>,
    pub quiz_options: Vec<String>,
    pub selected: Option<usize>,
    pub pronunciation: PronunciationStatus,
}

/// How a quiz option should be shown once the question is answered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionMark {
    Unanswered,
    Correct,
    Incorrect,
    Unselected,
}

/// Identifies a pronunciation check so its result can be matched to the item it was recorded for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PronunciationTicket {
    pub id: RequestId,
    pub key: ItemKey,
    pub target_text: String,
}

pub struct StudySession<R: Rng> {
    queue: ReviewQueue,
    mode: Option<StudyMode>,
    state: StudyState,
    item: ItemState,
    auto_read: bool,
    speech_request: Option<String>,
    recording: RecordingGate,
    pronunciation: RequestTracker,
    rng: R,
}

impl<R: Rng> StudySession<R> {
    pub fn start(
        due_words: Vec<WordData>,
        due_sentences: Vec<SentenceData>,
        auto_read: bool,
        record_limit: Duration,
        mut rng: R,
    ) -> Self {
        let queue = ReviewQueue::start(due_words, due_sentences, &mut rng);
        let state = if queue.is_empty() {
            StudyState::Empty
        } else {
            StudyState::ChoosingMode
        };
        tracing::info!(items = queue.len(), "study session started");
        Self {
            queue,
            mode: None,
            state,
            item: ItemState::default(),
            auto_read,
            speech_request: None,
            recording: RecordingGate::new(record_limit),
            pronunciation: RequestTracker::new(),
            rng,
        }
    }

    pub fn state(&self) -> StudyState {
        self.state
    }

    pub fn mode(&self) -> Option<StudyMode> {
        self.mode
    }

    pub fn queue(&self) -> &ReviewQueue {
        &self.queue
    }

    pub fn item_state(&self) -> &ItemState {
        &self.item
    }

    /// The item being reviewed. None before a mode is chosen and once the session is over.
    pub fn current(&self) -> Option<&ReviewableItem> {
        match self.state {
            StudyState::Reviewing | StudyState::Transitioning => self.queue.current(),
            _ => None,
        }
    }

    pub fn stats(&self) -> SessionStats {
        self.queue.stats()
    }

    /// Stats for the completion view; None if the session never had anything to review.
    pub fn summary(&self) -> Option<SessionStats> {
        self.queue.summary()
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.state,
            StudyState::Empty | StudyState::Complete | StudyState::Exited
        )
    }

    pub fn auto_read(&self) -> bool {
        self.auto_read
    }

    pub fn set_auto_read(&mut self, enabled: bool) {
        self.auto_read = enabled;
        if enabled {
            self.queue_auto_read();
        }
    }

    /// Text the front end should speak, if any. Each request is handed out once.
    pub fn take_speech_request(&mut self) -> Option<String> {
        self.speech_request.take()
    }

    pub fn speak_current(&mut self) {
        if let Some(text) = self.current().map(|i| i.primary_text().to_string()) {
            self.speech_request = Some(text);
        }
    }

    pub fn select_mode(&mut self, mode: StudyMode) {
        if self.state != StudyState::ChoosingMode {
            return;
        }
        tracing::debug!(mode = mode.label(), "study mode selected");
        self.mode = Some(mode);
        self.state = StudyState::Reviewing;
        self.load_item();
    }

    /// Turn the flashcard over. Ignored while a recording is live.
    pub fn flip(&mut self) {
        if self.state != StudyState::Reviewing
            || self.mode != Some(StudyMode::Flashcard)
            || self.recording.is_active()
        {
            return;
        }
        self.item.face = match self.item.face {
            CardFace::Front => CardFace::Back,
            CardFace::Back => CardFace::Front,
        };
        if self.item.face == CardFace::Front {
            self.queue_auto_read();
        }
    }

    fn accepts_typing(&self) -> bool {
        self.state == StudyState::Reviewing
            && self.mode == Some(StudyMode::Typing)
            && !self.item.answered
    }

    pub fn type_char(&mut self, ch: char) {
        if self.accepts_typing() {
            self.item.input.push(ch);
        }
    }

    pub fn backspace(&mut self) {
        if self.accepts_typing() {
            self.item.input.pop();
        }
    }

    /// Compare the typed answer with the item's text. Blank input is not checked.
    pub fn check_typing(&mut self) -> bool {
        if !self.accepts_typing() {
            return false;
        }
        let answer = self.item.input.trim();
        if answer.is_empty() {
            return false;
        }
        let Some(expected) = self.queue.current().map(|i| i.primary_text().to_string()) else {
            return false;
        };
        let correct = answer.to_lowercase() == expected.trim().to_lowercase();
        self.answer(correct, expected);
        true
    }

    pub fn select_option(&mut self, index: usize) -> bool {
        if self.state != StudyState::Reviewing
            || self.mode != Some(StudyMode::Quiz)
            || self.item.answered
        {
            return false;
        }
        let Some(option) = self.item.quiz_options.get(index).cloned() else {
            return false;
        };
        let Some(expected) = self.queue.current().map(|i| i.primary_text().to_string()) else {
            return false;
        };
        self.item.selected = Some(index);
        self.answer(option == expected, expected);
        true
    }

    fn answer(&mut self, correct: bool, expected: String) {
        self.item.answered = true;
        self.item.correct = Some(correct);
        if correct {
            self.speech_request = Some(expected);
        }
    }

    pub fn option_mark(&self, index: usize) -> OptionMark {
        if !self.item.answered {
            return OptionMark::Unanswered;
        }
        let is_answer = match (self.item.quiz_options.get(index), self.queue.current()) {
            (Some(option), Some(item)) => option == item.primary_text(),
            _ => false,
        };
        if is_answer {
            OptionMark::Correct
        } else if self.item.selected == Some(index) {
            OptionMark::Incorrect
        } else {
            OptionMark::Unselected
        }
    }

    /// Whether a rating would be accepted right now.
    pub fn can_rate(&self) -> bool {
        if self.state != StudyState::Reviewing {
            return false;
        }
        match self.mode {
            Some(StudyMode::Flashcard) => self.item.face == CardFace::Back,
            Some(StudyMode::Typing) | Some(StudyMode::Quiz) => self.item.answered,
            None => false,
        }
    }

    /// Schedule the current item, persist it, and move on. Ratings that are not
    /// yet allowed are ignored. Returns true if the rating was applied.
    pub fn rate<S: ItemStore + ?Sized>(&mut self, rating: Rating, now: Timestamp, store: &mut S) -> bool {
        if !self.can_rate() {
            return false;
        }
        let Some(item) = self.queue.current() else {
            return false;
        };

        let key = item.key();
        let schedule = scheduler::schedule(item.srs_level(), rating, now);
        match store.update_schedule(&key, schedule) {
            Ok(true) => {}
            Ok(false) => tracing::warn!(kind = key.kind().as_str(), "rated item is no longer saved"),
            Err(e) => tracing::warn!(error = %e, "failed to persist review"),
        }
        self.queue.record_rating(rating);
        tracing::debug!(
            rating = rating.as_str(),
            level = schedule.srs_level,
            position = self.queue.position(),
            "item rated"
        );

        self.reset_item();
        if self.queue.is_last() {
            self.queue.advance();
            self.finish();
        } else {
            self.state = StudyState::Transitioning;
        }
        true
    }

    /// Reveal the next item after a rating.
    pub fn complete_transition(&mut self) {
        if self.state != StudyState::Transitioning {
            return;
        }
        self.queue.advance();
        self.state = StudyState::Reviewing;
        self.load_item();
    }

    /// Leave the session. Ratings already submitted stay persisted.
    pub fn exit(&mut self) {
        if matches!(self.state, StudyState::Exited) {
            return;
        }
        self.recording.stop();
        self.pronunciation.invalidate();
        self.speech_request = None;
        tracing::info!(
            reviewed = self.queue.stats().reviewed,
            remaining = self.queue.len().saturating_sub(self.queue.position()),
            "study session exited"
        );
        self.state = StudyState::Exited;
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_active()
    }

    pub fn recording_remaining(&self, now: Instant) -> Option<Duration> {
        self.recording.remaining(now)
    }

    /// Begin capturing pronunciation for the current item.
    pub fn start_recording(&mut self, now: Instant) -> bool {
        if self.state != StudyState::Reviewing || self.queue.current().is_none() {
            return false;
        }
        if !self.recording.start(now) {
            return false;
        }
        self.pronunciation.invalidate();
        self.item.pronunciation = PronunciationStatus::Idle;
        true
    }

    /// Stop capturing. Returns the ticket the pronunciation check must carry.
    pub fn stop_recording(&mut self) -> Option<PronunciationTicket> {
        if !self.recording.stop() {
            return None;
        }
        let item = self.queue.current()?;
        let ticket = PronunciationTicket {
            id: self.pronunciation.issue(),
            key: item.key(),
            target_text: item.primary_text().to_string(),
        };
        self.item.pronunciation = PronunciationStatus::Checking;
        Some(ticket)
    }

    /// Drop a recording without checking it.
    pub fn cancel_recording(&mut self) {
        self.recording.stop();
    }

    /// Force-stop a recording that has run past its limit.
    pub fn tick(&mut self, now: Instant) -> Option<PronunciationTicket> {
        if self.recording.is_expired(now) {
            tracing::debug!("recording hit time limit");
            return self.stop_recording();
        }
        None
    }

    /// Apply a pronunciation result. Results for a superseded check or an item
    /// that is no longer on screen are discarded.
    pub fn apply_pronunciation(
        &mut self,
        ticket: &PronunciationTicket,
        result: Result<PronunciationFeedback, String>,
    ) -> bool {
        let on_screen = self.state == StudyState::Reviewing
            && self.queue.current().is_some_and(|i| i.key() == ticket.key);
        if !on_screen || !self.pronunciation.settle(ticket.id) {
            tracing::debug!(id = ticket.id, "discarding stale pronunciation result");
            return false;
        }
        self.item.pronunciation = match result {
            Ok(feedback) => PronunciationStatus::Ready(feedback),
            Err(e) => {
                tracing::warn!(error = %e, "pronunciation check failed");
                PronunciationStatus::Failed
            }
        };
        true
    }

    fn finish(&mut self) {
        let stats = self.queue.stats();
        tracing::info!(
            reviewed = stats.reviewed,
            forgotten = stats.forgotten,
            "study session complete"
        );
        self.state = StudyState::Complete;
    }

    fn reset_item(&mut self) {
        self.recording.stop();
        self.pronunciation.invalidate();
        self.item = ItemState::default();
    }

    fn load_item(&mut self) {
        self.reset_item();
        let Some(item) = self.queue.current() else {
            return;
        };
        if self.mode == Some(StudyMode::Quiz) {
            let kind = item.kind();
            let pool: Vec<&str> = self
                .queue
                .items()
                .iter()
                .filter(|i| i.kind() == kind)
                .map(|i| i.primary_text())
                .collect();
            self.item.quiz_options = quiz_options(item.primary_text(), &pool, &mut self.rng);
        }
        self.queue_auto_read();
    }

    fn queue_auto_read(&mut self) {
        if self.auto_read
            && self.state == StudyState::Reviewing
            && self.mode == Some(StudyMode::Flashcard)
            && self.item.face == CardFace::Front
        {
            self.speak_current();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scheduler::DAY_MS;
    use anyhow::Result;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use std::collections::HashMap;

    const NOW: Timestamp = 1_700_000_000_000;

    #[derive(Default)]
    struct RecordingStore {
        writes: HashMap<ItemKey, scheduler::Schedule>,
    }

    impl ItemStore for RecordingStore {
        fn update_schedule(&mut self, key: &ItemKey, schedule: scheduler::Schedule) -> Result<bool> {
            self.writes.insert(key.clone(), schedule);
            Ok(true)
        }
    }

    struct FailingStore;

    impl ItemStore for FailingStore {
        fn update_schedule(&mut self, _: &ItemKey, _: scheduler::Schedule) -> Result<bool> {
            anyhow::bail!("disk full")
        }
    }

    fn words(names: &[&str]) -> Vec<WordData> {
        names
            .iter()
            .map(|w| WordData {
                word: w.to_string(),
                ..Default::default()
            })
            .collect()
    }

    fn session(names: &[&str], auto_read: bool) -> StudySession<SmallRng> {
        StudySession::start(
            words(names),
            Vec::new(),
            auto_read,
            Duration::from_secs(3),
            SmallRng::seed_from_u64(7),
        )
    }

    #[test]
    fn test_empty_session_is_terminal() {
        let mut s = session(&[], false);
        assert_eq!(s.state(), StudyState::Empty);
        assert!(s.is_finished());
        assert_eq!(s.summary(), None);
        s.select_mode(StudyMode::Flashcard);
        assert_eq!(s.state(), StudyState::Empty);
    }

    #[test]
    fn test_mode_is_chosen_once() {
        let mut s = session(&["a", "b"], false);
        assert!(s.current().is_none());
        s.select_mode(StudyMode::Typing);
        s.select_mode(StudyMode::Quiz);
        assert_eq!(s.mode(), Some(StudyMode::Typing));
        assert!(s.current().is_some());
    }

    #[test]
    fn test_rating_before_mode_is_ignored() {
        let mut s = session(&["a"], false);
        let mut store = RecordingStore::default();
        assert!(!s.rate(Rating::Good, NOW, &mut store));
        assert!(store.writes.is_empty());
        assert_eq!(s.stats(), SessionStats::default());
    }

    #[test]
    fn test_flashcard_requires_flip() {
        let mut s = session(&["a", "b"], false);
        let mut store = RecordingStore::default();
        s.select_mode(StudyMode::Flashcard);
        assert!(!s.rate(Rating::Good, NOW, &mut store));

        s.flip();
        assert_eq!(s.item_state().face, CardFace::Back);
        assert!(s.rate(Rating::Good, NOW, &mut store));
        assert_eq!(s.state(), StudyState::Transitioning);
        assert_eq!(s.item_state().face, CardFace::Front);
        assert!(!s.can_rate());

        s.complete_transition();
        assert_eq!(s.state(), StudyState::Reviewing);
        assert_eq!(s.queue().position(), 1);
    }

    #[test]
    fn test_flip_blocked_while_recording() {
        let mut s = session(&["a"], false);
        s.select_mode(StudyMode::Flashcard);
        assert!(s.start_recording(Instant::now()));
        s.flip();
        assert_eq!(s.item_state().face, CardFace::Front);
        s.stop_recording();
        s.flip();
        assert_eq!(s.item_state().face, CardFace::Back);
    }

    #[test]
    fn test_typing_check_is_trimmed_and_case_insensitive() {
        let mut s = session(&["Exit"], false);
        s.select_mode(StudyMode::Typing);
        assert!(!s.check_typing());
        for ch in "  eXiT ".chars() {
            s.type_char(ch);
        }
        assert!(s.check_typing());
        assert_eq!(s.item_state().correct, Some(true));
        assert!(s.can_rate());
        assert_eq!(s.take_speech_request().as_deref(), Some("Exit"));

        // Answered: further input is ignored.
        s.type_char('x');
        assert_eq!(s.item_state().input, "  eXiT ");
    }

    #[test]
    fn test_typing_wrong_answer_still_allows_rating() {
        let mut s = session(&["exit"], false);
        s.select_mode(StudyMode::Typing);
        s.type_char('q');
        s.check_typing();
        assert_eq!(s.item_state().correct, Some(false));
        assert!(s.can_rate());
        assert_eq!(s.take_speech_request(), None);
    }

    #[test]
    fn test_quiz_single_answer() {
        let mut s = session(&["a", "b", "c", "d", "e"], false);
        s.select_mode(StudyMode::Quiz);
        let options = s.item_state().quiz_options.clone();
        assert_eq!(options.len(), 4);
        let answer = s.current().unwrap().primary_text().to_string();
        let correct_index = options.iter().position(|o| *o == answer).unwrap();
        let wrong_index = (correct_index + 1) % options.len();

        assert_eq!(s.option_mark(0), OptionMark::Unanswered);
        assert!(s.select_option(wrong_index));
        assert!(!s.select_option(correct_index));
        assert_eq!(s.item_state().correct, Some(false));
        assert_eq!(s.option_mark(correct_index), OptionMark::Correct);
        assert_eq!(s.option_mark(wrong_index), OptionMark::Incorrect);
    }

    #[test]
    fn test_quiz_single_item_degrades() {
        let mut s = session(&["solo"], false);
        s.select_mode(StudyMode::Quiz);
        assert_eq!(s.item_state().quiz_options, vec!["solo".to_string()]);
        assert!(!s.select_option(3));
        assert!(s.select_option(0));
        assert_eq!(s.item_state().correct, Some(true));
    }

    #[test]
    fn test_all_good_reaches_complete() {
        let mut s = session(&["a", "b", "c", "d", "e"], false);
        let mut store = RecordingStore::default();
        s.select_mode(StudyMode::Flashcard);
        while s.state() != StudyState::Complete {
            s.complete_transition();
            s.flip();
            assert!(s.rate(Rating::Good, NOW, &mut store));
        }
        assert_eq!(
            s.summary(),
            Some(SessionStats {
                reviewed: 5,
                forgotten: 0
            })
        );
        assert_eq!(s.queue().position(), 5);
        assert!(s.current().is_none());
        assert_eq!(store.writes.len(), 5);
        let write = store.writes[&ItemKey::word("a")];
        assert_eq!(write.srs_level, 1);
        assert_eq!(write.next_review, NOW + 3 * DAY_MS);
    }

    #[test]
    fn test_store_failure_does_not_abort() {
        let mut s = session(&["a", "b"], false);
        s.select_mode(StudyMode::Flashcard);
        s.flip();
        assert!(s.rate(Rating::Fail, NOW, &mut FailingStore));
        assert_eq!(s.stats().forgotten, 1);
        assert_eq!(s.state(), StudyState::Transitioning);
    }

    #[test]
    fn test_exit_keeps_committed_ratings() {
        let mut s = session(&["a", "b", "c"], false);
        let mut store = RecordingStore::default();
        s.select_mode(StudyMode::Flashcard);
        s.flip();
        s.rate(Rating::Hard, NOW, &mut store);
        s.exit();
        assert_eq!(s.state(), StudyState::Exited);
        assert!(s.is_finished());
        assert_eq!(store.writes.len(), 1);
        s.complete_transition();
        assert_eq!(s.state(), StudyState::Exited);
    }

    #[test]
    fn test_auto_read_on_new_front() {
        let mut s = session(&["a", "b"], true);
        s.select_mode(StudyMode::Flashcard);
        let first = s.current().unwrap().primary_text().to_string();
        assert_eq!(s.take_speech_request(), Some(first));
        assert_eq!(s.take_speech_request(), None);

        s.flip();
        s.rate(Rating::Good, NOW, &mut RecordingStore::default());
        s.complete_transition();
        assert!(s.take_speech_request().is_some());
    }

    #[test]
    fn test_auto_read_only_in_flashcard_mode() {
        let mut s = session(&["a", "b"], true);
        s.select_mode(StudyMode::Quiz);
        assert_eq!(s.take_speech_request(), None);
    }

    #[test]
    fn test_recording_auto_stops_and_issues_ticket() {
        let mut s = session(&["a"], false);
        s.select_mode(StudyMode::Flashcard);
        let start = Instant::now();
        s.start_recording(start);
        assert!(s.tick(start + Duration::from_secs(1)).is_none());
        let ticket = s.tick(start + Duration::from_secs(3)).unwrap();
        assert!(!s.is_recording());
        assert_eq!(ticket.key, ItemKey::word("a"));
        assert_eq!(s.item_state().pronunciation, PronunciationStatus::Checking);

        let feedback = PronunciationFeedback {
            score: 90.0,
            is_correct: true,
            feedback_text: "Tốt".to_string(),
            detected_speech: "a".to_string(),
        };
        assert!(s.apply_pronunciation(&ticket, Ok(feedback.clone())));
        assert_eq!(
            s.item_state().pronunciation,
            PronunciationStatus::Ready(feedback)
        );
    }

    #[test]
    fn test_stale_pronunciation_discarded() {
        let mut s = session(&["a", "b"], false);
        s.select_mode(StudyMode::Flashcard);
        let now = Instant::now();
        s.start_recording(now);
        let old = s.stop_recording().unwrap();
        s.start_recording(now);
        let new = s.stop_recording().unwrap();
        assert!(!s.apply_pronunciation(&old, Err("timeout".to_string())));
        assert!(s.apply_pronunciation(&new, Err("timeout".to_string())));
        assert_eq!(s.item_state().pronunciation, PronunciationStatus::Failed);
    }

    #[test]
    fn test_pronunciation_for_abandoned_item_discarded() {
        let mut s = session(&["a", "b"], false);
        s.select_mode(StudyMode::Flashcard);
        s.start_recording(Instant::now());
        let ticket = s.stop_recording().unwrap();
        s.flip();
        s.rate(Rating::Easy, NOW, &mut RecordingStore::default());
        s.complete_transition();
        assert!(!s.apply_pronunciation(&ticket, Err("late".to_string())));
        assert_eq!(s.item_state().pronunciation, PronunciationStatus::Idle);
    }
}
