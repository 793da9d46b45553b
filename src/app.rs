use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use crate::audio::{Recorder, Speaker};
use crate::config::Config;
use crate::engine::scheduler::{Rating, Timestamp};
use crate::event::AppEvent;
use crate::item::{PronunciationFeedback, Reviewable, ReviewableItem, WordData};
use crate::lookup::normalize::{clean_picked_word, is_searchable, normalize_word, pick_candidates};
use crate::lookup::{LOOKUP_FAILED_NOTICE, LookupService};
use crate::session::study::{PronunciationTicket, StudySession, StudyState};
use crate::session::ticket::{RequestId, RequestTracker};
use crate::store::BlobStore;
use crate::store::collections::Collections;
use crate::store::json_store::JsonStore;
use crate::store::preferences::Preferences;
use crate::ui::line_input::{InputResult, LineInput};
use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Search,
    Collection,
    Study,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchKind {
    Word,
    Sentence,
}

impl SearchKind {
    pub fn label(self) -> &'static str {
        match self {
            SearchKind::Word => "Word",
            SearchKind::Sentence => "Sentence",
        }
    }
}

pub struct SearchState {
    pub kind: SearchKind,
    pub input: LineInput,
    pub result: Option<ReviewableItem>,
    pub error: Option<&'static str>,
    /// When the query was last edited; the request goes out once the debounce elapses.
    pub edited_at: Option<Instant>,
    tracker: RequestTracker,
}

impl SearchState {
    fn new() -> Self {
        Self {
            kind: SearchKind::Word,
            input: LineInput::default(),
            result: None,
            error: None,
            edited_at: None,
            tracker: RequestTracker::new(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.tracker.is_pending()
    }
}

/// Popup for looking up a word picked from the card on screen. A successful
/// lookup offers the new word's own text for the next pick.
pub struct QuickLookup {
    pub candidates: Vec<String>,
    pub selected: usize,
    pub result: Option<WordData>,
    pub error: Option<&'static str>,
    tracker: RequestTracker,
}

impl QuickLookup {
    fn for_item(item: &ReviewableItem) -> Option<Self> {
        let candidates = candidates_for(item);
        (!candidates.is_empty()).then(|| Self {
            candidates,
            selected: 0,
            result: None,
            error: None,
            tracker: RequestTracker::new(),
        })
    }

    pub fn is_loading(&self) -> bool {
        self.tracker.is_pending()
    }

    pub fn selected_word(&self) -> Option<&str> {
        self.candidates.get(self.selected).map(String::as_str)
    }
}

fn candidates_for(item: &ReviewableItem) -> Vec<String> {
    let own = normalize_word(item.primary_text());
    pick_candidates(item.passages())
        .into_iter()
        .filter(|w| normalize_word(w) != own)
        .collect()
}

pub struct CollectionView {
    pub selected: usize,
    pub bucket_filter: Option<usize>,
}

pub fn now_ms() -> Timestamp {
    chrono::Utc::now().timestamp_millis()
}

pub struct App<S: BlobStore = JsonStore> {
    pub screen: AppScreen,
    pub theme: &'static Theme,
    pub config: Config,
    pub collections: Collections<S>,
    pub preferences: Preferences,
    pub search: SearchState,
    pub collection_view: CollectionView,
    pub quick: Option<QuickLookup>,
    pub study: Option<StudySession<SmallRng>>,
    /// Status line message, replaced by the next one.
    pub notice: Option<String>,
    pub should_quit: bool,
    transition_due: Option<Instant>,
    lookup: Arc<dyn LookupService>,
    speaker: Box<dyn Speaker>,
    recorder: Box<dyn Recorder>,
    events: Sender<AppEvent>,
    rng: SmallRng,
}

impl<S: BlobStore> App<S> {
    pub fn new(
        config: Config,
        theme: &'static Theme,
        store: S,
        lookup: Arc<dyn LookupService>,
        speaker: Box<dyn Speaker>,
        recorder: Box<dyn Recorder>,
        events: Sender<AppEvent>,
    ) -> Self {
        let preferences = Preferences::load(&store);
        let collections = Collections::load(store);
        let screen = if collections.is_empty() {
            AppScreen::Search
        } else {
            AppScreen::Collection
        };
        Self {
            screen,
            theme,
            config,
            collections,
            preferences,
            search: SearchState::new(),
            collection_view: CollectionView {
                selected: 0,
                bucket_filter: None,
            },
            quick: None,
            study: None,
            notice: None,
            should_quit: false,
            transition_due: None,
            lookup,
            speaker,
            recorder,
            events,
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_rng(mut self, rng: SmallRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn go_to_search(&mut self) {
        self.screen = AppScreen::Search;
    }

    pub fn go_to_collection(&mut self) {
        self.screen = AppScreen::Collection;
        self.clamp_collection_selection();
    }

    // --- Search ---

    pub fn search_input(&mut self, key: crossterm::event::KeyEvent, now: Instant) {
        match self.search.input.handle(key) {
            InputResult::Changed if self.search.input.value().trim().is_empty() => {
                self.clear_search_result();
            }
            InputResult::Changed => {
                self.search.edited_at = Some(now);
                self.search.error = None;
            }
            InputResult::Submit => self.dispatch_search(),
            InputResult::Cancel => self.go_to_collection(),
            InputResult::Continue => {}
        }
    }

    pub fn toggle_search_kind(&mut self) {
        self.search.kind = match self.search.kind {
            SearchKind::Word => SearchKind::Sentence,
            SearchKind::Sentence => SearchKind::Word,
        };
        self.search.tracker.invalidate();
        self.search.result = None;
        self.search.error = None;
        if !self.search.input.is_empty() {
            self.dispatch_search();
        }
    }

    /// Send the current query unless it is too short or already displayed.
    pub fn dispatch_search(&mut self) {
        self.search.edited_at = None;
        let query = self.search.input.value().trim().to_string();
        if !is_searchable(&query) {
            return;
        }
        if let Some(result) = &self.search.result
            && result.primary_text().to_lowercase() == query.to_lowercase()
        {
            // Already on screen, but anything still in flight is now out of date.
            self.search.tracker.invalidate();
            return;
        }

        let id = self.search.tracker.issue();
        let kind = self.search.kind;
        let lookup = Arc::clone(&self.lookup);
        let tx = self.events.clone();
        tracing::debug!(id, kind = kind.label(), "lookup dispatched");
        thread::spawn(move || {
            let result = match kind {
                SearchKind::Word => lookup.lookup_word(&query).map(ReviewableItem::Word),
                SearchKind::Sentence => lookup.lookup_sentence(&query).map(ReviewableItem::Sentence),
            };
            let _ = tx.send(AppEvent::Lookup {
                id,
                result: result.map_err(|e| e.to_string()),
            });
        });
    }

    /// Forget the displayed result and any request still in flight.
    fn clear_search_result(&mut self) {
        self.search.tracker.invalidate();
        self.search.edited_at = None;
        self.search.result = None;
        self.search.error = None;
    }

    pub fn on_lookup(&mut self, id: RequestId, result: Result<ReviewableItem, String>) {
        if !self.search.tracker.settle(id) {
            tracing::debug!(id, "discarding stale lookup");
            return;
        }
        match result {
            Ok(item) => {
                self.search.result = Some(item);
                self.search.error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "lookup failed");
                self.search.result = None;
                self.search.error = Some(LOOKUP_FAILED_NOTICE);
            }
        }
    }

    pub fn search_result_saved(&self) -> bool {
        self.search
            .result
            .as_ref()
            .is_some_and(|r| self.collections.is_saved(&r.key()))
    }

    pub fn toggle_save_result(&mut self) {
        if let Some(item) = self.search.result.clone() {
            self.toggle_save_item(&item);
        }
    }

    fn toggle_save_item(&mut self, item: &ReviewableItem) {
        match self.collections.toggle_save(item, now_ms()) {
            Ok(true) => self.notice = Some(format!("Saved \"{}\"", item.primary_text())),
            Ok(false) => self.notice = Some(format!("Removed \"{}\"", item.primary_text())),
            Err(e) => {
                tracing::warn!(error = %e, "failed to save item");
                self.notice = Some("Could not save.".to_string());
            }
        }
    }

    pub fn speak_search_result(&mut self) {
        if let Some(text) = self.search.result.as_ref().map(|r| r.primary_text().to_string()) {
            self.speak(&text);
        }
    }

    // --- Quick lookup ---

    /// The card a word can be picked from on the current screen.
    fn quick_source(&self) -> Option<ReviewableItem> {
        match self.screen {
            AppScreen::Search => self.search.result.clone(),
            AppScreen::Collection => self
                .collection_items()
                .into_iter()
                .nth(self.collection_view.selected),
            AppScreen::Study => None,
        }
    }

    pub fn open_quick_lookup(&mut self) {
        let Some(item) = self.quick_source() else {
            return;
        };
        self.quick = QuickLookup::for_item(&item);
        if self.quick.is_none() {
            self.notice = Some("No words to look up on this card.".to_string());
        }
    }

    /// Close the popup. A response still in flight is dropped when it arrives.
    pub fn close_quick_lookup(&mut self) {
        self.quick = None;
    }

    pub fn quick_next(&mut self) {
        if let Some(quick) = self.quick.as_mut()
            && quick.selected + 1 < quick.candidates.len()
        {
            quick.selected += 1;
        }
    }

    pub fn quick_prev(&mut self) {
        if let Some(quick) = self.quick.as_mut() {
            quick.selected = quick.selected.saturating_sub(1);
        }
    }

    pub fn quick_lookup_selected(&mut self) {
        let word = self
            .quick
            .as_ref()
            .and_then(|q| q.selected_word())
            .map(str::to_string);
        if let Some(word) = word {
            self.quick_lookup(&word);
        }
    }

    /// Look up `raw` for the popup after stripping punctuation. Words shorter
    /// than two characters are ignored.
    pub fn quick_lookup(&mut self, raw: &str) {
        let Some(word) = clean_picked_word(raw) else {
            return;
        };
        let Some(quick) = self.quick.as_mut() else {
            return;
        };
        let id = quick.tracker.issue();
        quick.error = None;
        let lookup = Arc::clone(&self.lookup);
        let tx = self.events.clone();
        tracing::debug!(id, "quick lookup dispatched");
        thread::spawn(move || {
            let result = lookup.lookup_word(&word).map_err(|e| e.to_string());
            let _ = tx.send(AppEvent::QuickLookup { id, result });
        });
    }

    pub fn on_quick_lookup(&mut self, id: RequestId, result: Result<WordData, String>) {
        let Some(quick) = self.quick.as_mut() else {
            tracing::debug!(id, "quick lookup closed before response");
            return;
        };
        if !quick.tracker.settle(id) {
            tracing::debug!(id, "discarding stale quick lookup");
            return;
        }
        match result {
            Ok(word) => {
                let next = candidates_for(&ReviewableItem::Word(word.clone()));
                if !next.is_empty() {
                    quick.candidates = next;
                    quick.selected = 0;
                }
                quick.result = Some(word);
                quick.error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "quick lookup failed");
                quick.error = Some(LOOKUP_FAILED_NOTICE);
            }
        }
    }

    pub fn quick_result_saved(&self) -> bool {
        self.quick
            .as_ref()
            .and_then(|q| q.result.as_ref())
            .is_some_and(|w| self.collections.is_saved(&w.key()))
    }

    pub fn toggle_save_quick_result(&mut self) {
        let word = self.quick.as_ref().and_then(|q| q.result.clone());
        if let Some(word) = word {
            self.toggle_save_item(&ReviewableItem::Word(word));
        }
    }

    pub fn speak_quick_result(&mut self) {
        let text = self
            .quick
            .as_ref()
            .and_then(|q| q.result.as_ref())
            .map(|w| w.word.clone());
        if let Some(text) = text {
            self.speak(&text);
        }
    }

    // --- Collection ---

    pub fn collection_items(&self) -> Vec<ReviewableItem> {
        self.collections.items(self.collection_view.bucket_filter)
    }

    pub fn collection_next(&mut self) {
        let len = self.collection_items().len();
        if len > 0 {
            self.collection_view.selected = (self.collection_view.selected + 1).min(len - 1);
        }
    }

    pub fn collection_prev(&mut self) {
        self.collection_view.selected = self.collection_view.selected.saturating_sub(1);
    }

    /// Cycle the level filter: all, then each bucket in turn.
    pub fn cycle_bucket_filter(&mut self) {
        use crate::engine::due::BUCKET_COUNT;
        self.collection_view.bucket_filter = match self.collection_view.bucket_filter {
            None => Some(0),
            Some(b) if b + 1 < BUCKET_COUNT => Some(b + 1),
            Some(_) => None,
        };
        self.collection_view.selected = 0;
    }

    pub fn set_bucket_filter(&mut self, bucket: Option<usize>) {
        self.collection_view.bucket_filter = bucket;
        self.collection_view.selected = 0;
    }

    pub fn remove_selected(&mut self) {
        let items = self.collection_items();
        let Some(item) = items.get(self.collection_view.selected) else {
            return;
        };
        match self.collections.remove(&item.key()) {
            Ok(_) => self.notice = Some(format!("Removed \"{}\"", item.primary_text())),
            Err(e) => {
                tracing::warn!(error = %e, "failed to remove item");
                self.notice = Some("Could not remove.".to_string());
            }
        }
        self.clamp_collection_selection();
    }

    fn clamp_collection_selection(&mut self) {
        let len = self.collection_items().len();
        self.collection_view.selected = self.collection_view.selected.min(len.saturating_sub(1));
    }

    // --- Study ---

    pub fn start_study(&mut self) {
        let now = now_ms();
        let session = StudySession::start(
            self.collections.due_words(now),
            self.collections.due_sentences(now),
            self.preferences.auto_read(),
            Duration::from_secs(self.config.record_timeout_secs),
            SmallRng::seed_from_u64(self.rng.next_u64()),
        );
        self.study = Some(session);
        self.transition_due = None;
        self.screen = AppScreen::Study;
    }

    pub fn study_rate(&mut self, rating: Rating, now: Instant) {
        let Some(study) = self.study.as_mut() else {
            return;
        };
        if !study.rate(rating, now_ms(), &mut self.collections) {
            return;
        }
        if study.state() == StudyState::Transitioning {
            let delay = Duration::from_millis(self.config.transition_ms);
            if delay.is_zero() {
                study.complete_transition();
            } else {
                self.transition_due = Some(now + delay);
            }
        }
        self.after_study_action();
    }

    pub fn toggle_recording(&mut self, now: Instant) {
        let Some(study) = self.study.as_mut() else {
            return;
        };
        if study.is_recording() {
            let ticket = study.stop_recording();
            self.finish_recording(ticket);
            return;
        }
        if !study.start_recording(now) {
            return;
        }
        self.speaker.cancel();
        if let Err(e) = self.recorder.start() {
            tracing::warn!(error = %e, "recording unavailable");
            study.cancel_recording();
            self.notice = Some("Recording unavailable.".to_string());
        }
    }

    fn finish_recording(&mut self, ticket: Option<PronunciationTicket>) {
        let Some(ticket) = ticket else {
            return;
        };
        let audio = match self.recorder.stop() {
            Ok(bytes) => bytes,
            Err(e) => {
                if let Some(study) = self.study.as_mut() {
                    study.apply_pronunciation(&ticket, Err(e.to_string()));
                }
                return;
            }
        };

        let lookup = Arc::clone(&self.lookup);
        let tx = self.events.clone();
        let mime_type = self.config.record_mime_type.clone();
        thread::spawn(move || {
            let result = lookup
                .check_pronunciation(&ticket.target_text, &audio, &mime_type)
                .map_err(|e| e.to_string());
            let _ = tx.send(AppEvent::Pronunciation { ticket, result });
        });
    }

    pub fn on_pronunciation(
        &mut self,
        ticket: PronunciationTicket,
        result: Result<PronunciationFeedback, String>,
    ) {
        if let Some(study) = self.study.as_mut() {
            study.apply_pronunciation(&ticket, result);
        }
    }

    pub fn toggle_auto_read(&mut self) {
        match self.preferences.toggle_auto_read(self.collections.store()) {
            Ok(enabled) => {
                if let Some(study) = self.study.as_mut() {
                    study.set_auto_read(enabled);
                }
                self.notice = Some(format!(
                    "Auto-read {}",
                    if enabled { "on" } else { "off" }
                ));
            }
            Err(e) => tracing::warn!(error = %e, "failed to save auto-read preference"),
        }
        self.after_study_action();
    }

    pub fn exit_study(&mut self) {
        if let Some(study) = self.study.as_mut() {
            study.exit();
        }
        self.study = None;
        self.transition_due = None;
        self.after_study_action();
        self.speaker.cancel();
        self.go_to_collection();
    }

    /// Run a study-session action, then sync audio side effects.
    pub fn with_study(&mut self, f: impl FnOnce(&mut StudySession<SmallRng>)) {
        if let Some(study) = self.study.as_mut() {
            f(study);
        }
        self.after_study_action();
    }

    fn after_study_action(&mut self) {
        let speech = self.study.as_mut().and_then(|s| s.take_speech_request());
        if let Some(text) = speech {
            self.speak(&text);
        }
        let session_recording = self.study.as_ref().is_some_and(|s| s.is_recording());
        if self.recorder.is_recording() && !session_recording {
            self.recorder.cancel();
        }
    }

    fn speak(&mut self, text: &str) {
        if let Err(e) = self.speaker.speak(text) {
            tracing::warn!(error = %e, "text-to-speech failed");
        }
    }

    /// Periodic housekeeping: debounced search, auto-advance, recording limit.
    pub fn tick(&mut self, now: Instant) {
        let debounce = Duration::from_millis(self.config.search_debounce_ms);
        if self
            .search
            .edited_at
            .is_some_and(|at| now.saturating_duration_since(at) >= debounce)
        {
            self.dispatch_search();
        }

        if self.transition_due.is_some_and(|due| now >= due) {
            self.transition_due = None;
            self.with_study(|s| s.complete_transition());
        }

        let ticket = self.study.as_mut().and_then(|s| s.tick(now));
        if ticket.is_some() {
            self.finish_recording(ticket);
        }
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Lookup { id, result } => self.on_lookup(id, result),
            AppEvent::QuickLookup { id, result } => self.on_quick_lookup(id, result),
            AppEvent::Pronunciation { ticket, result } => self.on_pronunciation(ticket, result),
            AppEvent::Tick => self.tick(Instant::now()),
            AppEvent::Key(_) | AppEvent::Resize(_, _) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioError;
    use crate::item::{SentenceData, WordData};
    use crate::lookup::LookupError;
    use crate::store::MemoryStore;
    use crate::store::schema::AUTO_READ_KEY;
    use std::sync::Mutex;
    use std::sync::mpsc::{self, Receiver};

    struct FakeLookup;

    impl LookupService for FakeLookup {
        fn lookup_word(&self, text: &str) -> Result<WordData, LookupError> {
            if text == "fail" {
                return Err(LookupError::EmptyResponse);
            }
            Ok(WordData {
                word: text.to_string(),
                meaning_vi: "nghĩa".to_string(),
                ..Default::default()
            })
        }

        fn lookup_sentence(&self, text: &str) -> Result<SentenceData, LookupError> {
            Ok(SentenceData {
                sentence: text.to_string(),
                ..Default::default()
            })
        }

        fn check_pronunciation(
            &self,
            target_text: &str,
            _audio: &[u8],
            _mime_type: &str,
        ) -> Result<PronunciationFeedback, LookupError> {
            Ok(PronunciationFeedback {
                score: 88.0,
                is_correct: true,
                feedback_text: "Tốt".to_string(),
                detected_speech: target_text.to_string(),
            })
        }
    }

    #[derive(Clone, Default)]
    struct SpokenLog(Arc<Mutex<Vec<String>>>);

    struct FakeSpeaker(SpokenLog);

    impl Speaker for FakeSpeaker {
        fn speak(&mut self, text: &str) -> Result<(), AudioError> {
            self.0.0.lock().unwrap().push(text.to_string());
            Ok(())
        }

        fn cancel(&mut self) {}
    }

    #[derive(Default)]
    struct FakeRecorder {
        active: bool,
    }

    impl Recorder for FakeRecorder {
        fn start(&mut self) -> Result<(), AudioError> {
            self.active = true;
            Ok(())
        }

        fn stop(&mut self) -> Result<Vec<u8>, AudioError> {
            if !std::mem::take(&mut self.active) {
                return Err(AudioError::NotRecording);
            }
            Ok(vec![1, 2, 3])
        }

        fn cancel(&mut self) {
            self.active = false;
        }

        fn is_recording(&self) -> bool {
            self.active
        }
    }

    fn make_app(store: MemoryStore) -> (App<MemoryStore>, Receiver<AppEvent>, SpokenLog) {
        let (tx, rx) = mpsc::channel();
        let spoken = SpokenLog::default();
        let theme: &'static Theme = Box::leak(Box::new(Theme::default()));
        let app = App::new(
            Config::default(),
            theme,
            store,
            Arc::new(FakeLookup),
            Box::new(FakeSpeaker(spoken.clone())),
            Box::new(FakeRecorder::default()),
            tx,
        )
        .with_rng(SmallRng::seed_from_u64(11));
        (app, rx, spoken)
    }

    fn type_query(app: &mut App<MemoryStore>, text: &str, now: Instant) {
        use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
        for ch in text.chars() {
            app.search_input(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE), now);
        }
    }

    fn pump(app: &mut App<MemoryStore>, rx: &Receiver<AppEvent>) {
        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        app.handle_event(event);
    }

    #[test]
    fn test_empty_collection_opens_search() {
        let (app, _rx, _) = make_app(MemoryStore::new());
        assert_eq!(app.screen, AppScreen::Search);
    }

    #[test]
    fn test_search_is_debounced() {
        let (mut app, rx, _) = make_app(MemoryStore::new());
        let start = Instant::now();
        type_query(&mut app, "exit", start);
        app.tick(start + Duration::from_millis(100));
        assert!(!app.search.is_loading());

        app.tick(start + Duration::from_millis(400));
        assert!(app.search.is_loading());
        pump(&mut app, &rx);
        assert_eq!(app.search.result.as_ref().unwrap().primary_text(), "exit");
    }

    #[test]
    fn test_short_query_not_sent() {
        let (mut app, _rx, _) = make_app(MemoryStore::new());
        type_query(&mut app, "e", Instant::now());
        app.dispatch_search();
        assert!(!app.search.is_loading());
    }

    #[test]
    fn test_stale_lookup_discarded() {
        let (mut app, rx, _) = make_app(MemoryStore::new());
        type_query(&mut app, "ex", Instant::now());
        app.dispatch_search();
        type_query(&mut app, "it", Instant::now());
        app.dispatch_search();

        let mut events = vec![
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        ];
        // Deliver the older response last.
        events.sort_by_key(|e| match e {
            AppEvent::Lookup { id, .. } => std::cmp::Reverse(*id),
            _ => std::cmp::Reverse(0),
        });
        for event in events {
            app.handle_event(event);
        }
        assert_eq!(app.search.result.as_ref().unwrap().primary_text(), "exit");
    }

    #[test]
    fn test_requery_of_displayed_result_drops_in_flight_lookup() {
        use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
        let (mut app, rx, _) = make_app(MemoryStore::new());
        type_query(&mut app, "exit", Instant::now());
        app.dispatch_search();
        pump(&mut app, &rx);

        type_query(&mut app, "s", Instant::now());
        app.dispatch_search();
        app.search_input(
            KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE),
            Instant::now(),
        );
        app.dispatch_search();
        assert!(!app.search.is_loading());

        // The "exits" response lands after the query went back to "exit".
        pump(&mut app, &rx);
        assert_eq!(app.search.input.value(), "exit");
        assert_eq!(app.search.result.as_ref().unwrap().primary_text(), "exit");
    }

    #[test]
    fn test_clearing_query_clears_result() {
        use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
        let (mut app, rx, _) = make_app(MemoryStore::new());
        type_query(&mut app, "exit", Instant::now());
        app.dispatch_search();
        pump(&mut app, &rx);

        type_query(&mut app, "s", Instant::now());
        app.dispatch_search();
        app.search_input(
            KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL),
            Instant::now(),
        );
        assert!(app.search.input.is_empty());
        assert!(app.search.result.is_none());
        assert!(!app.search.is_loading());

        pump(&mut app, &rx);
        assert!(app.search.result.is_none());
        assert!(app.search.edited_at.is_none());
    }

    #[test]
    fn test_failed_lookup_shows_generic_notice() {
        let (mut app, rx, _) = make_app(MemoryStore::new());
        type_query(&mut app, "fail", Instant::now());
        app.dispatch_search();
        pump(&mut app, &rx);
        assert_eq!(app.search.error, Some(LOOKUP_FAILED_NOTICE));
        assert!(app.search.result.is_none());
    }

    #[test]
    fn test_save_toggle_and_study_round() {
        let (mut app, rx, spoken) = make_app(MemoryStore::new());
        type_query(&mut app, "exit", Instant::now());
        app.dispatch_search();
        pump(&mut app, &rx);
        app.toggle_save_result();
        assert!(app.search_result_saved());
        assert_eq!(app.collections.due_count(now_ms()), 1);

        app.start_study();
        app.with_study(|s| s.select_mode(crate::session::study::StudyMode::Flashcard));
        app.with_study(|s| s.flip());
        app.study_rate(Rating::Good, Instant::now());

        let study = app.study.as_ref().unwrap();
        assert_eq!(study.state(), StudyState::Complete);
        assert_eq!(study.summary().unwrap().reviewed, 1);
        assert_eq!(app.collections.words()[0].srs_level, Some(1));
        assert_eq!(app.collections.due_count(now_ms()), 0);
        assert!(spoken.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_transition_waits_for_tick() {
        let store = MemoryStore::new();
        let (mut app, _rx, _) = make_app(store);
        for w in ["a", "b"] {
            app.collections
                .toggle_save(&ReviewableItem::Word(WordData {
                    word: w.to_string(),
                    ..Default::default()
                }), now_ms())
                .unwrap();
        }
        app.start_study();
        app.with_study(|s| s.select_mode(crate::session::study::StudyMode::Flashcard));
        app.with_study(|s| s.flip());

        let now = Instant::now();
        app.study_rate(Rating::Hard, now);
        assert_eq!(app.study.as_ref().unwrap().state(), StudyState::Transitioning);
        app.tick(now + Duration::from_millis(50));
        assert_eq!(app.study.as_ref().unwrap().state(), StudyState::Transitioning);
        app.tick(now + Duration::from_millis(200));
        assert_eq!(app.study.as_ref().unwrap().state(), StudyState::Reviewing);
    }

    #[test]
    fn test_auto_read_toggle_persists_and_speaks() {
        let store = MemoryStore::new();
        let (mut app, _rx, spoken) = make_app(store);
        app.collections
            .toggle_save(&ReviewableItem::Word(WordData {
                word: "exit".to_string(),
                ..Default::default()
            }), now_ms())
            .unwrap();
        app.start_study();
        app.with_study(|s| s.select_mode(crate::session::study::StudyMode::Flashcard));
        app.toggle_auto_read();
        assert_eq!(app.collections.store().raw(AUTO_READ_KEY).as_deref(), Some("true"));
        assert_eq!(spoken.0.lock().unwrap().as_slice(), ["exit".to_string()]);
    }

    #[test]
    fn test_recording_round_trip() {
        let (mut app, rx, _) = make_app(MemoryStore::new());
        app.collections
            .toggle_save(&ReviewableItem::Word(WordData {
                word: "exit".to_string(),
                ..Default::default()
            }), now_ms())
            .unwrap();
        app.start_study();
        app.with_study(|s| s.select_mode(crate::session::study::StudyMode::Flashcard));

        let now = Instant::now();
        app.toggle_recording(now);
        assert!(app.study.as_ref().unwrap().is_recording());
        app.tick(now + Duration::from_secs(3));
        assert!(!app.study.as_ref().unwrap().is_recording());

        pump(&mut app, &rx);
        assert!(matches!(
            app.study.as_ref().unwrap().item_state().pronunciation,
            crate::session::study::PronunciationStatus::Ready(_)
        ));
    }

    #[test]
    fn test_exit_study_returns_to_collection() {
        let (mut app, _rx, _) = make_app(MemoryStore::new());
        app.start_study();
        assert_eq!(app.study.as_ref().unwrap().state(), StudyState::Empty);
        app.exit_study();
        assert!(app.study.is_none());
        assert_eq!(app.screen, AppScreen::Collection);
    }

    fn show_word_with_example(app: &mut App<MemoryStore>) {
        app.search.result = Some(ReviewableItem::Word(WordData {
            word: "exit".to_string(),
            example_en: "Use the EXIT door, now!".to_string(),
            ..Default::default()
        }));
    }

    #[test]
    fn test_quick_lookup_offers_cleaned_words_from_card() {
        let (mut app, _rx, _) = make_app(MemoryStore::new());
        show_word_with_example(&mut app);
        app.open_quick_lookup();

        let quick = app.quick.as_ref().unwrap();
        assert_eq!(quick.candidates, vec!["Use", "the", "door", "now"]);
        assert_eq!(quick.selected_word(), Some("Use"));
    }

    #[test]
    fn test_quick_lookup_without_words_shows_notice() {
        let (mut app, _rx, _) = make_app(MemoryStore::new());
        app.search.result = Some(ReviewableItem::Word(WordData {
            word: "exit".to_string(),
            ..Default::default()
        }));
        app.open_quick_lookup();
        assert!(app.quick.is_none());
        assert!(app.notice.is_some());
    }

    #[test]
    fn test_quick_lookup_result_can_be_saved() {
        let (mut app, rx, _) = make_app(MemoryStore::new());
        show_word_with_example(&mut app);
        app.open_quick_lookup();
        app.quick_next();
        app.quick_next();
        app.quick_lookup_selected();
        assert!(app.quick.as_ref().unwrap().is_loading());
        pump(&mut app, &rx);

        let quick = app.quick.as_ref().unwrap();
        assert_eq!(quick.result.as_ref().unwrap().word, "door");
        assert!(!app.quick_result_saved());
        app.toggle_save_quick_result();
        assert!(app.quick_result_saved());
        assert!(app.collections.is_saved(&crate::item::ItemKey::word("door")));
    }

    #[test]
    fn test_quick_lookup_ignores_short_and_stale_words() {
        let (mut app, rx, _) = make_app(MemoryStore::new());
        show_word_with_example(&mut app);
        app.open_quick_lookup();

        app.quick_lookup("a,");
        assert!(!app.quick.as_ref().unwrap().is_loading());

        app.quick_lookup("(door)");
        app.quick_lookup("now!");
        let mut events = vec![
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        ];
        events.sort_by_key(|e| match e {
            AppEvent::QuickLookup { id, .. } => std::cmp::Reverse(*id),
            _ => std::cmp::Reverse(0),
        });
        for event in events {
            app.handle_event(event);
        }
        assert_eq!(app.quick.as_ref().unwrap().result.as_ref().unwrap().word, "now");
    }

    #[test]
    fn test_closed_quick_lookup_drops_response() {
        let (mut app, rx, _) = make_app(MemoryStore::new());
        show_word_with_example(&mut app);
        app.open_quick_lookup();
        app.quick_lookup_selected();
        app.close_quick_lookup();
        pump(&mut app, &rx);
        assert!(app.quick.is_none());
    }

    #[test]
    fn test_bucket_filter_cycles() {
        let (mut app, _rx, _) = make_app(MemoryStore::new());
        for _ in 0..5 {
            app.cycle_bucket_filter();
        }
        assert_eq!(app.collection_view.bucket_filter, Some(4));
        app.cycle_bucket_filter();
        assert_eq!(app.collection_view.bucket_filter, None);
    }
}
