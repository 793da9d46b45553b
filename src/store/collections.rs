use anyhow::Result;

use crate::engine::due::{self, BUCKET_COUNT, LevelBucket};
use crate::engine::scheduler::{Schedule, Timestamp};
use crate::item::{ItemKey, Reviewable, ReviewableItem, SentenceData, WordData};
use crate::store::schema::{SENTENCES_KEY, WORDS_KEY};
use crate::store::{BlobStore, load_or_default, save_json};

/// Write path the study session uses to persist scheduling updates.
pub trait ItemStore {
    /// Apply `schedule` to the saved item matching `key`. Returns false if no item matched.
    fn update_schedule(&mut self, key: &ItemKey, schedule: Schedule) -> Result<bool>;
}

/// The learner's saved words and sentences, written through to a `BlobStore`
/// on every mutation.
pub struct Collections<S: BlobStore> {
    store: S,
    words: Vec<WordData>,
    sentences: Vec<SentenceData>,
}

impl<S: BlobStore> Collections<S> {
    pub fn load(store: S) -> Self {
        let words = load_or_default(&store, WORDS_KEY);
        let sentences = load_or_default(&store, SENTENCES_KEY);
        Self {
            store,
            words,
            sentences,
        }
    }

    pub fn reload(&mut self) {
        self.words = load_or_default(&self.store, WORDS_KEY);
        self.sentences = load_or_default(&self.store, SENTENCES_KEY);
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn words(&self) -> &[WordData] {
        &self.words
    }

    pub fn sentences(&self) -> &[SentenceData] {
        &self.sentences
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.sentences.is_empty()
    }

    pub fn is_saved(&self, key: &ItemKey) -> bool {
        match key {
            ItemKey::Word(_) => self.words.iter().any(|w| &w.key() == key),
            ItemKey::Sentence(_) => self.sentences.iter().any(|s| &s.key() == key),
        }
    }

    /// Save `item` fresh at level 0 and due now, or remove it if already saved.
    /// Returns true if the item is saved afterwards.
    pub fn toggle_save(&mut self, item: &ReviewableItem, now: Timestamp) -> Result<bool> {
        let key = item.key();
        if self.is_saved(&key) {
            self.remove(&key)?;
            return Ok(false);
        }

        let fresh = Schedule {
            srs_level: 0,
            next_review: now,
        };
        match item {
            ReviewableItem::Word(w) => {
                let mut w = w.clone();
                w.set_schedule(fresh);
                self.words.insert(0, w);
                self.persist_words()?;
            }
            ReviewableItem::Sentence(s) => {
                let mut s = s.clone();
                s.set_schedule(fresh);
                s.date_saved.get_or_insert(now);
                self.sentences.insert(0, s);
                self.persist_sentences()?;
            }
        }
        tracing::info!(kind = key.kind().as_str(), "saved item");
        Ok(true)
    }

    pub fn remove(&mut self, key: &ItemKey) -> Result<bool> {
        match key {
            ItemKey::Word(_) => {
                let before = self.words.len();
                self.words.retain(|w| &w.key() != key);
                if self.words.len() == before {
                    return Ok(false);
                }
                self.persist_words()?;
            }
            ItemKey::Sentence(_) => {
                let before = self.sentences.len();
                self.sentences.retain(|s| &s.key() != key);
                if self.sentences.len() == before {
                    return Ok(false);
                }
                self.persist_sentences()?;
            }
        }
        Ok(true)
    }

    pub fn due_words(&self, now: Timestamp) -> Vec<WordData> {
        due::due_items(&self.words, now)
    }

    pub fn due_sentences(&self, now: Timestamp) -> Vec<SentenceData> {
        due::due_items(&self.sentences, now)
    }

    pub fn due_count(&self, now: Timestamp) -> usize {
        due::due_count(&self.words, now) + due::due_count(&self.sentences, now)
    }

    pub fn buckets(&self) -> [LevelBucket; BUCKET_COUNT] {
        let mut buckets = due::bucket_by_level(&self.words);
        due::add_to_buckets(&mut buckets, &self.sentences);
        buckets
    }

    /// All saved items in display order (words first), optionally limited to one level bucket.
    pub fn items(&self, bucket: Option<usize>) -> Vec<ReviewableItem> {
        self.words
            .iter()
            .filter(|w| in_optional_bucket(*w, bucket))
            .cloned()
            .map(ReviewableItem::from)
            .chain(
                self.sentences
                    .iter()
                    .filter(|s| in_optional_bucket(*s, bucket))
                    .cloned()
                    .map(ReviewableItem::from),
            )
            .collect()
    }

    fn persist_words(&self) -> Result<()> {
        save_json(&self.store, WORDS_KEY, &self.words)
    }

    fn persist_sentences(&self) -> Result<()> {
        save_json(&self.store, SENTENCES_KEY, &self.sentences)
    }
}

fn in_optional_bucket<T: Reviewable>(item: &T, bucket: Option<usize>) -> bool {
    bucket.is_none_or(|b| due::in_bucket(item, b))
}

impl<S: BlobStore> ItemStore for Collections<S> {
    fn update_schedule(&mut self, key: &ItemKey, schedule: Schedule) -> Result<bool> {
        let updated = match key {
            ItemKey::Word(_) => match self.words.iter_mut().find(|w| &w.key() == key) {
                Some(w) => {
                    w.set_schedule(schedule);
                    self.persist_words()?;
                    true
                }
                None => false,
            },
            ItemKey::Sentence(_) => match self.sentences.iter_mut().find(|s| &s.key() == key) {
                Some(s) => {
                    s.set_schedule(schedule);
                    self.persist_sentences()?;
                    true
                }
                None => false,
            },
        };
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scheduler::DAY_MS;
    use crate::store::MemoryStore;

    const NOW: Timestamp = 1_700_000_000_000;

    fn word(text: &str) -> ReviewableItem {
        ReviewableItem::Word(WordData {
            word: text.to_string(),
            meaning_vi: "nghĩa".to_string(),
            ..Default::default()
        })
    }

    fn sentence(text: &str) -> ReviewableItem {
        ReviewableItem::Sentence(SentenceData {
            sentence: text.to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_malformed_collections_load_empty() {
        let store = MemoryStore::new()
            .with_blob(WORDS_KEY, "not json at all")
            .with_blob(SENTENCES_KEY, "{\"oops\": 1}");
        let collections = Collections::load(store);
        assert!(collections.is_empty());
    }

    #[test]
    fn test_toggle_save_prepends_fresh_item() {
        let mut c = Collections::load(MemoryStore::new());
        assert!(c.toggle_save(&word("raw"), NOW).unwrap());
        assert!(c.toggle_save(&word("exit"), NOW).unwrap());

        assert_eq!(c.words()[0].word, "exit");
        assert_eq!(c.words()[0].srs_level, Some(0));
        assert_eq!(c.words()[0].next_review, Some(NOW));
        assert!(c.store().raw(WORDS_KEY).unwrap().contains("exit"));
    }

    #[test]
    fn test_toggle_save_twice_removes_case_insensitively() {
        let mut c = Collections::load(MemoryStore::new());
        c.toggle_save(&word("Exit"), NOW).unwrap();
        assert!(c.is_saved(&ItemKey::word("EXIT")));
        assert!(!c.toggle_save(&word("exit"), NOW).unwrap());
        assert!(c.words().is_empty());
    }

    #[test]
    fn test_sentence_gets_date_saved() {
        let mut c = Collections::load(MemoryStore::new());
        c.toggle_save(&sentence("How are you?"), NOW).unwrap();
        assert_eq!(c.sentences()[0].date_saved, Some(NOW));
        assert!(!c.is_saved(&ItemKey::sentence("how are you?")));
    }

    #[test]
    fn test_update_schedule_writes_through() {
        let mut c = Collections::load(MemoryStore::new());
        c.toggle_save(&word("exit"), NOW).unwrap();

        let schedule = Schedule {
            srs_level: 1,
            next_review: NOW + 3 * DAY_MS,
        };
        assert!(c.update_schedule(&ItemKey::word("exit"), schedule).unwrap());
        assert!(!c.update_schedule(&ItemKey::word("missing"), schedule).unwrap());

        let reloaded = Collections::load(MemoryStore::new().with_blob(
            WORDS_KEY,
            &c.store().raw(WORDS_KEY).unwrap(),
        ));
        assert_eq!(reloaded.words()[0].srs_level, Some(1));
        assert_eq!(reloaded.words()[0].next_review, Some(NOW + 3 * DAY_MS));
    }

    #[test]
    fn test_due_counts_and_buckets() {
        let mut c = Collections::load(MemoryStore::new());
        c.toggle_save(&word("a"), NOW).unwrap();
        c.toggle_save(&word("b"), NOW).unwrap();
        c.toggle_save(&sentence("S."), NOW).unwrap();
        c.update_schedule(
            &ItemKey::word("b"),
            Schedule {
                srs_level: 5,
                next_review: NOW + DAY_MS,
            },
        )
        .unwrap();

        assert_eq!(c.due_count(NOW), 2);
        assert_eq!(c.due_words(NOW).len(), 1);
        assert_eq!(c.due_sentences(NOW).len(), 1);

        let buckets = c.buckets();
        assert_eq!(buckets[0].count, 2);
        assert_eq!(buckets[4].count, 1);

        assert_eq!(c.items(Some(4)).len(), 1);
        assert_eq!(c.items(None).len(), 3);
    }
}
