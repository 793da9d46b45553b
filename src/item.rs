use serde::{Deserialize, Serialize};

use crate::engine::scheduler::{Schedule, Timestamp, clamp_level};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Word,
    Sentence,
}

impl ItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Word => "word",
            ItemKind::Sentence => "sentence",
        }
    }
}

/// Identity of a saved item. Words compare case-insensitively, sentences exactly.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ItemKey {
    Word(String),
    Sentence(String),
}

impl ItemKey {
    pub fn word(text: &str) -> Self {
        ItemKey::Word(text.to_lowercase())
    }

    pub fn sentence(text: &str) -> Self {
        ItemKey::Sentence(text.to_string())
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            ItemKey::Word(_) => ItemKind::Word,
            ItemKey::Sentence(_) => ItemKind::Sentence,
        }
    }
}

/// The slice of an item the scheduler and review queue care about.
pub trait Reviewable {
    fn key(&self) -> ItemKey;
    fn raw_level(&self) -> Option<u32>;
    fn next_review(&self) -> Option<Timestamp>;
    fn set_schedule(&mut self, schedule: Schedule);

    fn srs_level(&self) -> u32 {
        clamp_level(self.raw_level().unwrap_or(0))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WordData {
    pub word: String,
    #[serde(default)]
    pub meaning_vi: String,
    #[serde(default)]
    pub definition_en: String,
    #[serde(default)]
    pub ipa: String,
    #[serde(default)]
    pub syllables: String,
    #[serde(default)]
    pub spelling_tip: String,
    #[serde(default)]
    pub part_of_speech: String,
    #[serde(default)]
    pub example_en: String,
    #[serde(default)]
    pub example_vi: String,
    #[serde(default)]
    pub example_b2_en: String,
    #[serde(default)]
    pub example_b2_vi: String,
    #[serde(default)]
    pub root_word: String,
    #[serde(default)]
    pub mnemonic: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub antonyms: Vec<String>,
    #[serde(default)]
    pub word_family: Vec<String>,
    #[serde(default)]
    pub collocations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srs_level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_review: Option<Timestamp>,
}

impl Reviewable for WordData {
    fn key(&self) -> ItemKey {
        ItemKey::word(&self.word)
    }

    fn raw_level(&self) -> Option<u32> {
        self.srs_level
    }

    fn next_review(&self) -> Option<Timestamp> {
        self.next_review
    }

    fn set_schedule(&mut self, schedule: Schedule) {
        self.srs_level = Some(schedule.srs_level);
        self.next_review = Some(schedule.next_review);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarSentence {
    #[serde(default)]
    pub en: String,
    #[serde(default)]
    pub vi: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SentenceData {
    pub sentence: String,
    #[serde(default)]
    pub meaning_vi: String,
    #[serde(default)]
    pub grammar_breakdown: String,
    #[serde(default)]
    pub usage_context: String,
    #[serde(default)]
    pub naturalness_score: f64,
    #[serde(default)]
    pub similar_sentences: Vec<SimilarSentence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_saved: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srs_level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_review: Option<Timestamp>,
}

impl Reviewable for SentenceData {
    fn key(&self) -> ItemKey {
        ItemKey::sentence(&self.sentence)
    }

    fn raw_level(&self) -> Option<u32> {
        self.srs_level
    }

    fn next_review(&self) -> Option<Timestamp> {
        self.next_review
    }

    fn set_schedule(&mut self, schedule: Schedule) {
        self.srs_level = Some(schedule.srs_level);
        self.next_review = Some(schedule.next_review);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ReviewableItem {
    Word(WordData),
    Sentence(SentenceData),
}

impl ReviewableItem {
    pub fn kind(&self) -> ItemKind {
        match self {
            ReviewableItem::Word(_) => ItemKind::Word,
            ReviewableItem::Sentence(_) => ItemKind::Sentence,
        }
    }

    /// The text the learner must recall: the word, or the English sentence.
    pub fn primary_text(&self) -> &str {
        match self {
            ReviewableItem::Word(w) => &w.word,
            ReviewableItem::Sentence(s) => &s.sentence,
        }
    }

    pub fn meaning(&self) -> &str {
        match self {
            ReviewableItem::Word(w) => &w.meaning_vi,
            ReviewableItem::Sentence(s) => &s.meaning_vi,
        }
    }

    /// English text on the card that single words can be picked from.
    pub fn passages(&self) -> Vec<&str> {
        match self {
            ReviewableItem::Word(w) => [w.example_en.as_str(), w.example_b2_en.as_str()]
                .into_iter()
                .chain(w.synonyms.iter().map(String::as_str))
                .chain(w.antonyms.iter().map(String::as_str))
                .chain(w.word_family.iter().map(String::as_str))
                .chain(w.collocations.iter().map(String::as_str))
                .collect(),
            ReviewableItem::Sentence(s) => std::iter::once(s.sentence.as_str())
                .chain(s.similar_sentences.iter().map(|x| x.en.as_str()))
                .collect(),
        }
    }
}

impl Reviewable for ReviewableItem {
    fn key(&self) -> ItemKey {
        match self {
            ReviewableItem::Word(w) => w.key(),
            ReviewableItem::Sentence(s) => s.key(),
        }
    }

    fn raw_level(&self) -> Option<u32> {
        match self {
            ReviewableItem::Word(w) => w.raw_level(),
            ReviewableItem::Sentence(s) => s.raw_level(),
        }
    }

    fn next_review(&self) -> Option<Timestamp> {
        match self {
            ReviewableItem::Word(w) => Reviewable::next_review(w),
            ReviewableItem::Sentence(s) => Reviewable::next_review(s),
        }
    }

    fn set_schedule(&mut self, schedule: Schedule) {
        match self {
            ReviewableItem::Word(w) => w.set_schedule(schedule),
            ReviewableItem::Sentence(s) => s.set_schedule(schedule),
        }
    }
}

impl From<WordData> for ReviewableItem {
    fn from(w: WordData) -> Self {
        ReviewableItem::Word(w)
    }
}

impl From<SentenceData> for ReviewableItem {
    fn from(s: SentenceData) -> Self {
        ReviewableItem::Sentence(s)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PronunciationFeedback {
    pub score: f64,
    pub is_correct: bool,
    #[serde(rename = "feedback_vi")]
    pub feedback_text: String,
    pub detected_speech: String,
}
