use rand::Rng;
use rand::seq::SliceRandom;

use crate::engine::scheduler::Rating;
use crate::item::{ReviewableItem, SentenceData, WordData};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub reviewed: u32,
    pub forgotten: u32,
}

/// Shuffled snapshot of the items due when the session began.
pub struct ReviewQueue {
    items: Vec<ReviewableItem>,
    position: usize,
    stats: SessionStats,
}

impl ReviewQueue {
    pub fn start<R: Rng + ?Sized>(
        due_words: Vec<WordData>,
        due_sentences: Vec<SentenceData>,
        rng: &mut R,
    ) -> Self {
        let mut items: Vec<ReviewableItem> = due_words
            .into_iter()
            .map(ReviewableItem::Word)
            .chain(due_sentences.into_iter().map(ReviewableItem::Sentence))
            .collect();
        items.shuffle(rng);
        Self {
            items,
            position: 0,
            stats: SessionStats::default(),
        }
    }

    pub fn current(&self) -> Option<&ReviewableItem> {
        self.items.get(self.position)
    }

    pub fn advance(&mut self) {
        if self.position < self.items.len() {
            self.position += 1;
        }
    }

    pub fn record_rating(&mut self, rating: Rating) {
        self.stats.reviewed += 1;
        if rating == Rating::Fail {
            self.stats.forgotten += 1;
        }
    }

    pub fn items(&self) -> &[ReviewableItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Nothing was due when the session started.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Every item has been rated.
    pub fn is_complete(&self) -> bool {
        !self.items.is_empty() && self.position >= self.items.len()
    }

    pub fn is_last(&self) -> bool {
        self.position + 1 == self.items.len()
    }

    /// Stats worth reporting: none for a session that never had anything to review.
    pub fn summary(&self) -> Option<SessionStats> {
        (!self.is_empty()).then_some(self.stats)
    }

    pub fn progress(&self) -> f64 {
        if self.items.is_empty() {
            return 0.0;
        }
        self.position as f64 / self.items.len() as f64
    }
}
