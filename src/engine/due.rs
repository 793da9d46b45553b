use crate::engine::scheduler::{INTERVAL_DAYS, Timestamp};
use crate::item::Reviewable;

pub const BUCKET_COUNT: usize = 5;

/// One column of the level overview. The last bucket also holds every level above it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelBucket {
    pub index: usize,
    pub label_days: u32,
    pub count: usize,
}

impl LevelBucket {
    pub fn label(&self) -> String {
        if self.label_days == 1 {
            "1 day".to_string()
        } else {
            format!("{} days", self.label_days)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mastery {
    New,
    Learning,
    Mastered,
}

impl Mastery {
    pub fn from_level(level: u32) -> Self {
        if level >= 4 {
            Mastery::Mastered
        } else if level >= 2 {
            Mastery::Learning
        } else {
            Mastery::New
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mastery::New => "New",
            Mastery::Learning => "Learning",
            Mastery::Mastered => "Mastered",
        }
    }
}

pub fn is_due<T: Reviewable + ?Sized>(item: &T, now: Timestamp) -> bool {
    match item.next_review() {
        None => true,
        Some(at) => at <= now,
    }
}

pub fn due_items<T: Reviewable + Clone>(all: &[T], now: Timestamp) -> Vec<T> {
    all.iter().filter(|item| is_due(*item, now)).cloned().collect()
}

pub fn due_count<T: Reviewable>(all: &[T], now: Timestamp) -> usize {
    all.iter().filter(|item| is_due(*item, now)).count()
}

pub fn bucket_index(level: u32) -> usize {
    (level as usize).min(BUCKET_COUNT - 1)
}

pub fn empty_buckets() -> [LevelBucket; BUCKET_COUNT] {
    std::array::from_fn(|index| LevelBucket {
        index,
        label_days: INTERVAL_DAYS[index],
        count: 0,
    })
}

pub fn bucket_by_level<T: Reviewable>(all: &[T]) -> [LevelBucket; BUCKET_COUNT] {
    let mut buckets = empty_buckets();
    add_to_buckets(&mut buckets, all);
    buckets
}

/// Accumulate another collection into existing buckets (words and sentences share one overview).
pub fn add_to_buckets<T: Reviewable>(buckets: &mut [LevelBucket; BUCKET_COUNT], all: &[T]) {
    for item in all {
        buckets[bucket_index(item.srs_level())].count += 1;
    }
}

pub fn in_bucket<T: Reviewable + ?Sized>(item: &T, bucket: usize) -> bool {
    bucket_index(item.srs_level()) == bucket
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scheduler::DAY_MS;
    use crate::item::{SentenceData, WordData};

    const NOW: Timestamp = 1_700_000_000_000;

    fn word(text: &str, level: Option<u32>, next_review: Option<Timestamp>) -> WordData {
        WordData {
            word: text.to_string(),
            srs_level: level,
            next_review,
            ..Default::default()
        }
    }

    #[test]
    fn test_absent_next_review_is_due() {
        assert!(is_due(&word("a", None, None), NOW));
    }

    #[test]
    fn test_due_boundaries() {
        assert!(is_due(&word("a", Some(1), Some(NOW - 1)), NOW));
        assert!(is_due(&word("a", Some(1), Some(NOW)), NOW));
        assert!(!is_due(&word("a", Some(1), Some(NOW + 1)), NOW));
    }

    #[test]
    fn test_due_items_preserves_order_and_is_repeatable() {
        let all = vec![
            word("one", None, None),
            word("two", Some(2), Some(NOW + DAY_MS)),
            word("three", Some(0), Some(NOW - DAY_MS)),
            word("four", Some(3), Some(NOW)),
        ];
        let first = due_items(&all, NOW);
        let second = due_items(&all, NOW);
        assert_eq!(first, second);
        let names: Vec<&str> = first.iter().map(|w| w.word.as_str()).collect();
        assert_eq!(names, vec!["one", "three", "four"]);
        assert_eq!(due_count(&all, NOW), 3);
    }

    #[test]
    fn test_high_levels_collapse_into_last_bucket() {
        assert_eq!(bucket_index(6), 4);
        assert_eq!(bucket_index(5), 4);
        assert_eq!(bucket_index(4), 4);
        assert_eq!(bucket_index(2), 2);
    }

    #[test]
    fn test_bucket_counts_and_labels() {
        let words = vec![
            word("a", None, None),
            word("b", Some(2), None),
            word("c", Some(4), None),
            word("d", Some(6), None),
        ];
        let sentences = vec![SentenceData {
            sentence: "Go.".to_string(),
            srs_level: Some(5),
            ..Default::default()
        }];
        let mut buckets = bucket_by_level(&words);
        add_to_buckets(&mut buckets, &sentences);

        let counts: Vec<usize> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 0, 1, 0, 3]);
        let labels: Vec<u32> = buckets.iter().map(|b| b.label_days).collect();
        assert_eq!(labels, vec![1, 3, 7, 14, 30]);
        assert_eq!(buckets[0].label(), "1 day");
        assert_eq!(buckets[4].label(), "30 days");
    }

    #[test]
    fn test_bucket_filter_membership() {
        assert!(in_bucket(&word("a", Some(6), None), 4));
        assert!(!in_bucket(&word("a", Some(3), None), 4));
        assert!(in_bucket(&word("a", None, None), 0));
    }

    #[test]
    fn test_mastery_thresholds() {
        assert_eq!(Mastery::from_level(0), Mastery::New);
        assert_eq!(Mastery::from_level(1), Mastery::New);
        assert_eq!(Mastery::from_level(2), Mastery::Learning);
        assert_eq!(Mastery::from_level(4), Mastery::Mastered);
        assert_eq!(Mastery::from_level(6), Mastery::Mastered);
    }
}
