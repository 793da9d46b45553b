use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

pub const DAY_MS: i64 = 86_400_000;

/// Days until the next review, indexed by SRS level.
pub const INTERVAL_DAYS: [u32; 7] = [1, 3, 7, 14, 30, 90, 180];

pub const MAX_LEVEL: u32 = (INTERVAL_DAYS.len() - 1) as u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Fail,
    Hard,
    Good,
    Easy,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::Fail, Rating::Hard, Rating::Good, Rating::Easy];

    pub fn as_str(self) -> &'static str {
        match self {
            Rating::Fail => "fail",
            Rating::Hard => "hard",
            Rating::Good => "good",
            Rating::Easy => "easy",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Rating::Fail => "Forgot",
            Rating::Hard => "Hard",
            Rating::Good => "Good",
            Rating::Easy => "Easy",
        }
    }

    /// Digit shortcut: '1' = fail .. '4' = easy.
    pub fn from_digit(ch: char) -> Option<Self> {
        match ch {
            '1' => Some(Rating::Fail),
            '2' => Some(Rating::Hard),
            '3' => Some(Rating::Good),
            '4' => Some(Rating::Easy),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NextState {
    pub level: u32,
    pub interval_days: u32,
}

/// Scheduling metadata written back onto an item after a rating.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Schedule {
    pub srs_level: u32,
    pub next_review: Timestamp,
}

pub fn clamp_level(level: u32) -> u32 {
    level.min(MAX_LEVEL)
}

pub fn interval_days(level: u32) -> u32 {
    INTERVAL_DAYS[clamp_level(level) as usize]
}

pub fn next_state(current_level: u32, rating: Rating) -> NextState {
    let current = clamp_level(current_level);
    let level = match rating {
        Rating::Fail => 0,
        Rating::Hard => current,
        Rating::Good => clamp_level(current + 1),
        Rating::Easy => clamp_level(current + 2),
    };
    NextState {
        level,
        interval_days: interval_days(level),
    }
}

pub fn next_review_at(now: Timestamp, interval_days: u32) -> Timestamp {
    now + interval_days as i64 * DAY_MS
}

/// `next_state` plus the absolute due time measured from `now`.
pub fn schedule(current_level: u32, rating: Rating, now: Timestamp) -> Schedule {
    let next = next_state(current_level, rating);
    Schedule {
        srs_level: next.level,
        next_review: next_review_at(now, next.interval_days),
    }
}
