use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

pub type ItemId = String;

pub const EF_MIN: f64 = 1.3;
pub const EF_DEFAULT: f64 = 2.5;
pub const NEW_CARD_INTERVAL: u32 = 1;
pub const MAX_INTERVAL: u32 = 365;

/// Consecutive correct answers after which an item counts as mastered.
pub const MASTERY_STREAK: u32 = 5;

/// Self-assessed recall quality, 0 (blackout) to 5 (perfect).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(try_from = "i64", into = "u8")]
pub struct Performance(u8);

impl Performance {
    pub const MAX: u8 = 5;
    /// Lowest rating that counts as a successful recall.
    pub const PASSING: u8 = 3;

    pub fn new(rating: i64) -> Result<Self, CoreError> {
        if (0..=Self::MAX as i64).contains(&rating) {
            Ok(Self(rating as u8))
        } else {
            Err(CoreError::InvalidInput(format!(
                "performance must be between 0 and {}, got {rating}",
                Self::MAX
            )))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_correct(self) -> bool {
        self.0 >= Self::PASSING
    }
}

impl TryFrom<i64> for Performance {
    type Error = CoreError;

    fn try_from(rating: i64) -> Result<Self, Self::Error> {
        Performance::new(rating)
    }
}

impl From<Performance> for u8 {
    fn from(p: Performance) -> Self {
        p.0
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DueStatus {
    New,
    Due,
    Overdue,
    Future,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub new_card_interval: u32,
    pub max_interval: u32,
    pub min_ease_factor: f64,
    pub default_ease_factor: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            new_card_interval: NEW_CARD_INTERVAL,
            max_interval: MAX_INTERVAL,
            min_ease_factor: EF_MIN,
            default_ease_factor: EF_DEFAULT,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_interval < 1 {
            return Err(CoreError::InvalidInput("maxInterval must be at least 1".into()));
        }
        if self.new_card_interval < 1 || self.new_card_interval > self.max_interval {
            return Err(CoreError::InvalidInput(
                "newCardInterval must be between 1 and maxInterval".into(),
            ));
        }
        if !self.min_ease_factor.is_finite() || self.min_ease_factor <= 0.0 {
            return Err(CoreError::InvalidInput("minEaseFactor must be positive".into()));
        }
        if !self.default_ease_factor.is_finite() || self.default_ease_factor < self.min_ease_factor {
            return Err(CoreError::InvalidInput(
                "defaultEaseFactor must not be below minEaseFactor".into(),
            ));
        }
        Ok(())
    }
}

/// One flashcard and its scheduling state.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    pub id: ItemId,
    pub front: String,
    pub back: String,
    pub category: String,
    pub difficulty: String,

    pub repetitions: u32,
    pub ease_factor: f64,
    pub interval: u32,
    pub next_review: DateTime<Utc>,

    pub created: DateTime<Utc>,
    pub last_reviewed: Option<DateTime<Utc>>,
    pub total_reviews: u32,
    pub correct_streak: u32,
    pub last_performance: Option<Performance>,
    pub average_performance: f64,
    /// Seconds.
    pub time_spent: u64,
}

impl ReviewItem {
    pub fn new(
        id: impl Into<ItemId>,
        front: impl Into<String>,
        back: impl Into<String>,
        category: impl Into<String>,
        difficulty: impl Into<String>,
        settings: &Settings,
        now: DateTime<Utc>,
    ) -> Self {
        let mut item = Self {
            id: id.into(),
            front: front.into(),
            back: back.into(),
            category: category.into(),
            difficulty: difficulty.into(),
            repetitions: 0,
            ease_factor: settings.default_ease_factor,
            interval: settings.new_card_interval,
            next_review: now,
            created: now,
            last_reviewed: None,
            total_reviews: 0,
            correct_streak: 0,
            last_performance: None,
            average_performance: 0.0,
            time_spent: 0,
        };
        item.reset_schedule(settings, now);
        item
    }

    /// Puts the scheduling fields back to their starting values. Content and
    /// lifetime counters are left alone.
    pub fn reset_schedule(&mut self, settings: &Settings, now: DateTime<Utc>) {
        self.repetitions = 0;
        self.ease_factor = settings.default_ease_factor;
        self.interval = settings.new_card_interval.clamp(1, settings.max_interval.max(1));
        self.next_review = now;
        self.correct_streak = 0;
    }

    pub fn is_new(&self) -> bool {
        self.total_reviews == 0
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review <= now
    }

    pub fn is_mastered(&self) -> bool {
        self.correct_streak >= MASTERY_STREAK
    }

    pub fn due_status(&self, now: DateTime<Utc>) -> DueStatus {
        if self.is_new() {
            DueStatus::New
        } else if self.next_review > now {
            DueStatus::Future
        } else if now - self.next_review >= Duration::hours(24) {
            DueStatus::Overdue
        } else {
            DueStatus::Due
        }
    }

    /// Checks the scheduling fields against `settings`.
    pub fn check(&self, settings: &Settings) -> Result<(), CoreError> {
        if !self.ease_factor.is_finite() || self.ease_factor < settings.min_ease_factor {
            return Err(CoreError::InvalidInput(format!(
                "item {}: easeFactor {} below minEaseFactor {}",
                self.id, self.ease_factor, settings.min_ease_factor
            )));
        }
        if self.interval < 1 || self.interval > settings.max_interval {
            return Err(CoreError::InvalidInput(format!(
                "item {}: interval {} outside 1..={}",
                self.id, self.interval, settings.max_interval
            )));
        }
        if !(0.0..=Performance::MAX as f64).contains(&self.average_performance) {
            return Err(CoreError::InvalidInput(format!(
                "item {}: averagePerformance {} outside 0..=5",
                self.id, self.average_performance
            )));
        }
        Ok(())
    }

    /// Pulls ease factor and interval into the bounds of `settings`.
    pub fn fit_to(&mut self, settings: &Settings) {
        self.ease_factor = self.ease_factor.max(settings.min_ease_factor);
        self.interval = self.interval.clamp(1, settings.max_interval);
    }
}

/// History row written for every review.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub item_id: ItemId,
    pub performance: Performance,
    pub reviewed_at: DateTime<Utc>,
    pub interval_applied: u32,
    pub ease_factor_after: f64,
    pub time_spent: u64,
}
