//! Reporting over the item set and review history. Nothing here feeds back
//! into scheduling.

use crate::{DueStatus, ReviewItem, ReviewRecord};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Items reviewed fewer than this many times are still "learning".
pub const LEARNING_THRESHOLD: u32 = 3;

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub total: u32,
    pub new: u32,
    pub due: u32,
    pub mastered: u32,
    pub average_ease_factor: f64,
    pub total_reviews: u32,
}

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Retention {
    /// Mean of `average_performance` over reviewed items, 0–5 scale.
    pub overall: Option<f64>,
    pub by_difficulty: BTreeMap<String, f64>,
}

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total: u32,
    pub new: u32,
    pub learning: u32,
    pub review: u32,
    pub due: u32,
    pub overdue: u32,
    pub mastered: u32,
    pub average_ease_factor: f64,
    pub categories: BTreeMap<String, CategoryStats>,
    pub retention: Retention,
}

fn mean(sum: f64, n: u32) -> f64 {
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

pub fn statistics(items: &[ReviewItem], now: DateTime<Utc>) -> Statistics {
    let mut s = Statistics::default();
    let mut ease_sum = 0.0;
    let mut category_ease: BTreeMap<String, f64> = BTreeMap::new();

    for item in items {
        s.total += 1;
        ease_sum += item.ease_factor;

        match item.total_reviews {
            0 => s.new += 1,
            n if n < LEARNING_THRESHOLD => s.learning += 1,
            _ => s.review += 1,
        }
        if item.is_due(now) {
            s.due += 1;
        }
        if item.due_status(now) == DueStatus::Overdue {
            s.overdue += 1;
        }
        if item.is_mastered() {
            s.mastered += 1;
        }

        let cat = s.categories.entry(item.category.clone()).or_default();
        cat.total += 1;
        cat.total_reviews += item.total_reviews;
        if item.is_new() {
            cat.new += 1;
        }
        if item.is_due(now) {
            cat.due += 1;
        }
        if item.is_mastered() {
            cat.mastered += 1;
        }
        *category_ease.entry(item.category.clone()).or_default() += item.ease_factor;
    }

    s.average_ease_factor = mean(ease_sum, s.total);
    for (name, cat) in s.categories.iter_mut() {
        cat.average_ease_factor = mean(category_ease.get(name).copied().unwrap_or(0.0), cat.total);
    }
    s.retention = retention(items);
    s
}

pub fn retention(items: &[ReviewItem]) -> Retention {
    let mut sum = 0.0;
    let mut n = 0u32;
    let mut groups: BTreeMap<String, (f64, u32)> = BTreeMap::new();
    for item in items.iter().filter(|i| !i.is_new()) {
        sum += item.average_performance;
        n += 1;
        let g = groups.entry(item.difficulty.clone()).or_default();
        g.0 += item.average_performance;
        g.1 += 1;
    }
    Retention {
        overall: (n > 0).then(|| mean(sum, n)),
        by_difficulty: groups
            .into_iter()
            .map(|(k, (total, count))| (k, mean(total, count)))
            .collect(),
    }
}

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct Totals {
    pub total: u32,
    pub correct: u32,
    pub seconds: u64,
}

impl Totals {
    pub fn record(&mut self, r: &ReviewRecord) {
        self.total += 1;
        if r.performance.is_correct() {
            self.correct += 1;
        }
        self.seconds = self.seconds.saturating_add(r.time_spent);
    }

    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct HistorySummary {
    pub totals: Totals,
    pub per_day: BTreeMap<NaiveDate, Totals>,
}

pub fn summarize(records: &[ReviewRecord]) -> HistorySummary {
    let mut summary = HistorySummary::default();
    for r in records {
        summary.totals.record(r);
        let d = r.reviewed_at.date_naive();
        summary.per_day.entry(d).or_default().record(r);
    }
    summary
}

/// Consecutive days with at least one review, counting back from `today`.
pub fn daily_streak(records: &[ReviewRecord], today: NaiveDate) -> u32 {
    let per_day = summarize(records).per_day;
    let mut streak = 0u32;
    let mut day = today;
    while per_day.get(&day).map(|t| t.total > 0).unwrap_or(false) {
        streak += 1;
        day -= Duration::days(1);
    }
    streak
}
