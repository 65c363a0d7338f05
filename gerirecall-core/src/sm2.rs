use crate::{Performance, ReviewItem, ReviewRecord, Settings};
use chrono::{DateTime, Duration, Utc};

pub struct ScheduleOutcome {
    pub updated_item: ReviewItem,
    pub record: ReviewRecord,
}

/// SM-2 ease adjustment: `0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)`.
pub fn ease_delta(performance: Performance) -> f64 {
    let miss = (Performance::MAX - performance.value()) as f64;
    0.1 - miss * (0.08 + miss * 0.02)
}

/// Interval for a successful recall, chosen from the repetition count the
/// item had before this review.
fn next_interval(repetitions: u32, interval: u32, ease_factor: f64) -> u32 {
    match repetitions {
        0 => 1,
        1 => 6,
        _ => (interval as f64 * ease_factor).round().max(1.0) as u32,
    }
}

pub fn apply_review(
    mut item: ReviewItem,
    performance: Performance,
    time_spent_secs: u64,
    settings: &Settings,
    now: DateTime<Utc>,
) -> ScheduleOutcome {
    let correct = performance.is_correct();

    let mut interval = if correct {
        let i = next_interval(item.repetitions, item.interval, item.ease_factor);
        item.repetitions += 1;
        i
    } else {
        item.repetitions = 0;
        1
    };

    item.ease_factor = (item.ease_factor + ease_delta(performance)).max(settings.min_ease_factor);

    interval = interval.clamp(1, settings.max_interval.max(1));
    item.interval = interval;
    item.next_review = now + Duration::days(interval as i64);

    item.last_reviewed = Some(now);
    item.total_reviews += 1;
    item.last_performance = Some(performance);
    item.average_performance +=
        (performance.value() as f64 - item.average_performance) / item.total_reviews as f64;
    item.correct_streak = if correct { item.correct_streak + 1 } else { 0 };
    item.time_spent = item.time_spent.saturating_add(time_spent_secs);

    let record = ReviewRecord {
        item_id: item.id.clone(),
        performance,
        reviewed_at: now,
        interval_applied: interval,
        ease_factor_after: item.ease_factor,
        time_spent: time_spent_secs,
    };

    ScheduleOutcome { updated_item: item, record }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perf(p: i64) -> Performance {
        Performance::new(p).unwrap()
    }

    #[test]
    fn ease_delta_table() {
        assert!((ease_delta(perf(5)) - 0.1).abs() < 1e-9);
        assert!((ease_delta(perf(4)) - 0.0).abs() < 1e-9);
        assert!((ease_delta(perf(3)) + 0.14).abs() < 1e-9);
        assert!((ease_delta(perf(0)) + 0.8).abs() < 1e-9);
    }

    #[test]
    fn third_success_multiplies_by_ease() {
        assert_eq!(next_interval(2, 6, 2.5), 15);
        assert_eq!(next_interval(5, 10, 1.3), 13);
    }

    #[test]
    fn running_mean_of_performance() {
        let now = Utc::now();
        let s = Settings::default();
        let item = ReviewItem::new("c1", "Q", "A", "g", "m", &s, now);
        let item = apply_review(item, perf(5), 10, &s, now).updated_item;
        let item = apply_review(item, perf(2), 5, &s, now).updated_item;
        let item = apply_review(item, perf(5), 5, &s, now).updated_item;
        assert!((item.average_performance - 4.0).abs() < 1e-9);
        assert_eq!(item.time_spent, 20);
    }

    #[test]
    fn interval_capped_by_settings() {
        let now = Utc::now();
        let s = Settings { max_interval: 10, ..Settings::default() };
        let mut item = ReviewItem::new("c1", "Q", "A", "g", "m", &s, now);
        item.repetitions = 4;
        item.interval = 9;
        let out = apply_review(item, perf(5), 0, &s, now);
        assert_eq!(out.updated_item.interval, 10);
        assert_eq!(out.record.interval_applied, 10);
        assert_eq!(out.updated_item.next_review, now + Duration::days(10));
    }

    #[test]
    fn time_spent_saturates() {
        let now = Utc::now();
        let s = Settings::default();
        let item = ReviewItem::new("c1", "Q", "A", "g", "m", &s, now);
        let item = apply_review(item, perf(4), u64::MAX, &s, now).updated_item;
        let item = apply_review(item, perf(4), 1, &s, now).updated_item;
        assert_eq!(item.time_spent, u64::MAX);
    }
}
