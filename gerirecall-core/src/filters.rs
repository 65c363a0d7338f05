use crate::{DueStatus, ReviewItem};
use chrono::{DateTime, Utc};

pub fn filter_by_text(items: &[ReviewItem], query: &str) -> Vec<ReviewItem> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|c| {
            c.front.to_lowercase().contains(&q)
                || c.back.to_lowercase().contains(&q)
                || c.category.to_lowercase().contains(&q)
        })
        .cloned()
        .collect()
}

pub fn filter_by_category(items: &[ReviewItem], category: &str) -> Vec<ReviewItem> {
    let q = category.trim();
    items
        .iter()
        .filter(|c| c.category.eq_ignore_ascii_case(q))
        .cloned()
        .collect()
}

pub fn filter_by_difficulty(items: &[ReviewItem], difficulty: &str) -> Vec<ReviewItem> {
    let q = difficulty.trim();
    items
        .iter()
        .filter(|c| c.difficulty.eq_ignore_ascii_case(q))
        .cloned()
        .collect()
}

pub fn filter_by_due(items: &[ReviewItem], now: DateTime<Utc>, want: DueStatus) -> Vec<ReviewItem> {
    items
        .iter()
        .filter(|c| c.due_status(now) == want)
        .cloned()
        .collect()
}

/// Items with `next_review <= now`, most overdue first.
pub fn due_items(items: &[ReviewItem], now: DateTime<Utc>, limit: usize) -> Vec<ReviewItem> {
    let mut v: Vec<ReviewItem> = items.iter().filter(|c| c.is_due(now)).cloned().collect();
    v.sort_by(|a, b| {
        (a.next_review, a.created, &a.id).cmp(&(b.next_review, b.created, &b.id))
    });
    v.truncate(limit);
    v
}

/// Never-reviewed items, oldest first.
pub fn new_items(items: &[ReviewItem], limit: usize) -> Vec<ReviewItem> {
    let mut v: Vec<ReviewItem> = items.iter().filter(|c| c.is_new()).cloned().collect();
    v.sort_by(|a, b| (a.created, &a.id).cmp(&(b.created, &b.id)));
    v.truncate(limit);
    v
}
