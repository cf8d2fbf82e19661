use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::tags::normalize_tags;

mod merge;

pub use merge::merge_entries;

pub const DEFAULT_TITLE: &str = "Untitled Entry";

/// A single journal record. `id` and `created_at` are fixed at creation;
/// every mutation replaces the whole record and bumps `updated_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Always >= `created_at`.
    pub updated_at: i64,
}

/// Unvalidated input destined to become or replace an entry.
#[derive(Debug, Clone, Default)]
pub struct EntryDraft {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

/// Produces ids for new entries. A replacement source must stay
/// collision-free for the lifetime of one collection.
pub type IdSource = fn() -> String;

pub fn create_entry(
    entries: &[JournalEntry],
    draft: &EntryDraft,
) -> (Vec<JournalEntry>, JournalEntry) {
    create_entry_with(entries, draft, new_entry_id)
}

pub fn create_entry_with(
    entries: &[JournalEntry],
    draft: &EntryDraft,
    id_source: IdSource,
) -> (Vec<JournalEntry>, JournalEntry) {
    let now = now_ms();
    let entry = JournalEntry {
        id: id_source(),
        title: normalized_title(&draft.title),
        content: draft.content.clone(),
        tags: normalize_tags(&draft.tags),
        created_at: now,
        updated_at: now,
    };

    let mut next = Vec::with_capacity(entries.len() + 1);
    next.push(entry.clone());
    next.extend_from_slice(entries);
    next.sort_by(recency_order);

    (next, entry)
}

pub fn update_entry(
    entries: &[JournalEntry],
    id: &str,
    draft: &EntryDraft,
) -> (Vec<JournalEntry>, Option<JournalEntry>) {
    let Some(position) = entries.iter().position(|entry| entry.id == id) else {
        return (entries.to_vec(), None);
    };

    let previous = &entries[position];
    let updated = JournalEntry {
        id: previous.id.clone(),
        title: normalized_title(&draft.title),
        content: draft.content.clone(),
        tags: normalize_tags(&draft.tags),
        created_at: previous.created_at,
        // Strictly increases even when the clock has not advanced since the
        // previous stamp. Saturates rather than wraps when an imported stamp
        // already sits at the i64 ceiling.
        updated_at: now_ms().max(previous.updated_at.saturating_add(1)),
    };

    let mut next = entries.to_vec();
    next[position] = updated.clone();
    next.sort_by(recency_order);

    (next, Some(updated))
}

pub fn delete_entry(entries: &[JournalEntry], id: &str) -> Vec<JournalEntry> {
    entries
        .iter()
        .filter(|entry| entry.id != id)
        .cloned()
        .collect()
}

pub fn entry_by_id<'a>(entries: &'a [JournalEntry], id: &str) -> Option<&'a JournalEntry> {
    entries.iter().find(|entry| entry.id == id)
}

/// Display order: `updated_at` descending, ties by `created_at` descending.
/// Stable beyond that.
pub fn sort_by_recency(entries: &[JournalEntry]) -> Vec<JournalEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(recency_order);
    sorted
}

pub(crate) fn recency_order(a: &JournalEntry, b: &JournalEntry) -> Ordering {
    b.updated_at
        .cmp(&a.updated_at)
        .then_with(|| b.created_at.cmp(&a.created_at))
}

fn normalized_title(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Default [`IdSource`], backed by uuid-v4 entropy.
pub fn new_entry_id() -> String {
    Uuid::new_v4().to_string()
}

fn now_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

#[cfg(test)]
pub(crate) fn sample_entry(id: &str) -> JournalEntry {
    JournalEntry {
        id: id.to_string(),
        title: DEFAULT_TITLE.to_string(),
        content: "Hello world".to_string(),
        tags: vec!["retro".to_string()],
        created_at: 1,
        updated_at: 1,
    }
}
