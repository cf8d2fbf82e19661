use indexmap::IndexMap;

use crate::tags::normalize_tags;

use super::{recency_order, JournalEntry};

/// Reconciles an imported batch against the existing collection.
///
/// Matching ids keep whichever side carries the later `updated_at`; an exact
/// tie favors the incoming record. Incoming tags are normalized before the
/// comparison so imports from hand-edited files land clean.
pub fn merge_entries(existing: &[JournalEntry], incoming: &[JournalEntry]) -> Vec<JournalEntry> {
    let mut by_id: IndexMap<String, JournalEntry> = existing
        .iter()
        .map(|entry| (entry.id.clone(), entry.clone()))
        .collect();

    for entry in incoming {
        let mut clean = entry.clone();
        clean.tags = normalize_tags(&clean.tags);
        match by_id.get(&clean.id) {
            Some(prior) if prior.updated_at > clean.updated_at => {}
            _ => {
                by_id.insert(clean.id.clone(), clean);
            }
        }
    }

    let mut merged: Vec<JournalEntry> = by_id.into_values().collect();
    merged.sort_by(recency_order);
    merged
}

#[cfg(test)]
mod tests {
    use super::super::sample_entry;
    use super::*;

    #[test]
    fn newer_incoming_replaces_existing() {
        let mut local = sample_entry("alpha");
        local.title = "Local".to_string();
        local.updated_at = 10;
        let mut imported = sample_entry("alpha");
        imported.title = "Imported".to_string();
        imported.updated_at = 20;

        let merged = merge_entries(&[local], &[imported]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].title, "Imported");
    }

    #[test]
    fn newer_existing_survives_import() {
        let mut local = sample_entry("alpha");
        local.title = "Local".to_string();
        local.updated_at = 30;
        let mut imported = sample_entry("alpha");
        imported.title = "Imported".to_string();
        imported.updated_at = 20;

        let merged = merge_entries(&[local], &[imported]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].title, "Local");
    }

    #[test]
    fn timestamp_tie_favors_incoming() {
        let mut local = sample_entry("alpha");
        local.title = "Local".to_string();
        local.updated_at = 20;
        let mut imported = sample_entry("alpha");
        imported.title = "Imported".to_string();
        imported.updated_at = 20;

        let merged = merge_entries(&[local], &[imported]);
        assert_eq!(merged[0].title, "Imported");
    }

    #[test]
    fn import_batch_unions_and_prefers_latest() {
        let mut local = sample_entry("keep");
        local.updated_at = 5;
        let mut newer = sample_entry("keep");
        newer.title = "Latest".to_string();
        newer.updated_at = 10;
        let mut fresh = sample_entry("new");
        fresh.updated_at = 3;

        let merged = merge_entries(&[local], &[newer, fresh]);
        assert_eq!(merged.len(), 2);
        let kept = merged
            .iter()
            .find(|entry| entry.id == "keep")
            .expect("kept entry");
        assert_eq!(kept.title, "Latest");
    }

    #[test]
    fn unmatched_ids_union_and_sort_by_recency() {
        let mut local = sample_entry("local");
        local.updated_at = 5;
        let mut imported = sample_entry("imported");
        imported.updated_at = 50;

        let merged = merge_entries(&[local], &[imported]);
        let ids: Vec<_> = merged.iter().map(|entry| entry.id.as_str()).collect();
        assert_eq!(ids, vec!["imported", "local"]);
    }

    #[test]
    fn incoming_tags_are_normalized() {
        let mut imported = sample_entry("alpha");
        imported.tags = vec![" retro ".to_string(), "retro".to_string(), String::new()];
        imported.updated_at = 99;

        let merged = merge_entries(&[], &[imported]);
        assert_eq!(merged[0].tags, vec!["retro"]);
    }

    #[test]
    fn empty_incoming_leaves_existing_sorted() {
        let mut older = sample_entry("older");
        older.updated_at = 1;
        let mut newer = sample_entry("newer");
        newer.updated_at = 2;

        let merged = merge_entries(&[older, newer], &[]);
        let ids: Vec<_> = merged.iter().map(|entry| entry.id.as_str()).collect();
        assert_eq!(ids, vec!["newer", "older"]);
    }
}
