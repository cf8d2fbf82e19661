use indexmap::IndexMap;

use crate::entries::JournalEntry;

const TITLE_MATCH_WEIGHT: u32 = 2;
const CONTENT_MATCH_WEIGHT: u32 = 1;

/// Filter inputs exactly as the caller supplied them. Whitespace-only values
/// are treated as absent.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub query: Option<String>,
    pub tag: Option<String>,
}

impl SearchOptions {
    pub fn is_empty(&self) -> bool {
        normalized(self.query.as_deref()).is_none() && normalized(self.tag.as_deref()).is_none()
    }
}

/// Filters and ranks entries.
///
/// The tag filter is a hard predicate: entries without a case-insensitive
/// exact tag match are excluded before scoring. The query then matches as a
/// case-insensitive substring, weighting title hits double content hits;
/// entries matching neither field are excluded. Results order by score
/// descending, ties by `updated_at` descending.
pub fn search_entries(entries: &[JournalEntry], options: &SearchOptions) -> Vec<JournalEntry> {
    let query = normalized(options.query.as_deref());
    let tag = normalized(options.tag.as_deref());

    let mut scored: Vec<(JournalEntry, u32)> = Vec::new();
    for entry in entries {
        if let Some(tag) = &tag {
            let tagged = entry
                .tags
                .iter()
                .any(|candidate| candidate.to_lowercase() == *tag);
            if !tagged {
                continue;
            }
        }

        let Some(query) = &query else {
            scored.push((entry.clone(), 0));
            continue;
        };

        let mut score = 0;
        if entry.title.to_lowercase().contains(query) {
            score += TITLE_MATCH_WEIGHT;
        }
        if entry.content.to_lowercase().contains(query) {
            score += CONTENT_MATCH_WEIGHT;
        }
        if score > 0 {
            scored.push((entry.clone(), score));
        }
    }

    scored.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| b.0.updated_at.cmp(&a.0.updated_at))
    });
    scored.into_iter().map(|(entry, _)| entry).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFrequency {
    pub tag: String,
    pub count: usize,
}

/// Counts tag usage across the collection, ordered by count descending with
/// alphabetical ties.
pub fn tag_frequencies(entries: &[JournalEntry]) -> Vec<TagFrequency> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for entry in entries {
        for tag in &entry.tags {
            *counts.entry(tag.clone()).or_insert(0) += 1;
        }
    }

    let mut frequencies: Vec<TagFrequency> = counts
        .into_iter()
        .map(|(tag, count)| TagFrequency { tag, count })
        .collect();
    frequencies.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    frequencies
}

fn normalized(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}
