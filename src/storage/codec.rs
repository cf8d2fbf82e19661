use serde::Serialize;
use serde_json::Value;

use crate::entries::JournalEntry;
use crate::tags::normalize_tags;

use super::StorageError;

pub const STORAGE_VERSION: i64 = 1;

/// On-disk payload shape. Reads that cannot produce a valid envelope fall
/// back to an empty one rather than failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope {
    pub version: i64,
    pub entries: Vec<JournalEntry>,
}

impl Envelope {
    pub fn current(entries: Vec<JournalEntry>) -> Self {
        Self {
            version: STORAGE_VERSION,
            entries,
        }
    }

    pub fn empty() -> Self {
        Self::current(Vec::new())
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::empty()
    }
}

/// Parses a raw import payload. Accepts either a bare entry array or an
/// envelope object carrying an `entries` array; any envelope version field is
/// ignored so exports from other app versions still import. Anything else
/// yields an empty collection.
pub fn parse_entries(payload: &str) -> Vec<JournalEntry> {
    let value: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(?err, "failed to parse journal payload");
            return Vec::new();
        }
    };
    parse_entries_value(&value)
}

pub(crate) fn parse_entries_value(value: &Value) -> Vec<JournalEntry> {
    match value {
        Value::Array(records) => sanitize_entries(records),
        Value::Object(envelope) => match envelope.get("entries") {
            Some(Value::Array(records)) => sanitize_entries(records),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Serializes entries as a pretty-printed current-version envelope for an
/// export file. The persisted journal itself is compact.
pub fn serialize_entries(entries: &[JournalEntry]) -> Result<String, StorageError> {
    let envelope = Envelope::current(entries.to_vec());
    Ok(serde_json::to_string_pretty(&envelope)?)
}

pub(crate) fn sanitize_entries(records: &[Value]) -> Vec<JournalEntry> {
    let mut entries = Vec::with_capacity(records.len());
    let mut dropped = 0usize;
    for record in records {
        match sanitize_entry(record) {
            Some(entry) => entries.push(entry),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        tracing::warn!(dropped, "dropped malformed journal entries");
    }
    entries
}

/// Rebuilds one entry from untrusted JSON. The id must be a non-blank string
/// and both timestamps must coerce to finite numbers; everything else repairs
/// to a usable default.
fn sanitize_entry(record: &Value) -> Option<JournalEntry> {
    let record = record.as_object()?;

    let id = match record.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
        _ => return None,
    };
    let created_at = coerce_number(record.get("createdAt"))?;
    let updated_at = coerce_number(record.get("updatedAt"))?;

    let tags = match record.get("tags") {
        Some(Value::Array(items)) => {
            let raw: Vec<String> = items.iter().map(coerce_text).collect();
            normalize_tags(&raw)
        }
        _ => Vec::new(),
    };

    Some(JournalEntry {
        id,
        title: record.get("title").map(coerce_text).unwrap_or_default(),
        content: record.get("content").map(coerce_text).unwrap_or_default(),
        tags,
        created_at,
        updated_at,
    })
}

pub(crate) fn coerce_version(value: &Value) -> Option<i64> {
    coerce_number(value.get("version"))
}

fn coerce_number(value: Option<&Value>) -> Option<i64> {
    let parsed = match value? {
        Value::Number(number) => number.as_f64()?,
        Value::String(raw) => raw.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if parsed.is_finite() {
        Some(parsed as i64)
    } else {
        None
    }
}

fn coerce_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => String::new(),
    }
}
