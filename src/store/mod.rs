use crate::entries::{self, EntryDraft, IdSource, JournalEntry};
use crate::storage::JournalStorage;

/// Owns the in-memory collection and mirrors every change to storage.
///
/// Persistence is best-effort: storage failures surface as warnings while the
/// in-memory collection keeps the change.
#[derive(Debug)]
pub struct JournalStore {
    entries: Vec<JournalEntry>,
    storage: Option<JournalStorage>,
    id_source: IdSource,
}

impl JournalStore {
    /// Loads the persisted collection and keeps the storage handle for
    /// subsequent writes.
    pub fn open(storage: JournalStorage) -> Self {
        let envelope = storage.read();
        Self {
            entries: entries::sort_by_recency(&envelope.entries),
            storage: Some(storage),
            id_source: entries::new_entry_id,
        }
    }

    /// An in-memory store with no backing file.
    pub fn detached(initial: Vec<JournalEntry>) -> Self {
        Self {
            entries: entries::sort_by_recency(&initial),
            storage: None,
            id_source: entries::new_entry_id,
        }
    }

    /// Swaps the generator used for new entry ids. The replacement must stay
    /// collision-free for the lifetime of the collection.
    pub fn with_id_source(mut self, id_source: IdSource) -> Self {
        self.id_source = id_source;
        self
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn entry_by_id(&self, id: &str) -> Option<&JournalEntry> {
        entries::entry_by_id(&self.entries, id)
    }

    pub fn create_entry(&mut self, draft: &EntryDraft) -> JournalEntry {
        let (next, created) = entries::create_entry_with(&self.entries, draft, self.id_source);
        self.entries = next;
        self.persist();
        created
    }

    pub fn update_entry(&mut self, id: &str, draft: &EntryDraft) -> Option<JournalEntry> {
        let (next, updated) = entries::update_entry(&self.entries, id, draft);
        if updated.is_some() {
            self.entries = next;
            self.persist();
        }
        updated
    }

    pub fn delete_entry(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries = entries::delete_entry(&self.entries, id);
        self.persist();
        self.entries.len() < before
    }

    /// Merges an imported batch into the collection. Empty batches are a
    /// no-op and leave storage untouched.
    pub fn import_entries(&mut self, incoming: &[JournalEntry]) {
        if incoming.is_empty() {
            return;
        }
        self.entries = entries::merge_entries(&self.entries, incoming);
        self.persist();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        if let Some(storage) = &self.storage {
            storage.clear();
        }
    }

    fn persist(&self) {
        if let Some(storage) = &self.storage {
            storage.write(&self.entries);
        }
    }
}
