pub mod cli;
pub mod config;
pub mod entries;
pub mod search;
pub mod storage;
pub mod store;
pub mod tags;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use entries::{EntryDraft, JournalEntry};
pub use store::JournalStore;
