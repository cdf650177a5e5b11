//! Audit journal adapter

mod jsonl_journal;

pub use jsonl_journal::JsonlJournal;
