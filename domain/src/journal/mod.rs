//! Journal domain module
//!
//! The audit journal is an append-only sequence of [`JournalEntry`] values.
//! Entries written by one engine invocation share a [`SessionId`]; their
//! write order is the order in which undo replays them backwards.

pub mod entities;

pub use entities::{EntryKind, JournalEntry, SessionId, StepOutcome};
