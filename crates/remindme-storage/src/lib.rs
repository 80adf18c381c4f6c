//! remindme storage crate: key-value backends and the reminder store.
//!
//! The persisted state is two opaque JSON values (`reminders` and
//! `sectionStates`) held by a [`KeyValueBackend`]. [`ReminderStore`] layers
//! serialized read-modify-write access to the reminder map on top of it.

pub mod backend;
pub mod db;
pub mod migrations;
pub mod store;

pub use backend::{KeyValueBackend, MemoryBackend};
pub use db::Database;
pub use store::{ReminderStore, REMINDERS_KEY, SECTION_STATES_KEY};
