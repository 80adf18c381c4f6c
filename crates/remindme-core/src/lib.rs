//! Core types, identity, errors, and configuration for remindme.

pub mod config;
pub mod error;
pub mod hash;
pub mod types;
pub mod url;
pub mod zone;

pub use config::RemindmeConfig;
pub use error::{RemindmeError, Result};
pub use hash::{hash_reminder, hash_subject};
pub use types::*;
pub use zone::Zone;
