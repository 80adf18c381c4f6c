//! Content-hash identity for reminders.

use sha2::{Digest, Sha256};

use crate::types::HashId;

/// SHA-256 of the subject's UTF-8 bytes as 64 lowercase hex characters.
pub fn hash_subject(subject: &str) -> HashId {
    let mut hasher = Sha256::new();
    hasher.update(subject.as_bytes());
    HashId(format!("{:x}", hasher.finalize()))
}

/// Hash of a reminder's subject: the url when present, the text otherwise.
pub fn hash_reminder(url: &str, text: &str) -> HashId {
    if url.is_empty() {
        hash_subject(text)
    } else {
        hash_subject(url)
    }
}
