//! Store and alarm changes applied as one step.
//!
//! Every mutation of the reminder store goes through [`ReminderService::apply`],
//! which performs the store half and then the matching alarm half. Alarms
//! are a best-effort mirror: a failed alarm call is logged, not returned.
//!
//! One alarm exists per hash. When the same hash is stored in both
//! categories, the alarm follows whichever unfired record is due first.

use tracing::warn;

use remindme_core::error::RemindmeError;
use remindme_core::types::{Category, HashId, ReminderBook, ReminderRecord, Timestamp};

use crate::error::CommandError;
use crate::service::ReminderService;

/// A change to reminder state.
#[derive(Debug, Clone)]
pub enum ReminderChange {
    /// Insert or replace a record, then (re)schedule its alarm.
    Upsert {
        category: Category,
        hash: HashId,
        record: ReminderRecord,
    },
    /// Swap the record stored under `old` for `record` under `hash`, in one
    /// write. Fails with `NotFound` when `old` is not in `category`.
    Replace {
        category: Category,
        old: HashId,
        hash: HashId,
        record: ReminderRecord,
    },
    /// Delete a record, then cancel its alarm.
    Remove { category: Category, hash: HashId },
    /// Empty both categories, then cancel every alarm they named.
    Clear,
    /// Flag a record as delivered.
    MarkFired { category: Category, hash: HashId },
    /// Move a repeating record to its next occurrence and reschedule.
    Rollover {
        category: Category,
        hash: HashId,
        next: Timestamp,
    },
    /// Flag every unfired record older than `now` as delivered.
    MarkMissed { now: Timestamp },
}

/// What [`ReminderService::apply`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Upserted,
    Replaced,
    Removed(ReminderRecord),
    Cleared(Vec<HashId>),
    /// Whether the record still existed.
    Marked(bool),
    /// Whether the record still existed.
    RolledOver(bool),
    /// Number of records flagged.
    MissedMarked(usize),
}

fn due_time(book: &ReminderBook, hash: &HashId) -> Option<Timestamp> {
    book.next_due(hash).map(|(_, record)| record.timestamp)
}

impl ReminderService {
    pub async fn apply(&self, change: ReminderChange) -> Result<Applied, CommandError> {
        match change {
            ReminderChange::Upsert {
                category,
                hash,
                record,
            } => {
                let due = self
                    .store
                    .transact(|book| {
                        book.category_mut(category).insert(hash.clone(), record);
                        Ok(due_time(book, &hash))
                    })
                    .await?;
                self.sync_alarm(&hash, due).await;
                Ok(Applied::Upserted)
            }
            ReminderChange::Replace {
                category,
                old,
                hash,
                record,
            } => {
                let (old_due, due) = self
                    .store
                    .transact(|book| {
                        let records = book.category_mut(category);
                        records
                            .remove(&old)
                            .ok_or_else(|| RemindmeError::NotFound(old.to_string()))?;
                        records.insert(hash.clone(), record);
                        Ok((due_time(book, &old), due_time(book, &hash)))
                    })
                    .await?;
                if old != hash {
                    self.sync_alarm(&old, old_due).await;
                }
                self.sync_alarm(&hash, due).await;
                Ok(Applied::Replaced)
            }
            ReminderChange::Remove { category, hash } => {
                let (removed, due) = self
                    .store
                    .transact(|book| {
                        let removed = book
                            .category_mut(category)
                            .remove(&hash)
                            .ok_or_else(|| RemindmeError::NotFound(hash.to_string()))?;
                        Ok((removed, due_time(book, &hash)))
                    })
                    .await?;
                self.sync_alarm(&hash, due).await;
                Ok(Applied::Removed(removed))
            }
            ReminderChange::Clear => {
                let previous = self.store.clear().await?;
                let hashes = previous.hashes();
                for hash in &hashes {
                    self.disarm(hash).await;
                }
                Ok(Applied::Cleared(hashes))
            }
            ReminderChange::MarkFired { category, hash } => {
                let (found, due) = self
                    .store
                    .transact(|book| {
                        let found = match book.category_mut(category).get_mut(&hash) {
                            Some(record) => {
                                record.fired = true;
                                true
                            }
                            None => false,
                        };
                        Ok((found, due_time(book, &hash)))
                    })
                    .await?;
                self.sync_alarm(&hash, due).await;
                Ok(Applied::Marked(found))
            }
            ReminderChange::Rollover {
                category,
                hash,
                next,
            } => {
                let (found, due) = self
                    .store
                    .transact(|book| {
                        let found = match book.category_mut(category).get_mut(&hash) {
                            Some(record) => {
                                record.timestamp = next;
                                record.fired = false;
                                true
                            }
                            None => false,
                        };
                        Ok((found, due_time(book, &hash)))
                    })
                    .await?;
                self.sync_alarm(&hash, due).await;
                Ok(Applied::RolledOver(found))
            }
            ReminderChange::MarkMissed { now } => {
                let count = self
                    .store
                    .transact(|book| {
                        let mut count = 0;
                        for (_, _, record) in book.records_mut() {
                            if record.is_missed(now) {
                                record.fired = true;
                                count += 1;
                            }
                        }
                        Ok(count)
                    })
                    .await?;
                Ok(Applied::MissedMarked(count))
            }
        }
    }

    /// Point the alarm named `hash` at `due`, or drop it when nothing is due.
    pub(crate) async fn sync_alarm(&self, hash: &HashId, due: Option<Timestamp>) {
        match due {
            Some(when) => self.arm(hash, when).await,
            None => self.disarm(hash).await,
        }
    }

    async fn arm(&self, hash: &HashId, when: Timestamp) {
        if let Err(e) = self.alarms.schedule(hash, when).await {
            warn!(hash = %hash, error = %e, "Alarm could not be scheduled");
        }
    }

    async fn disarm(&self, hash: &HashId) {
        if let Err(e) = self.alarms.cancel(hash).await {
            warn!(hash = %hash, error = %e, "Alarm could not be cancelled");
        }
    }
}
