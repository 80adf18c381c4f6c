//! Alarm bridge: one named one-shot timer per active reminder.
//!
//! The bridge never reads or writes the reminder store. Keeping the two in
//! step is the job of [`crate::lifecycle`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use remindme_core::types::{HashId, Timestamp};

use crate::error::AlarmError;

/// Host timer capability, named by reminder hash.
#[async_trait]
pub trait AlarmBridge: Send + Sync {
    /// Replace any alarm called `name` with one firing at `when`.
    async fn schedule(&self, name: &HashId, when: Timestamp) -> Result<(), AlarmError>;

    /// Remove the alarm called `name`. Returns whether one existed.
    async fn cancel(&self, name: &HashId) -> Result<bool, AlarmError>;

    /// Names of alarms that have not fired or been cancelled.
    async fn pending(&self) -> Vec<HashId>;
}

struct AlarmEntry {
    when: Timestamp,
    generation: u64,
    handle: JoinHandle<()>,
}

type AlarmTable = Arc<Mutex<HashMap<HashId, AlarmEntry>>>;

/// Alarm bridge backed by tokio timers.
///
/// Each alarm is a spawned sleep. When it elapses the alarm removes itself
/// and its name is sent on the channel returned by [`TokioAlarmBridge::new`].
/// Times in the past fire immediately.
pub struct TokioAlarmBridge {
    entries: AlarmTable,
    next_generation: AtomicU64,
    fired_tx: mpsc::UnboundedSender<HashId>,
}

impl TokioAlarmBridge {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<HashId>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let bridge = Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
            fired_tx,
        };
        (bridge, fired_rx)
    }

    /// Fire time of a pending alarm.
    pub fn fire_time(&self, name: &HashId) -> Option<Timestamp> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(name).map(|e| e.when))
    }

    fn table(&self) -> Result<MutexGuard<'_, HashMap<HashId, AlarmEntry>>, AlarmError> {
        self.entries
            .lock()
            .map_err(|e| AlarmError::Failed(format!("Alarm table lock poisoned: {}", e)))
    }
}

#[async_trait]
impl AlarmBridge for TokioAlarmBridge {
    async fn schedule(&self, name: &HashId, when: Timestamp) -> Result<(), AlarmError> {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let delay_ms = (when.0 - Timestamp::now().0).max(0) as u64;

        {
            let mut entries = self.table()?;
            if let Some(previous) = entries.remove(name) {
                previous.handle.abort();
            }

            let table = Arc::clone(&self.entries);
            let fired_tx = self.fired_tx.clone();
            let alarm = name.clone();
            let handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                // A reschedule after this task was spawned owns the name now.
                let current = match table.lock() {
                    Ok(mut entries) => match entries.get(&alarm) {
                        Some(entry) if entry.generation == generation => {
                            entries.remove(&alarm);
                            true
                        }
                        _ => false,
                    },
                    Err(_) => false,
                };
                if current {
                    let _ = fired_tx.send(alarm);
                }
            });

            entries.insert(
                name.clone(),
                AlarmEntry {
                    when,
                    generation,
                    handle,
                },
            );
        }

        debug!(hash = %name, when = %when, delay_ms, "Alarm scheduled");
        Ok(())
    }

    async fn cancel(&self, name: &HashId) -> Result<bool, AlarmError> {
        let removed = self.table()?.remove(name);
        match removed {
            Some(entry) => {
                entry.handle.abort();
                debug!(hash = %name, "Alarm cancelled");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn pending(&self) -> Vec<HashId> {
        let mut names: Vec<HashId> = match self.entries.lock() {
            Ok(entries) => entries.keys().cloned().collect(),
            Err(_) => return vec![],
        };
        names.sort();
        names
    }
}

impl Drop for TokioAlarmBridge {
    fn drop(&mut self) {
        if let Ok(mut entries) = self.entries.lock() {
            for (_, entry) in entries.drain() {
                entry.handle.abort();
            }
        }
    }
}
