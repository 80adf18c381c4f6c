//! Reminder store: the persisted category -> (hash -> record) map.
//!
//! Every operation is a full read-modify-write of the `reminders` value.
//! An async mutex serializes those cycles so two requests can never read
//! the same snapshot and overwrite each other's changes.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use remindme_core::error::{RemindmeError, Result};
use remindme_core::types::{Category, HashId, ReminderBook, ReminderRecord, SectionStates};

use crate::backend::KeyValueBackend;

/// Backend key holding the reminder map.
pub const REMINDERS_KEY: &str = "reminders";
/// Backend key holding the popup tab state.
pub const SECTION_STATES_KEY: &str = "sectionStates";

/// Serialized access to the persisted reminder map.
pub struct ReminderStore {
    backend: Arc<dyn KeyValueBackend>,
    lock: Mutex<()>,
}

impl ReminderStore {
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self {
            backend,
            lock: Mutex::new(()),
        }
    }

    /// Current reminder map, with empty categories if nothing is persisted.
    pub async fn get_all(&self) -> Result<ReminderBook> {
        let _guard = self.lock.lock().await;
        self.read()
    }

    /// Overwrite the persisted map wholesale.
    pub async fn set_all(&self, book: &ReminderBook) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.write(book)
    }

    /// Insert or replace a record. Last writer wins.
    pub async fn upsert(
        &self,
        category: Category,
        hash: HashId,
        record: ReminderRecord,
    ) -> Result<()> {
        self.transact(|book| {
            book.category_mut(category).insert(hash, record);
            Ok(())
        })
        .await
    }

    /// Delete a record, failing with `NotFound` if the category lacks it.
    pub async fn remove(&self, category: Category, hash: &HashId) -> Result<ReminderRecord> {
        self.transact(|book| {
            book.category_mut(category)
                .remove(hash)
                .ok_or_else(|| RemindmeError::NotFound(hash.to_string()))
        })
        .await
    }

    /// Reset both categories, returning what was there before.
    pub async fn clear(&self) -> Result<ReminderBook> {
        self.transact(|book| Ok(std::mem::take(book))).await
    }

    /// Look a hash up across both categories.
    pub async fn find(&self, hash: &HashId) -> Result<Option<(Category, ReminderRecord)>> {
        let book = self.get_all().await?;
        Ok(book.find(hash).map(|(c, r)| (c, r.clone())))
    }

    /// Run `f` against the current map and persist the result.
    ///
    /// Nothing is written when `f` fails or leaves the map unchanged.
    pub async fn transact<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut ReminderBook) -> Result<T>,
    {
        let _guard = self.lock.lock().await;
        let before = self.read()?;
        let mut book = before.clone();
        let out = f(&mut book)?;
        if book != before {
            self.write(&book)?;
        }
        Ok(out)
    }

    /// Persisted popup tab state, or the default tabs.
    pub async fn section_states(&self) -> Result<SectionStates> {
        let _guard = self.lock.lock().await;
        match self.backend.get(SECTION_STATES_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(SectionStates::default()),
        }
    }

    pub async fn save_section_states(&self, states: &SectionStates) -> Result<()> {
        let _guard = self.lock.lock().await;
        let raw = serde_json::to_string(states)?;
        self.backend.set(SECTION_STATES_KEY, &raw)
    }

    fn read(&self) -> Result<ReminderBook> {
        match self.backend.get(REMINDERS_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(ReminderBook::default()),
        }
    }

    fn write(&self, book: &ReminderBook) -> Result<()> {
        let raw = serde_json::to_string(book)?;
        self.backend.set(REMINDERS_KEY, &raw)?;
        debug!(reminders = book.len(), "Reminder store persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use remindme_core::types::{RepeatKind, Timestamp};

    fn store() -> ReminderStore {
        ReminderStore::new(Arc::new(MemoryBackend::new()))
    }

    fn note(text: &str, ts: i64) -> ReminderRecord {
        ReminderRecord::new(String::new(), text.to_string(), Timestamp(ts), RepeatKind::None)
    }

    #[tokio::test]
    async fn test_get_all_defaults_empty() {
        let book = store().get_all().await.unwrap();
        assert!(book.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_and_find() {
        let s = store();
        s.upsert(Category::Note, HashId::from("h"), note("milk", 10))
            .await
            .unwrap();
        let (cat, rec) = s.find(&HashId::from("h")).await.unwrap().unwrap();
        assert_eq!(cat, Category::Note);
        assert_eq!(rec.text, "milk");
        assert!(s.find(&HashId::from("other")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_overwrites_same_hash() {
        let s = store();
        s.upsert(Category::Note, HashId::from("h"), note("first", 1))
            .await
            .unwrap();
        s.upsert(Category::Note, HashId::from("h"), note("second", 2))
            .await
            .unwrap();
        let book = s.get_all().await.unwrap();
        assert_eq!(book.note_reminders.len(), 1);
        assert_eq!(book.note_reminders[&HashId::from("h")].text, "second");
    }

    #[tokio::test]
    async fn test_remove_missing_is_not_found_and_leaves_store() {
        let s = store();
        s.upsert(Category::Note, HashId::from("h"), note("keep", 1))
            .await
            .unwrap();
        let before = s.get_all().await.unwrap();

        let err = s.remove(Category::Url, &HashId::from("h")).await.unwrap_err();
        assert!(matches!(err, RemindmeError::NotFound(_)));
        assert_eq!(s.get_all().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_remove_existing() {
        let s = store();
        s.upsert(Category::Note, HashId::from("h"), note("gone", 1))
            .await
            .unwrap();
        let removed = s.remove(Category::Note, &HashId::from("h")).await.unwrap();
        assert_eq!(removed.text, "gone");
        assert!(s.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_returns_previous() {
        let s = store();
        s.upsert(Category::Note, HashId::from("a"), note("a", 1))
            .await
            .unwrap();
        s.upsert(Category::Url, HashId::from("b"), note("b", 1))
            .await
            .unwrap();
        let previous = s.clear().await.unwrap();
        assert_eq!(previous.len(), 2);
        assert!(s.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transact_failure_writes_nothing() {
        let s = store();
        let result: Result<()> = s
            .transact(|book| {
                book.category_mut(Category::Note)
                    .insert(HashId::from("x"), note("x", 1));
                Err(RemindmeError::Validation("abort".to_string()))
            })
            .await;
        assert!(result.is_err());
        assert!(s.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_upserts_are_not_lost() {
        let s = Arc::new(store());
        let mut handles = Vec::new();
        for i in 0..20 {
            let s = Arc::clone(&s);
            handles.push(tokio::spawn(async move {
                s.upsert(Category::Note, HashId(format!("h{}", i)), note("n", i))
                    .await
                    .unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(s.get_all().await.unwrap().note_reminders.len(), 20);
    }

    #[tokio::test]
    async fn test_section_states_default_and_save() {
        let s = store();
        assert_eq!(s.section_states().await.unwrap(), SectionStates::default());
        let states = SectionStates {
            active_tab: "notes".to_string(),
            sub_tab: "pastNote".to_string(),
        };
        s.save_section_states(&states).await.unwrap();
        assert_eq!(s.section_states().await.unwrap(), states);
    }

    #[tokio::test]
    async fn test_corrupt_value_is_serialization_error() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set(REMINDERS_KEY, "not json").unwrap();
        let s = ReminderStore::new(backend);
        assert!(matches!(
            s.get_all().await,
            Err(RemindmeError::Serialization(_))
        ));
    }
}
