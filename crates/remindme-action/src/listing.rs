//! Upcoming/past view of the store.

use serde::Serialize;

use remindme_core::types::{Category, HashId, ReminderBook, ReminderRecord, Timestamp};

use crate::error::CommandError;
use crate::service::ReminderService;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedReminder {
    pub hash: HashId,
    #[serde(flatten)]
    pub record: ReminderRecord,
}

/// One category split at `now`. Both halves are sorted by time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryListing {
    pub upcoming: Vec<ListedReminder>,
    pub past: Vec<ListedReminder>,
}

impl CategoryListing {
    fn split<'a>(
        entries: impl Iterator<Item = (&'a HashId, &'a ReminderRecord)>,
        now: Timestamp,
    ) -> Self {
        let mut listing = CategoryListing::default();
        for (hash, record) in entries {
            let item = ListedReminder {
                hash: hash.clone(),
                record: record.clone(),
            };
            if record.timestamp > now {
                listing.upcoming.push(item);
            } else {
                listing.past.push(item);
            }
        }
        listing.upcoming.sort_by_key(|r| r.record.timestamp);
        listing.past.sort_by_key(|r| r.record.timestamp);
        listing
    }

    pub fn len(&self) -> usize {
        self.upcoming.len() + self.past.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderListing {
    pub url_reminders: CategoryListing,
    pub note_reminders: CategoryListing,
}

impl ReminderListing {
    pub fn from_book(book: &ReminderBook, now: Timestamp) -> Self {
        Self {
            url_reminders: CategoryListing::split(book.url_reminders.iter(), now),
            note_reminders: CategoryListing::split(book.note_reminders.iter(), now),
        }
    }

    pub fn category(&self, category: Category) -> &CategoryListing {
        match category {
            Category::Url => &self.url_reminders,
            Category::Note => &self.note_reminders,
        }
    }
}

impl ReminderService {
    pub async fn list(&self, now: Timestamp) -> Result<ReminderListing, CommandError> {
        let book = self.store.get_all().await?;
        Ok(ReminderListing::from_book(&book, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remindme_core::types::RepeatKind;

    fn rec(url: &str, text: &str, ts: i64) -> ReminderRecord {
        ReminderRecord::new(url.to_string(), text.to_string(), Timestamp(ts), RepeatKind::None)
    }

    #[test]
    fn test_split_and_sort() {
        let mut book = ReminderBook::default();
        book.url_reminders
            .insert(HashId::from("late"), rec("https://b.io", "", 3_000));
        book.url_reminders
            .insert(HashId::from("early"), rec("https://a.io", "", 2_000));
        book.url_reminders
            .insert(HashId::from("old"), rec("https://c.io", "", 500));
        book.note_reminders
            .insert(HashId::from("now"), rec("", "exactly now", 1_000));

        let listing = ReminderListing::from_book(&book, Timestamp(1_000));
        let urls = listing.category(Category::Url);
        let upcoming: Vec<&str> = urls.upcoming.iter().map(|r| r.hash.as_str()).collect();
        assert_eq!(upcoming, vec!["early", "late"]);
        assert_eq!(urls.past.len(), 1);

        // Equal to now counts as past.
        let notes = listing.category(Category::Note);
        assert!(notes.upcoming.is_empty());
        assert_eq!(notes.past[0].hash.as_str(), "now");
    }

    #[test]
    fn test_listed_reminder_serializes_flat() {
        let item = ListedReminder {
            hash: HashId::from("h"),
            record: rec("https://a.io", "", 7),
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["hash"], "h");
        assert_eq!(value["ts"], 7);
        assert_eq!(value["url"], "https://a.io");
    }
}
