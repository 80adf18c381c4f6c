//! Alarm fire and notification click handling.

use tracing::{debug, info, warn};

use remindme_core::types::{HashId, ReminderRecord, Timestamp};
use remindme_core::url::is_openable;
use remindme_core::zone::Zone;

use crate::error::CommandError;
use crate::lifecycle::ReminderChange;
use crate::notify::Notification;
use crate::repeat::next_occurrence;
use crate::service::ReminderService;

/// Result of handling an alarm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FireOutcome {
    /// No reminder under that name any more.
    Dropped,
    /// Delivered and marked fired.
    Fired,
    /// Delivered and moved to its next occurrence.
    Rescheduled(Timestamp),
}

/// Result of handling a notification click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The reminder's URL was opened.
    Opened(String),
    /// Nothing to open: no such reminder, no URL, or a non-http URL.
    Dismissed,
}

/// Notification content for a reminder.
pub fn build_notification(
    hash: &HashId,
    record: &ReminderRecord,
    zone: &Zone,
    prefix: &str,
    icon: &str,
) -> Notification {
    let time = zone.format_time(record.timestamp);
    let (title, message) = match (record.url.is_empty(), record.text.is_empty()) {
        (false, true) => (
            prefix.to_string(),
            format!("You were supposed to look at {} at {}!", record.url, time),
        ),
        (false, false) => (
            format!(
                "{} You were supposed to look at {} at {}!",
                prefix, record.url, time
            ),
            record.text.clone(),
        ),
        (true, _) => (
            format!("{} You put a reminder for {}!", prefix, time),
            record.text.clone(),
        ),
    };
    Notification {
        id: hash.to_string(),
        title,
        message,
        icon: icon.to_string(),
    }
}

impl ReminderService {
    /// React to the alarm called `hash` going off.
    ///
    /// Delivers the earliest unfired record stored under `hash`. When the
    /// other category holds a record with the same hash, the alarm is then
    /// moved on to it.
    pub async fn on_alarm(&self, hash: &HashId) -> Result<FireOutcome, CommandError> {
        let book = self.store.get_all().await?;
        let Some((category, record)) = book
            .next_due(hash)
            .map(|(category, record)| (category, record.clone()))
        else {
            debug!(hash = %hash, "Alarm fired for unknown reminder, dropping");
            return Ok(FireOutcome::Dropped);
        };

        let settings = &self.settings;
        let notification = build_notification(
            hash,
            &record,
            &settings.zone,
            &settings.title_prefix,
            &settings.icon,
        );
        if let Err(e) = self.notifier.show(&notification).await {
            warn!(hash = %hash, error = %e, "Failed to show reminder notification");
        }

        match next_occurrence(record.timestamp, record.repeat, &settings.zone) {
            Some(next) => {
                self.apply(ReminderChange::Rollover {
                    category,
                    hash: hash.clone(),
                    next,
                })
                .await?;
                info!(
                    hash = %hash,
                    category = %category,
                    repeat = %record.repeat,
                    next = %next,
                    "Repeating reminder rescheduled"
                );
                Ok(FireOutcome::Rescheduled(next))
            }
            None => {
                self.apply(ReminderChange::MarkFired {
                    category,
                    hash: hash.clone(),
                })
                .await?;
                info!(hash = %hash, category = %category, "Reminder fired");
                Ok(FireOutcome::Fired)
            }
        }
    }

    /// React to a click on the notification called `id`.
    ///
    /// Opens the reminder's URL when it is an http(s) URL and always clears
    /// the notification. The reminder itself is left untouched.
    pub async fn on_notification_click(&self, id: &str) -> ClickOutcome {
        let url = match self.store.find(&HashId::from(id)).await {
            Ok(Some((_, record))) if is_openable(&record.url) => Some(record.url),
            Ok(_) => None,
            Err(e) => {
                warn!(id = %id, error = %e, "Failed to look up clicked reminder");
                None
            }
        };

        let outcome = match url {
            Some(url) => match self.opener.open(&url).await {
                Ok(()) => ClickOutcome::Opened(url),
                Err(e) => {
                    warn!(id = %id, error = %e, "Failed to open reminder URL");
                    ClickOutcome::Dismissed
                }
            },
            None => ClickOutcome::Dismissed,
        };

        if let Err(e) = self.notifier.clear(id).await {
            warn!(id = %id, error = %e, "Failed to clear notification");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use remindme_core::types::RepeatKind;

    fn zone() -> Zone {
        Zone::parse("Europe/Berlin").unwrap()
    }

    fn record(url: &str, text: &str) -> ReminderRecord {
        let naive = NaiveDate::from_ymd_opt(2026, 6, 1)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap();
        ReminderRecord::new(
            url.to_string(),
            text.to_string(),
            zone().from_local(naive),
            RepeatKind::None,
        )
    }

    #[test]
    fn test_url_only_notification() {
        let n = build_notification(
            &HashId::from("h"),
            &record("https://example.com", ""),
            &zone(),
            "[remindme]",
            "icon48.png",
        );
        assert_eq!(n.id, "h");
        assert_eq!(n.title, "[remindme]");
        assert_eq!(
            n.message,
            "You were supposed to look at https://example.com at 14:05!"
        );
        assert_eq!(n.icon, "icon48.png");
    }

    #[test]
    fn test_url_and_text_notification() {
        let n = build_notification(
            &HashId::from("h"),
            &record("https://example.com", "read the docs"),
            &zone(),
            "[remindme]",
            "icon48.png",
        );
        assert_eq!(
            n.title,
            "[remindme] You were supposed to look at https://example.com at 14:05!"
        );
        assert_eq!(n.message, "read the docs");
    }

    #[test]
    fn test_text_only_notification() {
        let n = build_notification(
            &HashId::from("h"),
            &record("", "call mom"),
            &zone(),
            "[remindme]",
            "icon48.png",
        );
        assert_eq!(n.title, "[remindme] You put a reminder for 14:05!");
        assert_eq!(n.message, "call mom");
    }
}
