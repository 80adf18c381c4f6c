//! Startup catch-up pass.
//!
//! Reminders whose time passed while nothing was running are marked fired
//! and summarised in one notification. Alarms are then re-armed for what is
//! still pending, since in-process timers do not outlive the process.

use serde::Serialize;
use tracing::{info, warn};

use remindme_core::types::Timestamp;

use crate::error::CommandError;
use crate::lifecycle::{Applied, ReminderChange};
use crate::notify::Notification;
use crate::service::ReminderService;

/// Notification id of the aggregate missed-reminders notice.
pub const MISSED_NOTIFICATION_ID: &str = "missedReminders";

const MISSED_MESSAGE: &str = "You missed some reminders while the browser was closed!";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StartupReport {
    /// Reminders marked fired without being delivered.
    pub missed: usize,
    /// Alarms scheduled for pending reminders.
    pub rearmed: usize,
    /// Whether the aggregate notification was shown.
    pub notified: bool,
}

impl ReminderService {
    /// Mark every overdue unfired reminder as fired.
    ///
    /// Returns how many were marked and whether the aggregate notification
    /// was shown.
    pub async fn reconcile_missed(&self, now: Timestamp) -> Result<(usize, bool), CommandError> {
        let missed = match self.apply(ReminderChange::MarkMissed { now }).await? {
            Applied::MissedMarked(count) => count,
            _ => 0,
        };
        if missed == 0 || !self.settings.notify_missed {
            return Ok((missed, false));
        }

        let notification = Notification {
            id: MISSED_NOTIFICATION_ID.to_string(),
            title: self.settings.title_prefix.clone(),
            message: MISSED_MESSAGE.to_string(),
            icon: self.settings.icon.clone(),
        };
        match self.notifier.show(&notification).await {
            Ok(()) => Ok((missed, true)),
            Err(e) => {
                warn!(error = %e, "Failed to show missed reminders notification");
                Ok((missed, false))
            }
        }
    }

    /// Schedule one alarm per hash that still has an unfired reminder, at
    /// its earliest due time. Returns the count.
    pub async fn rearm(&self) -> Result<usize, CommandError> {
        let book = self.store.get_all().await?;
        let mut rearmed = 0;
        for hash in book.hashes() {
            if let Some((_, record)) = book.next_due(&hash) {
                self.sync_alarm(&hash, Some(record.timestamp)).await;
                rearmed += 1;
            }
        }
        Ok(rearmed)
    }

    /// Reconcile, then re-arm.
    pub async fn startup(&self, now: Timestamp) -> Result<StartupReport, CommandError> {
        let (missed, notified) = self.reconcile_missed(now).await?;
        let rearmed = self.rearm().await?;
        info!(missed, rearmed, notified, "Startup reconciliation complete");
        Ok(StartupReport {
            missed,
            rearmed,
            notified,
        })
    }
}
