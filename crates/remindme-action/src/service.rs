//! The reminder service: store plus host collaborators.

use std::sync::Arc;

use remindme_core::config::RemindmeConfig;
use remindme_core::error::Result;
use remindme_core::zone::Zone;
use remindme_storage::ReminderStore;

use crate::alarm::AlarmBridge;
use crate::notify::{Notifier, TabOpener};

/// Settings the service reads on every event.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub zone: Zone,
    pub require_future_time: bool,
    pub notify_missed: bool,
    pub title_prefix: String,
    pub icon: String,
}

impl ServiceSettings {
    pub fn from_config(config: &RemindmeConfig) -> Result<Self> {
        Ok(Self {
            zone: config.reminders.zone()?,
            require_future_time: config.reminders.require_future_time,
            notify_missed: config.reminders.notify_missed,
            title_prefix: config.notifications.title_prefix.clone(),
            icon: config.notifications.icon.clone(),
        })
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        // Defaults come from the config defaults, whose zone always parses.
        let config = RemindmeConfig::default();
        Self {
            zone: Zone::Local,
            require_future_time: config.reminders.require_future_time,
            notify_missed: config.reminders.notify_missed,
            title_prefix: config.notifications.title_prefix,
            icon: config.notifications.icon,
        }
    }
}

/// Owns the reminder store and the alarm, notification, and tab capabilities.
///
/// Command handling lives in [`crate::command`], alarm and click reactions
/// in [`crate::firing`], and the startup pass in [`crate::reconcile`].
pub struct ReminderService {
    pub(crate) store: Arc<ReminderStore>,
    pub(crate) alarms: Arc<dyn AlarmBridge>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) opener: Arc<dyn TabOpener>,
    pub(crate) settings: ServiceSettings,
}

impl ReminderService {
    pub fn new(
        store: Arc<ReminderStore>,
        alarms: Arc<dyn AlarmBridge>,
        notifier: Arc<dyn Notifier>,
        opener: Arc<dyn TabOpener>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            store,
            alarms,
            notifier,
            opener,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<ReminderStore> {
        &self.store
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }
}
