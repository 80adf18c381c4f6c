//! Reminder lifecycle engine for remindme.
//!
//! Pairs every store mutation with the matching alarm call, reacts to alarms
//! and notification clicks, catches up on reminders missed while the host
//! was down, and answers the request/response command surface.

pub mod alarm;
pub mod command;
pub mod error;
pub mod firing;
pub mod lifecycle;
pub mod listing;
pub mod notify;
pub mod reconcile;
pub mod repeat;
pub mod runtime;
pub mod service;

pub use alarm::{AlarmBridge, TokioAlarmBridge};
pub use command::{ReminderPayload, Request, Response, ResponseStatus};
pub use error::{AlarmError, CommandError, NotifyError};
pub use firing::{build_notification, ClickOutcome, FireOutcome};
pub use lifecycle::{Applied, ReminderChange};
pub use listing::ReminderListing;
pub use notify::{LogNotifier, LogTabOpener, Notification, Notifier, TabOpener};
pub use reconcile::{StartupReport, MISSED_NOTIFICATION_ID};
pub use repeat::next_occurrence;
pub use runtime::{Background, BackgroundHandle, Event};
pub use service::{ReminderService, ServiceSettings};
