//! Request/response command surface.
//!
//! Every request produces exactly one [`Response`]. Handler errors are
//! folded into an error response and never escape [`ReminderService::handle`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use remindme_core::hash::hash_reminder;
use remindme_core::types::{Category, HashId, ReminderRecord, RepeatKind, Timestamp};
use remindme_core::url::{is_likely_url, normalize_url};

use crate::error::CommandError;
use crate::lifecycle::ReminderChange;
use crate::service::ReminderService;

/// Fields of a set or update request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Fire time, epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    #[serde(
        rename = "type",
        alias = "category",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_type: Option<RepeatKind>,
    /// Hash of the reminder being edited (update only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<HashId>,
}

/// Fields of a delete request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletePayload {
    pub hash: HashId,
    /// When absent, both categories are searched.
    #[serde(
        rename = "type",
        alias = "category",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<Category>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Request {
    #[serde(rename = "setReminder", alias = "set")]
    Set(ReminderPayload),
    #[serde(rename = "updateReminder", alias = "update")]
    Update(ReminderPayload),
    #[serde(rename = "deleteReminder", alias = "delete")]
    Delete(DeletePayload),
    #[serde(rename = "nukeAllReminders", alias = "nuke")]
    Nuke,
}

const ACTIONS: &[&str] = &[
    "setReminder",
    "set",
    "updateReminder",
    "update",
    "deleteReminder",
    "delete",
    "nukeAllReminders",
    "nuke",
];

impl Request {
    /// Parse one JSON request.
    pub fn from_json(input: &str) -> Result<Self, CommandError> {
        let value: serde_json::Value = serde_json::from_str(input)
            .map_err(|e| CommandError::Validation(format!("Invalid request: {}", e)))?;
        match value.get("action").and_then(|a| a.as_str()) {
            Some(action) if ACTIONS.contains(&action) => {}
            _ => return Err(CommandError::Validation("Unknown action".to_string())),
        }
        serde_json::from_value(value)
            .map_err(|e| CommandError::Validation(format!("Invalid request: {}", e)))
    }

    pub fn action(&self) -> &'static str {
        match self {
            Request::Set(_) => "setReminder",
            Request::Update(_) => "updateReminder",
            Request::Delete(_) => "deleteReminder",
            Request::Nuke => "nukeAllReminders",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<HashId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Response {
    pub fn success() -> Self {
        Self {
            status: ResponseStatus::Success,
            hash: None,
            message: None,
        }
    }

    pub fn with_hash(hash: HashId) -> Self {
        Self {
            hash: Some(hash),
            ..Self::success()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            hash: None,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

impl From<CommandError> for Response {
    fn from(err: CommandError) -> Self {
        Response::error(err.to_string())
    }
}

impl ReminderService {
    /// Handle one request. `now` is used for the optional future-time check.
    pub async fn handle(&self, request: Request, now: Timestamp) -> Response {
        let action = request.action();
        let result = match request {
            Request::Set(payload) => self.save_reminder(payload, None, now).await,
            Request::Update(payload) => {
                let previous = payload.hash.clone();
                self.save_reminder(payload, previous, now).await
            }
            Request::Delete(payload) => self
                .delete_reminder(payload)
                .await
                .map(|()| Response::success()),
            Request::Nuke => self
                .apply(ReminderChange::Clear)
                .await
                .map(|_| Response::success()),
        };
        match result {
            Ok(response) => response,
            Err(e) => {
                debug!(action, error = %e, "Request rejected");
                Response::from(e)
            }
        }
    }

    async fn save_reminder(
        &self,
        payload: ReminderPayload,
        previous: Option<HashId>,
        now: Timestamp,
    ) -> Result<Response, CommandError> {
        let time = match payload.time {
            None | Some(0) => {
                return Err(CommandError::Validation("No time provided".to_string()))
            }
            Some(t) if t < 0 || !Timestamp(t).is_representable() => {
                return Err(CommandError::Validation("Invalid time".to_string()))
            }
            Some(t) => Timestamp(t),
        };

        let raw_url = payload.url.as_deref().unwrap_or("").trim();
        if !raw_url.is_empty() && !is_likely_url(raw_url) {
            return Err(CommandError::Validation(
                "Please enter a valid URL (e.g. example.com or https://example.com)".to_string(),
            ));
        }
        let url = normalize_url(raw_url);
        let text = payload.text.unwrap_or_default();
        if url.is_empty() && text.trim().is_empty() {
            return Err(CommandError::Validation(
                "A reminder needs a URL or a note".to_string(),
            ));
        }
        if self.settings.require_future_time && time <= now {
            return Err(CommandError::Validation(
                "Reminder time must be in the future".to_string(),
            ));
        }

        let category = payload.category.unwrap_or_else(|| Category::infer(&url));
        let hash = hash_reminder(&url, &text);

        let repeat = payload.repeat_type.unwrap_or_default();
        let record = ReminderRecord::new(url, text, time, repeat);
        let change = match previous {
            Some(old) => ReminderChange::Replace {
                category,
                old,
                hash: hash.clone(),
                record,
            },
            None => ReminderChange::Upsert {
                category,
                hash: hash.clone(),
                record,
            },
        };
        self.apply(change).await?;

        info!(hash = %hash, category = %category, repeat = %repeat, "Reminder saved");
        Ok(Response::with_hash(hash))
    }

    async fn delete_reminder(&self, payload: DeletePayload) -> Result<(), CommandError> {
        let category = match payload.category {
            Some(category) => category,
            None => self
                .store
                .find(&payload.hash)
                .await?
                .map(|(category, _)| category)
                .ok_or_else(|| CommandError::NotFound(payload.hash.to_string()))?,
        };
        self.apply(ReminderChange::Remove {
            category,
            hash: payload.hash.clone(),
        })
        .await?;
        info!(hash = %payload.hash, category = %category, "Reminder deleted");
        Ok(())
    }
}
