use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Value Objects
// =============================================================================

/// Milliseconds since the Unix epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    pub fn from_datetime<Tz: chrono::TimeZone>(dt: &DateTime<Tz>) -> Self {
        Self(dt.timestamp_millis())
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.0).unwrap_or_default()
    }

    /// Within the range calendar arithmetic can represent.
    pub fn is_representable(&self) -> bool {
        DateTime::from_timestamp_millis(self.0).is_some()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content-derived reminder identifier (lowercase hex SHA-256).
///
/// Used both as the store key and as the alarm / notification name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashId(pub String);

impl HashId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HashId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HashId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// =============================================================================
// Enums
// =============================================================================

/// Partition of the reminder store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "url-reminders", alias = "url")]
    Url,
    #[serde(rename = "note-reminders", alias = "notes")]
    Note,
}

impl Category {
    /// Lookup order used whenever a hash is resolved across both categories.
    pub const ALL: [Category; 2] = [Category::Url, Category::Note];

    /// Category a new reminder lands in when the caller does not name one.
    pub fn infer(url: &str) -> Self {
        if url.is_empty() {
            Category::Note
        } else {
            Category::Url
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Url => write!(f, "url-reminders"),
            Category::Note => write!(f, "note-reminders"),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "url-reminders" | "url" => Ok(Category::Url),
            "note-reminders" | "notes" => Ok(Category::Note),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

/// Repeat cadence of a reminder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatKind {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

impl RepeatKind {
    pub fn is_repeating(&self) -> bool {
        !matches!(self, RepeatKind::None)
    }

    /// Short label shown next to a reminder's time.
    pub fn label(&self) -> &'static str {
        match self {
            RepeatKind::None => "",
            RepeatKind::Daily => "Daily",
            RepeatKind::Weekly => "Weekly",
            RepeatKind::Monthly => "Monthly",
        }
    }
}

impl fmt::Display for RepeatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepeatKind::None => write!(f, "none"),
            RepeatKind::Daily => write!(f, "daily"),
            RepeatKind::Weekly => write!(f, "weekly"),
            RepeatKind::Monthly => write!(f, "monthly"),
        }
    }
}

impl std::str::FromStr for RepeatKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" | "" => Ok(RepeatKind::None),
            "daily" => Ok(RepeatKind::Daily),
            "weekly" => Ok(RepeatKind::Weekly),
            "monthly" => Ok(RepeatKind::Monthly),
            _ => Err(format!("Unknown repeat kind: {}", s)),
        }
    }
}

// =============================================================================
// Domain Structs
// =============================================================================

/// A single persisted reminder.
///
/// Invariant: `url` and `text` are not both empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRecord {
    #[serde(default)]
    pub url: String,
    #[serde(rename = "ts")]
    pub timestamp: Timestamp,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub fired: bool,
    #[serde(rename = "repeatType", default)]
    pub repeat: RepeatKind,
    /// The time given when the reminder was created, before any rollover.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_time: Option<Timestamp>,
}

impl ReminderRecord {
    /// Build an unfired reminder.
    pub fn new(url: String, text: String, timestamp: Timestamp, repeat: RepeatKind) -> Self {
        Self {
            url,
            timestamp,
            text,
            fired: false,
            repeat,
            original_time: Some(timestamp),
        }
    }

    /// The string the reminder's hash is derived from.
    pub fn subject(&self) -> &str {
        if self.url.is_empty() {
            &self.text
        } else {
            &self.url
        }
    }

    /// Past its time without having been delivered.
    pub fn is_missed(&self, now: Timestamp) -> bool {
        self.timestamp < now && !self.fired
    }
}

/// The whole persisted reminder map: category -> (hash -> record).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderBook {
    #[serde(rename = "url-reminders", alias = "url", default)]
    pub url_reminders: BTreeMap<HashId, ReminderRecord>,
    #[serde(rename = "note-reminders", alias = "notes", default)]
    pub note_reminders: BTreeMap<HashId, ReminderRecord>,
}

impl ReminderBook {
    pub fn category(&self, category: Category) -> &BTreeMap<HashId, ReminderRecord> {
        match category {
            Category::Url => &self.url_reminders,
            Category::Note => &self.note_reminders,
        }
    }

    pub fn category_mut(&mut self, category: Category) -> &mut BTreeMap<HashId, ReminderRecord> {
        match category {
            Category::Url => &mut self.url_reminders,
            Category::Note => &mut self.note_reminders,
        }
    }

    /// Resolve a hash across both categories, url reminders first.
    pub fn find(&self, hash: &HashId) -> Option<(Category, &ReminderRecord)> {
        Category::ALL
            .into_iter()
            .find_map(|c| self.category(c).get(hash).map(|r| (c, r)))
    }

    /// Earliest unfired record stored under `hash`, url reminders first on ties.
    ///
    /// A subject can hash identically in both categories. The single alarm
    /// named by that hash always tracks this record.
    pub fn next_due(&self, hash: &HashId) -> Option<(Category, &ReminderRecord)> {
        Category::ALL
            .into_iter()
            .filter_map(|c| self.category(c).get(hash).map(|r| (c, r)))
            .filter(|(_, r)| !r.fired)
            .min_by_key(|(_, r)| r.timestamp)
    }

    /// Every distinct hash in either category, sorted.
    pub fn hashes(&self) -> Vec<HashId> {
        self.url_reminders
            .keys()
            .chain(self.note_reminders.keys())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Mutable access to every record, tagged with its category and hash.
    pub fn records_mut(
        &mut self,
    ) -> impl Iterator<Item = (Category, &HashId, &mut ReminderRecord)> + '_ {
        self.url_reminders
            .iter_mut()
            .map(|(h, r)| (Category::Url, h, r))
            .chain(
                self.note_reminders
                    .iter_mut()
                    .map(|(h, r)| (Category::Note, h, r)),
            )
    }

    pub fn len(&self) -> usize {
        self.url_reminders.len() + self.note_reminders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Popup tab state. Persisted alongside reminders but never read by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionStates {
    pub active_tab: String,
    pub sub_tab: String,
}

impl Default for SectionStates {
    fn default() -> Self {
        Self {
            active_tab: "url".to_string(),
            sub_tab: "futureUrl".to_string(),
        }
    }
}
