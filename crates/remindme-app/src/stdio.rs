//! Line protocol spoken on stdin by `remindme serve`.
//!
//! Each line is either a command request, answered by the command surface,
//! or a notification event from the host, e.g.
//! `{"event":"notificationClicked","id":"<hash>"}`.

use serde::Deserialize;

use remindme_action::{CommandError, Request};

/// Host events that arrive on stdin next to requests.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event")]
pub enum HostEvent {
    /// The user clicked the notification called `id`.
    #[serde(rename = "notificationClicked", alias = "click")]
    NotificationClicked { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Request(Request),
    Event(HostEvent),
}

/// Parse one stdin line. Lines carrying an `event` key are host events;
/// everything else goes to the request parser.
pub fn parse_line(line: &str) -> Result<Inbound, CommandError> {
    let value: serde_json::Value = serde_json::from_str(line)
        .map_err(|e| CommandError::Validation(format!("Invalid request: {}", e)))?;
    if value.get("event").is_some() {
        return serde_json::from_value(value)
            .map(Inbound::Event)
            .map_err(|e| CommandError::Validation(format!("Invalid event: {}", e)));
    }
    Request::from_json(line).map(Inbound::Request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_line() {
        let parsed = parse_line(r#"{"event":"notificationClicked","id":"abc"}"#).unwrap();
        assert_eq!(
            parsed,
            Inbound::Event(HostEvent::NotificationClicked {
                id: "abc".to_string()
            })
        );
        let short = parse_line(r#"{"event":"click","id":"abc"}"#).unwrap();
        assert_eq!(short, parsed);
    }

    #[test]
    fn test_request_line() {
        assert_eq!(
            parse_line(r#"{"action":"nuke"}"#).unwrap(),
            Inbound::Request(Request::Nuke)
        );
    }

    #[test]
    fn test_bad_lines() {
        let err = parse_line(r#"{"event":"closed","id":"abc"}"#).unwrap_err();
        assert!(err.to_string().starts_with("Invalid event"));
        let err = parse_line(r#"{"event":"click"}"#).unwrap_err();
        assert!(err.to_string().starts_with("Invalid event"));
        let err = parse_line(r#"{"action":"snooze"}"#).unwrap_err();
        assert_eq!(err.to_string(), "Unknown action");
        let err = parse_line("not json").unwrap_err();
        assert!(err.to_string().starts_with("Invalid request"));
    }
}
