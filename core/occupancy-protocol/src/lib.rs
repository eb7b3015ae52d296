//! Wire types for the occupancy data source.
//!
//! Shared by the core and its clients so the shape of the two read-only
//! endpoints (`/api/attendance-data` and `/api/status`) lives in one place.
//! Timestamps stay as the raw source strings here; turning them into instants
//! is the normalizer's job in `occupancy-core`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const EVENTS_PATH: &str = "/api/attendance-data";
pub const STATUS_PATH: &str = "/api/status";
pub const MAX_RESPONSE_BYTES: usize = 8 * 1024 * 1024; // 8MB

/// Recorded action. Anything the source sends besides enter/exit decodes as
/// `Unknown` so one odd row cannot sink the page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Enter,
    Exit,
    #[default]
    #[serde(other)]
    Unknown,
}

/// A single log row. Missing or null fields decode to defaults; the core
/// skips rows it cannot place on the timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventRecord {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub action: Action,
    #[serde(default, deserialize_with = "string_or_null")]
    pub timestamp: String,
}

fn string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// One page of the event log, ordered by occurrence time ascending.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EventsPage {
    #[serde(default)]
    pub data: Vec<EventRecord>,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub days: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CurrentStatus {
    Enter,
    Exit,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StatusSnapshot {
    #[serde(default)]
    pub current_status: CurrentStatus,
    #[serde(default)]
    pub last_action_time: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl EventsPage {
    /// False when `count` disagrees with the rows actually carried.
    pub fn is_complete(&self) -> bool {
        self.count == self.data.len()
    }
}

/// Decodes an events page. Row-level problems (blank timestamps, unknown
/// actions, a short page) are left for the consumer to tolerate.
pub fn parse_events_page(payload: Value) -> Result<EventsPage, ErrorInfo> {
    serde_json::from_value(payload).map_err(|err| {
        ErrorInfo::new(
            "invalid_payload",
            format!("events payload is invalid: {}", err),
        )
    })
}

pub fn parse_status(payload: Value) -> Result<StatusSnapshot, ErrorInfo> {
    serde_json::from_value(payload).map_err(|err| {
        ErrorInfo::new(
            "invalid_payload",
            format!("status payload is invalid: {}", err),
        )
    })
}
