//! Live status presentation.

use occupancy_protocol::{CurrentStatus, StatusSnapshot};
use serde::Serialize;
use tracing::warn;

use crate::time::{normalize, DisplayInstant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Occupied,
    Vacant,
    Unknown,
}

impl Presence {
    pub fn label(&self) -> &'static str {
        match self {
            Presence::Occupied => "occupied",
            Presence::Vacant => "vacant",
            Presence::Unknown => "unknown",
        }
    }
}

impl From<CurrentStatus> for Presence {
    fn from(status: CurrentStatus) -> Self {
        match status {
            CurrentStatus::Enter => Presence::Occupied,
            CurrentStatus::Exit => Presence::Vacant,
            CurrentStatus::Unknown => Presence::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub presence: Presence,
    /// Last recorded action, at the display offset.
    pub since: Option<DisplayInstant>,
}

impl StatusView {
    pub fn from_snapshot(snapshot: Option<&StatusSnapshot>) -> Self {
        let Some(snapshot) = snapshot else {
            return Self {
                presence: Presence::Unknown,
                since: None,
            };
        };

        let since = snapshot
            .last_action_time
            .as_deref()
            .and_then(|raw| match normalize(raw) {
                Ok(instant) => Some(instant),
                Err(err) => {
                    warn!(error = %err, "Ignoring malformed last_action_time");
                    None
                }
            });

        Self {
            presence: Presence::from(snapshot.current_status),
            since,
        }
    }
}
