//! Data sources and polling.
//!
//! The event log and status snapshot come from an external collaborator. The
//! core only sees it through [`OccupancySource`]; the CLI provides the HTTP
//! implementation, [`FileSource`] reads JSON dumps from disk.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs_err as fs;
use occupancy_protocol::{parse_events_page, parse_status, EventsPage, StatusSnapshot};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{OccupancyError, Result};

pub trait OccupancySource: Send + Sync {
    /// Events from the last `days` days, oldest first.
    fn fetch_events(&self, days: u32) -> Result<EventsPage>;
    fn fetch_status(&self) -> Result<StatusSnapshot>;
}

/// Inputs captured by one successful poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub page: EventsPage,
    pub status: StatusSnapshot,
    pub fetched_at: DateTime<Utc>,
}

/// Reads an events page and a status snapshot from JSON files.
#[derive(Debug, Clone)]
pub struct FileSource {
    events_path: PathBuf,
    status_path: Option<PathBuf>,
}

impl FileSource {
    pub fn new(events_path: impl Into<PathBuf>, status_path: Option<PathBuf>) -> Self {
        Self {
            events_path: events_path.into(),
            status_path,
        }
    }
}

impl OccupancySource for FileSource {
    fn fetch_events(&self, days: u32) -> Result<EventsPage> {
        debug!(path = %self.events_path.display(), days, "Reading events file");
        let payload = read_json(&self.events_path)?;
        parse_events_page(payload).map_err(|info| OccupancyError::InvalidPayload {
            source_name: self.events_path.display().to_string(),
            details: info.to_string(),
        })
    }

    fn fetch_status(&self) -> Result<StatusSnapshot> {
        let Some(path) = &self.status_path else {
            return Ok(StatusSnapshot::default());
        };
        let payload = read_json(path)?;
        parse_status(payload).map_err(|info| OccupancyError::InvalidPayload {
            source_name: path.display().to_string(),
            details: info.to_string(),
        })
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|source| OccupancyError::Io {
        context: format!("reading {}", path.display()),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| OccupancyError::Json {
        context: format!("parsing {}", path.display()),
        source,
    })
}

/// What changed between two consecutive polls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    pub events_added: usize,
    pub events_removed: usize,
    pub status_changed: bool,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.events_added == 0 && self.events_removed == 0 && !self.status_changed
    }
}

pub fn compute_diff(previous: Option<&Snapshot>, current: &Snapshot) -> SnapshotDiff {
    let Some(previous) = previous else {
        return SnapshotDiff {
            events_added: current.page.data.len(),
            status_changed: true,
            ..SnapshotDiff::default()
        };
    };

    let previous_ids: HashSet<i64> = previous.page.data.iter().map(|event| event.id).collect();
    let current_ids: HashSet<i64> = current.page.data.iter().map(|event| event.id).collect();

    SnapshotDiff {
        events_added: current_ids.difference(&previous_ids).count(),
        events_removed: previous_ids.difference(&current_ids).count(),
        status_changed: previous.status != current.status,
    }
}

/// Fetches snapshots from a source, remembering the last good one for diffs
/// and how many polls in a row have failed since.
#[derive(Debug)]
pub struct Poller<S: OccupancySource> {
    source: S,
    window_days: u32,
    previous_snapshot: Option<Snapshot>,
    consecutive_failures: u32,
}

impl<S: OccupancySource> Poller<S> {
    pub fn new(source: S, window_days: u32) -> Self {
        Self {
            source,
            window_days,
            previous_snapshot: None,
            consecutive_failures: 0,
        }
    }

    /// Failed polls since the last success.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn poll_once(&mut self, now: DateTime<Utc>) -> Result<(Snapshot, SnapshotDiff)> {
        let result = self.fetch(now);
        self.consecutive_failures = match &result {
            Ok(_) => 0,
            Err(_) => self.consecutive_failures.saturating_add(1),
        };
        result
    }

    fn fetch(&mut self, now: DateTime<Utc>) -> Result<(Snapshot, SnapshotDiff)> {
        let page = self.source.fetch_events(self.window_days)?;
        if !page.is_complete() {
            warn!(
                count = page.count,
                carried = page.data.len(),
                "Events page count disagrees with its rows; using the rows"
            );
        }
        let status = self.source.fetch_status()?;
        let snapshot = Snapshot {
            page,
            status,
            fetched_at: now,
        };
        let diff = compute_diff(self.previous_snapshot.as_ref(), &snapshot);
        self.previous_snapshot = Some(snapshot.clone());
        Ok((snapshot, diff))
    }
}
