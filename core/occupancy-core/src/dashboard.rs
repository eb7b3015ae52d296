//! Dashboard state: the latest snapshot plus a pure recompute.
//!
//! The dashboard owns only what the caller hands it. A refresh replaces the
//! snapshot (or records why it could not); a clock tick calls [`Dashboard::view`]
//! with a new `now`, which rebuilds sessions and the grid from scratch. A failed
//! refresh keeps the previous snapshot and marks the view stale.

use chrono::{DateTime, Utc};
use occupancy_protocol::{EventsPage, StatusSnapshot};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::GridConfig;
use crate::error::Result;
use crate::grid::{build_grid, grand_total_minutes, DayBucket};
use crate::sessions::reconstruct;
use crate::source::Snapshot;
use crate::status::StatusView;
use crate::time::{to_display, DisplayInstant};

/// Rebuilds the day grid for one set of inputs.
pub fn compute_grid(
    page: &EventsPage,
    status: Option<&StatusSnapshot>,
    now: DateTime<Utc>,
    grid: &GridConfig,
) -> Vec<DayBucket> {
    let sessions = reconstruct(&page.data, status, now, grid.rounding);
    build_grid(&sessions, grid.window_days, now, grid.orientation)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    pub status: StatusView,
    pub days: Vec<DayBucket>,
    pub total_minutes: i64,
    /// Events carried by the last page, and the day span it was asked for.
    pub record_count: usize,
    pub record_days: u32,
    pub fetched_at: Option<DisplayInstant>,
    /// True until the first successful refresh.
    pub loading: bool,
    /// True when the latest refresh failed and older data is shown.
    pub stale: bool,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    grid: GridConfig,
    snapshot: Option<Snapshot>,
    last_error: Option<String>,
}

impl Dashboard {
    pub fn new(grid: GridConfig) -> Self {
        Self {
            grid,
            snapshot: None,
            last_error: None,
        }
    }

    /// Records the outcome of a refresh.
    pub fn apply_refresh(&mut self, result: Result<Snapshot>) {
        match result {
            Ok(snapshot) => {
                debug!(
                    events = snapshot.page.data.len(),
                    status = ?snapshot.status.current_status,
                    "Snapshot refreshed"
                );
                self.snapshot = Some(snapshot);
                self.last_error = None;
            }
            Err(err) => {
                warn!(error = %err, "Refresh failed; keeping previous snapshot");
                self.last_error = Some(err.to_string());
            }
        }
    }

    /// Recomputes everything for the given wall-clock instant.
    pub fn view(&self, now: DateTime<Utc>) -> DashboardView {
        let status = self.snapshot.as_ref().map(|snapshot| &snapshot.status);
        let days = match &self.snapshot {
            Some(snapshot) => compute_grid(&snapshot.page, status, now, &self.grid),
            None => compute_grid(&EventsPage::default(), None, now, &self.grid),
        };

        DashboardView {
            status: StatusView::from_snapshot(status),
            total_minutes: grand_total_minutes(&days),
            days,
            record_count: self
                .snapshot
                .as_ref()
                .map(|snapshot| snapshot.page.count)
                .unwrap_or(0),
            record_days: self
                .snapshot
                .as_ref()
                .map(|snapshot| snapshot.page.days)
                .unwrap_or(self.grid.window_days),
            fetched_at: self
                .snapshot
                .as_ref()
                .map(|snapshot| to_display(snapshot.fetched_at)),
            loading: self.snapshot.is_none() && self.last_error.is_none(),
            stale: self.snapshot.is_some() && self.last_error.is_some(),
            last_error: self.last_error.clone(),
        }
    }
}
