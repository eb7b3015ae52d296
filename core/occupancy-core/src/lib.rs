//! # occupancy-core
//!
//! Rebuilds occupancy sessions and a per-day grid from an enter/exit event log.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. Callers schedule refreshes and ticks.
//! - **Stateless recompute**: Sessions and buckets are rebuilt from scratch on every call.
//! - **Total**: Bad records are logged and skipped; nothing here panics on input data.
//! - **One clock**: Every timestamp passes through [`time::normalize`] before use.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use occupancy_core::{reconstruct, build_grid, Orientation, RoundingRule};
//!
//! let sessions = reconstruct(&page.data, Some(&status), now, RoundingRule::Floor);
//! let days = build_grid(&sessions, 30, now, Orientation::NewestFirst);
//! ```

pub mod config;
pub mod dashboard;
pub mod error;
pub mod format;
pub mod grid;
pub mod sessions;
pub mod source;
pub mod status;
pub mod time;

pub use config::{load_config, Config, DisplayConfig, GridConfig, ScheduleConfig, SourceConfig};
pub use dashboard::{compute_grid, Dashboard, DashboardView};
pub use error::{OccupancyError, Result};
pub use format::{format_display_date, format_display_time, format_minutes};
pub use grid::{
    build_grid, grand_total_minutes, DayBucket, Orientation, HOURS_PER_DAY, MAX_WINDOW_DAYS,
};
pub use sessions::{reconstruct, RoundingRule, Session};
pub use source::{compute_diff, FileSource, OccupancySource, Poller, Snapshot, SnapshotDiff};
pub use status::{Presence, StatusView};
pub use time::{normalize, to_display, DisplayInstant};
