//! Day-grid building and aggregation.
//!
//! A grid is a fixed run of consecutive display-timezone dates ending at the
//! anchor date. Every date gets a bucket, empty or not, so fixed-width views
//! stay aligned. Sessions are attributed wholly to the date they start on; a
//! session crossing midnight is never split.

use chrono::{DateTime, Days, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::sessions::Session;
use crate::time::{display_date, to_display};

pub const HOURS_PER_DAY: usize = 24;

/// Largest grid window accepted (ten years of days).
pub const MAX_WINDOW_DAYS: u32 = 3660;

/// Order of buckets in the built grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    OldestFirst,
    #[default]
    NewestFirst,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub sessions: Vec<Session>,
    pub total_minutes: i64,
}

impl DayBucket {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            sessions: Vec::new(),
            total_minutes: 0,
        }
    }

    fn push(&mut self, session: Session) {
        self.total_minutes += session.duration_minutes;
        self.sessions.push(session);
    }

    pub fn has_open_session(&self) -> bool {
        self.sessions.iter().any(|session| session.is_open)
    }

    /// Hour-of-day presence map for this date.
    ///
    /// A session marks every hour from its start hour through its end hour;
    /// one that runs past midnight marks through the last hour of the day.
    pub fn hour_cells(&self) -> [bool; HOURS_PER_DAY] {
        let mut cells = [false; HOURS_PER_DAY];
        for session in &self.sessions {
            let first = session.start.hour() as usize;
            let last = if display_date(&session.end) == self.date {
                session.end.hour() as usize
            } else {
                HOURS_PER_DAY - 1
            };
            for cell in cells.iter_mut().take(last + 1).skip(first) {
                *cell = true;
            }
        }
        cells
    }
}

/// Buckets sessions into `window_days` dates ending at the anchor's date.
///
/// Sessions starting outside the window are ignored. A zero-day window
/// yields an empty grid; windows above [`MAX_WINDOW_DAYS`] are clamped.
pub fn build_grid(
    sessions: &[Session],
    window_days: u32,
    anchor: DateTime<Utc>,
    orientation: Orientation,
) -> Vec<DayBucket> {
    if window_days == 0 {
        return Vec::new();
    }
    let window_days = if window_days > MAX_WINDOW_DAYS {
        debug!(window_days, max = MAX_WINDOW_DAYS, "Clamping grid window");
        MAX_WINDOW_DAYS
    } else {
        window_days
    };

    let anchor_date = display_date(&to_display(anchor));
    let first = anchor_date
        .checked_sub_days(Days::new(u64::from(window_days - 1)))
        .unwrap_or(NaiveDate::MIN);

    let mut buckets: Vec<DayBucket> = first
        .iter_days()
        .take(window_days as usize)
        .map(DayBucket::empty)
        .collect();

    for session in sessions {
        let offset = session.start_date().signed_duration_since(first).num_days();
        match usize::try_from(offset).ok().and_then(|index| buckets.get_mut(index)) {
            Some(bucket) => bucket.push(session.clone()),
            None => debug!(date = %session.start_date(), "Session outside grid window"),
        }
    }

    if orientation == Orientation::NewestFirst {
        buckets.reverse();
    }

    buckets
}

/// Sum of all bucket totals.
pub fn grand_total_minutes(buckets: &[DayBucket]) -> i64 {
    buckets.iter().map(|bucket| bucket.total_minutes).sum()
}
