//! Session reconstruction from the enter/exit log.
//!
//! Pairing is greedy and adjacent: an `enter` closes only against the event
//! right after it. Logs with consecutive enters or exits are not repaired; an
//! unpaired `enter` that is not the last event simply yields nothing. The last
//! `enter` becomes an open session (ending at `now`) only when the status
//! snapshot agrees the space is occupied.

use chrono::{DateTime, NaiveDate, Utc};
use occupancy_protocol::{Action, CurrentStatus, EventRecord, StatusSnapshot};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::time::{display_date, normalize, to_display, DisplayInstant};

const MILLIS_PER_MINUTE: i64 = 60_000;

/// How elapsed milliseconds become whole minutes.
///
/// One rule is applied to every session of a reconstruction, open or closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingRule {
    /// `floor(ms / 60000)`
    #[default]
    Floor,
    /// `floor(ms / 60000 + 0.5)`
    Nearest,
}

impl RoundingRule {
    pub fn minutes_between(&self, start: &DisplayInstant, end: &DisplayInstant) -> i64 {
        let millis = end.signed_duration_since(*start).num_milliseconds().max(0);
        match self {
            RoundingRule::Floor => millis / MILLIS_PER_MINUTE,
            RoundingRule::Nearest => (millis + MILLIS_PER_MINUTE / 2) / MILLIS_PER_MINUTE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub start: DisplayInstant,
    pub end: DisplayInstant,
    pub duration_minutes: i64,
    pub is_open: bool,
}

impl Session {
    fn new(start: DisplayInstant, end: DisplayInstant, is_open: bool, rounding: RoundingRule) -> Self {
        // Clock skew can put the recorded end before the start.
        let end = end.max(start);
        Self {
            start,
            end,
            duration_minutes: rounding.minutes_between(&start, &end),
            is_open,
        }
    }

    /// Display-timezone date the session is attributed to.
    pub fn start_date(&self) -> NaiveDate {
        display_date(&self.start)
    }
}

/// Rebuilds occupancy sessions from an ordered event log.
///
/// Events with malformed timestamps or unrecognised actions are dropped
/// before pairing, as if they were never delivered. The result is rebuilt from scratch on every call.
pub fn reconstruct(
    events: &[EventRecord],
    status: Option<&StatusSnapshot>,
    now: DateTime<Utc>,
    rounding: RoundingRule,
) -> Vec<Session> {
    let timeline: Vec<(Action, DisplayInstant)> = events
        .iter()
        .filter_map(|event| {
            if event.action == Action::Unknown {
                warn!(event_id = event.id, "Skipping event with unrecognised action");
                return None;
            }
            match normalize(&event.timestamp) {
                Ok(instant) => Some((event.action, instant)),
                Err(err) => {
                    warn!(event_id = event.id, error = %err, "Skipping event with malformed timestamp");
                    None
                }
            }
        })
        .collect();

    let current_status = status
        .map(|snapshot| snapshot.current_status)
        .unwrap_or(CurrentStatus::Unknown);
    let now = to_display(now);
    let mut sessions = Vec::new();

    for (index, (action, start)) in timeline.iter().enumerate() {
        if *action != Action::Enter {
            continue;
        }

        match timeline.get(index + 1) {
            Some((Action::Exit, end)) => {
                sessions.push(Session::new(*start, *end, false, rounding));
            }
            Some(_) => {
                debug!(at = %start, "Dropping enter without an adjacent exit");
            }
            None if current_status == CurrentStatus::Enter => {
                sessions.push(Session::new(*start, now, true, rounding));
            }
            None => {
                debug!(
                    status = ?current_status,
                    at = %start,
                    "Trailing enter not confirmed by status; no open session"
                );
            }
        }
    }

    if current_status == CurrentStatus::Enter
        && !matches!(timeline.last(), Some((Action::Enter, _)))
    {
        debug!("Status reports occupied but the log does not end with an enter");
    }

    sessions
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(id: i64, action: Action, timestamp: &str) -> EventRecord {
        EventRecord {
            id,
            action,
            timestamp: timestamp.to_string(),
        }
    }

    fn status(current_status: CurrentStatus) -> StatusSnapshot {
        StatusSnapshot {
            current_status,
            last_action_time: None,
        }
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, h, m, s).unwrap()
    }

    #[test]
    fn pairs_adjacent_enter_exit() {
        let events = vec![
            event(1, Action::Enter, "2024-03-05 01:00:00"),
            event(2, Action::Exit, "2024-03-05 02:30:00"),
            event(3, Action::Enter, "2024-03-05 04:00:00"),
            event(4, Action::Exit, "2024-03-05 04:10:59"),
        ];
        let sessions = reconstruct(
            &events,
            Some(&status(CurrentStatus::Exit)),
            at(6, 0, 0),
            RoundingRule::Floor,
        );

        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].duration_minutes, 90);
        assert_eq!(sessions[1].duration_minutes, 10);
        assert!(sessions.iter().all(|s| !s.is_open));
    }

    #[test]
    fn does_not_pair_across_an_intervening_enter() {
        let events = vec![
            event(1, Action::Enter, "2024-03-05 01:00:00"),
            event(2, Action::Enter, "2024-03-05 02:00:00"),
            event(3, Action::Exit, "2024-03-05 03:00:00"),
            event(4, Action::Exit, "2024-03-05 04:00:00"),
        ];
        let sessions = reconstruct(
            &events,
            Some(&status(CurrentStatus::Exit)),
            at(6, 0, 0),
            RoundingRule::Floor,
        );

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].duration_minutes, 60);
        assert_eq!(sessions[0].start.to_rfc3339(), "2024-03-05T11:00:00+09:00");
    }

    #[test]
    fn exit_only_log_yields_nothing() {
        let events = vec![
            event(1, Action::Exit, "2024-03-05 01:00:00"),
            event(2, Action::Exit, "2024-03-05 02:00:00"),
        ];
        let sessions = reconstruct(
            &events,
            Some(&status(CurrentStatus::Enter)),
            at(6, 0, 0),
            RoundingRule::Floor,
        );
        assert!(sessions.is_empty());
    }

    #[test]
    fn trailing_enter_opens_only_when_status_agrees() {
        let events = vec![event(1, Action::Enter, "2024-03-05 05:00:00")];
        let now = at(5, 45, 30);

        let open = reconstruct(
            &events,
            Some(&status(CurrentStatus::Enter)),
            now,
            RoundingRule::Floor,
        );
        assert_eq!(open.len(), 1);
        assert!(open[0].is_open);
        assert_eq!(open[0].end, now);
        assert_eq!(open[0].duration_minutes, 45);

        for snapshot in [Some(status(CurrentStatus::Exit)), Some(status(CurrentStatus::Unknown)), None] {
            let sessions = reconstruct(&events, snapshot.as_ref(), now, RoundingRule::Floor);
            assert!(sessions.is_empty());
        }
    }

    #[test]
    fn unknown_actions_are_treated_as_absent() {
        let events = vec![
            event(1, Action::Enter, "2024-03-05 01:00:00"),
            event(2, Action::Unknown, "2024-03-05 01:10:00"),
            event(3, Action::Exit, "2024-03-05 01:45:00"),
        ];
        let sessions = reconstruct(
            &events,
            Some(&status(CurrentStatus::Exit)),
            at(3, 0, 0),
            RoundingRule::Floor,
        );
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].duration_minutes, 45);
    }

    #[test]
    fn unpaired_enter_before_the_end_is_dropped() {
        let events = vec![
            event(1, Action::Enter, "2024-03-05 01:00:00"),
            event(2, Action::Enter, "2024-03-05 02:00:00"),
        ];
        let sessions = reconstruct(
            &events,
            Some(&status(CurrentStatus::Enter)),
            at(3, 0, 0),
            RoundingRule::Floor,
        );
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].is_open);
        assert_eq!(sessions[0].duration_minutes, 60);
    }

    #[test]
    fn malformed_events_are_treated_as_absent() {
        let events = vec![
            event(1, Action::Enter, "2024-03-05 01:00:00"),
            event(2, Action::Exit, "not a time"),
            event(3, Action::Exit, "2024-03-05 01:20:00"),
        ];
        let sessions = reconstruct(
            &events,
            Some(&status(CurrentStatus::Exit)),
            at(3, 0, 0),
            RoundingRule::Floor,
        );
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].duration_minutes, 20);
    }

    #[test]
    fn skewed_clock_is_clamped_to_zero() {
        let events = vec![event(1, Action::Enter, "2024-03-05 05:00:00")];
        let sessions = reconstruct(
            &events,
            Some(&status(CurrentStatus::Enter)),
            at(4, 0, 0),
            RoundingRule::Floor,
        );
        assert_eq!(sessions[0].duration_minutes, 0);
        assert_eq!(sessions[0].end, sessions[0].start);
    }

    #[test]
    fn rounding_rule_applies_to_open_and_closed_alike() {
        let events = vec![
            event(1, Action::Enter, "2024-03-05 01:00:00"),
            event(2, Action::Exit, "2024-03-05 01:10:40"),
            event(3, Action::Enter, "2024-03-05 02:00:00"),
        ];
        let snapshot = status(CurrentStatus::Enter);
        let now = at(2, 10, 40);

        let floor = reconstruct(&events, Some(&snapshot), now, RoundingRule::Floor);
        assert_eq!(floor[0].duration_minutes, floor[1].duration_minutes);
        assert_eq!(floor[0].duration_minutes, 10);

        let nearest = reconstruct(&events, Some(&snapshot), now, RoundingRule::Nearest);
        assert_eq!(nearest[0].duration_minutes, nearest[1].duration_minutes);
        assert_eq!(nearest[0].duration_minutes, 11);
    }

    #[test]
    fn nearest_rounds_half_minute_up() {
        let start = normalize("2024-03-05 01:00:00").unwrap();
        let end = normalize("2024-03-05 01:00:30").unwrap();
        assert_eq!(RoundingRule::Nearest.minutes_between(&start, &end), 1);
        assert_eq!(RoundingRule::Floor.minutes_between(&start, &end), 0);
    }

    #[test]
    fn start_date_uses_display_timezone() {
        let events = vec![
            event(1, Action::Enter, "2024-01-10 23:50:00"),
            event(2, Action::Exit, "2024-01-11 00:10:00"),
        ];
        let sessions = reconstruct(
            &events,
            Some(&status(CurrentStatus::Exit)),
            at(0, 0, 0),
            RoundingRule::Floor,
        );
        assert_eq!(
            sessions[0].start_date(),
            NaiveDate::from_ymd_opt(2024, 1, 11).unwrap()
        );
        assert_eq!(sessions[0].duration_minutes, 20);
    }
}
