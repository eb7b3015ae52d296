//! Display formatting for instants, dates and durations.
//!
//! Time and date patterns come from configuration. A pattern chrono cannot
//! render (unknown specifier, or one that needs data a date lacks) falls back
//! to fixed zero-padded digits that match the default pattern exactly.

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{Datelike, NaiveDate, Timelike};
use tracing::debug;

use crate::time::DisplayInstant;

pub const DEFAULT_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";
pub const DEFAULT_DATE_FORMAT: &str = "%m/%d";

/// Formats an instant with `pattern`, falling back to `YYYY/MM/DD HH:MM:SS`.
pub fn format_display_time(instant: &DisplayInstant, pattern: &str) -> String {
    match render_pattern(pattern, |items, out| {
        write!(out, "{}", instant.format_with_items(items.iter()))
    }) {
        Some(rendered) => rendered,
        None => {
            debug!(pattern, "Time pattern not renderable; using fallback");
            fallback_time(instant)
        }
    }
}

/// Formats a calendar date with `pattern`, falling back to `MM/DD`.
pub fn format_display_date(date: &NaiveDate, pattern: &str) -> String {
    match render_pattern(pattern, |items, out| {
        write!(out, "{}", date.format_with_items(items.iter()))
    }) {
        Some(rendered) => rendered,
        None => {
            debug!(pattern, "Date pattern not renderable; using fallback");
            fallback_date(date)
        }
    }
}

/// Renders a minute total as `"3h 05m"`, or `"45m"` under an hour.
pub fn format_minutes(minutes: i64) -> String {
    let minutes = minutes.max(0);
    let hours = minutes / 60;
    let rest = minutes % 60;
    if hours > 0 {
        format!("{}h {:02}m", hours, rest)
    } else {
        format!("{}m", rest)
    }
}

fn render_pattern<'a, F>(pattern: &'a str, render: F) -> Option<String>
where
    F: FnOnce(&[Item<'a>], &mut String) -> std::fmt::Result,
{
    let items: Vec<Item<'a>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return None;
    }

    let mut out = String::new();
    render(&items, &mut out).ok()?;
    Some(out)
}

fn fallback_time(instant: &DisplayInstant) -> String {
    format!(
        "{:04}/{:02}/{:02} {:02}:{:02}:{:02}",
        instant.year(),
        instant.month(),
        instant.day(),
        instant.hour(),
        instant.minute(),
        instant.second()
    )
}

fn fallback_date(date: &NaiveDate) -> String {
    format!("{:02}/{:02}", date.month(), date.day())
}
