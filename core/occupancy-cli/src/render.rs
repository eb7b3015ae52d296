//! Plain-text rendering of a dashboard view.

use occupancy_core::config::DisplayConfig;
use occupancy_core::{
    format_display_date, format_display_time, format_minutes, DashboardView, HOURS_PER_DAY,
};

const PRESENT_CELL: &str = "##";
const ABSENT_CELL: &str = "..";
const OPEN_MARKER: &str = " *";
const DATE_COLUMN_WIDTH: usize = 8;

pub fn render_view(view: &DashboardView, display: &DisplayConfig) -> String {
    let mut lines = Vec::with_capacity(view.days.len() + 4);
    lines.push(status_line(view, display));

    if view.loading {
        lines.push("Loading...".to_string());
        return lines.join("\n");
    }
    if let Some(error) = &view.last_error {
        let note = if view.stale {
            "showing previous data; retrying"
        } else {
            "retrying"
        };
        lines.push(format!("Fetch failed ({}): {}", note, error));
    }

    let mut header = " ".repeat(DATE_COLUMN_WIDTH);
    for hour in 0..HOURS_PER_DAY {
        header.push_str(&format!("{:02}", hour));
    }
    lines.push(header);

    for day in &view.days {
        let mut row = format!(
            "{:<width$}",
            format_display_date(&day.date, &display.date_format),
            width = DATE_COLUMN_WIDTH
        );
        for present in day.hour_cells() {
            row.push_str(if present { PRESENT_CELL } else { ABSENT_CELL });
        }
        row.push_str(&format!("  {:>7}", format_minutes(day.total_minutes)));
        if day.has_open_session() {
            row.push_str(OPEN_MARKER);
        }
        lines.push(row);
    }

    let mut footer = format!(
        "Total {} | {} records over {} days",
        format_minutes(view.total_minutes),
        view.record_count,
        view.record_days
    );
    if let Some(fetched_at) = &view.fetched_at {
        footer.push_str(&format!(
            " | fetched {}",
            format_display_time(fetched_at, &display.time_format)
        ));
    }
    lines.push(footer);

    lines.join("\n")
}

fn status_line(view: &DashboardView, display: &DisplayConfig) -> String {
    match &view.status.since {
        Some(since) => format!(
            "Room: {} (last update {})",
            view.status.presence.label(),
            format_display_time(since, &display.time_format)
        ),
        None => format!("Room: {}", view.status.presence.label()),
    }
}
