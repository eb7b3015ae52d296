use std::path::PathBuf;

use chrono::{DateTime, Utc};
use occupancy_core::{Config, Dashboard, FileSource, OccupancyError, Poller, Result};
use tracing::info;

use crate::render::render_view;

/// One-shot grid from JSON dumps. A bad input fails the command instead of
/// rendering a stale view.
pub fn run(
    config: &Config,
    events: PathBuf,
    status: Option<PathBuf>,
    now: DateTime<Utc>,
    json: bool,
) -> Result<()> {
    let mut poller = Poller::new(FileSource::new(events, status), config.grid.window_days);
    let (snapshot, _) = poller.poll_once(now)?;
    info!(
        events = snapshot.page.data.len(),
        window_days = config.grid.window_days,
        "Loaded snapshot"
    );

    let mut dashboard = Dashboard::new(config.grid);
    dashboard.apply_refresh(Ok(snapshot));
    let view = dashboard.view(now);

    if json {
        let text = serde_json::to_string_pretty(&view).map_err(|source| OccupancyError::Json {
            context: "encoding dashboard view".to_string(),
            source,
        })?;
        println!("{}", text);
    } else {
        println!("{}", render_view(&view, &config.display));
    }
    Ok(())
}
