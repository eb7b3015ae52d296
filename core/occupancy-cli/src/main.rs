//! occupancy: room occupancy dashboard in the terminal.
//!
//! ## Subcommands
//!
//! - `show`: One-shot grid from JSON dumps of the events page and status snapshot
//! - `watch`: Live view against the HTTP source (slow refresh timer + fast clock tick)

mod backoff;
mod http;
mod logging;
mod render;
mod show;
mod watch;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use occupancy_core::{load_config, Config, Orientation, RoundingRule, MAX_WINDOW_DAYS};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "occupancy")]
#[command(about = "Room occupancy sessions per day")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.occupancy/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Number of days in the grid
    #[arg(long, global = true, value_parser = parse_days)]
    days: Option<u32>,

    /// Bucket order
    #[arg(long, global = true, value_enum)]
    order: Option<OrderArg>,

    /// Minute rounding rule, applied to every session
    #[arg(long, global = true, value_enum)]
    rounding: Option<RoundingArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the grid once from JSON files
    Show {
        /// Events page JSON (`{ data, count, days }`)
        #[arg(long, value_name = "PATH")]
        events: PathBuf,

        /// Status snapshot JSON (`{ current_status, last_action_time }`)
        #[arg(long, value_name = "PATH")]
        status: Option<PathBuf>,

        /// Wall-clock instant to compute against (RFC 3339, defaults to now)
        #[arg(long, value_parser = parse_now)]
        now: Option<DateTime<Utc>>,

        /// Print the view as JSON instead of the text grid
        #[arg(long)]
        json: bool,
    },

    /// Poll the data source and redraw every tick
    Watch {
        /// Base URL of the data source
        #[arg(long)]
        url: Option<String>,

        /// Seconds between data refreshes
        #[arg(long)]
        refresh_secs: Option<u64>,

        /// Seconds between clock ticks
        #[arg(long)]
        tick_secs: Option<u64>,

        /// Stop after this many seconds (runs until interrupted otherwise)
        #[arg(long)]
        for_secs: Option<u64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OrderArg {
    NewestFirst,
    OldestFirst,
}

#[derive(Clone, Copy, ValueEnum)]
enum RoundingArg {
    Floor,
    Nearest,
}

fn parse_now(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| format!("invalid RFC 3339 instant: {}", err))
}

fn parse_days(value: &str) -> Result<u32, String> {
    let days: u32 = value
        .parse()
        .map_err(|err| format!("invalid day count: {}", err))?;
    if days > MAX_WINDOW_DAYS {
        return Err(format!("at most {} days are supported", MAX_WINDOW_DAYS));
    }
    Ok(days)
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(days) = cli.days {
        config.grid.window_days = days;
    }
    if let Some(order) = cli.order {
        config.grid.orientation = match order {
            OrderArg::NewestFirst => Orientation::NewestFirst,
            OrderArg::OldestFirst => Orientation::OldestFirst,
        };
    }
    if let Some(rounding) = cli.rounding {
        config.grid.rounding = match rounding {
            RoundingArg::Floor => RoundingRule::Floor,
            RoundingArg::Nearest => RoundingRule::Nearest,
        };
    }
}

fn main() {
    let cli = Cli::parse();
    let _logging_guard = match &cli.command {
        Commands::Show { .. } => logging::init(logging::Target::Stderr),
        Commands::Watch { .. } => logging::init(logging::Target::File),
    };

    let mut config = match load_config(cli.config.clone()) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "Failed to load config");
            std::process::exit(1);
        }
    };
    apply_overrides(&mut config, &cli);

    match cli.command {
        Commands::Show {
            events,
            status,
            now,
            json,
        } => {
            let now = now.unwrap_or_else(Utc::now);
            if let Err(e) = show::run(&config, events, status, now, json) {
                tracing::error!(error = %e, "occupancy show failed");
                std::process::exit(1);
            }
        }
        Commands::Watch {
            url,
            refresh_secs,
            tick_secs,
            for_secs,
        } => {
            if let Some(url) = url {
                config.source.base_url = url;
            }
            if let Some(secs) = refresh_secs {
                config.schedule.refresh_secs = secs;
            }
            if let Some(secs) = tick_secs {
                config.schedule.tick_secs = secs;
            }
            watch::run(&config, for_secs.map(std::time::Duration::from_secs));
        }
    }
}
