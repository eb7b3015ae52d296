//! Live view: a slow refresh timer and a fast clock tick feeding one loop.
//!
//! Both timers run on their own threads and talk to the render loop over a
//! channel. Dropping [`Timers`] stops and joins them together, so neither can
//! outlive the other.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::Utc;
use occupancy_core::{Config, Dashboard, Poller, Result, Snapshot};
use tracing::{debug, info, warn};

use crate::backoff::refresh_delay;
use crate::http::HttpSource;
use crate::render::render_view;

const SLEEP_SLICE: Duration = Duration::from_millis(100);
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

enum Message {
    Refreshed(Result<Snapshot>),
    Tick,
}

struct Timers {
    stop: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

impl Timers {
    fn start(config: &Config, sender: Sender<Message>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let refresh = spawn_refresh(config, sender.clone(), Arc::clone(&stop));
        let tick = spawn_tick(config.schedule.tick_interval(), sender, Arc::clone(&stop));
        Self {
            stop,
            handles: vec![refresh, tick],
        }
    }

    fn cancel(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                warn!("Timer thread panicked");
            }
        }
    }
}

impl Drop for Timers {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Sleeps up to `duration`, returning early (false) once `stop` is set.
fn sleep_unless_stopped(duration: Duration, stop: &AtomicBool) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if stop.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep(SLEEP_SLICE.min(deadline - now));
    }
}

fn spawn_refresh(config: &Config, sender: Sender<Message>, stop: Arc<AtomicBool>) -> JoinHandle<()> {
    let source = HttpSource::new(&config.source);
    let window_days = config.grid.window_days;
    let base = config.schedule.refresh_interval();

    thread::spawn(move || {
        let mut poller = Poller::new(source, window_days);
        while !stop.load(Ordering::SeqCst) {
            let result = poller.poll_once(Utc::now()).map(|(snapshot, diff)| {
                if !diff.is_empty() {
                    info!(
                        added = diff.events_added,
                        removed = diff.events_removed,
                        status_changed = diff.status_changed,
                        "Occupancy data changed"
                    );
                }
                snapshot
            });
            if sender.send(Message::Refreshed(result)).is_err() {
                break;
            }
            let failures = poller.consecutive_failures();
            let delay = refresh_delay(base, failures);
            debug!(delay_secs = delay.as_secs(), failures, "Next refresh scheduled");
            if !sleep_unless_stopped(delay, &stop) {
                break;
            }
        }
    })
}

fn spawn_tick(interval: Duration, sender: Sender<Message>, stop: Arc<AtomicBool>) -> JoinHandle<()> {
    thread::spawn(move || {
        while sleep_unless_stopped(interval, &stop) {
            if sender.send(Message::Tick).is_err() {
                break;
            }
        }
    })
}

fn redraw(dashboard: &Dashboard, config: &Config) {
    let view = dashboard.view(Utc::now());
    let mut stdout = std::io::stdout().lock();
    let drawn = writeln!(stdout, "{}{}", CLEAR_SCREEN, render_view(&view, &config.display))
        .and_then(|_| stdout.flush());
    if let Err(err) = drawn {
        warn!(error = %err, "Failed to draw dashboard");
    }
}

/// Runs until interrupted, or for `run_for` when given.
pub fn run(config: &Config, run_for: Option<Duration>) {
    info!(
        base_url = %config.source.base_url,
        refresh_secs = config.schedule.refresh_interval().as_secs(),
        tick_secs = config.schedule.tick_interval().as_secs(),
        "Starting watch"
    );

    let (sender, receiver) = mpsc::channel();
    let mut timers = Timers::start(config, sender);
    let mut dashboard = Dashboard::new(config.grid);
    let deadline = run_for.map(|duration| Instant::now() + duration);

    redraw(&dashboard, config);
    loop {
        let message = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                match receiver.recv_timeout(deadline - now) {
                    Ok(message) => message,
                    Err(_) => break,
                }
            }
            None => match receiver.recv() {
                Ok(message) => message,
                Err(_) => break,
            },
        };

        match message {
            Message::Refreshed(result) => dashboard.apply_refresh(result),
            Message::Tick => {}
        }
        redraw(&dashboard, config);
    }

    timers.cancel();
    info!("Watch stopped");
}
