use std::time::Duration;

use anyhow::{bail, Result};

use crate::app::App;
use crate::render::terminal::{paint, Color};

/// How often the persisted status is refreshed while watching
const STATUS_FLUSH_SECS: u64 = 5;

pub async fn run(app: &App, interval: Option<u64>, use_color: bool) -> Result<()> {
    if !app.settings.auto_sync_enabled {
        bail!("Automatic sync is disabled (autoSyncEnabled = false). Run `scribe-sync sync` instead.");
    }

    let interval = interval.unwrap_or(app.settings.sync_interval_seconds);
    if interval == 0 {
        bail!("Interval must be greater than 0");
    }

    let service = app.service()?;
    let scheduler = service.start_recurring(Duration::from_secs(interval));
    println!(
        "{} every {}s into {} (Ctrl-C to stop)",
        paint("Watching", Color::BOLD, use_color),
        interval,
        app.settings.target_dir().display()
    );

    let mut flush = tokio::time::interval(Duration::from_secs(STATUS_FLUSH_SECS));
    let mut last_saved = None;
    loop {
        tokio::select! {
            _ = flush.tick() => {
                let status = service.status();
                if last_saved.as_ref() != Some(&status) {
                    app.save_status(&status)?;
                    last_saved = Some(status);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    log::info!("Watch: stopping, waiting for any running pass");
    scheduler.stop().await;
    scheduler.stopped().await;
    while service.is_running() {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    app.save_status(&service.status())?;

    Ok(())
}
