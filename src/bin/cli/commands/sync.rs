use anyhow::{bail, Result};

use scribe_sync::SyncError;

use crate::app::App;
use crate::render::terminal::report_lines;
use crate::OutputFormat;

pub async fn run(app: &App, notebooks: Vec<String>, format: &OutputFormat, use_color: bool) -> Result<()> {
    let mut settings = app.settings.clone();
    if !notebooks.is_empty() {
        settings.selected_notebook_ids = notebooks.into_iter().collect();
    }

    let service = app.service_with(settings)?;
    let result = service.sync().await;
    app.save_status(&service.status())?;

    let report = match result {
        Ok(report) => report,
        Err(SyncError::Authentication(message)) => {
            bail!("{}. Run `scribe-sync config set-credential` with a fresh cookie header.", message)
        }
        Err(e) => return Err(e.into()),
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Plain => {
            for line in report_lines(&report, use_color) {
                println!("{}", line);
            }
        }
    }

    if report.failed() > 0 {
        bail!("{} notebook(s) failed to sync", report.failed());
    }
    Ok(())
}
