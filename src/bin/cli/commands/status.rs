use anyhow::Result;

use crate::app::App;
use crate::render::terminal::{paint, report_lines, state_label, Color};
use crate::OutputFormat;

pub fn run(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let status = app.load_status()?;
    let settings = &app.settings;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "configPath": app.config_path.to_string_lossy(),
                "targetDir": settings.target_dir().to_string_lossy(),
                "syncIntervalSeconds": settings.sync_interval_seconds,
                "selectedNotebookIds": settings.selected_notebook_ids,
                "status": status,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("Target:    {}", settings.target_dir().display());
            println!("Interval:  {}s", settings.sync_interval_seconds);
            if settings.selected_notebook_ids.is_empty() {
                println!("Selection: all notebooks");
            } else {
                println!("Selection: {} notebook(s)", settings.selected_notebook_ids.len());
            }
            println!();

            let Some(status) = status else {
                println!("{}", paint("No sync has run yet.", Color::DIM, use_color));
                return Ok(());
            };

            println!("State:     {}", state_label(status.state, use_color));
            if let Some(last_sync) = status.last_sync {
                println!("Last sync: {}", last_sync.format("%Y-%m-%d %H:%M:%S UTC"));
            }
            if let Some(error) = &status.last_error {
                println!("Error:     {}", paint(error, Color::RED, use_color));
            }
            if let Some(report) = &status.last_report {
                println!();
                for line in report_lines(report, use_color) {
                    println!("{}", line);
                }
            }
        }
    }

    Ok(())
}
