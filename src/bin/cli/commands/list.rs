use anyhow::Result;

use crate::app::App;
use crate::render::terminal::{paint, Color};
use crate::OutputFormat;

pub async fn run(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let service = app.service()?;
    let notebooks = service.list_notebooks().await?;

    match format {
        OutputFormat::Json => {
            let output: Vec<_> = notebooks
                .iter()
                .map(|nb| {
                    serde_json::json!({
                        "id": nb.id,
                        "name": nb.name,
                        "derivedPath": nb.derived_path,
                        "selected": app.settings.is_selected(&nb.id),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if notebooks.is_empty() {
                println!("(no notebooks)");
            }
            for nb in &notebooks {
                let marker = if app.settings.is_selected(&nb.id) { "* " } else { "  " };
                println!(
                    "{}{}  {}",
                    marker,
                    nb.derived_path,
                    paint(&nb.id, Color::DIM, use_color)
                );
            }
        }
    }

    Ok(())
}
