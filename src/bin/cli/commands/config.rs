use std::io::Read;

use anyhow::{bail, Context, Result};

use crate::app::App;
use crate::OutputFormat;

const REDACTED: &str = "<redacted>";

pub fn run_show(app: &App, format: &OutputFormat) -> Result<()> {
    let mut settings = app.settings.clone();
    if !settings.session_credential.is_empty() {
        settings.session_credential = REDACTED.to_string();
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&settings)?),
        OutputFormat::Plain => {
            println!("# {}", app.config_path.display());
            print!("{}", toml::to_string_pretty(&settings)?);
        }
    }
    Ok(())
}

pub fn run_path(app: &App) {
    println!("{}", app.config_path.display());
}

pub fn run_init(app: &App, force: bool) -> Result<()> {
    if app.config_path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            app.config_path.display()
        );
    }

    scribe_sync::SyncSettings::default()
        .save(&app.config_path)
        .context("Failed to write config")?;
    println!("Wrote {}", app.config_path.display());
    Ok(())
}

pub fn run_set_credential(app: &App, value: Option<String>, clear: bool) -> Result<()> {
    if clear {
        app.credentials.clear()?;
        println!("Session credential removed");
        return Ok(());
    }

    let value = match value {
        Some(value) => value,
        None => {
            if crate::stdin_is_tty() {
                eprintln!("Paste the Cookie header of a signed-in web reader session, then press Ctrl-D:");
            }
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read credential from stdin")?;
            buf
        }
    };

    if value.trim().is_empty() {
        bail!("Empty credential");
    }

    app.credentials.set(&value)?;
    println!("Session credential stored in {}", app.credentials.data_dir().display());
    Ok(())
}
