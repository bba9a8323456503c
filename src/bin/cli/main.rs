mod app;
mod commands;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "scribe-sync",
    about = "Sync handwritten Kindle Scribe notebooks into Markdown files",
    version
)]
struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true, env = "SCRIBE_SYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Run one sync pass
    Sync {
        /// Sync only these notebook ids (overrides selectedNotebookIds)
        #[arg(long = "notebook")]
        notebooks: Vec<String>,
    },

    /// Show the result of the last sync
    Status,

    /// Check that the session credential is accepted
    Test,

    /// List remote notebooks
    List,

    /// Sync on the configured interval until interrupted
    Watch {
        /// Override syncIntervalSeconds
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Inspect or edit configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Print the config file location
    Path,

    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Store the session credential (cookie header) outside the config file
    SetCredential {
        /// Credential value; read from stdin when omitted
        value: Option<String>,
        /// Remove the stored credential instead
        #[arg(long, conflicts_with = "value")]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let use_color = !cli.no_color && atty_check();

    let app = app::App::new(cli.config.clone())?;

    // RUST_LOG wins over the configured level
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(app.settings.log_level.as_filter()),
    )
    .init();

    match cli.command {
        Command::Sync { notebooks } => {
            commands::sync::run(&app, notebooks, &cli.format, use_color).await?;
        }
        Command::Status => {
            commands::status::run(&app, &cli.format, use_color)?;
        }
        Command::Test => {
            commands::test::run(&app, &cli.format, use_color).await?;
        }
        Command::List => {
            commands::list::run(&app, &cli.format, use_color).await?;
        }
        Command::Watch { interval } => {
            commands::watch::run(&app, interval, use_color).await?;
        }
        Command::Config(subcmd) => match subcmd {
            ConfigCommand::Show => commands::config::run_show(&app, &cli.format)?,
            ConfigCommand::Path => commands::config::run_path(&app),
            ConfigCommand::Init { force } => commands::config::run_init(&app, force)?,
            ConfigCommand::SetCredential { value, clear } => {
                commands::config::run_set_credential(&app, value, clear)?
            }
        },
    }

    Ok(())
}

/// Check if stdout is a terminal (for color support)
fn atty_check() -> bool {
    unsafe { libc_isatty(1) != 0 }
}

/// Check if stdin is a terminal (not piped)
pub(crate) fn stdin_is_tty() -> bool {
    unsafe { libc_isatty(0) != 0 }
}

extern "C" {
    #[link_name = "isatty"]
    fn libc_isatty(fd: i32) -> i32;
}
