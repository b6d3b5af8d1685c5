use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::app::App;
use crate::config::ConfigLoader;
use crate::storage;

pub mod commands;

use self::commands::{DeleteArgs, EditArgs, NewArgs, ShowArgs};

#[derive(Parser, Debug)]
#[command(
    name = "glassnotes",
    version,
    about = "Rich-text notes kept in a single write-through slot"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over GLASSNOTES_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over GLASSNOTES_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List notes in creation order (default)
    List,
    /// Create a note; content is read from stdin when piped
    New(NewArgs),
    /// Print a note's title and markup
    Show(ShowArgs),
    /// Replace the title and/or content of a note
    Edit(EditArgs),
    /// Delete a note (no-op if it does not exist)
    Delete(DeleteArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var("GLASSNOTES_CONFIG", path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var("GLASSNOTES_DATA", path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let config = loader.load_or_init()?;
    let slots = storage::init(&config.storage)?;
    match slots.run_wal_health_check() {
        Ok(stats) => tracing::debug!(?stats, "wal checkpoint at startup"),
        Err(err) => tracing::warn!(?err, "wal checkpoint failed"),
    }
    let mut app = App::new(slots, &config);

    let command = cli.command.unwrap_or(Commands::List);
    let output = match command {
        Commands::List => Ok(commands::list_notes(&app)),
        Commands::New(mut args) => {
            if args.content.is_none() {
                args.content = commands::read_stdin()?;
            }
            commands::new_note(&mut app, args)
        }
        Commands::Show(args) => commands::show_note(&mut app, args),
        Commands::Edit(args) => commands::edit_note(&mut app, args),
        Commands::Delete(args) => commands::delete_note(&mut app, args),
    }?;
    commands::ensure_persisted(app.flush())?;
    print!("{output}");
    Ok(())
}

fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        Ok(())
    })
    .map(|_| ())
}
