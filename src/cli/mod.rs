use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::ConfigLoader;
use crate::storage;
use crate::store::JournalStore;

pub mod commands;

use self::commands::{
    AddArgs, ClearArgs, DeleteArgs, EditArgs, ExportArgs, ImportArgs, ListArgs, SearchArgs,
    ShowArgs,
};

#[derive(Parser, Debug)]
#[command(
    name = "retrolog",
    version,
    about = "Retro-styled personal journal for the terminal"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over RETROLOG_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over RETROLOG_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a new journal entry
    Add(AddArgs),
    /// Rewrite an existing entry
    Edit(EditArgs),
    /// Delete an entry
    Delete(DeleteArgs),
    /// Print a single entry in full
    Show(ShowArgs),
    /// List entries, newest first (default)
    List(ListArgs),
    /// Search entries by text and tag
    Search(SearchArgs),
    /// Summarise tag usage across the journal
    Tags,
    /// Merge entries from an exported JSON file
    Import(ImportArgs),
    /// Write all entries to a JSON export file
    Export(ExportArgs),
    /// Delete every entry and the journal file
    Clear(ClearArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var("RETROLOG_CONFIG", path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var("RETROLOG_DATA", path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let paths = loader.paths().clone();
    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let config = loader.load_or_init()?;
    let storage = storage::init(&paths, &config.storage)?;
    let mut store = JournalStore::open(storage);

    let command = cli
        .command
        .unwrap_or_else(|| Commands::List(ListArgs::default()));
    match command {
        Commands::Add(args) => commands::add_entry(&mut store, args),
        Commands::Edit(args) => commands::edit_entry(&mut store, args),
        Commands::Delete(args) => commands::delete_entry(&mut store, args),
        Commands::Show(args) => commands::show_entry(&store, args),
        Commands::List(args) => commands::list_entries(&config, &store, args),
        Commands::Search(args) => commands::search_entries(&config, &store, args),
        Commands::Tags => commands::tag_summary(&store),
        Commands::Import(args) => commands::import_entries(&mut store, args),
        Commands::Export(args) => commands::export_entries(&store, args),
        Commands::Clear(args) => commands::clear_entries(&mut store, args),
    }
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
