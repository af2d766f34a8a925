//! Bring the database schema up to date without starting the server

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use renval_core::Store;
use tracing::info;

use crate::config::ConfigLoader;

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// SQLite database file (overrides config)
    #[arg(long)]
    pub database: Option<PathBuf>,
}

pub fn run(args: MigrateArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let database = args.database.unwrap_or(config.storage.database);
    let version = migrate(&database)?;
    println!("{} is at schema version {}", database.display(), version);
    Ok(())
}

/// Open the database, creating parent directories and applying pending
/// migrations
pub fn open_store(database: &Path) -> Result<Store> {
    if let Some(parent) = database.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let store = Store::open(database)
        .with_context(|| format!("Failed to open database {}", database.display()))?;
    info!(database = %database.display(), version = store.schema_version()?, "Database ready");
    Ok(store)
}

fn migrate(database: &Path) -> Result<i32> {
    Ok(open_store(database)?.schema_version()?)
}
