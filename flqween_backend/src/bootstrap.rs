use crate::auth::TokenSigner;
use crate::config::FlqweenConfig;
use crate::database::Database;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub struct BootstrapResources {
    pub directories_created: Vec<String>,
    pub database_initialized: bool,
    pub database: Database,
    pub tokens: TokenSigner,
}

/// Prepares the on-disk layout, opens and migrates the database and loads
/// the token signing secret.
pub fn initialize(config: &FlqweenConfig) -> Result<BootstrapResources> {
    let mut directories_created = Vec::new();
    create_dir_if_missing(&config.paths.data_dir, &mut directories_created)?;
    create_dir_if_missing(&config.paths.uploads_dir, &mut directories_created)?;
    create_dir_if_missing(&config.paths.keys_dir, &mut directories_created)?;

    let database = Database::connect(&config.paths)?;
    let database_initialized = database.ensure_migrations()?;
    let tokens = TokenSigner::from_config(&config.auth, &config.paths)?;

    tracing::info!(
        base = %config.paths.base.display(),
        created = directories_created.len(),
        database_initialized,
        "bootstrap complete"
    );

    Ok(BootstrapResources {
        directories_created,
        database_initialized,
        database,
        tokens,
    })
}

fn create_dir_if_missing(path: &Path, created: &mut Vec<String>) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory {}", path.display()))?;
        created.push(path.display().to_string());
    }
    Ok(())
}
