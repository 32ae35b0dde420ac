pub mod chat;
pub mod migrate;
pub mod seed;
pub mod serve;

use shopdesk_config::AppConfig;
use shopdesk_store::SqliteStore;

/// Load config, failing with a readable message.
pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// Open the configured database, running migrations.
pub async fn open_store(config: &AppConfig) -> Result<SqliteStore, Box<dyn std::error::Error>> {
    Ok(SqliteStore::new(&config.database.url, config.database.max_connections).await?)
}
