//! `shopdesk seed`: Load a catalog fixture.

use shopdesk_store::CatalogSeed;
use std::path::PathBuf;
use tracing::info;

pub async fn run(file: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;

    let json = tokio::fs::read_to_string(&file)
        .await
        .map_err(|e| format!("Cannot read {}: {e}", file.display()))?;
    let seed = CatalogSeed::from_json(&json)?;
    info!(file = %file.display(), summary = %seed.summary(), "Loaded catalog fixture");

    let store = super::open_store(&config).await?;
    let summary = store.seed(&seed).await?;

    println!("Seeded {summary} into {}", config.database.url);
    Ok(())
}
