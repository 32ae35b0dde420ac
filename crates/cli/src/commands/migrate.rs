//! `shopdesk migrate`: Create the catalog and conversation tables.

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    // Opening the store runs every migration.
    super::open_store(&config).await?;
    println!("Schema ready at {}", config.database.url);
    Ok(())
}
