//! `shopdesk serve`: Start the HTTP chat gateway.

use tracing::debug;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config()?;

    if let Some(port) = port_override {
        debug!(port, "Port overridden from the command line");
        config.gateway.port = port;
    }
    if !config.has_api_key() {
        return Err("No API key found. Set SHOPDESK_API_KEY or ANTHROPIC_API_KEY.".into());
    }

    println!("Shopdesk gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Database:  {}", config.database.url);
    println!("   Origins:   {}", config.gateway.allowed_origins.join(", "));

    shopdesk_gateway::start(config).await?;

    Ok(())
}
