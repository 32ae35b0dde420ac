//! LLM Provider implementations for Shopdesk.
//!
//! All providers implement the `shopdesk_core::Provider` trait.

pub mod anthropic;

pub use anthropic::AnthropicProvider;

use shopdesk_config::AppConfig;
use shopdesk_core::error::ProviderError;

/// Build the configured provider. Fails when no API key is available.
pub fn build_from_config(config: &AppConfig) -> Result<AnthropicProvider, ProviderError> {
    let api_key = config.api_key.clone().ok_or_else(|| {
        ProviderError::NotConfigured(
            "no API key: set SHOPDESK_API_KEY or ANTHROPIC_API_KEY".into(),
        )
    })?;
    Ok(AnthropicProvider::new(
        api_key,
        std::time::Duration::from_secs(config.provider.timeout_secs),
    )?
    .with_base_url(&config.provider.base_url))
}
