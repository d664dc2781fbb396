//! LLM provider factory.
//!
//! Creates clients from a provider name plus optional endpoint and API
//! key, so callers stay decoupled from concrete provider types.

use crate::client::LlmClient;
use crate::providers::OpenRouterClient;
use lorebase_core::{AppError, AppResult};
use std::sync::Arc;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("openrouter")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - Optional API key (required by providers that need it)
///
/// # Errors
/// Returns a Config error when the provider is unknown or a required
/// API key is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    match provider.to_lowercase().as_str() {
        "openrouter" => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("OpenRouter provider requires an API key".to_string())
            })?;

            let client = match endpoint {
                Some(endpoint) => OpenRouterClient::with_base_url(endpoint, api_key),
                None => OpenRouterClient::new(api_key),
            };
            Ok(Arc::new(client))
        }
        _ => Err(AppError::Config(format!("Unknown provider: {}", provider))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_openrouter_client() {
        let client = create_client("openrouter", None, Some("key"));
        assert!(client.is_ok());
        assert_eq!(client.unwrap().provider_name(), "openrouter");
    }

    #[test]
    fn test_create_openrouter_custom_endpoint() {
        let client = create_client("openrouter", Some("http://localhost:8080/v1"), Some("key"));
        assert!(client.is_ok());
    }

    #[test]
    fn test_openrouter_requires_api_key() {
        match create_client("openrouter", None, None) {
            Err(err) => assert!(err.to_string().contains("requires an API key")),
            Ok(_) => panic!("Expected error for OpenRouter without API key"),
        }
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", None, None) {
            Err(err) => assert!(err.to_string().contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
