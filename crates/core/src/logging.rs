//! Logging infrastructure for lorebase.
//!
//! Initializes the tracing subscriber for structured logging. All logs go
//! to stderr so stdout stays clean for data output (search results,
//! context blocks, JSON).

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::AppResult;

/// Initialize the tracing subscriber with stderr output.
///
/// Filtering comes from `RUST_LOG` unless an explicit level override is
/// provided.
///
/// # Arguments
/// * `log_level` - Optional log level override (e.g., "debug", "info")
/// * `no_color` - Disable colored output
pub fn init_logging(log_level: Option<&str>, no_color: bool) -> AppResult<()> {
    let default_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_str = log_level.unwrap_or(&default_level);

    let env_filter = EnvFilter::try_new(filter_str)
        .map_err(|e| crate::error::AppError::Config(format!("Invalid log filter: {}", e)))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(!no_color && supports_color());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| crate::error::AppError::Config(format!("Failed to init logging: {}", e)))?;

    Ok(())
}

/// Check if the terminal supports color output.
fn supports_color() -> bool {
    // NO_COLOR wins over everything else
    std::env::var("NO_COLOR").is_err()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging() {
        // The global subscriber can only be installed once per process, so
        // a second call from another test is allowed to fail.
        let result = init_logging(None, true);
        assert!(result.is_ok() || result.is_err());
    }

    #[test]
    fn test_invalid_filter_rejected() {
        let result = init_logging(Some("not a [valid] filter ;;"), true);
        assert!(result.is_err());
    }
}
