//! Structured logging.

use std::future::Future;

use tokio::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// `LOG_FORMAT=json` selects JSON; anything else is pretty text.
    pub fn from_env() -> Self {
        Self::parse(std::env::var("LOG_FORMAT").ok().as_deref())
    }

    fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `default_level`.
///
/// Calling this twice is harmless: the second call returns an error that
/// callers may ignore.
pub fn init_tracing(
    format: LogFormat,
    default_level: &str,
) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match format {
        LogFormat::Json => Registry::default()
            .with(filter)
            .with(fmt::layer().json().with_current_span(false))
            .try_init()?,
        LogFormat::Pretty => Registry::default()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .try_init()?,
    }
    Ok(())
}

/// Run `fut` and log how it went: `info` on success, `warn` with the error
/// code on failure.
pub async fn observe<T, F>(operation: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let started = Instant::now();
    let result = fut.await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match &result {
        Ok(_) => info!(operation, elapsed_ms, "operation completed"),
        Err(e) => warn!(
            operation,
            elapsed_ms,
            error_code = e.error_code(),
            error = %e,
            "operation failed"
        ),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;

    #[test]
    fn log_format_parsing() {
        assert_eq!(LogFormat::parse(Some("json")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some(" JSON ")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("pretty")), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(None), LogFormat::Pretty);
    }

    #[tokio::test]
    async fn observe_passes_results_through() {
        let ok = observe("ok_op", async { Ok(5) }).await.unwrap();
        assert_eq!(ok, 5);

        let err = observe::<(), _>("bad_op", async {
            Err(BridgeError::infrastructure("bad_op", "boom"))
        })
        .await
        .unwrap_err();
        assert_eq!(err.error_code(), "infrastructure");
    }
}
