//! Tracing subscriber initialization driven by [`LoggingConfig`].
//!
//! ```no_run
//! use tidings_types::LoggingConfig;
//!
//! tidings_observe::init_tracing(&LoggingConfig::default()).unwrap();
//! // ... run the application ...
//! tidings_observe::shutdown_tracing();
//! ```

use std::sync::OnceLock;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tidings_types::LoggingConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Kept so [`shutdown_tracing`] can flush buffered spans.
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `config.filter`. Output is human-readable unless
/// `config.json` is set. With `config.otel`, spans are also bridged to
/// OpenTelemetry through a stdout exporter.
///
/// # Errors
///
/// Fails if the filter directive is invalid or a global subscriber is
/// already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter)?,
    };

    let fmt_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(true).boxed()
    };

    let otel_layer = if config.otel {
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build();
        let tracer = provider.tracer("tidings");
        let _ = TRACER_PROVIDER.set(provider.clone());
        opentelemetry::global::set_tracer_provider(provider);
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()?;

    tracing::debug!(json = config.json, otel = config.otel, "tracing initialized");
    Ok(())
}

/// Flush and shut down the OpenTelemetry provider, if one was installed.
pub fn shutdown_tracing() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            eprintln!("Warning: OTel tracer provider shutdown error: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_parses() {
        let config = LoggingConfig::default();
        assert!(EnvFilter::try_new(&config.filter).is_ok());
    }

    // The global subscriber can be installed once per process, so every
    // `init_tracing` call lives in this one test.
    #[test]
    fn init_tracing_lifecycle() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }

        let bad_filter = LoggingConfig {
            filter: "tidings=notalevel".to_string(),
            ..LoggingConfig::default()
        };
        assert!(init_tracing(&bad_filter).is_err());

        let json = LoggingConfig {
            json: true,
            ..LoggingConfig::default()
        };
        assert!(init_tracing(&json).is_ok());

        // Already installed: the OTel provider is built, then install fails.
        let otel = LoggingConfig {
            otel: true,
            ..LoggingConfig::default()
        };
        assert!(init_tracing(&otel).is_err());
        assert!(TRACER_PROVIDER.get().is_some());
        shutdown_tracing();
    }
}
