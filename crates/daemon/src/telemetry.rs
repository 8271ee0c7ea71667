//! Logging and optional OpenTelemetry export
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directives (default: `futon=info`)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (e.g., http://localhost:4317)
//! - `OTEL_SERVICE_NAME`: Service name (default: futon-daemon)
//!
//! ```text
//! OTEL_EXPORTER_OTLP_ENDPOINT=http://localhost:4317 \
//! OTEL_SERVICE_NAME=futon-dev \
//!     ./futon-daemon
//! ```

use crate::config::{LogConfig, LogFormat};
use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

const DEFAULT_FILTER: &str = "futon=info";
const LOG_FILE_PREFIX: &str = "futon-daemon.log";

type Filtered = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<Filtered> + Send + Sync + 'static>;

/// Keeps background writers alive; flushes on drop
pub struct TelemetryGuard {
    _file: Option<WorkerGuard>,
    #[cfg(feature = "telemetry")]
    provider: Option<opentelemetry_sdk::trace::TracerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        #[cfg(feature = "telemetry")]
        {
            if let Some(provider) = self.provider.take() {
                if let Err(e) = provider.shutdown() {
                    eprintln!("OpenTelemetry shutdown failed: {e}");
                }
            }
        }
    }
}

/// Install the global subscriber
pub fn init(config: &LogConfig) -> Result<TelemetryGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .context("Failed to create env filter")?;

    let mut layers: Vec<BoxedLayer> = Vec::new();

    layers.push(match config.format {
        LogFormat::Json => fmt::layer().json().boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
    });

    let file_guard = match &config.dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .boxed(),
            );
            Some(guard)
        }
        None => None,
    };

    #[cfg(feature = "telemetry")]
    let provider = match otel::layer()? {
        Some((layer, provider)) => {
            layers.push(layer);
            Some(provider)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() && cfg!(not(feature = "telemetry")) {
        tracing::warn!("OpenTelemetry endpoint set but feature 'telemetry' not enabled");
        tracing::warn!("Rebuild with: cargo build --features telemetry");
    }

    Ok(TelemetryGuard {
        _file: file_guard,
        #[cfg(feature = "telemetry")]
        provider,
    })
}

#[cfg(feature = "telemetry")]
mod otel {
    use super::BoxedLayer;
    use anyhow::Result;
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::trace::TracerProvider;
    use tracing_subscriber::Layer;

    /// OTLP layer, if an endpoint is configured
    pub(super) fn layer() -> Result<Option<(BoxedLayer, TracerProvider)>> {
        let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") else {
            return Ok(None);
        };
        let service_name =
            std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "futon-daemon".to_string());

        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(&endpoint)
            .build()?;

        let provider = TracerProvider::builder()
            .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
            .build();
        let tracer = provider.tracer(service_name);

        let layer = tracing_opentelemetry::layer().with_tracer(tracer).boxed();
        Ok(Some((layer, provider)))
    }
}
