//! Tracing subscriber and optional OpenTelemetry export.

use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing::error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::AppConfig;
use crate::error::AppError;

/// Runtime telemetry state. Call [`Telemetry::shutdown`] before exit to
/// flush buffered spans.
#[derive(Debug)]
pub struct Telemetry {
    tracer_provider: Option<SdkTracerProvider>,
}

impl Telemetry {
    /// Installs JSON logging, plus OTLP span export when an endpoint is
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Telemetry` if the exporter cannot be built or a
    /// global subscriber is already installed.
    pub fn init(config: &AppConfig) -> Result<Self, AppError> {
        let tracer_provider = config
            .otel_exporter_otlp_endpoint
            .as_deref()
            .map(|endpoint| build_tracer_provider(config, endpoint))
            .transpose()?;

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,h2=warn,hyper=warn,tower=warn,tonic=warn,sqlx=warn")
        });
        let subscriber = tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .with(filter);

        let installed = if let Some(provider) = &tracer_provider {
            global::set_text_map_propagator(TraceContextPropagator::new());
            let tracer = provider.tracer(config.otel_service_name.clone());
            subscriber
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .try_init()
        } else {
            subscriber.try_init()
        };
        installed.map_err(|e| AppError::Telemetry(e.to_string()))?;

        Ok(Self { tracer_provider })
    }

    /// Flushes and shuts down the exporter, if any.
    pub fn shutdown(self) {
        let Some(provider) = self.tracer_provider else {
            return;
        };
        if let Err(e) = provider.shutdown() {
            error!("failed to shut down tracer provider: {e}");
        }
    }
}

fn build_tracer_provider(
    config: &AppConfig,
    endpoint: &str,
) -> Result<SdkTracerProvider, AppError> {
    let resource = Resource::builder_empty()
        .with_service_name(config.otel_service_name.clone())
        .with_attributes([KeyValue::new("service.version", env!("CARGO_PKG_VERSION"))])
        .build();

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint.to_owned())
        .build()
        .map_err(|e| AppError::Telemetry(e.to_string()))?;

    Ok(SdkTracerProvider::builder()
        .with_resource(resource)
        .with_batch_exporter(exporter)
        .build())
}
