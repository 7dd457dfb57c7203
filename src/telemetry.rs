use anyhow::{Context, Result};
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, Resource};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

static OTLP_EXPORTER_INSTALLED: AtomicBool = AtomicBool::new(false);
static SUBSCRIBER_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Telemetry configuration structure
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub service_version: String,
    pub environment: String,
    pub otlp_endpoint: Option<String>,
    pub enable_tracing: bool,
    pub export_timeout: Duration,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: env!("CARGO_PKG_NAME").to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            otlp_endpoint: std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok(),
            enable_tracing: std::env::var("OTEL_TRACES_ENABLED")
                .map(|v| v.parse().unwrap_or(true))
                .unwrap_or(true),
            export_timeout: Duration::from_secs(30),
        }
    }
}

/// Telemetry handles for graceful shutdown
pub struct TelemetryHandles {
    _config: TelemetryConfig,
}

impl TelemetryHandles {
    /// Flushes pending spans and shuts the tracer provider down
    pub async fn shutdown(self) -> Result<()> {
        info!("Shutting down telemetry providers...");
        global::shutdown_tracer_provider();
        OTLP_EXPORTER_INSTALLED.store(false, Ordering::SeqCst);
        info!("Telemetry providers shutdown completed");
        Ok(())
    }
}

/// Installs the log subscriber and, when an endpoint is configured, the OTLP tracer.
pub async fn init_telemetry(config: Option<TelemetryConfig>) -> Result<TelemetryHandles> {
    let config = config.unwrap_or_default();

    setup_tracing_subscriber()?;

    info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = %config.environment,
        "Initializing telemetry"
    );

    if config.enable_tracing {
        let resource = create_resource(&config);
        init_tracing(&config, resource)?;
    }

    Ok(TelemetryHandles { _config: config })
}

fn create_resource(config: &TelemetryConfig) -> Resource {
    Resource::new(vec![
        KeyValue::new("service.name", config.service_name.clone()),
        KeyValue::new("service.version", config.service_version.clone()),
        KeyValue::new("deployment.environment", config.environment.clone()),
    ])
}

fn init_tracing(config: &TelemetryConfig, resource: Resource) -> Result<()> {
    let Some(endpoint) = &config.otlp_endpoint else {
        info!("No OTLP endpoint configured, using console-only tracing");
        return Ok(());
    };

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint)
                .with_timeout(config.export_timeout),
        )
        .with_trace_config(
            opentelemetry_sdk::trace::config()
                .with_resource(resource)
                .with_sampler(opentelemetry_sdk::trace::Sampler::AlwaysOn),
        )
        .install_batch(runtime::Tokio)
        .context("Failed to initialize OTLP tracer")?;

    OTLP_EXPORTER_INSTALLED.store(true, Ordering::SeqCst);
    info!(endpoint = %endpoint, "Distributed tracing initialized with OTLP exporter");
    Ok(())
}

fn setup_tracing_subscriber() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{}=debug,tower_http=info", env!("CARGO_CRATE_NAME")).into());

    Registry::default()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    SUBSCRIBER_INSTALLED.store(true, Ordering::SeqCst);
    Ok(())
}

/// Get a tracer instance for the current service
pub fn get_tracer(name: &'static str) -> global::BoxedTracer {
    global::tracer(name)
}

/// Health of the telemetry components, reported by `/health`
pub fn telemetry_health_check() -> HashMap<String, bool> {
    let mut health = HashMap::new();
    health.insert(
        "log_subscriber".to_string(),
        SUBSCRIBER_INSTALLED.load(Ordering::SeqCst),
    );
    health.insert(
        "otlp_exporter".to_string(),
        OTLP_EXPORTER_INSTALLED.load(Ordering::SeqCst),
    );
    health
}
