//! Tracing setup for structured logging.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset or invalid. The Kafka clients log
/// every metadata refresh at info.
pub const DEFAULT_FILTER: &str = "info,rskafka=warn,rdkafka=warn,hyper=warn";

/// Tracing configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Process name attached to the startup line
    pub service: &'static str,
    pub filter: String,
    /// One JSON object per line instead of human-readable output
    pub json: bool,
}

impl TracingConfig {
    pub fn new(service: &'static str) -> Self {
        Self {
            service,
            filter: DEFAULT_FILTER.to_string(),
            json: false,
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

/// Installs the global subscriber. A second call in the same process is a
/// no-op.
pub fn init_tracing(config: TracingConfig) {
    let env_filter =
        EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let installed = if config.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(false)
                    .with_target(true),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(true))
            .try_init()
    };

    if installed.is_ok() {
        tracing::info!(
            service = config.service,
            filter = %config.filter,
            json = config.json,
            "Tracing initialized"
        );
    }
}

/// Initialize tracing from `RUST_LOG` and `LOG_JSON`.
pub fn init_tracing_from_env(service: &'static str) {
    let json = std::env::var("LOG_JSON").map(|v| is_truthy(&v)).unwrap_or(false);
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string());

    init_tracing(TracingConfig::new(service).with_filter(filter).with_json(json));
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim(), "1") || value.trim().eq_ignore_ascii_case("true")
}
