//! Subscriber configuration and setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::error::{TelemetryError, TelemetryResult};

/// Output formatting for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-oriented multi-line output; good for local development.
    Pretty,
    /// Single-line, field-aligned output; good default for a daemon's
    /// console.
    #[default]
    Compact,
    /// Newline-delimited JSON; good for shipping to a log aggregator.
    Json,
}

/// Where log output is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogTarget {
    /// Standard output.
    #[default]
    Stdout,
    /// Standard error.
    Stderr,
}

/// Configuration for [`setup_logging`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    level: String,
    format: LogFormat,
    target: LogTarget,
    extra_directives: Vec<String>,
}

impl LogConfig {
    /// Start a config at the given base level (e.g. `"info"`, `"debug"`).
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            format: LogFormat::default(),
            target: LogTarget::default(),
            extra_directives: Vec::new(),
        }
    }

    /// Set the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the output target.
    #[must_use]
    pub fn with_target(mut self, target: LogTarget) -> Self {
        self.target = target;
        self
    }

    /// Add an extra `EnvFilter` directive (e.g. `"acf_gateway=trace"`),
    /// layered on top of the base level.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.extra_directives.push(directive.into());
        self
    }

    fn filter(&self) -> TelemetryResult<EnvFilter> {
        let mut spec = self.level.clone();
        for directive in &self.extra_directives {
            spec.push(',');
            spec.push_str(directive);
        }
        EnvFilter::try_new(spec.clone()).map_err(|e| TelemetryError::Config(format!("{spec}: {e}")))
    }
}

/// Install a global `tracing` subscriber built from `config`.
///
/// # Errors
///
/// Returns [`TelemetryError::Config`] if the level/directives do not parse
/// as a valid `EnvFilter`, or [`TelemetryError::Init`] if a global
/// subscriber is already installed.
pub fn setup_logging(config: &LogConfig) -> TelemetryResult<()> {
    let filter = config.filter()?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = match (config.format, config.target) {
        (LogFormat::Pretty, LogTarget::Stdout) => registry.with(tracing_subscriber::fmt::layer().pretty()).try_init(),
        (LogFormat::Pretty, LogTarget::Stderr) => registry
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
        (LogFormat::Compact, LogTarget::Stdout) => {
            registry.with(tracing_subscriber::fmt::layer().compact()).try_init()
        }
        (LogFormat::Compact, LogTarget::Stderr) => registry
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .try_init(),
        (LogFormat::Json, LogTarget::Stdout) => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        (LogFormat::Json, LogTarget::Stderr) => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };

    result.map_err(|e| TelemetryError::Init(e.to_string()))
}

/// Install a global subscriber at `info` level, compact format, stdout —
/// the daemon's default when no explicit [`LogConfig`] is supplied.
///
/// # Errors
///
/// See [`setup_logging`].
pub fn setup_default_logging() -> TelemetryResult<()> {
    setup_logging(&LogConfig::new("info"))
}
