//! Configuration errors.

/// Errors from loading, merging, or validating a layered configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A layer's TOML could not be parsed.
    #[error("failed to parse config layer {layer}: {source}")]
    Parse {
        /// Which layer failed (e.g. `"tenant:acme"`).
        layer: String,
        /// The underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// The merged configuration failed validation.
    #[error("config validation failed: {0}")]
    Invalid(String),
}

/// Result alias used throughout `acf-config`.
pub type ConfigResult<T> = Result<T, ConfigError>;
