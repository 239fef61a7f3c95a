//! Client configuration.

/// API version used until a caller picks another one.
pub const DEFAULT_API_VERSION: &str = "v46.0";

/// Environment variable read by [`ClientConfig::from_env`].
pub const API_VERSION_ENV: &str = "FORCE_NET_API_VERSION";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Version segment inserted into every versioned path, e.g. `v46.0`.
    /// Not validated.
    pub api_version: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn with_api_version(version: impl Into<String>) -> Self {
        Self {
            api_version: version.into(),
        }
    }

    /// Read overrides from the environment, falling back to the defaults.
    pub fn from_env() -> Self {
        match std::env::var(API_VERSION_ENV) {
            Ok(version) if !version.is_empty() => Self::with_api_version(version),
            _ => Self::default(),
        }
    }
}
