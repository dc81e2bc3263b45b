//! Configuration and environment selection.
use serde::{Deserialize, Serialize};
use std::{str::FromStr, time::Duration};
use thiserror::Error;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// CIS environment selection for the fiscalization endpoint.
/// - Test: the demo registry that accepts demo (FINA DEMO) certificates.
/// - Production: the live registry.
/// # Examples
/// ```rust
/// use std::str::FromStr;
/// use fiskal_core::config::EnvironmentType;
///
/// let env = EnvironmentType::from_str("production")?;
/// assert_eq!(env, EnvironmentType::Production);
/// # Ok::<(), fiskal_core::config::EnvironmentParseError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvironmentType {
    Test,
    Production,
}

/// Error returned when parsing an [`EnvironmentType`] from a string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvironmentParseError {
    #[error("invalid environment type: {input}")]
    Invalid { input: String },
}

impl FromStr for EnvironmentType {
    type Err = EnvironmentParseError;
    fn from_str(env: &str) -> Result<EnvironmentType, EnvironmentParseError> {
        match env.to_ascii_lowercase().as_str() {
            "test" => Ok(EnvironmentType::Test),
            "production" => Ok(EnvironmentType::Production),
            _ => Err(EnvironmentParseError::Invalid {
                input: env.to_string(),
            }),
        }
    }
}

impl EnvironmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentType::Test => "test",
            EnvironmentType::Production => "production",
        }
    }

    pub fn endpoint_url(&self) -> &'static str {
        match self {
            EnvironmentType::Test => "https://cistest.apis-it.hr:8449/FiskalizacijaServiceTest",
            EnvironmentType::Production => "https://cis.porezna-uprava.hr:8449/FiskalizacijaService",
        }
    }
}

/// Configuration for the protocol client.
///
/// Loading values from files or the environment is left to the caller.
///
/// # Examples
/// ```rust
/// use std::time::Duration;
/// use fiskal_core::config::{Config, EnvironmentType};
///
/// let config = Config::new(EnvironmentType::Production)
///     .with_timeout(Duration::from_secs(3));
/// assert_eq!(config.timeout(), Duration::from_secs(3));
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    env: EnvironmentType,
    endpoint: Option<String>,
    timeout: Duration,
    connect_timeout: Duration,
    root_certificates: Vec<Vec<u8>>,
}

impl Config {
    pub fn new(env: EnvironmentType) -> Self {
        Self {
            env,
            endpoint: None,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            root_certificates: Vec::new(),
        }
    }

    /// Override the environment's endpoint, e.g. for a local proxy.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Trust an additional root certificate (PEM), such as the FINA root CA.
    pub fn with_root_certificate(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.root_certificates.push(pem.into());
        self
    }

    pub fn env(&self) -> EnvironmentType {
        self.env
    }

    pub fn endpoint_url(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.env.endpoint_url())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn root_certificates(&self) -> &[Vec<u8>] {
        &self.root_certificates
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(EnvironmentType::Test)
    }
}
