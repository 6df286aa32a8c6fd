//! Configuration management for the submission client.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{CrptError, Result};

/// Main configuration for the submission client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrptConfig {
    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Remote API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

impl Default for CrptConfig {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

/// Rate limiting configuration.
///
/// Both values are fixed for the lifetime of the pipeline built from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Length of the enforcement window in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Maximum number of requests issued within one window
    #[serde(default = "default_max_requests")]
    pub max_requests_per_window: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            max_requests_per_window: default_max_requests(),
        }
    }
}

fn default_window_secs() -> u64 {
    1
}

fn default_max_requests() -> u32 {
    10
}

impl RateLimitConfig {
    /// Validate the configured values.
    pub fn validate(&self) -> Result<()> {
        if self.window_secs == 0 {
            return Err(CrptError::Config(
                "window_secs must be greater than zero".to_string(),
            ));
        }
        if self.max_requests_per_window == 0 {
            return Err(CrptError::Config(
                "max_requests_per_window must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Fixed spacing between dispatch firings: window divided by request limit.
    ///
    /// Call [`validate`](Self::validate) first; a zero request limit would
    /// divide by zero here.
    pub fn pacing_interval(&self) -> Duration {
        Duration::from_secs(self.window_secs) / self.max_requests_per_window
    }
}

/// Remote registration API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Document creation endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Product group sent as the `pg` query parameter
    #[serde(default = "default_product_group")]
    pub product_group: String,

    /// Per-request timeout in seconds applied by the transport
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            product_group: default_product_group(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "https://ismp.crpt.ru/api/v3/lk/documents/create".to_string()
}

fn default_product_group() -> String {
    "1".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl ApiConfig {
    /// The transport deadline for a single request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl CrptConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: CrptConfig =
            serde_yaml::from_str(&contents).map_err(|e| CrptError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Validate all sections.
    pub fn validate(&self) -> Result<()> {
        self.rate_limit.validate()
    }
}
