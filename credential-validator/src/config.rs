//! Configuration for the validation pipeline

use crate::{Result, ValidatorError};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

/// Canonical provider endpoint
pub const DEFAULT_API_BASE: &str = "https://api.openai.com";

/// Baseline model, also used as the fallback in the availability stage
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

pub const DEFAULT_PROMPT: &str =
    "Hello! Please respond with 'API test successful' if you can see this message.";

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_API_BASE: &str = "OPENAI_API_BASE";
pub const ENV_MODEL: &str = "OPENAI_MODEL";
pub const ENV_TIMEOUT_SECS: &str = "OPENAI_TIMEOUT_SECS";

#[derive(Debug)]
pub struct ValidatorConfig {
    /// Credential under test. `None` is reported by the format stage.
    pub credential: Option<SecretString>,

    /// Base URL override, `None` means [`DEFAULT_API_BASE`]
    pub endpoint_base: Option<String>,

    /// Model used for the availability and completion stages
    pub model_id: String,

    /// Timeout of the connectivity request
    pub connectivity_timeout: Duration,

    /// Timeout of model lookups and the completion request
    pub request_timeout: Duration,

    pub max_tokens: u32,
    pub temperature: f32,
    pub prompt: String,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            credential: None,
            endpoint_base: None,
            model_id: DEFAULT_MODEL.to_string(),
            connectivity_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_tokens: 50,
            temperature: 0.1,
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

impl ValidatorConfig {
    /// Load configuration from process environment variables
    ///
    /// A missing credential is not an error here; the format stage reports it.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            credential: lookup(ENV_API_KEY).map(SecretString::new),
            endpoint_base: lookup(ENV_API_BASE).filter(|base| !base.trim().is_empty()),
            ..Self::default()
        };

        if let Some(model) = lookup(ENV_MODEL).filter(|model| !model.trim().is_empty()) {
            config.model_id = model.trim().to_string();
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let seconds: u64 = raw.trim().parse().map_err(|e| {
                ValidatorError::ConfigError(format!("{ENV_TIMEOUT_SECS}={raw:?}: {e}"))
            })?;
            config.request_timeout = Duration::from_secs(seconds);
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(SecretString::new(credential.into()));
        self
    }

    #[must_use]
    pub fn with_endpoint_base(mut self, base: impl Into<String>) -> Self {
        self.endpoint_base = Some(base.into());
        self
    }

    #[must_use]
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    #[must_use]
    pub fn with_connectivity_timeout(mut self, timeout: Duration) -> Self {
        self.connectivity_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Credential as a plain string slice, empty when absent
    pub fn credential_str(&self) -> &str {
        self.credential
            .as_ref()
            .map_or("", |secret| secret.expose_secret().as_str())
    }

    /// Resolved base URL without trailing `/` or `/v1`
    ///
    /// `https://host` and `https://host/v1` both resolve to `https://host`.
    pub fn api_base(&self) -> String {
        let base = self
            .endpoint_base
            .as_deref()
            .map_or(DEFAULT_API_BASE, str::trim)
            .trim_end_matches('/');
        base.strip_suffix("/v1").unwrap_or(base).to_string()
    }

    /// Reject values that would make every network stage meaningless
    pub fn validate(&self) -> Result<()> {
        let base = self.api_base();
        let parsed = reqwest::Url::parse(&base)
            .map_err(|e| ValidatorError::ConfigError(format!("invalid API base {base:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ValidatorError::ConfigError(format!(
                "API base must use http or https, got {:?}",
                parsed.scheme()
            )));
        }

        if self.model_id.trim().is_empty() {
            return Err(ValidatorError::ConfigError("model id is empty".to_string()));
        }

        if self.connectivity_timeout.is_zero() || self.request_timeout.is_zero() {
            return Err(ValidatorError::ConfigError(
                "timeouts must be greater than zero".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidatorError::ConfigError(format!(
                "temperature {} outside 0.0..=2.0",
                self.temperature
            )));
        }

        Ok(())
    }
}
