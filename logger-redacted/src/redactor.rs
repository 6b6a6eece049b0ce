use regex::Regex;
use lazy_static::lazy_static;
use sha2::{Sha256, Digest};
use base64::{Engine as _, engine::general_purpose};
use std::fmt;

lazy_static! {
    static ref API_KEY_REGEX: Regex = Regex::new(r"\bsk-[A-Za-z0-9_\-]{8,}").unwrap();
    static ref BEARER_REGEX: Regex = Regex::new(r"(?i)\bbearer\s+[A-Za-z0-9._~+/=\-]{8,}").unwrap();
    static ref EMAIL_REGEX: Regex = Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b").unwrap();
}

/// Secret redaction configuration
#[derive(Clone)]
pub struct RedactionConfig {
    pub redact_api_keys: bool,
    pub redact_bearer_tokens: bool,
    pub redact_emails: bool,
    pub hash_for_correlation: bool,
    pub custom_patterns: Vec<(Regex, String)>,
    /// Exact values scrubbed wherever they appear, whatever their shape
    literal_secrets: Vec<String>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            redact_api_keys: true,
            redact_bearer_tokens: true,
            redact_emails: true,
            hash_for_correlation: true,
            custom_patterns: Vec::new(),
            literal_secrets: Vec::new(),
        }
    }
}

impl RedactionConfig {
    /// Always scrub this exact value. Empty values are ignored.
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        if !secret.is_empty() {
            self.literal_secrets.push(secret);
        }
        self
    }

    /// `false` masks matches with a fixed `[REDACTED]` instead of a correlation hash
    #[must_use]
    pub fn with_hash_for_correlation(mut self, enabled: bool) -> Self {
        self.hash_for_correlation = enabled;
        self
    }

    #[must_use]
    pub fn with_custom_pattern(mut self, pattern: Regex, replacement: impl Into<String>) -> Self {
        self.custom_patterns.push((pattern, replacement.into()));
        self
    }
}

impl fmt::Debug for RedactionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedactionConfig")
            .field("redact_api_keys", &self.redact_api_keys)
            .field("redact_bearer_tokens", &self.redact_bearer_tokens)
            .field("redact_emails", &self.redact_emails)
            .field("hash_for_correlation", &self.hash_for_correlation)
            .field("custom_patterns", &self.custom_patterns.len())
            .field("literal_secrets", &self.literal_secrets.len())
            .finish()
    }
}

/// Redactor for log lines and user-facing diagnostics
#[derive(Debug, Clone, Default)]
pub struct SecretRedactor {
    config: RedactionConfig,
}

impl SecretRedactor {
    pub fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    pub fn redact(&self, text: &str) -> String {
        let mut result = text.to_string();

        for secret in &self.config.literal_secrets {
            if result.contains(secret.as_str()) {
                let replacement = self.mask("SECRET", secret);
                result = result.replace(secret.as_str(), &replacement);
            }
        }

        if self.config.redact_bearer_tokens {
            result = self.redact_bearer_tokens(&result);
        }

        if self.config.redact_api_keys {
            result = self.redact_api_keys(&result);
        }

        if self.config.redact_emails {
            result = self.redact_emails(&result);
        }

        for (pattern, replacement) in &self.config.custom_patterns {
            result = pattern.replace_all(&result, replacement.as_str()).to_string();
        }

        result
    }

    fn redact_api_keys(&self, text: &str) -> String {
        API_KEY_REGEX.replace_all(text, |caps: &regex::Captures| {
            self.mask("sk", &caps[0])
        }).to_string()
    }

    fn redact_bearer_tokens(&self, text: &str) -> String {
        BEARER_REGEX.replace_all(text, |caps: &regex::Captures| {
            format!("Bearer {}", self.mask("TOKEN", &caps[0]))
        }).to_string()
    }

    fn redact_emails(&self, text: &str) -> String {
        EMAIL_REGEX.replace_all(text, |caps: &regex::Captures| {
            let email = &caps[0];
            if self.config.hash_for_correlation {
                format!("EMAIL[{}]", self.hash_value(email))
            } else {
                match email.split_once('@') {
                    Some((user, domain)) => format!(
                        "{}***@{}***",
                        user.chars().next().unwrap_or('*'),
                        domain.chars().next().unwrap_or('*')
                    ),
                    None => "***@***.com".to_string(),
                }
            }
        }).to_string()
    }

    fn mask(&self, label: &str, value: &str) -> String {
        if self.config.hash_for_correlation {
            format!("{}[{}]", label, self.hash_value(value))
        } else {
            format!("{}[REDACTED]", label)
        }
    }

    fn hash_value(&self, value: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(value.as_bytes());
        let result = hasher.finalize();
        general_purpose::STANDARD.encode(&result[..8]) // Use first 8 bytes for shorter hash
    }
}

/// Display form of a credential: first and last four characters
///
/// `sk-abcdefghijklmnopqrstuvwx` becomes `sk-a...uvwx`; values of twelve
/// characters or fewer are fully masked.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len().max(3));
    }
    let head: String = chars.iter().take(4).collect();
    let tail: String = chars.iter().skip(chars.len() - 4).collect();
    format!("{}...{}", head, tail)
}
