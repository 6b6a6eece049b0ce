// Logger configuration
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Filter directive used when `KEYPROBE_LOG` is not set, e.g. `warn` or `credential_validator=debug`
    pub log_level: String,
    pub format: LogFormat,
    pub ansi: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            format: LogFormat::Text,
            ansi: true,
        }
    }
}

impl LoggerConfig {
    /// Verbose runs log the whole workspace at debug level
    pub fn verbose() -> Self {
        Self {
            log_level: "credential_validator=debug,keyprobe_cli=debug,reqwest=info,warn".to_string(),
            ..Self::default()
        }
    }
}
