//! Log output configuration.

use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};

/// Format of log lines written to stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Log output options.
#[derive(Debug, Clone, Serialize, Deserialize, Args)]
pub struct TelemetryConfig {
    /// Format of log lines
    #[arg(long, env = "MITA_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    #[serde(default)]
    pub log_format: LogFormat,

    /// Colorize text logs
    #[arg(long, env = "MITA_LOG_ANSI", default_value_t = true, action = clap::ArgAction::Set)]
    #[serde(default = "default_true")]
    pub log_ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Text,
            log_ansi: true,
        }
    }
}

const fn default_true() -> bool {
    true
}
