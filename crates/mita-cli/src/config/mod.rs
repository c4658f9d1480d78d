//! CLI configuration management.
//!
//! This module defines the complete CLI configuration hierarchy:
//!
//! ```text
//! Cli
//! ├── gateway: ReqwestConfig      # API origin, timeout, session headers
//! ├── storage: ObjectConfig       # Credential path, endpoint, multipart
//! ├── telemetry: TelemetryConfig  # Log format
//! └── command: Command            # request | upload | multipart-upload | download
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.
//!
//! # Example
//!
//! ```bash
//! mita --api-url https://api.example.com/api --session-token "$TOKEN" \
//!     upload avatar.png ./avatar.png --speed-limit 512
//!
//! # Or via environment variables
//! MITA_API_URL=https://api.example.com/api mita download avatar.png -o avatar.png
//! ```

mod telemetry;

use std::process;

use anyhow::Context;
use clap::Parser;
use mita_object::ObjectConfig;
use mita_reqwest::ReqwestConfig;
pub use telemetry::{LogFormat, TelemetryConfig};

use crate::command::Command;
use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "mita")]
#[command(about = "Backend requests and object storage transfers")]
#[command(version)]
pub struct Cli {
    /// Request gateway configuration.
    #[clap(flatten)]
    pub gateway: ReqwestConfig,

    /// Object transfer configuration.
    #[clap(flatten)]
    pub storage: ObjectConfig,

    /// Log output configuration.
    #[clap(flatten)]
    pub telemetry: TelemetryConfig,

    /// Operation to run.
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is loaded before clap parses arguments so its variables
    /// act as defaults for the `env` attributes.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.gateway
            .validate()
            .map_err(mita_core::Error::from)
            .context("invalid gateway configuration")?;

        if self.gateway.api_url.is_empty() && self.command.needs_api_origin() {
            anyhow::bail!("an API origin is required: pass --api-url or set MITA_API_URL");
        }

        self.storage
            .validate()
            .map_err(mita_core::Error::from)
            .context("invalid storage configuration")?;
        Ok(())
    }

    /// Logs configuration at debug level (no sensitive information).
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );

        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            api_url = %self.gateway.api_url,
            http_timeout_secs = self.gateway.http_timeout,
            success_codes = ?self.gateway.success_codes,
            authenticated = self.gateway.session.token.is_some(),
            language = %self.gateway.session.language,
            tenant_id = %self.gateway.session.tenant_id,
            "Gateway configuration"
        );

        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            credential_path = %self.storage.credential_path,
            endpoint_template = %self.storage.endpoint_template,
            part_size = self.storage.part_size,
            parallelism = self.storage.parallelism,
            checkpoint_dir = %self.storage.effective_checkpoint_dir().display(),
            catalogue_prefix = self.storage.catalogue_prefix,
            "Storage configuration"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_flattened_configuration() {
        let cli = Cli::try_parse_from([
            "mita",
            "--api-url",
            "https://api.example.com/api",
            "--session-token",
            "abc",
            "--success-code",
            "0",
            "--oss-part-size",
            "1048576",
            "download",
            "a.txt",
        ])
        .unwrap();

        assert_eq!(cli.gateway.api_url, "https://api.example.com/api");
        assert_eq!(cli.gateway.session.token.as_deref(), Some("abc"));
        assert_eq!(cli.gateway.success_codes, vec![0]);
        assert_eq!(cli.storage.part_size, 1_048_576);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_transfers_require_api_origin() {
        let cli = Cli::try_parse_from(["mita", "--api-url", "", "download", "a.txt"]).unwrap();
        assert!(cli.validate().is_err());
    }
}
