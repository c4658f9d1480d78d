//! Object transfer configuration.

use std::path::PathBuf;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::credentials::StsCredentials;
use crate::error::{Error, Result};
use crate::transfer::{DEFAULT_PARALLELISM, DEFAULT_PART_SIZE};

/// Gateway path serving the STS credential bundle.
pub const DEFAULT_CREDENTIAL_PATH: &str = "/oss/sts-token";

/// Virtual-hosted endpoint template of the storage service.
pub const DEFAULT_ENDPOINT_TEMPLATE: &str = "https://{bucket}.{region}.aliyuncs.com";

/// Refresh interval used when neither configuration nor bundle provide one.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 10;

/// Configuration for object transfers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ObjectConfig {
    /// Gateway path of the STS credential endpoint
    #[cfg_attr(
        feature = "config",
        arg(
            long = "oss-credential-path",
            env = "MITA_OSS_CREDENTIAL_PATH",
            default_value = DEFAULT_CREDENTIAL_PATH
        )
    )]
    #[serde(default = "default_credential_path")]
    pub credential_path: String,

    /// Endpoint template with `{bucket}` and `{region}` placeholders
    #[cfg_attr(
        feature = "config",
        arg(
            long = "oss-endpoint",
            env = "MITA_OSS_ENDPOINT",
            default_value = DEFAULT_ENDPOINT_TEMPLATE
        )
    )]
    #[serde(default = "default_endpoint_template")]
    pub endpoint_template: String,

    /// Credential refresh interval in seconds (defaults to the bundle expiration)
    #[cfg_attr(
        feature = "config",
        arg(long = "oss-refresh-interval", env = "MITA_OSS_REFRESH_INTERVAL_SECS")
    )]
    #[serde(default)]
    pub refresh_interval: Option<u64>,

    /// Default multipart part size in bytes
    #[cfg_attr(
        feature = "config",
        arg(long = "oss-part-size", env = "MITA_OSS_PART_SIZE", default_value = "5242880")
    )]
    #[serde(default = "default_part_size")]
    pub part_size: u64,

    /// Maximum number of part uploads in flight
    #[cfg_attr(
        feature = "config",
        arg(long = "oss-parallelism", env = "MITA_OSS_PARALLELISM", default_value = "5")
    )]
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,

    /// Directory holding multipart checkpoints
    #[cfg_attr(
        feature = "config",
        arg(long = "oss-checkpoint-dir", env = "MITA_OSS_CHECKPOINT_DIR")
    )]
    #[serde(default)]
    pub checkpoint_dir: Option<PathBuf>,

    /// Prefix uploaded keys with the catalogue of the credential bundle
    #[cfg_attr(
        feature = "config",
        arg(long = "oss-catalogue-prefix", env = "MITA_OSS_CATALOGUE_PREFIX")
    )]
    #[serde(default)]
    pub catalogue_prefix: bool,
}

fn default_credential_path() -> String {
    DEFAULT_CREDENTIAL_PATH.to_owned()
}

fn default_endpoint_template() -> String {
    DEFAULT_ENDPOINT_TEMPLATE.to_owned()
}

fn default_part_size() -> u64 {
    DEFAULT_PART_SIZE
}

fn default_parallelism() -> usize {
    DEFAULT_PARALLELISM
}

impl Default for ObjectConfig {
    fn default() -> Self {
        Self {
            credential_path: default_credential_path(),
            endpoint_template: default_endpoint_template(),
            refresh_interval: None,
            part_size: default_part_size(),
            parallelism: default_parallelism(),
            checkpoint_dir: None,
            catalogue_prefix: false,
        }
    }
}

impl ObjectConfig {
    /// Returns the refresh interval for a freshly fetched bundle.
    ///
    /// The configured interval wins; otherwise the bundle expiration is used
    /// when positive, falling back to [`DEFAULT_REFRESH_INTERVAL_SECS`].
    pub fn refresh_interval_for(&self, bundle: &StsCredentials) -> Duration {
        let secs = match self.refresh_interval {
            Some(secs) if secs > 0 => secs,
            _ if bundle.expiration > 0 => bundle.expiration.unsigned_abs(),
            _ => DEFAULT_REFRESH_INTERVAL_SECS,
        };
        Duration::from_secs(secs)
    }

    /// Renders the endpoint for `bucket` in `region`.
    pub fn endpoint_for(&self, bucket: &str, region: &str) -> String {
        self.endpoint_template
            .replace("{bucket}", bucket)
            .replace("{region}", region)
            .trim_end_matches('/')
            .to_owned()
    }

    /// Returns the checkpoint directory, defaulting below the system temp dir.
    pub fn effective_checkpoint_dir(&self) -> PathBuf {
        self.checkpoint_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("mita-checkpoints"))
    }

    /// Returns the parallelism, using the default if zero.
    pub fn effective_parallelism(&self) -> usize {
        if self.parallelism == 0 {
            DEFAULT_PARALLELISM
        } else {
            self.parallelism
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.part_size == 0 {
            return Err(Error::Config("part_size must be positive".into()));
        }
        if !self.endpoint_template.starts_with("http://")
            && !self.endpoint_template.starts_with("https://")
        {
            return Err(Error::Config(format!(
                "endpoint template must be an http(s) URL, got `{}`",
                self.endpoint_template
            )));
        }
        Ok(())
    }

    /// Set the credential endpoint path.
    #[must_use]
    pub fn with_credential_path(mut self, path: impl Into<String>) -> Self {
        self.credential_path = path.into();
        self
    }

    /// Set the endpoint template.
    #[must_use]
    pub fn with_endpoint_template(mut self, template: impl Into<String>) -> Self {
        self.endpoint_template = template.into();
        self
    }

    /// Set the refresh interval in seconds.
    #[must_use]
    pub fn with_refresh_interval(mut self, secs: u64) -> Self {
        self.refresh_interval = Some(secs);
        self
    }

    /// Set the default part size in bytes.
    #[must_use]
    pub fn with_part_size(mut self, part_size: u64) -> Self {
        self.part_size = part_size;
        self
    }

    /// Set the multipart parallelism.
    #[must_use]
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Set the checkpoint directory.
    #[must_use]
    pub fn with_checkpoint_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.checkpoint_dir = Some(dir.into());
        self
    }

    /// Enable or disable the catalogue key prefix.
    #[must_use]
    pub fn with_catalogue_prefix(mut self, enabled: bool) -> Self {
        self.catalogue_prefix = enabled;
        self
    }
}
