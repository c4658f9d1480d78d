use object_store::aws::AwsCredential;
use serde::{Deserialize, Serialize};

/// Suffix some credential endpoints append to the region identifier.
const REGION_HOST_SUFFIX: &str = ".aliyuncs.com";

/// Short-lived credential bundle issued by the credential endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StsCredentials {
    /// Temporary access key id.
    pub access_key_id: String,
    /// Temporary access key secret.
    pub access_key_secret: String,
    /// Security token accompanying the temporary keys.
    pub sts_token: String,
    /// Storage region, e.g. `oss-cn-hangzhou`.
    pub region: String,
    /// Bucket the bundle grants access to.
    pub bucket: String,
    /// Seconds until the bundle expires; zero when unknown.
    #[serde(default)]
    pub expiration: i64,
    /// Per-user upload directory.
    #[serde(default)]
    pub catalogue: Option<String>,
}

impl std::fmt::Debug for StsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<redacted>")
            .field("sts_token", &"<redacted>")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("expiration", &self.expiration)
            .field("catalogue", &self.catalogue)
            .finish()
    }
}

impl StsCredentials {
    /// Creates a bundle without expiration or catalogue.
    pub fn new(
        access_key_id: impl Into<String>,
        access_key_secret: impl Into<String>,
        sts_token: impl Into<String>,
        region: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
            sts_token: sts_token.into(),
            region: region.into(),
            bucket: bucket.into(),
            expiration: 0,
            catalogue: None,
        }
    }

    /// Set the per-user upload directory.
    #[must_use]
    pub fn with_catalogue(mut self, catalogue: impl Into<String>) -> Self {
        self.catalogue = Some(catalogue.into());
        self
    }

    /// Region without a trailing service host suffix.
    pub fn normalized_region(&self) -> &str {
        self.region
            .strip_suffix(REGION_HOST_SUFFIX)
            .unwrap_or(&self.region)
    }

    /// Catalogue, when present and non-empty.
    pub fn catalogue(&self) -> Option<&str> {
        self.catalogue
            .as_deref()
            .map(|c| c.trim_matches('/'))
            .filter(|c| !c.is_empty())
    }

    /// Converts the bundle into the signing credential of the store client.
    pub fn to_aws_credential(&self) -> AwsCredential {
        AwsCredential {
            key_id: self.access_key_id.clone(),
            secret_key: self.access_key_secret.clone(),
            token: (!self.sts_token.is_empty()).then(|| self.sts_token.clone()),
        }
    }
}
