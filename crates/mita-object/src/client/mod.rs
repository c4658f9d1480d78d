//! Per-call object store client.
//!
//! [`TransferClient`] bundles the object store handles produced by a
//! [`Connect`] implementation with the [`BucketLocation`] they point at.
//! Clients are built fresh for every transfer and dropped afterwards.

use std::sync::Arc;

use object_store::ObjectStore;
use object_store::multipart::MultipartStore;
use object_store::path::Path as ObjectPath;
use url::Url;

use crate::error::ValidationError;

mod connect;

pub use connect::{Connect, ConnectOptions, OssConnector};

/// Tracing target for client construction.
pub const TRACING_TARGET: &str = "mita_object::client";

/// Bucket, region and addressing details of an active client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketLocation {
    /// Bucket name.
    pub bucket: String,
    /// Region identifier.
    pub region: String,
    /// Base URL objects are addressed under, without trailing slash.
    pub endpoint: String,
    /// Per-user upload directory from the credential bundle.
    pub catalogue: Option<String>,
}

impl BucketLocation {
    /// Creates a location without catalogue.
    pub fn new(
        bucket: impl Into<String>,
        region: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            endpoint: endpoint.into().trim_end_matches('/').to_owned(),
            catalogue: None,
        }
    }

    /// Set the catalogue.
    #[must_use]
    pub fn with_catalogue(mut self, catalogue: Option<String>) -> Self {
        self.catalogue = catalogue.filter(|c| !c.is_empty());
        self
    }

    /// Resolves the object key for an uploaded `name`.
    ///
    /// With `use_catalogue` set and a catalogue present the key becomes
    /// `{catalogue}/{name}`; otherwise `name` is used as is.
    pub fn resolve_key(&self, name: &str, use_catalogue: bool) -> String {
        match self.catalogue.as_deref().map(|c| c.trim_matches('/')) {
            Some(catalogue) if use_catalogue && !catalogue.is_empty() => {
                format!("{catalogue}/{}", name.trim_start_matches('/'))
            }
            _ => name.to_owned(),
        }
    }

    /// Public URL of the object stored at `key`.
    ///
    /// Each key segment is percent-encoded, so `#` or `?` in a name stay part
    /// of the path.
    pub fn object_url(&self, key: &str) -> String {
        let key = key.trim_start_matches('/');
        let Ok(mut url) = Url::parse(&self.endpoint) else {
            return format!("{}/{key}", self.endpoint);
        };
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(key.split('/'));
        }
        url.into()
    }
}

/// Store path of `key`, taken verbatim.
///
/// Keys the store would have to rewrite (leading or trailing `/`, empty
/// segments, `.` or `..` segments, control characters) are rejected.
pub fn object_path(key: &str) -> Result<ObjectPath, ValidationError> {
    match ObjectPath::parse(key) {
        Ok(path) if path.as_ref() == key => Ok(path),
        _ => Err(ValidationError::InvalidKey),
    }
}

/// Object store handles for one transfer.
#[derive(Clone)]
pub struct TransferClient {
    objects: Arc<dyn ObjectStore>,
    multipart: Arc<dyn MultipartStore>,
    location: BucketLocation,
}

impl std::fmt::Debug for TransferClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferClient")
            .field("objects", &self.objects)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl TransferClient {
    /// Wraps a store implementing both single-shot and multipart uploads.
    pub fn new<S>(store: S, location: BucketLocation) -> Self
    where
        S: ObjectStore + MultipartStore,
    {
        let store = Arc::new(store);
        Self {
            objects: store.clone(),
            multipart: store,
            location,
        }
    }

    /// Builds a client from separate object and multipart handles.
    pub fn from_parts(
        objects: Arc<dyn ObjectStore>,
        multipart: Arc<dyn MultipartStore>,
        location: BucketLocation,
    ) -> Self {
        Self {
            objects,
            multipart,
            location,
        }
    }

    /// Handle used for single-shot puts and gets.
    pub fn objects(&self) -> &Arc<dyn ObjectStore> {
        &self.objects
    }

    /// Handle used for multipart uploads.
    pub fn multipart(&self) -> &Arc<dyn MultipartStore> {
        &self.multipart
    }

    /// Location this client points at.
    pub fn location(&self) -> &BucketLocation {
        &self.location
    }
}

#[cfg(test)]
mod tests {
    use object_store::memory::InMemory;

    use super::*;

    fn location() -> BucketLocation {
        BucketLocation::new("media", "oss-cn-hangzhou", "https://media.oss-cn-hangzhou.aliyuncs.com/")
    }

    #[test]
    fn test_object_url() {
        assert_eq!(
            location().object_url("reports/q1.pdf"),
            "https://media.oss-cn-hangzhou.aliyuncs.com/reports/q1.pdf"
        );
    }

    #[test]
    fn test_object_url_encodes_segments() {
        assert_eq!(
            location().object_url("users/7/report[1]#v2%.pdf"),
            "https://media.oss-cn-hangzhou.aliyuncs.com/users/7/report[1]%23v2%25.pdf"
        );
        let prefixed = BucketLocation::new("media", "local", "http://127.0.0.1:9000/media");
        assert_eq!(prefixed.object_url("a b.txt"), "http://127.0.0.1:9000/media/a%20b.txt");
    }

    #[test]
    fn test_object_path_is_verbatim() {
        let path = object_path("docs/report[1]#v2%.pdf").unwrap();
        assert_eq!(path.as_ref(), "docs/report[1]#v2%.pdf");

        for key in ["/lead.txt", "trail/", "a//b", "a/../b", "./a", "bad\nname"] {
            assert_eq!(object_path(key), Err(ValidationError::InvalidKey), "{key:?}");
        }
    }

    #[test]
    fn test_resolve_key_with_catalogue() {
        let location = location().with_catalogue(Some("users/7/".into()));
        assert_eq!(location.resolve_key("a.png", true), "users/7/a.png");
        assert_eq!(location.resolve_key("a.png", false), "a.png");
    }

    #[test]
    fn test_resolve_key_without_catalogue() {
        let location = location().with_catalogue(Some(String::new()));
        assert!(location.catalogue.is_none());
        assert_eq!(location.resolve_key("a.png", true), "a.png");
    }

    #[test]
    fn test_client_shares_store() {
        let client = TransferClient::new(InMemory::new(), location());
        assert_eq!(client.location().bucket, "media");
        assert!(format!("{client:?}").contains("InMemory"));
    }
}
