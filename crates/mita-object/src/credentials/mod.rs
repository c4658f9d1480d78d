//! STS credentials for the object store client.
//!
//! A [`CredentialSource`] produces [`StsCredentials`] bundles; the
//! [`StsCredentialProvider`] plugs a source into `object_store` and refreshes
//! the bundle once its interval has elapsed.

mod provider;
mod source;
mod sts;

pub use provider::StsCredentialProvider;
pub use source::{CredentialSource, GatewayCredentialSource};
pub use sts::StsCredentials;

/// Tracing target for credential operations.
pub const TRACING_TARGET: &str = "mita_object::credentials";
