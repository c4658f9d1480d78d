#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod client;
mod config;
/// STS credential bundles, sources and the refreshing provider.
pub mod credentials;
mod error;
/// Upload, multipart upload and download operations.
pub mod transfer;

#[doc(hidden)]
pub mod prelude;

pub use crate::config::ObjectConfig;
pub use crate::error::{Error, Result, ValidationError};
