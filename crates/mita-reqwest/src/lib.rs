#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod connect;
mod error;
mod request;

pub use crate::connect::{ReqwestClient, ReqwestConfig, SessionContext, TRACING_TARGET};
pub use crate::error::{Error, Result};
pub use crate::request::{ApiEnvelope, HttpMethod, query_pairs, strip_empty};
