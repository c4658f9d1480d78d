//! Reqwest client module.
//!
//! This module provides the gateway client, its configuration and the
//! per-session header values injected into every request.

mod client;
mod config;
mod session;

pub use client::{ReqwestClient, TRACING_TARGET};
pub use config::ReqwestConfig;
pub use session::SessionContext;
