//! Subcommands.

mod request;
mod transfer;

use clap::Subcommand;
use mita_object::ObjectConfig;
use mita_object::transfer::ObjectTransfer;
use mita_reqwest::ReqwestClient;
use serde_json::Value;

pub use request::RequestArgs;
pub use transfer::{DownloadArgs, MultipartUploadArgs, TransferLimits, UploadArgs};

use crate::config::Cli;

/// Operation to run.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Send one request through the gateway and print the payload
    Request(RequestArgs),
    /// Upload a file in a single request
    Upload(UploadArgs),
    /// Upload a file in parts, resuming an interrupted upload
    MultipartUpload(MultipartUploadArgs),
    /// Download an object to a file or stdout
    Download(DownloadArgs),
}

impl Command {
    /// Whether the command resolves paths against the API origin.
    pub fn needs_api_origin(&self) -> bool {
        match self {
            Self::Request(args) => !args.direct,
            Self::Upload(_) | Self::MultipartUpload(_) | Self::Download(_) => true,
        }
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Request(_) => "request",
            Self::Upload(_) => "upload",
            Self::MultipartUpload(_) => "multipart-upload",
            Self::Download(_) => "download",
        }
    }
}

/// Runs the selected command, returning the JSON document to print.
pub async fn run(cli: Cli) -> anyhow::Result<Option<Value>> {
    let gateway = ReqwestClient::new(cli.gateway).map_err(mita_core::Error::from)?;

    match cli.command {
        Command::Request(args) => args.run(&gateway).await.map(Some),
        Command::Upload(args) => {
            let transfer = object_transfer(gateway, cli.storage)?;
            args.run(&transfer).await.map(Some)
        }
        Command::MultipartUpload(args) => {
            let transfer = object_transfer(gateway, cli.storage)?;
            args.run(&transfer).await.map(Some)
        }
        Command::Download(args) => {
            let transfer = object_transfer(gateway, cli.storage)?;
            args.run(&transfer).await
        }
    }
}

fn object_transfer(gateway: ReqwestClient, config: ObjectConfig) -> anyhow::Result<ObjectTransfer> {
    Ok(ObjectTransfer::from_gateway(gateway, config).map_err(mita_core::Error::from)?)
}
