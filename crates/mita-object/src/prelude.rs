//! Convenience re-exports.

pub use crate::client::{BucketLocation, Connect, ConnectOptions, OssConnector, TransferClient};
pub use crate::credentials::{
    CredentialSource, GatewayCredentialSource, StsCredentialProvider, StsCredentials,
};
pub use crate::transfer::{
    DownloadOutput, DownloadRequest, MultipartOutput, MultipartUploadRequest, ObjectTransfer,
    Payload, TrafficLimit, TransferProgress, UploadOutput, UploadRequest,
};
pub use crate::{Error, ObjectConfig, Result, ValidationError};
