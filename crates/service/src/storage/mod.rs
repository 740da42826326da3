//! Storage abstractions for service layer
//!
//! Uploaded model files go through the `FileStore` capability so the ingestion
//! flow does not care whether bytes land on local disk or behind a CDN.

pub mod local;

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::ServiceError;

/// Opaque key/value blob store returning public URLs.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Write `data` under `key` (overwriting) and return its public URL.
    async fn put(&self, key: &str, data: Bytes) -> Result<String, ServiceError>;

    /// Remove `key`; a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), ServiceError>;
}
