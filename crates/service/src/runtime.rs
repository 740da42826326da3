//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` to keep binary crates importing
//! `service::runtime::ensure_env` without depending directly on `common`.

/// Ensure the upload storage root exists.
pub async fn ensure_env(storage_root: &str) -> anyhow::Result<()> {
    common::env::ensure_env(storage_root).await
}
