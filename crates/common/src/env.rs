//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use tracing::info;

/// Ensure the upload storage root exists, creating it when missing.
pub async fn ensure_env(storage_root: &str) -> anyhow::Result<()> {
    if tokio::fs::metadata(storage_root).await.is_err() {
        info!(%storage_root, "storage root missing; creating it");
    }
    tokio::fs::create_dir_all(storage_root)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {storage_root}: {e}"))?;
    Ok(())
}
