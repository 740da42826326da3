#![cfg(test)]
use std::path::PathBuf;
use std::sync::Arc;

use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::storage::local::LocalFileStore;

/// Fresh migrated in-memory database; every call gets its own schema.
pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    models::db::connect_in_memory().await
}

/// Throwaway storage root under the system temp dir.
pub fn temp_storage() -> (PathBuf, Arc<LocalFileStore>) {
    let root = std::env::temp_dir().join(format!("market_store_{}", Uuid::new_v4()));
    let store = Arc::new(LocalFileStore::new(root.clone(), "http://localhost:8080/storage"));
    (root, store)
}

/// Author + category pair most listing tests need.
pub async fn seed_author_and_category(
    db: &DatabaseConnection,
) -> Result<(models::user::Model, models::category::Model), anyhow::Error> {
    let author = models::user::create(db, "author@example.com", "Author", Some("author")).await?;
    let category = models::category::create(db, "Vehicles", "vehicles").await?;
    Ok((author, category))
}
