use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use models::model_listing::{self, FileUrls, ListingRow};
use models::{category, user};

use super::domain::{AuthorSummary, CategorySummary, FieldErrors, FileSlot, ListingDetail, ListingSummary, ModelDraft, ValidListing};
use super::validation::{category_missing_message, validate};
use crate::errors::ServiceError;
use crate::pagination::{Cursor, CursorPage, PER_PAGE};
use crate::storage::FileStore;

/// Listing query + ingestion over the database and a file store.
#[derive(Clone)]
pub struct ListingService {
    db: DatabaseConnection,
    store: Arc<dyn FileStore>,
}

/// Storage folder of one listing; only known once the row id exists.
pub fn storage_folder(author_id: Uuid, model_id: i64) -> String { format!("author_{author_id}/model_{model_id}") }

impl ListingService {
    pub fn new(db: DatabaseConnection, store: Arc<dyn FileStore>) -> Self { Self { db, store } }

    /// One page of listings, newest first.
    ///
    /// `path` is the absolute URL of the index endpoint; page links append
    /// `?cursor=`. Unreadable cursors fall back to the first page.
    #[instrument(skip(self, path))]
    pub async fn list(&self, cursor: Option<&str>, path: &str) -> Result<CursorPage<ListingSummary>, ServiceError> {
        let decoded = cursor.filter(|c| !c.trim().is_empty()).and_then(|raw| {
            let c = Cursor::decode(raw);
            if c.is_none() {
                debug!(cursor = %raw, "undecodable cursor; serving first page");
            }
            c
        });
        let rows = model_listing::scan(&self.db, Cursor::scan_from(decoded), PER_PAGE + 1).await?;
        let page = CursorPage::from_scan(rows, decoded, PER_PAGE, path, |r: &ListingRow| r.id);

        let author_ids: Vec<Uuid> = page.data.iter().map(|r| r.author_id).collect();
        let category_ids: Vec<i64> = page.data.iter().map(|r| r.category_id).collect();
        let (authors, categories) = Self::relations(&self.db, &author_ids, &category_ids).await?;
        Ok(page.map(|row| ListingSummary {
            author: authors.get(&row.author_id).cloned(),
            category: categories.get(&row.category_id).cloned(),
            row,
        }))
    }

    /// Single listing with author and category.
    pub async fn show(&self, id: i64) -> Result<ListingDetail, ServiceError> {
        let model = model_listing::find(&self.db, id).await?.ok_or_else(|| ServiceError::not_found("model"))?;
        let (authors, categories) = Self::relations(&self.db, &[model.author_id], &[model.category_id]).await?;
        Ok(ListingDetail {
            author: authors.get(&model.author_id).cloned(),
            category: categories.get(&model.category_id).cloned(),
            model,
        })
    }

    /// Validate and persist a submission for `author_id`.
    ///
    /// The row insert, file writes and URL backfill commit together; on any
    /// failure the transaction is rolled back and files already written are
    /// removed again. Nothing is written when validation fails.
    #[instrument(skip(self, draft))]
    pub async fn create(&self, author_id: Uuid, draft: &ModelDraft, today: NaiveDate) -> Result<ListingDetail, ServiceError> {
        let valid = self.check(draft, today).await?;

        let txn = self.db.begin().await?;
        let mut written: Vec<String> = Vec::new();
        match self.persist(&txn, author_id, valid, &mut written).await {
            Ok(detail) => {
                if let Err(e) = txn.commit().await {
                    error!(service = "listing", event = "create_commit_failed", error = %e);
                    self.discard(&written).await;
                    return Err(e.into());
                }
                info!(service = "listing", event = "model_created", model_id = detail.model.id, files = written.len());
                Ok(detail)
            }
            Err(e) => {
                error!(service = "listing", event = "create_failed", error = %e, files_written = written.len());
                if let Err(rb) = txn.rollback().await {
                    warn!(service = "listing", event = "rollback_failed", error = %rb);
                }
                self.discard(&written).await;
                Err(e)
            }
        }
    }

    // field rules plus category existence, reported together
    async fn check(&self, draft: &ModelDraft, today: NaiveDate) -> Result<ValidListing, ServiceError> {
        let checked = validate(draft, today);
        let category_id = match &checked {
            Ok(valid) => Some(valid.category_id),
            Err(_) => draft.category_id.as_deref().and_then(|raw| raw.trim().parse::<i64>().ok()),
        };
        let category_missing = match category_id {
            Some(id) => !category::exists(&self.db, id).await?,
            None => false,
        };
        match checked {
            Ok(valid) if !category_missing => Ok(valid),
            Ok(_) => Err(ServiceError::Validation(FieldErrors::single("category_id", category_missing_message()))),
            Err(mut errors) => {
                if category_missing {
                    errors.add("category_id", category_missing_message());
                }
                Err(ServiceError::Validation(errors))
            }
        }
    }

    async fn persist(
        &self,
        txn: &DatabaseTransaction,
        author_id: Uuid,
        valid: ValidListing,
        written: &mut Vec<String>,
    ) -> Result<ListingDetail, ServiceError> {
        let (new, files) = valid.into_new(author_id);
        let row = model_listing::insert_metadata(txn, new).await?;
        let folder = storage_folder(author_id, row.id);

        let mut urls = FileUrls::default();
        for (slot, ext, file) in files {
            let key = format!("{folder}/{}", slot.stored_name(&ext));
            let url = self.store.put(&key, file.bytes).await?;
            written.push(key);
            let target = match slot {
                FileSlot::Archive => &mut urls.file_url,
                FileSlot::Preview => &mut urls.preview_image_url,
                FileSlot::Texture => &mut urls.texture_url,
                FileSlot::ModelFbx => &mut urls.model_fbx_url,
            };
            *target = Some(url);
        }
        let model = model_listing::attach_files(txn, row, urls).await?;
        // 在提交前组装返回值，提交后不再有可失败的查询
        let (authors, categories) = Self::relations(txn, &[model.author_id], &[model.category_id]).await?;
        Ok(ListingDetail {
            author: authors.get(&model.author_id).cloned(),
            category: categories.get(&model.category_id).cloned(),
            model,
        })
    }

    // best-effort: a leftover file is logged, not surfaced
    async fn discard(&self, keys: &[String]) {
        for key in keys {
            if let Err(e) = self.store.delete(key).await {
                warn!(service = "listing", event = "orphan_file", %key, error = %e);
            }
        }
    }

    async fn relations<C: ConnectionTrait>(
        db: &C,
        author_ids: &[Uuid],
        category_ids: &[i64],
    ) -> Result<(HashMap<Uuid, AuthorSummary>, HashMap<i64, CategorySummary>), ServiceError> {
        let mut author_ids = author_ids.to_vec();
        author_ids.sort_unstable();
        author_ids.dedup();
        let mut category_ids = category_ids.to_vec();
        category_ids.sort_unstable();
        category_ids.dedup();

        let authors = user::find_many(db, &author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, AuthorSummary::from(u)))
            .collect();
        let categories = category::find_many(db, &category_ids)
            .await?
            .into_iter()
            .map(|c| (c.id, CategorySummary::from(c)))
            .collect();
        Ok((authors, categories))
    }
}
