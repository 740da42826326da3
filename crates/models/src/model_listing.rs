//! `models` table: sellable 3D asset listings.
use sea_orm::{
    entity::prelude::*, ActiveValue::NotSet, ConnectionTrait, FromQueryResult, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{category, errors, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "models")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub author_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub category_id: i64,
    pub end_date: Option<Date>,
    pub file_url: Option<String>,
    pub preview_image_url: Option<String>,
    pub texture_url: Option<String>,
    pub model_fbx_url: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Author, Category }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Author => Entity::belongs_to(user::Entity)
                .from(Column::AuthorId)
                .to(user::Column::Id)
                .into(),
            Relation::Category => Entity::belongs_to(category::Entity)
                .from(Column::CategoryId)
                .to(category::Column::Id)
                .into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::Author.def() }
}

impl Related<category::Entity> for Entity {
    fn to() -> RelationDef { Relation::Category.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Metadata written by the first insert; file URLs come later.
#[derive(Clone, Debug, PartialEq)]
pub struct NewModelListing {
    pub author_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub category_id: i64,
    pub end_date: Option<Date>,
}

/// Public URLs of the stored files, one per upload slot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUrls {
    pub file_url: Option<String>,
    pub preview_image_url: Option<String>,
    pub texture_url: Option<String>,
    pub model_fbx_url: Option<String>,
}

/// Fixed projection used by the listing query.
#[derive(Clone, Debug, PartialEq, FromQueryResult, Serialize, Deserialize)]
pub struct ListingRow {
    pub id: i64,
    pub author_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub preview_image_url: Option<String>,
    pub file_url: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub end_date: Option<Date>,
    pub category_id: i64,
}

/// Where a page scan starts relative to the identifier ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanFrom {
    /// Highest ids first.
    Start,
    /// `id < n`, descending.
    Below(i64),
    /// `id > n`, ascending (caller reverses).
    Above(i64),
}

pub fn validate_title(title: &str) -> Result<(), errors::ModelError> {
    let len = title.trim().chars().count();
    if len < 2 { return Err(errors::ModelError::Validation("title too short (>=2)".into())); }
    if len > 255 { return Err(errors::ModelError::Validation("title too long (<=255)".into())); }
    Ok(())
}

pub fn validate_price(price: f64) -> Result<(), errors::ModelError> {
    if !price.is_finite() || price < 0.0 {
        return Err(errors::ModelError::Validation("price must be a non-negative number".into()));
    }
    Ok(())
}

/// Insert the metadata-only row. Works on a connection or an open transaction.
pub async fn insert_metadata<C: ConnectionTrait>(db: &C, new: NewModelListing) -> Result<Model, errors::ModelError> {
    validate_title(&new.title)?;
    validate_price(new.price)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        id: NotSet,
        author_id: Set(new.author_id),
        title: Set(new.title.trim().to_string()),
        description: Set(new.description),
        price: Set(new.price),
        category_id: Set(new.category_id),
        end_date: Set(new.end_date),
        file_url: Set(None),
        preview_image_url: Set(None),
        texture_url: Set(None),
        model_fbx_url: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Backfill the file URLs of a freshly inserted row.
pub async fn attach_files<C: ConnectionTrait>(db: &C, row: Model, urls: FileUrls) -> Result<Model, errors::ModelError> {
    let mut am: ActiveModel = row.into();
    am.file_url = Set(urls.file_url);
    am.preview_image_url = Set(urls.preview_image_url);
    am.texture_url = Set(urls.texture_url);
    am.model_fbx_url = Set(urls.model_fbx_url);
    am.updated_at = Set(Utc::now().into());
    am.update(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn find<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<Model>, errors::ModelError> {
    Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Fetch up to `limit` projected rows starting at `from`.
pub async fn scan<C: ConnectionTrait>(db: &C, from: ScanFrom, limit: u64) -> Result<Vec<ListingRow>, errors::ModelError> {
    let select = Entity::find().select_only().columns([
        Column::Id,
        Column::AuthorId,
        Column::Title,
        Column::Description,
        Column::Price,
        Column::PreviewImageUrl,
        Column::FileUrl,
        Column::CreatedAt,
        Column::EndDate,
        Column::CategoryId,
    ]);
    let select = match from {
        ScanFrom::Start => select.order_by_desc(Column::Id),
        ScanFrom::Below(id) => select.filter(Column::Id.lt(id)).order_by_desc(Column::Id),
        ScanFrom::Above(id) => select.filter(Column::Id.gt(id)).order_by_asc(Column::Id),
    };
    select
        .limit(limit)
        .into_model::<ListingRow>()
        .all(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn count<C: ConnectionTrait>(db: &C) -> Result<u64, errors::ModelError> {
    use sea_orm::PaginatorTrait;
    Entity::find()
        .count(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}
