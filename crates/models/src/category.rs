use sea_orm::{entity::prelude::*, ActiveValue::NotSet, ConnectionTrait, Set, DatabaseConnection, QueryFilter};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors;
use crate::model_listing;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub code: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Models,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self { Relation::Models => Entity::has_many(model_listing::Entity).into() }
    }
}

impl Related<model_listing::Entity> for Entity {
    fn to() -> RelationDef { Relation::Models.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn create(db: &DatabaseConnection, title: &str, code: &str) -> Result<Model, errors::ModelError> {
    if title.trim().is_empty() { return Err(errors::ModelError::Validation("title required".into())); }
    if code.trim().is_empty() { return Err(errors::ModelError::Validation("code required".into())); }
    let am = ActiveModel {
        id: NotSet,
        title: Set(title.trim().to_string()),
        code: Set(code.trim().to_string()),
        created_at: Set(Utc::now().into()),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn exists(db: &DatabaseConnection, id: i64) -> Result<bool, errors::ModelError> {
    let found = Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(found.is_some())
}

pub async fn find_many<C: ConnectionTrait>(db: &C, ids: &[i64]) -> Result<Vec<Model>, errors::ModelError> {
    if ids.is_empty() { return Ok(Vec::new()); }
    Entity::find()
        .filter(Column::Id.is_in(ids.iter().copied()))
        .all(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}
