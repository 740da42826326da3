//! Create `models` table (sellable 3D asset listings) with FKs to `user` and `category`.
//!
//! File URL columns are nullable at the schema level; the ingestion flow fills
//! archive and preview inside the same transaction as the insert.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Models::Table)
                    .if_not_exists()
                    .col(big_integer(Models::Id).primary_key().auto_increment())
                    .col(uuid(Models::AuthorId).not_null())
                    .col(string_len(Models::Title, 255).not_null())
                    .col(ColumnDef::new(Models::Description).text().null())
                    .col(double(Models::Price).not_null())
                    .col(big_integer(Models::CategoryId).not_null())
                    .col(ColumnDef::new(Models::EndDate).date().null())
                    .col(ColumnDef::new(Models::FileUrl).string_len(1024).null())
                    .col(ColumnDef::new(Models::PreviewImageUrl).string_len(1024).null())
                    .col(ColumnDef::new(Models::TextureUrl).string_len(1024).null())
                    .col(ColumnDef::new(Models::ModelFbxUrl).string_len(1024).null())
                    .col(timestamp_with_time_zone(Models::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Models::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_models_author")
                            .from(Models::Table, Models::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        // 分类被引用时不允许删除
                        ForeignKey::create()
                            .name("fk_models_category")
                            .from(Models::Table, Models::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Models::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Models {
    Table,
    Id,
    AuthorId,
    Title,
    Description,
    Price,
    CategoryId,
    EndDate,
    FileUrl,
    PreviewImageUrl,
    TextureUrl,
    ModelFbxUrl,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User { Table, Id }

#[derive(DeriveIden)]
enum Category { Table, Id }
