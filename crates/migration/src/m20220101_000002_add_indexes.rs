use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Models: index on author_id
        manager
            .create_index(
                Index::create()
                    .name("idx_models_author")
                    .table(Models::Table)
                    .col(Models::AuthorId)
                    .to_owned(),
            )
            .await?;

        // Models: index on category_id
        manager
            .create_index(
                Index::create()
                    .name("idx_models_category")
                    .table(Models::Table)
                    .col(Models::CategoryId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_models_author").table(Models::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_models_category").table(Models::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Models { Table, AuthorId, CategoryId }
