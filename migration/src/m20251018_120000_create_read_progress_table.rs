use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReadProgress::Table)
                    .if_not_exists()
                    .col(string(ReadProgress::Id).primary_key())
                    .col(string(ReadProgress::UserId))
                    .col(string(ReadProgress::ComicId))
                    .col(string(ReadProgress::ChapterId))
                    .col(big_integer(ReadProgress::TotalPages))
                    .col(big_integer(ReadProgress::Page))
                    .col(timestamp_with_time_zone(ReadProgress::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // One row per (user, comic, chapter); the store upserts on this key.
        manager
            .create_index(
                Index::create()
                    .name("idx_read_progress_user_comic_chapter")
                    .table(ReadProgress::Table)
                    .col(ReadProgress::UserId)
                    .col(ReadProgress::ComicId)
                    .col(ReadProgress::ChapterId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_read_progress_user_comic_chapter")
                    .table(ReadProgress::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(ReadProgress::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum ReadProgress {
    Table,
    Id,
    UserId,
    ComicId,
    ChapterId,
    TotalPages,
    Page,
    UpdatedAt,
}
