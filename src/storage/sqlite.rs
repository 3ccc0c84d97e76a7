use anyhow::Context;
use entities::read_progress;
use migration::MigratorTrait;
use sea_orm::{
    ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter,
    sea_query::{Alias, Expr, OnConflict},
};

use super::ProgressStore;
use crate::domain::{
    ProgressKey, ReadProgress, ReadProgressRecord,
    mapping::{map_model_to_record, map_progress_to_active_model},
};

#[derive(Clone, Debug)]
pub struct SeaOrmProgressStore {
    db: DatabaseConnection,
}

impl SeaOrmProgressStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Connect and bring the schema up to date.
    pub async fn connect(connection_string: &str) -> anyhow::Result<Self> {
        let db = Database::connect(connection_string)
            .await
            .with_context(|| "Failed to connect to database")?;
        migration::Migrator::up(&db, None)
            .await
            .with_context(|| "Failed to run database migrations")?;
        Ok(Self::new(db))
    }
}

#[async_trait::async_trait]
impl ProgressStore for SeaOrmProgressStore {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn load_all(&self) -> anyhow::Result<Vec<ReadProgressRecord>> {
        let rows = read_progress::Entity::find()
            .all(&self.db)
            .await
            .with_context(|| "Failed to load read progress")?;
        tracing::debug!(rows = rows.len(), "loaded persisted progress");
        Ok(rows.into_iter().map(map_model_to_record).collect())
    }

    #[tracing::instrument(level = "debug", skip(self, progress), fields(id = %progress.id))]
    async fn upsert(&self, progress: &ReadProgress) -> anyhow::Result<()> {
        let active = map_progress_to_active_model(progress);
        read_progress::Entity::insert(active)
            .on_conflict(
                OnConflict::columns([
                    read_progress::Column::UserId,
                    read_progress::Column::ComicId,
                    read_progress::Column::ChapterId,
                ])
                .update_columns([
                    read_progress::Column::Id,
                    read_progress::Column::TotalPages,
                    read_progress::Column::Page,
                    read_progress::Column::UpdatedAt,
                ])
                // never let a late write roll a row back
                .action_and_where(
                    Expr::col((read_progress::Entity, read_progress::Column::UpdatedAt)).lte(
                        Expr::col((Alias::new("excluded"), read_progress::Column::UpdatedAt)),
                    ),
                )
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .with_context(|| format!("Failed to persist progress {}", progress.id))?;
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn delete(&self, key: &ProgressKey) -> anyhow::Result<bool> {
        let res = read_progress::Entity::delete_many()
            .filter(read_progress::Column::UserId.eq(key.user_id.as_str()))
            .filter(read_progress::Column::ComicId.eq(key.comic_id.as_str()))
            .filter(read_progress::Column::ChapterId.eq(key.chapter_id.as_str()))
            .exec(&self.db)
            .await
            .with_context(|| "Failed to delete progress")?;
        Ok(res.rows_affected > 0)
    }
}
