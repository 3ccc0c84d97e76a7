use std::sync::Arc;

use poem_openapi::{
    OpenApi,
    param::{Header, Path, Query},
    payload::{Json, PlainText},
};

use super::models::{
    ChangesResponseDto, GetProgressResponseDto, ListProgressResponseDto, ReadProgressDto,
    ReconcileResponseDto, RemoveProgressResponseDto, ReportProgressDto, ReportProgressResponseDto,
};
use super::services::{health::HealthService, progress::ProgressService, sync::SyncService};
use crate::{domain::ChapterOrder, progress_api::models::ErrorDto, storage::WriteThrough};

pub struct ProgressApi {
    pub writer: Arc<WriteThrough>,
}

impl ProgressApi {
    fn progress(&self) -> ProgressService<'_> {
        ProgressService::new(&self.writer)
    }
}

/// Comma-separated chapter ids in reading order, or `id=number` pairs.
fn parse_chapter_order(raw: Option<&str>) -> Result<ChapterOrder, String> {
    let entries: Vec<&str> = raw
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if !entries.iter().any(|e| e.contains('=')) {
        return Ok(ChapterOrder::from_ids(entries));
    }
    let mut numbers = Vec::with_capacity(entries.len());
    for entry in entries {
        let (id, number) = entry
            .split_once('=')
            .ok_or_else(|| format!("chapter {entry:?} has no number"))?;
        let number = number
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| format!("chapter {id:?} has an invalid number {number:?}"))?;
        numbers.push((id.trim(), number));
    }
    Ok(ChapterOrder::from_numbers(numbers))
}

#[OpenApi]
impl ProgressApi {
    #[oai(path = "/status", method = "get")]
    #[tracing::instrument(level = "debug", skip(self))]
    async fn status(&self) -> PlainText<String> {
        HealthService::new(self.writer.tracker()).status_text()
    }

    /// Report the page reached in a chapter
    #[oai(
        path = "/v1/users/:user_id/comics/:comic_id/chapters/:chapter_id/progress",
        method = "put"
    )]
    #[tracing::instrument(level = "debug", skip(self, user_id, comic_id, chapter_id, body))]
    async fn report_progress(
        &self,
        user_id: Path<String>,
        comic_id: Path<String>,
        chapter_id: Path<String>,
        body: Json<ReportProgressDto>,
    ) -> ReportProgressResponseDto {
        self.progress()
            .report(&user_id.0, &comic_id.0, &chapter_id.0, body.0)
            .await
    }

    /// Progress of one chapter
    #[oai(
        path = "/v1/users/:user_id/comics/:comic_id/chapters/:chapter_id/progress",
        method = "get"
    )]
    #[tracing::instrument(level = "debug", skip(self, user_id, comic_id, chapter_id))]
    async fn get_progress(
        &self,
        user_id: Path<String>,
        comic_id: Path<String>,
        chapter_id: Path<String>,
    ) -> GetProgressResponseDto {
        self.progress().get(&user_id.0, &comic_id.0, &chapter_id.0)
    }

    /// Forget the progress of a chapter removed from the catalog
    #[oai(
        path = "/v1/users/:user_id/comics/:comic_id/chapters/:chapter_id/progress",
        method = "delete"
    )]
    #[tracing::instrument(level = "debug", skip(self, user_id, comic_id, chapter_id))]
    async fn remove_progress(
        &self,
        user_id: Path<String>,
        comic_id: Path<String>,
        chapter_id: Path<String>,
    ) -> RemoveProgressResponseDto {
        self.progress()
            .remove(&user_id.0, &comic_id.0, &chapter_id.0)
            .await
    }

    /// Progress of every chapter of a comic
    #[oai(path = "/v1/users/:user_id/comics/:comic_id/progress", method = "get")]
    #[tracing::instrument(level = "debug", skip(self, user_id, comic_id, chapters))]
    async fn list_comic_progress(
        &self,
        user_id: Path<String>,
        comic_id: Path<String>,
        /// Comma-separated chapter ids in reading order, or `id=number` pairs
        Query(chapters): Query<Option<String>>,
    ) -> ListProgressResponseDto {
        match parse_chapter_order(chapters.as_deref()) {
            Ok(order) => self
                .progress()
                .list_for_comic(&user_id.0, &comic_id.0, &order),
            Err(message) => ListProgressResponseDto::BadRequest(Json(ErrorDto::from(message))),
        }
    }

    /// Merge a record held by a remote replica (last writer wins)
    #[oai(path = "/v1/progress/reconcile", method = "post")]
    #[tracing::instrument(level = "debug", skip(self, body))]
    async fn reconcile(&self, body: Json<ReadProgressDto>) -> ReconcileResponseDto {
        self.progress().reconcile(body.0).await
    }

    /// Incremental feed of a user's changed records
    #[oai(path = "/v1/users/:user_id/progress/changes", method = "get")]
    #[tracing::instrument(level = "debug", skip(self, user_id, sync_token))]
    async fn progress_changes(
        &self,
        user_id: Path<String>,
        #[oai(name = "X-Progress-SyncToken")] sync_token: Header<Option<String>>,
    ) -> ChangesResponseDto {
        SyncService::new(self.writer.tracker()).changes(&user_id.0, sync_token.0.as_deref())
    }
}
