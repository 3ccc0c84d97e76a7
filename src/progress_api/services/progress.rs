use poem_openapi::payload::Json;

use crate::{
    domain::{ChapterOrder, ReadProgressRecord},
    progress_api::models::{
        ErrorDto, GetProgressResponseDto, ListProgressResponseDto, ReadProgressDto,
        ReconcileResponseDto, RemoveProgressResponseDto, ReportProgressDto,
        ReportProgressResponseDto,
    },
    storage::WriteThrough,
};

/// Tracker operations behind the HTTP routes, written through to the
/// persistence replica.
///
/// A failed store write is logged and retried later; it does not fail the
/// request because the tracker is authoritative.
pub struct ProgressService<'a> {
    pub writer: &'a WriteThrough,
}

impl<'a> ProgressService<'a> {
    pub fn new(writer: &'a WriteThrough) -> Self {
        Self { writer }
    }

    #[tracing::instrument(level = "debug", skip(self, body))]
    pub async fn report(
        &self,
        user_id: &str,
        comic_id: &str,
        chapter_id: &str,
        body: ReportProgressDto,
    ) -> ReportProgressResponseDto {
        match self
            .writer
            .report(user_id, comic_id, chapter_id, body.page, body.total_pages)
            .await
        {
            Ok(record) => ReportProgressResponseDto::Ok(Json(record.into())),
            Err(e) => {
                tracing::debug!(error = %e, "rejected progress report");
                ReportProgressResponseDto::BadRequest(Json(e.into()))
            }
        }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn get(&self, user_id: &str, comic_id: &str, chapter_id: &str) -> GetProgressResponseDto {
        match self.writer.tracker().get(user_id, comic_id, chapter_id) {
            Some(record) => GetProgressResponseDto::Ok(Json(record.into())),
            None => GetProgressResponseDto::NotFound(Json(ErrorDto::from(format!(
                "no progress for chapter {chapter_id}"
            )))),
        }
    }

    #[tracing::instrument(level = "debug", skip(self, order))]
    pub fn list_for_comic(
        &self,
        user_id: &str,
        comic_id: &str,
        order: &ChapterOrder,
    ) -> ListProgressResponseDto {
        let records = self.writer.tracker().list_for_comic(user_id, comic_id, order);
        if records.is_empty() {
            return ListProgressResponseDto::NotFound(Json(ErrorDto::from(format!(
                "no progress for comic {comic_id}"
            ))));
        }
        let dtos: Vec<ReadProgressDto> = records.into_iter().map(Into::into).collect();
        ListProgressResponseDto::Ok(Json(dtos))
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn remove(
        &self,
        user_id: &str,
        comic_id: &str,
        chapter_id: &str,
    ) -> RemoveProgressResponseDto {
        if !self.writer.remove(user_id, comic_id, chapter_id).await {
            return RemoveProgressResponseDto::NotFound(Json(ErrorDto::from(format!(
                "no progress for chapter {chapter_id}"
            ))));
        }
        RemoveProgressResponseDto::NoContent
    }

    #[tracing::instrument(level = "debug", skip(self, remote))]
    pub async fn reconcile(&self, remote: ReadProgressDto) -> ReconcileResponseDto {
        match self.writer.reconcile(ReadProgressRecord::from(remote)).await {
            Ok(outcome) => ReconcileResponseDto::Ok(Json(outcome.into())),
            Err(e) => {
                tracing::debug!(error = %e, "rejected replica record");
                ReconcileResponseDto::BadRequest(Json(e.into()))
            }
        }
    }
}
