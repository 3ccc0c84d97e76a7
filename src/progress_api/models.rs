use chrono::{DateTime, Utc};
use poem_openapi::{ApiResponse, Object, payload::Json};

use crate::domain::{ProgressError, ProgressId, ReadProgress, ReadProgressRecord, Reconciled};

/// Read progress of one chapter, in the persisted/wire shape.
#[derive(Debug, Clone, Object)]
#[oai(rename_all = "camelCase")]
pub struct ReadProgressDto {
    /// Absent until the record has been assigned by a tracker
    pub id: Option<String>,
    pub chapter_id: String,
    pub comic_id: String,
    pub user_id: String,
    pub total_pages: i64,
    /// Last read page, 0 = not started
    pub page: i64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<ReadProgress> for ReadProgressDto {
    fn from(p: ReadProgress) -> Self {
        ReadProgressDto {
            id: Some(p.id.to_string()),
            chapter_id: p.chapter_id,
            comic_id: p.comic_id,
            user_id: p.user_id,
            total_pages: i64::from(p.total_pages),
            page: i64::from(p.page),
            updated_at: Some(p.updated_at),
        }
    }
}

impl From<ReadProgressDto> for ReadProgressRecord {
    fn from(d: ReadProgressDto) -> Self {
        ReadProgressRecord {
            id: d.id.map(ProgressId::from),
            chapter_id: d.chapter_id,
            comic_id: d.comic_id,
            user_id: d.user_id,
            total_pages: d.total_pages,
            page: d.page,
            updated_at: d.updated_at,
        }
    }
}

#[derive(Debug, Clone, Object)]
#[oai(rename_all = "camelCase")]
pub struct ReportProgressDto {
    pub page: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Object)]
pub struct ReconcileResultDto {
    /// Whether the submitted record replaced the local one
    pub replaced: bool,
    /// The record now held locally
    pub record: ReadProgressDto,
}

impl From<Reconciled> for ReconcileResultDto {
    fn from(r: Reconciled) -> Self {
        let replaced = r.is_replaced();
        ReconcileResultDto {
            replaced,
            record: r.into_record().into(),
        }
    }
}

#[derive(Debug, Clone, Object)]
pub struct ErrorDto {
    /// Human-readable error message
    pub message: String,
    /// Offending input field, for validation errors
    pub field: Option<String>,
}

impl From<String> for ErrorDto {
    fn from(message: String) -> Self {
        ErrorDto {
            message,
            field: None,
        }
    }
}

impl From<ProgressError> for ErrorDto {
    fn from(e: ProgressError) -> Self {
        ErrorDto {
            message: e.to_string(),
            field: Some(e.field().to_string()),
        }
    }
}

#[derive(ApiResponse)]
pub enum ReportProgressResponseDto {
    /// Progress accepted; the canonical record
    #[oai(status = 200)]
    Ok(Json<ReadProgressDto>),

    /// Malformed report
    #[oai(status = 400)]
    BadRequest(Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum GetProgressResponseDto {
    #[oai(status = 200)]
    Ok(Json<ReadProgressDto>),

    /// Never reported for this chapter
    #[oai(status = 404)]
    NotFound(Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum ListProgressResponseDto {
    /// Chapter records ordered by chapter number
    #[oai(status = 200)]
    Ok(Json<Vec<ReadProgressDto>>),

    /// Unparsable chapter order
    #[oai(status = 400)]
    BadRequest(Json<ErrorDto>),

    /// No progress recorded for this comic
    #[oai(status = 404)]
    NotFound(Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum RemoveProgressResponseDto {
    /// Record deleted
    #[oai(status = 204)]
    NoContent,

    #[oai(status = 404)]
    NotFound(Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum ReconcileResponseDto {
    #[oai(status = 200)]
    Ok(Json<ReconcileResultDto>),

    /// Malformed replica record
    #[oai(status = 400)]
    BadRequest(Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum ChangesResponseDto {
    /// Records changed since the token, oldest first
    #[oai(status = 200)]
    Ok(
        Json<Vec<ReadProgressDto>>,
        #[oai(header = "X-Progress-SyncToken")] Option<String>,
    ),

    /// Unreadable sync token
    #[oai(status = 400)]
    BadRequest(Json<ErrorDto>),
}
