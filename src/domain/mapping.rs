// Mapping between persisted rows and domain records

use entities::read_progress;
use sea_orm::ActiveValue::Set;

use super::models::{ProgressId, ReadProgress, ReadProgressRecord};

pub fn map_progress_to_active_model(p: &ReadProgress) -> read_progress::ActiveModel {
    read_progress::ActiveModel {
        id: Set(p.id.to_string()),
        user_id: Set(p.user_id.clone()),
        comic_id: Set(p.comic_id.clone()),
        chapter_id: Set(p.chapter_id.clone()),
        total_pages: Set(i64::from(p.total_pages)),
        page: Set(i64::from(p.page)),
        updated_at: Set(p.updated_at),
    }
}

/// Rows come back as replica records so they pass through the tracker's
/// validation when hydrating, rather than being trusted as canonical.
pub fn map_model_to_record(m: read_progress::Model) -> ReadProgressRecord {
    ReadProgressRecord {
        id: Some(ProgressId::from(m.id)),
        chapter_id: m.chapter_id,
        comic_id: m.comic_id,
        user_id: m.user_id,
        total_pages: m.total_pages,
        page: m.page,
        updated_at: Some(m.updated_at),
    }
}
