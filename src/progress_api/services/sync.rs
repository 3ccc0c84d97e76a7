use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use poem_openapi::payload::Json;

use crate::{
    domain::{ChangeCursor, ProgressTracker},
    progress_api::models::{ChangesResponseDto, ErrorDto, ReadProgressDto},
};

/// Opaque change-feed cursor: base64 of `{epoch}.{seq}` from the tracker's change log.
pub fn encode_sync_token(cursor: &ChangeCursor) -> String {
    URL_SAFE_NO_PAD.encode(format!("{}.{}", cursor.epoch, cursor.seq))
}

pub fn decode_sync_token(token: &str) -> Result<ChangeCursor, String> {
    let raw = URL_SAFE_NO_PAD
        .decode(token.trim())
        .map_err(|e| format!("sync token is not base64: {e}"))?;
    let text = String::from_utf8(raw).map_err(|_| "sync token is not UTF-8".to_string())?;
    let (epoch, seq) = text
        .rsplit_once('.')
        .filter(|(epoch, _)| !epoch.is_empty())
        .ok_or_else(|| "sync token holds no cursor".to_string())?;
    let seq = seq
        .parse::<u64>()
        .map_err(|e| format!("sync token holds no sequence number: {e}"))?;
    Ok(ChangeCursor {
        epoch: epoch.to_string(),
        seq,
    })
}

pub struct SyncService<'a> {
    pub tracker: &'a ProgressTracker,
}

impl<'a> SyncService<'a> {
    pub fn new(tracker: &'a ProgressTracker) -> Self {
        Self { tracker }
    }

    /// Records of `user_id` changed locally after the token's cursor, in the
    /// order the changes were accepted, plus the token to resume from.
    #[tracing::instrument(level = "debug", skip(self, sync_token))]
    pub fn changes(&self, user_id: &str, sync_token: Option<&str>) -> ChangesResponseDto {
        let since = match sync_token.filter(|t| !t.trim().is_empty()) {
            None => None,
            Some(token) => match decode_sync_token(token) {
                Ok(cursor) => Some(cursor),
                Err(message) => {
                    tracing::debug!(%message, "rejected sync token");
                    return ChangesResponseDto::BadRequest(Json(ErrorDto::from(message)));
                }
            },
        };

        let changes = self.tracker.changes_after(Some(user_id), since.as_ref());
        tracing::debug!(count = changes.records.len(), since = ?since, "serving progress changes");

        let next_token = encode_sync_token(&changes.cursor);
        let dtos: Vec<ReadProgressDto> = changes.records.into_iter().map(Into::into).collect();
        ChangesResponseDto::Ok(Json(dtos), Some(next_token))
    }
}
