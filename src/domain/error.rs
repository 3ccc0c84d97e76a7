/// Result type for tracker operations.
pub type Result<T> = std::result::Result<T, ProgressError>;

/// Errors surfaced by the progress tracker.
///
/// Lookups that find nothing are not errors; they come back as `None` or an
/// empty list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgressError {
    /// Malformed input; `field` names the violated constraint.
    #[error("invalid {field}: {reason}")]
    InvalidArgument { field: &'static str, reason: String },
}

impl ProgressError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ProgressError::InvalidArgument {
            field,
            reason: reason.into(),
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            ProgressError::InvalidArgument { field, .. } => field,
        }
    }
}
