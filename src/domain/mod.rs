pub mod de;
pub mod error;
pub mod mapping;
pub mod models;
pub mod tracker;

pub use error::ProgressError;
pub use models::{ChapterOrder, ProgressId, ProgressKey, ReadProgress, ReadProgressRecord};
pub use tracker::{ChangeCursor, ProgressTracker, Reconciled};
