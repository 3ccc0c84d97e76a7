use poem_openapi::payload::PlainText;

use crate::domain::ProgressTracker;

pub struct HealthService<'a> {
    pub tracker: &'a ProgressTracker,
}

impl<'a> HealthService<'a> {
    pub fn new(tracker: &'a ProgressTracker) -> Self {
        Self { tracker }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn status_text(&self) -> PlainText<String> {
        PlainText(format!(
            "{} version={} records={}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            self.tracker.len()
        ))
    }
}
