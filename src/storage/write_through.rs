use std::{collections::HashSet, sync::Arc};

use tokio::sync::Mutex;

use super::ProgressStore;
use crate::domain::{
    self, ProgressKey, ProgressTracker, ReadProgress, ReadProgressRecord, Reconciled,
};

/// Tracker mutations mirrored into the persistence replica.
///
/// Each mutation and its store write run under one async lock, so rows reach
/// the store in the order the tracker accepted them. A failed store write is
/// logged and the key is remembered; the next mutation or
/// `retry_unpersisted` call writes the tracker's current state for those keys
/// again. The tracker stays authoritative either way.
pub struct WriteThrough {
    tracker: Arc<ProgressTracker>,
    store: Arc<dyn ProgressStore>,
    unpersisted: Mutex<HashSet<ProgressKey>>,
}

impl WriteThrough {
    pub fn new(tracker: Arc<ProgressTracker>, store: Arc<dyn ProgressStore>) -> Self {
        Self {
            tracker,
            store,
            unpersisted: Mutex::new(HashSet::new()),
        }
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    pub async fn report(
        &self,
        user_id: &str,
        comic_id: &str,
        chapter_id: &str,
        page: i64,
        total_pages: i64,
    ) -> domain::error::Result<ReadProgress> {
        let mut pending = self.unpersisted.lock().await;
        let record = self
            .tracker
            .report(user_id, comic_id, chapter_id, page, total_pages)?;
        self.mirror(&mut pending, record.key()).await;
        Ok(record)
    }

    pub async fn remove(&self, user_id: &str, comic_id: &str, chapter_id: &str) -> bool {
        let mut pending = self.unpersisted.lock().await;
        if !self.tracker.remove(user_id, comic_id, chapter_id) {
            return false;
        }
        self.mirror(&mut pending, ProgressKey::new(user_id, comic_id, chapter_id))
            .await;
        true
    }

    pub async fn reconcile(
        &self,
        remote: ReadProgressRecord,
    ) -> domain::error::Result<Reconciled> {
        let mut pending = self.unpersisted.lock().await;
        let outcome = self.tracker.reconcile(remote)?;
        if outcome.is_replaced() {
            self.mirror(&mut pending, outcome.record().key()).await;
        }
        Ok(outcome)
    }

    /// Write again every key whose last store write failed. Returns how many
    /// keys are still not persisted.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn retry_unpersisted(&self) -> usize {
        let mut pending = self.unpersisted.lock().await;
        self.flush(&mut pending).await;
        pending.len()
    }

    async fn mirror(&self, pending: &mut HashSet<ProgressKey>, key: ProgressKey) {
        pending.insert(key);
        self.flush(pending).await;
    }

    async fn flush(&self, pending: &mut HashSet<ProgressKey>) {
        let keys: Vec<ProgressKey> = pending.iter().cloned().collect();
        for key in keys {
            self.write_key(pending, key).await;
        }
    }

    // Mirrors the tracker's current state for `key`: upsert when present, delete otherwise.
    async fn write_key(&self, pending: &mut HashSet<ProgressKey>, key: ProgressKey) {
        let current = self
            .tracker
            .get(&key.user_id, &key.comic_id, &key.chapter_id);
        let result = match &current {
            Some(record) => self.store.upsert(record).await,
            None => self.store.delete(&key).await.map(|_| ()),
        };
        match result {
            Ok(()) => {
                pending.remove(&key);
            }
            Err(e) => {
                tracing::error!(error = %format!("{:?}", e), ?key, "failed to persist progress");
                pending.insert(key);
            }
        }
    }
}
