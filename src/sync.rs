// Periodic reconciliation of the tracker with a remote progress store

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};

use crate::{
    domain::{ChangeCursor, ReadProgressRecord},
    remote_client::RemoteClient,
    storage::WriteThrough,
};

/// Counters for one sync pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub pulled: usize,
    pub replaced: usize,
    pub skipped: usize,
    pub pushed: usize,
    /// Keys the persistence replica is still missing after the pass
    pub unpersisted: usize,
}

pub struct SyncWorker {
    writer: Arc<WriteThrough>,
    client: RemoteClient,
    interval: Duration,
    // remote clock, as reported by the remote
    pull_cursor: Option<DateTime<Utc>>,
    // local change log position; never compared with record timestamps
    push_cursor: Option<ChangeCursor>,
}

impl SyncWorker {
    pub fn new(writer: Arc<WriteThrough>, client: RemoteClient, interval: Duration) -> Self {
        Self {
            writer,
            client,
            interval,
            pull_cursor: None,
            push_cursor: None,
        }
    }

    /// Run forever; a failed pass is logged and retried on the next tick.
    pub async fn run(mut self) {
        tracing::info!(remote = %self.client.base_url(), interval_secs = self.interval.as_secs(), "starting sync worker");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match self.sync_once().await {
                Ok(report) => tracing::info!(
                    pulled = report.pulled,
                    replaced = report.replaced,
                    skipped = report.skipped,
                    pushed = report.pushed,
                    unpersisted = report.unpersisted,
                    "sync pass finished"
                ),
                Err(e) => tracing::error!(error = %format!("{:?}", e), "sync pass failed"),
            }
        }
    }

    /// Pull remote replicas into the tracker, then push local changes.
    ///
    /// The pull cursor only moves after every pulled record went through
    /// `reconcile`; the push cursor only moves after the remote accepted the
    /// batch.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn sync_once(&mut self) -> anyhow::Result<SyncReport> {
        let mut report = SyncReport::default();
        self.writer.retry_unpersisted().await;

        let pulled = self.client.pull(self.pull_cursor).await?;
        report.pulled = pulled.records.len();
        for remote in pulled.records {
            report.replaced += self.apply_remote(remote).await as usize;
        }
        report.skipped = report.pulled - report.replaced;
        if let Some(server_time) = pulled.server_time {
            self.pull_cursor = Some(server_time);
        }

        // Everything accepted since the last push, including what was just
        // pulled; the remote resolves those with the same last-writer-wins rule.
        let changes = self
            .writer
            .tracker()
            .changes_after(None, self.push_cursor.as_ref());
        if !changes.records.is_empty() {
            let records: Vec<ReadProgressRecord> =
                changes.records.iter().map(|p| p.to_record()).collect();
            let resp = self.client.push(&records).await?;
            report.pushed = resp.accepted;
        }
        self.push_cursor = Some(changes.cursor);

        report.unpersisted = self.writer.retry_unpersisted().await;
        Ok(report)
    }

    /// Returns whether the remote copy won. A store failure does not undo
    /// that; the writer keeps the key for a later retry.
    async fn apply_remote(&self, remote: ReadProgressRecord) -> bool {
        match self.writer.reconcile(remote).await {
            Ok(outcome) => outcome.is_replaced(),
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed remote record");
                false
            }
        }
    }
}
