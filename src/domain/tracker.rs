//! Authoritative in-memory store of chapter read progress.

use std::{
    cmp::Ordering,
    collections::{HashMap, hash_map::Entry},
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use chrono::Utc;
use uuid::Uuid;

use super::{
    error::{ProgressError, Result},
    models::{ChapterOrder, ProgressId, ProgressKey, ReadProgress, ReadProgressRecord},
};

/// Outcome of merging a replica record into the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    /// The replica was strictly newer (or unknown locally) and is now stored.
    Replaced(ReadProgress),
    /// The local record won; it is returned unchanged.
    Kept(ReadProgress),
}

impl Reconciled {
    pub fn record(&self) -> &ReadProgress {
        match self {
            Reconciled::Replaced(r) | Reconciled::Kept(r) => r,
        }
    }

    pub fn into_record(self) -> ReadProgress {
        match self {
            Reconciled::Replaced(r) | Reconciled::Kept(r) => r,
        }
    }

    pub fn is_replaced(&self) -> bool {
        matches!(self, Reconciled::Replaced(_))
    }
}

/// Position in the tracker's local change log.
///
/// `seq` counts accepted mutations (reports and replacing reconciles) of one
/// tracker instance; `epoch` names that instance, so a cursor handed out
/// before a restart is recognised as stale instead of silently skipping
/// records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeCursor {
    pub epoch: String,
    pub seq: u64,
}

/// Records changed after a cursor, in change order, and the cursor to resume from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Changes {
    pub records: Vec<ReadProgress>,
    pub cursor: ChangeCursor,
}

#[derive(Debug)]
struct Tracked {
    progress: ReadProgress,
    seq: u64,
}

#[derive(Debug, Default)]
struct State {
    records: HashMap<ProgressKey, Tracked>,
    // Which key each record id belongs to; ids are unique across keys.
    owners: HashMap<ProgressId, ProgressKey>,
    seq: u64,
}

/// Owns one `ReadProgress` per (user, comic, chapter) and mediates every
/// read and write of it.
///
/// Mutations are serialized by a single write lock; reads take the read lock
/// and return clones. No operation performs I/O.
#[derive(Debug)]
pub struct ProgressTracker {
    state: RwLock<State>,
    epoch: String,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self {
            state: RwLock::default(),
            epoch: Uuid::now_v7().simple().to_string(),
        }
    }
}

struct Validated {
    key: ProgressKey,
    page: u32,
    total_pages: u32,
}

fn require_id(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ProgressError::invalid(field, "must not be empty"));
    }
    Ok(())
}

fn validate(
    user_id: &str,
    comic_id: &str,
    chapter_id: &str,
    page: i64,
    total_pages: i64,
) -> Result<Validated> {
    require_id("userId", user_id)?;
    require_id("comicId", comic_id)?;
    require_id("chapterId", chapter_id)?;

    if total_pages <= 0 {
        return Err(ProgressError::invalid(
            "totalPages",
            format!("must be positive, got {total_pages}"),
        ));
    }
    let total = u32::try_from(total_pages).map_err(|_| {
        ProgressError::invalid("totalPages", format!("{total_pages} is too large"))
    })?;
    if page < 0 {
        return Err(ProgressError::invalid(
            "page",
            format!("must not be negative, got {page}"),
        ));
    }
    if page > total_pages {
        return Err(ProgressError::invalid(
            "page",
            format!("{page} exceeds totalPages {total_pages}"),
        ));
    }

    Ok(Validated {
        key: ProgressKey::new(user_id, comic_id, chapter_id),
        // page <= total_pages, which fits u32
        page: page as u32,
        total_pages: total,
    })
}

fn compare_chapters(order: &ChapterOrder, a: &ReadProgress, b: &ReadProgress) -> Ordering {
    let by_number = match (order.number(&a.chapter_id), order.number(&b.chapter_id)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_number.then_with(|| a.chapter_id.cmp(&b.chapter_id))
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    // Every mutation is a single pass over the state, so a poisoned lock still guards consistent data.
    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the page a user has reached in a chapter.
    ///
    /// Creates the record on first report, otherwise updates `page` and
    /// `total_pages` in place and keeps the id. `updated_at` never moves
    /// backwards for a key. Invalid input is rejected and leaves any existing
    /// record untouched.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn report(
        &self,
        user_id: &str,
        comic_id: &str,
        chapter_id: &str,
        page: i64,
        total_pages: i64,
    ) -> Result<ReadProgress> {
        let v = validate(user_id, comic_id, chapter_id, page, total_pages)?;
        let now = Utc::now();
        let mut guard = self.write();
        let State {
            records,
            owners,
            seq,
        } = &mut *guard;
        *seq += 1;
        let record = match records.entry(v.key) {
            Entry::Occupied(mut e) => {
                let existing = e.get_mut();
                existing.progress.page = v.page;
                existing.progress.total_pages = v.total_pages;
                existing.progress.updated_at = now.max(existing.progress.updated_at);
                existing.seq = *seq;
                existing.progress.clone()
            }
            Entry::Vacant(e) => {
                let key = e.key().clone();
                let id = ProgressId::generate();
                owners.insert(id.clone(), key.clone());
                let created = ReadProgress {
                    id,
                    user_id: key.user_id,
                    comic_id: key.comic_id,
                    chapter_id: key.chapter_id,
                    total_pages: v.total_pages,
                    page: v.page,
                    updated_at: now,
                };
                e.insert(Tracked {
                    progress: created,
                    seq: *seq,
                })
                .progress
                .clone()
            }
        };
        tracing::debug!(id = %record.id, page = record.page, total_pages = record.total_pages, "progress reported");
        Ok(record)
    }

    /// `None` means the triple was never reported, which is distinct from a
    /// record at page 0.
    pub fn get(&self, user_id: &str, comic_id: &str, chapter_id: &str) -> Option<ReadProgress> {
        self.read()
            .records
            .get(&ProgressKey::new(user_id, comic_id, chapter_id))
            .map(|t| t.progress.clone())
    }

    /// All chapter records of one comic for a user, ordered by chapter number.
    ///
    /// Chapters missing from `order` come after the known ones; ties are broken
    /// by chapter id.
    pub fn list_for_comic(
        &self,
        user_id: &str,
        comic_id: &str,
        order: &ChapterOrder,
    ) -> Vec<ReadProgress> {
        let mut out: Vec<ReadProgress> = self
            .read()
            .records
            .values()
            .map(|t| &t.progress)
            .filter(|r| r.user_id == user_id && r.comic_id == comic_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| compare_chapters(order, a, b));
        out
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn remove(&self, user_id: &str, comic_id: &str, chapter_id: &str) -> bool {
        let mut guard = self.write();
        let removed = guard
            .records
            .remove(&ProgressKey::new(user_id, comic_id, chapter_id));
        if let Some(t) = &removed {
            guard.owners.remove(&t.progress.id);
            tracing::debug!(id = %t.progress.id, "progress removed");
        }
        removed.is_some()
    }

    /// Merge a replica record using last-writer-wins on `updated_at`.
    ///
    /// A strictly newer replica (or one with no local counterpart) replaces the
    /// local record wholesale; equal or older timestamps keep the local copy.
    /// Replicas go through the same shape checks as `report` and must carry
    /// `updated_at`. A replica without an id inherits the local id, or gets a
    /// fresh one when there is no local record. So does a replica whose id
    /// already belongs to a different chapter.
    #[tracing::instrument(level = "debug", skip(self, remote), fields(user_id = %remote.user_id, comic_id = %remote.comic_id, chapter_id = %remote.chapter_id))]
    pub fn reconcile(&self, remote: ReadProgressRecord) -> Result<Reconciled> {
        let v = validate(
            &remote.user_id,
            &remote.comic_id,
            &remote.chapter_id,
            remote.page,
            remote.total_pages,
        )?;
        let remote_at = remote
            .updated_at
            .ok_or_else(|| ProgressError::invalid("updatedAt", "required on replica records"))?;
        if remote.id.as_ref().is_some_and(|id| id.as_str().trim().is_empty()) {
            return Err(ProgressError::invalid("id", "must not be empty when present"));
        }

        let mut guard = self.write();
        let State {
            records,
            owners,
            seq,
        } = &mut *guard;

        let local_id = match records.get(&v.key) {
            Some(local) if remote_at <= local.progress.updated_at => {
                tracing::debug!(id = %local.progress.id, "replica is not newer, keeping local record");
                return Ok(Reconciled::Kept(local.progress.clone()));
            }
            Some(local) => Some(local.progress.id.clone()),
            None => None,
        };

        let id = match remote.id {
            Some(id) if owners.get(&id).is_none_or(|owner| *owner == v.key) => id,
            Some(id) => {
                tracing::warn!(%id, "replica id already names another chapter, keeping a local id");
                local_id.clone().unwrap_or_else(ProgressId::generate)
            }
            None => local_id.clone().unwrap_or_else(ProgressId::generate),
        };
        if let Some(old) = local_id.filter(|old| *old != id) {
            owners.remove(&old);
        }
        owners.insert(id.clone(), v.key.clone());

        *seq += 1;
        let progress = ReadProgress {
            id,
            user_id: remote.user_id,
            comic_id: remote.comic_id,
            chapter_id: remote.chapter_id,
            total_pages: v.total_pages,
            page: v.page,
            updated_at: remote_at,
        };
        records.insert(
            v.key,
            Tracked {
                progress: progress.clone(),
                seq: *seq,
            },
        );
        tracing::debug!(id = %progress.id, "replica replaced local record");
        Ok(Reconciled::Replaced(progress))
    }

    /// Records changed locally after `after`, in the order the changes were
    /// accepted. Timestamps play no part, so a replica carrying an old
    /// `updated_at` is still reported once it lands here. A cursor from another
    /// tracker instance is treated as no cursor at all.
    pub fn changes_after(&self, user_id: Option<&str>, after: Option<&ChangeCursor>) -> Changes {
        let state = self.read();
        let after_seq = after
            .filter(|c| c.epoch == self.epoch)
            .map_or(0, |c| c.seq);
        let mut changed: Vec<&Tracked> = state
            .records
            .values()
            .filter(|t| t.seq > after_seq)
            .filter(|t| user_id.is_none_or(|u| t.progress.user_id == u))
            .collect();
        changed.sort_by_key(|t| t.seq);
        Changes {
            records: changed.into_iter().map(|t| t.progress.clone()).collect(),
            cursor: ChangeCursor {
                epoch: self.epoch.clone(),
                seq: state.seq,
            },
        }
    }

    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};

    fn replica(page: i64, total: i64, at: DateTime<Utc>) -> ReadProgressRecord {
        ReadProgressRecord {
            id: None,
            chapter_id: "ch1".into(),
            comic_id: "c1".into(),
            user_id: "u1".into(),
            total_pages: total,
            page,
            updated_at: Some(at),
        }
    }

    #[test]
    fn report_then_get_returns_equal_record() {
        let t = ProgressTracker::new();
        let r = t.report("u1", "c1", "ch1", 5, 20).unwrap();
        assert_eq!(r.page, 5);
        assert_eq!(r.total_pages, 20);
        assert_eq!(t.get("u1", "c1", "ch1"), Some(r));
    }

    #[test]
    fn never_reported_is_not_found() {
        let t = ProgressTracker::new();
        t.report("u1", "c1", "ch1", 0, 20).unwrap();
        assert!(t.get("u1", "c1", "ch2").is_none());
        assert!(t.get("u2", "c1", "ch1").is_none());
        // started at page 0 is still a record
        assert_eq!(t.get("u1", "c1", "ch1").unwrap().page, 0);
    }

    #[test]
    fn second_report_keeps_id_and_advances_timestamp() {
        let t = ProgressTracker::new();
        let first = t.report("u1", "c1", "ch1", 5, 20).unwrap();
        let second = t.report("u1", "c1", "ch1", 12, 20).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.page, 12);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn report_may_change_total_pages() {
        let t = ProgressTracker::new();
        t.report("u1", "c1", "ch1", 5, 20).unwrap();
        let r = t.report("u1", "c1", "ch1", 22, 24).unwrap();
        assert_eq!((r.page, r.total_pages), (22, 24));
    }

    #[test]
    fn invalid_reports_are_rejected_without_side_effects() {
        let t = ProgressTracker::new();
        let before = t.report("u1", "c1", "ch1", 5, 20).unwrap();

        let cases = [
            (21, 20, "page"),
            (-1, 20, "page"),
            (0, 0, "totalPages"),
            (0, -3, "totalPages"),
            (1, i64::from(u32::MAX) + 1, "totalPages"),
        ];
        for (page, total, field) in cases {
            let err = t.report("u1", "c1", "ch1", page, total).unwrap_err();
            assert_eq!(err.field(), field, "page={page} total={total}");
        }
        assert_eq!(t.get("u1", "c1", "ch1"), Some(before));
    }

    #[test]
    fn empty_identifiers_are_rejected() {
        let t = ProgressTracker::new();
        assert_eq!(t.report("", "c1", "ch1", 1, 2).unwrap_err().field(), "userId");
        assert_eq!(t.report("u1", " ", "ch1", 1, 2).unwrap_err().field(), "comicId");
        assert_eq!(t.report("u1", "c1", "", 1, 2).unwrap_err().field(), "chapterId");
        assert!(t.is_empty());
    }

    #[test]
    fn page_equal_to_total_is_finished() {
        let t = ProgressTracker::new();
        let r = t.report("u1", "c1", "ch1", 20, 20).unwrap();
        assert_eq!(r.page, r.total_pages);
    }

    #[test]
    fn remove_existing_and_missing() {
        let t = ProgressTracker::new();
        t.report("u1", "c1", "ch1", 3, 10).unwrap();
        assert!(t.remove("u1", "c1", "ch1"));
        assert!(t.get("u1", "c1", "ch1").is_none());
        assert!(!t.remove("u1", "c1", "ch1"));
    }

    #[test]
    fn list_for_comic_orders_by_chapter_number() {
        let t = ProgressTracker::new();
        t.report("u1", "c1", "ch-10", 1, 10).unwrap();
        t.report("u1", "c1", "ch-2", 2, 10).unwrap();
        t.report("u1", "c1", "ch-10.5", 3, 10).unwrap();
        t.report("u1", "c1", "extra-b", 4, 10).unwrap();
        t.report("u1", "c1", "extra-a", 5, 10).unwrap();
        t.report("u1", "c2", "ch-1", 1, 10).unwrap();
        t.report("u2", "c1", "ch-2", 1, 10).unwrap();

        let order = ChapterOrder::from_numbers([("ch-2", 2.0), ("ch-10", 10.0), ("ch-10.5", 10.5)]);
        let chapters: Vec<String> = t
            .list_for_comic("u1", "c1", &order)
            .into_iter()
            .map(|r| r.chapter_id)
            .collect();
        assert_eq!(chapters, ["ch-2", "ch-10", "ch-10.5", "extra-a", "extra-b"]);
    }

    #[test]
    fn list_for_unknown_comic_is_empty() {
        let t = ProgressTracker::new();
        t.report("u1", "c1", "ch1", 1, 10).unwrap();
        assert!(t.list_for_comic("u1", "nope", &ChapterOrder::default()).is_empty());
    }

    #[test]
    fn reconcile_newer_replaces_all_fields() {
        let t = ProgressTracker::new();
        let local = t.report("u1", "c1", "ch1", 12, 20).unwrap();
        let later = local.updated_at + Duration::hours(1);

        let out = t.reconcile(replica(18, 30, later)).unwrap();
        assert!(out.is_replaced());
        let stored = t.get("u1", "c1", "ch1").unwrap();
        assert_eq!((stored.page, stored.total_pages), (18, 30));
        assert_eq!(stored.updated_at, later);
        // replica without id inherits the local one
        assert_eq!(stored.id, local.id);
    }

    #[test]
    fn reconcile_older_or_equal_keeps_local() {
        let t = ProgressTracker::new();
        let local = t.report("u1", "c1", "ch1", 12, 20).unwrap();

        let older = t
            .reconcile(replica(3, 20, local.updated_at - Duration::minutes(5)))
            .unwrap();
        assert_eq!(older, Reconciled::Kept(local.clone()));

        let tie = t.reconcile(replica(7, 20, local.updated_at)).unwrap();
        assert_eq!(tie, Reconciled::Kept(local.clone()));
        assert_eq!(t.get("u1", "c1", "ch1"), Some(local));
    }

    #[test]
    fn reconcile_unknown_key_inserts_with_remote_id() {
        let t = ProgressTracker::new();
        let mut r = replica(4, 8, Utc::now());
        r.id = Some(ProgressId::from("remote-1".to_string()));
        let out = t.reconcile(r).unwrap();
        assert!(out.is_replaced());
        assert_eq!(t.get("u1", "c1", "ch1").unwrap().id.as_str(), "remote-1");
    }

    #[test]
    fn reconcile_rejects_malformed_replicas() {
        let t = ProgressTracker::new();
        let local = t.report("u1", "c1", "ch1", 1, 2).unwrap();
        let later = local.updated_at + Duration::hours(1);

        assert_eq!(t.reconcile(replica(5, 2, later)).unwrap_err().field(), "page");
        let mut no_stamp = replica(1, 2, later);
        no_stamp.updated_at = None;
        assert_eq!(t.reconcile(no_stamp).unwrap_err().field(), "updatedAt");
        let mut blank_id = replica(1, 2, later);
        blank_id.id = Some(ProgressId::from(String::new()));
        assert_eq!(t.reconcile(blank_id).unwrap_err().field(), "id");

        assert_eq!(t.get("u1", "c1", "ch1"), Some(local));
    }

    #[test]
    fn report_after_future_replica_stays_monotonic() {
        let t = ProgressTracker::new();
        let future = Utc::now() + Duration::days(1);
        t.reconcile(replica(2, 10, future)).unwrap();
        let r = t.report("u1", "c1", "ch1", 3, 10).unwrap();
        assert!(r.updated_at >= future);
    }

    #[test]
    fn page_turning_scenario() {
        let t = ProgressTracker::new();
        let first = t.report("u1", "c1", "ch1", 5, 20).unwrap();
        assert_eq!((first.page, first.total_pages), (5, 20));

        let second = t.report("u1", "c1", "ch1", 12, 20).unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.page, 12);

        let earlier = second.updated_at - Duration::seconds(30);
        t.reconcile(replica(3, 20, earlier)).unwrap();
        assert_eq!(t.get("u1", "c1", "ch1").unwrap().page, 12);

        let later = second.updated_at + Duration::seconds(30);
        t.reconcile(replica(18, 20, later)).unwrap();
        assert_eq!(t.get("u1", "c1", "ch1").unwrap().page, 18);
    }

    #[test]
    fn changes_follow_local_acceptance_order() {
        let t = ProgressTracker::new();
        let base = Utc::now() - Duration::hours(2);
        let mut b = replica(2, 10, base + Duration::hours(1));
        b.chapter_id = "b".into();
        let mut other = replica(3, 10, base + Duration::hours(1));
        other.user_id = "u2".into();
        let mut a = replica(1, 10, base);
        a.chapter_id = "a".into();
        for r in [b, other, a] {
            t.reconcile(r).unwrap();
        }

        assert_eq!(t.changes_after(None, None).records.len(), 3);
        let u1 = t.changes_after(Some("u1"), None);
        let chapters: Vec<&str> = u1.records.iter().map(|r| r.chapter_id.as_str()).collect();
        // "a" carries the oldest timestamp but was accepted last
        assert_eq!(chapters, ["b", "a"]);
        assert!(t.changes_after(Some("u1"), Some(&u1.cursor)).records.is_empty());

        t.report("u1", "c1", "b", 5, 10).unwrap();
        let next = t.changes_after(Some("u1"), Some(&u1.cursor));
        assert_eq!(next.records.len(), 1);
        assert_eq!(next.records[0].chapter_id, "b");
        assert!(next.cursor.seq > u1.cursor.seq);
    }

    #[test]
    fn older_replica_landing_later_is_still_a_change() {
        let t = ProgressTracker::new();
        t.report("u1", "c1", "ch-local", 1, 10).unwrap();
        let seen = t.changes_after(None, None).cursor;

        let stale_stamp = Utc::now() - Duration::days(30);
        t.reconcile(replica(4, 10, stale_stamp)).unwrap();
        let changes = t.changes_after(None, Some(&seen));
        assert_eq!(changes.records.len(), 1);
        assert_eq!(changes.records[0].updated_at, stale_stamp);
    }

    #[test]
    fn kept_replica_is_not_a_change() {
        let t = ProgressTracker::new();
        let local = t.report("u1", "c1", "ch1", 5, 10).unwrap();
        let seen = t.changes_after(None, None).cursor;
        t.reconcile(replica(1, 10, local.updated_at)).unwrap();
        assert!(t.changes_after(None, Some(&seen)).records.is_empty());
    }

    #[test]
    fn cursor_from_another_tracker_restarts_the_feed() {
        let before_restart = ProgressTracker::new();
        before_restart.report("u1", "c1", "ch1", 1, 10).unwrap();
        before_restart.report("u1", "c1", "ch2", 1, 10).unwrap();
        let stale = before_restart.changes_after(None, None).cursor;

        let t = ProgressTracker::new();
        t.report("u1", "c1", "ch1", 1, 10).unwrap();
        let changes = t.changes_after(None, Some(&stale));
        assert_eq!(changes.records.len(), 1);
        assert_ne!(changes.cursor.epoch, stale.epoch);
    }

    #[test]
    fn replica_id_owned_by_another_chapter_is_not_reused() {
        let t = ProgressTracker::new();
        let mut first = replica(1, 10, Utc::now());
        first.id = Some(ProgressId::from("shared".to_string()));
        t.reconcile(first).unwrap();

        let mut clash = replica(2, 10, Utc::now());
        clash.chapter_id = "ch2".into();
        clash.id = Some(ProgressId::from("shared".to_string()));
        let out = t.reconcile(clash).unwrap();
        assert!(out.is_replaced());
        assert_ne!(out.record().id.as_str(), "shared");
        assert_eq!(t.get("u1", "c1", "ch1").unwrap().id.as_str(), "shared");

        // once the owner is gone the id is free again
        assert!(t.remove("u1", "c1", "ch1"));
        let mut reuse = replica(3, 10, Utc::now() + Duration::hours(1));
        reuse.chapter_id = "ch2".into();
        reuse.id = Some(ProgressId::from("shared".to_string()));
        assert_eq!(t.reconcile(reuse).unwrap().record().id.as_str(), "shared");
    }

    #[test]
    fn replica_keeps_its_own_id_when_replacing() {
        let t = ProgressTracker::new();
        let local = t.report("u1", "c1", "ch1", 1, 10).unwrap();
        let mut r = replica(2, 10, local.updated_at + Duration::minutes(1));
        r.id = Some(ProgressId::from("remote-9".to_string()));
        t.reconcile(r).unwrap();
        assert_eq!(t.get("u1", "c1", "ch1").unwrap().id.as_str(), "remote-9");

        // the replaced local id no longer blocks another chapter
        let mut other = replica(1, 10, Utc::now());
        other.chapter_id = "ch2".into();
        other.id = Some(local.id.clone());
        assert_eq!(t.reconcile(other).unwrap().record().id, local.id);
    }

    #[test]
    fn concurrent_reports_keep_one_record() {
        let t = std::sync::Arc::new(ProgressTracker::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let t = t.clone();
                std::thread::spawn(move || t.report("u1", "c1", "ch1", i, 10).unwrap())
            })
            .collect();
        let ids: Vec<ProgressId> = handles.into_iter().map(|h| h.join().unwrap().id).collect();
        assert_eq!(t.len(), 1);
        assert!(ids.iter().all(|id| *id == ids[0]));
    }
}
