use std::future::Future;
use std::sync::Arc;

use ledger_core::TeamMembershipRecord;
use tracing::{info, warn};

use crate::error::{Result, SourceResult};

/// Keyed persistence for the team membership decision.
pub trait MembershipStore: Send + Sync {
    fn get(&self, subject_id: &str) -> Result<Option<TeamMembershipRecord>>;
    fn put(&self, record: &TeamMembershipRecord) -> Result<()>;
}

impl<T: MembershipStore + ?Sized> MembershipStore for Box<T> {
    fn get(&self, subject_id: &str) -> Result<Option<TeamMembershipRecord>> {
        (**self).get(subject_id)
    }

    fn put(&self, record: &TeamMembershipRecord) -> Result<()> {
        (**self).put(record)
    }
}

impl<T: MembershipStore + ?Sized> MembershipStore for Arc<T> {
    fn get(&self, subject_id: &str) -> Result<Option<TeamMembershipRecord>> {
        (**self).get(subject_id)
    }

    fn put(&self, record: &TeamMembershipRecord) -> Result<()> {
        (**self).put(record)
    }
}

/// Resolves team membership once per subject.
pub struct TeamMembershipCache<M> {
    store: M,
}

impl<M: MembershipStore> TeamMembershipCache<M> {
    pub fn new(store: M) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &M {
        &self.store
    }

    /// Cached record for `subject_id`, or the loader's answer stored under it.
    ///
    /// Store read failures count as a miss and store write failures are only
    /// logged. Loader failures are returned without touching the store.
    pub async fn resolve<F, Fut>(&self, subject_id: &str, loader: F) -> SourceResult<TeamMembershipRecord>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = SourceResult<TeamMembershipRecord>>,
    {
        match self.store.get(subject_id) {
            Ok(Some(record)) if record.subject_id == subject_id => {
                info!(subject_id, "team membership cache hit");
                return Ok(record);
            }
            Ok(_) => info!(subject_id, "team membership cache miss"),
            Err(err) => warn!(subject_id, "team membership cache unreadable, reloading: {}", err),
        }
        let record = loader().await?;
        if let Err(err) = self.store.put(&record) {
            warn!(subject_id, "failed to persist team membership: {}", err);
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::error::{AppError, SourceError};
    use crate::stores::InMemoryMembershipStore;

    fn record(subject: &str, team: Option<(i64, i64)>) -> TeamMembershipRecord {
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        TeamMembershipRecord {
            subject_id: subject.to_string(),
            is_team_member: team.is_some(),
            team_id: team.map(|(id, _)| id),
            team_user_id: team.map(|(_, user)| user),
            period_anchor: ts,
            last_checked: ts,
        }
    }

    struct BrokenStore;

    impl MembershipStore for BrokenStore {
        fn get(&self, _subject_id: &str) -> Result<Option<TeamMembershipRecord>> {
            Err(AppError::Message("corrupt cache".to_string()))
        }

        fn put(&self, _record: &TeamMembershipRecord) -> Result<()> {
            Err(AppError::Message("read-only".to_string()))
        }
    }

    #[tokio::test]
    async fn loads_once_per_subject() {
        let cache = TeamMembershipCache::new(InMemoryMembershipStore::default());
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let resolved = cache
                .resolve("auth0|a", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(record("auth0|a", Some((7, 42))))
                })
                .await
                .expect("resolve");
            assert_eq!(resolved.team_ids(), Some((7, 42)));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn subject_change_invalidates_previous_entry() {
        let cache = TeamMembershipCache::new(InMemoryMembershipStore::default());
        let calls = AtomicUsize::new(0);
        for subject in ["auth0|a", "auth0|b", "auth0|a"] {
            let resolved = cache
                .resolve(subject, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(record(subject, None))
                })
                .await
                .expect("resolve");
            assert_eq!(resolved.subject_id, subject);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn unreadable_store_falls_back_to_loader() {
        let cache = TeamMembershipCache::new(BrokenStore);
        let resolved = cache
            .resolve("auth0|a", || async { Ok(record("auth0|a", None)) })
            .await
            .expect("resolve");
        assert!(!resolved.is_team_member);
    }

    #[tokio::test]
    async fn loader_failure_is_not_cached() {
        let cache = TeamMembershipCache::new(InMemoryMembershipStore::default());
        let err = cache
            .resolve("auth0|a", || async {
                Err(SourceError::Transport("connection reset".to_string()))
            })
            .await
            .expect_err("loader error");
        assert!(matches!(err, SourceError::Transport(_)));
        assert!(cache.store().get("auth0|a").expect("get").is_none());
    }
}
