//! Browser sessions
//!
//! Each session owns its own catalog copy (seeded from config) and its own
//! auth gate. Nothing is shared between sessions except the seed.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::{AdminPolicy, AuthGate};
use crate::catalog::CatalogStore;
use crate::error::{ArchiveError, Result};

pub struct Session {
    id: String,
    pub catalog: RwLock<CatalogStore>,
    pub auth: RwLock<AuthGate>,
    in_flight: AtomicBool,
    /// Unix millis of the last request
    last_seen: AtomicI64,
}

/// Held while a submission runs; dropping it frees the session
pub struct SubmissionGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl Session {
    fn new(id: String, catalog: CatalogStore, policy: AdminPolicy) -> Self {
        Self {
            id,
            catalog: RwLock::new(catalog),
            auth: RwLock::new(AuthGate::new(policy)),
            in_flight: AtomicBool::new(false),
            last_seen: AtomicI64::new(Utc::now().timestamp_millis()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Claim the single submission slot, or fail with `Busy`
    pub fn begin_submission(&self) -> Result<SubmissionGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ArchiveError::Busy)?;
        Ok(SubmissionGuard {
            flag: &self.in_flight,
        })
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn touch(&self) {
        self.last_seen
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    fn idle_for(&self, now_millis: i64) -> Duration {
        let idle = now_millis - self.last_seen.load(Ordering::Relaxed);
        Duration::from_millis(idle.max(0) as u64)
    }
}

/// All live sessions, keyed by id
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<Session>>,
    seed: CatalogStore,
    policy: AdminPolicy,
    idle_ttl: Duration,
}

impl SessionRegistry {
    pub fn new(seed: CatalogStore, policy: AdminPolicy, idle_ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            seed,
            policy,
            idle_ttl,
        }
    }

    /// Start an anonymous session with a fresh copy of the seed catalog
    pub fn open(&self) -> (String, Arc<Session>) {
        self.prune_idle();

        let id = Uuid::new_v4().to_string();
        let session = Arc::new(Session::new(
            id.clone(),
            self.seed.clone(),
            self.policy.clone(),
        ));
        self.sessions.insert(id.clone(), session.clone());

        info!(session = %id, live = self.sessions.len(), "Session opened");
        (id, session)
    }

    pub fn get(&self, id: &str) -> Result<Arc<Session>> {
        let session = self
            .sessions
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ArchiveError::Session(format!("unknown session: {}", id)))?;
        session.touch();
        Ok(session)
    }

    pub fn close(&self, id: &str) -> Result<()> {
        self.sessions
            .remove(id)
            .map(|_| info!(session = %id, "Session closed"))
            .ok_or_else(|| ArchiveError::Session(format!("unknown session: {}", id)))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn prune_idle(&self) {
        let now = Utc::now().timestamp_millis();
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.idle_for(now) <= self.idle_ttl);

        let pruned = before.saturating_sub(self.sessions.len());
        if pruned > 0 {
            debug!(pruned, "Dropped idle sessions");
        }
    }
}
