use super::{SessionError, SessionStore};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use std::{
    collections::{hash_map::Entry, HashMap},
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

// 256 bits, 43 characters once encoded.
const SESSION_ID_BYTES: usize = 32;

/// Session store kept in process memory.
///
/// Expiry uses the monotonic clock, so wall-clock adjustments never stretch or
/// shorten a session.
#[derive(Debug)]
pub struct MemorySessionStore {
    ttl: Duration,
    sessions: Mutex<HashMap<String, Instant>>,
}

impl MemorySessionStore {
    /// Create a store whose sessions live for `ttl`, swept every ten minutes.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(ttl: Duration) -> Arc<Self> {
        Self::with_sweep_interval(ttl, DEFAULT_SWEEP_INTERVAL)
    }

    /// Same as [`MemorySessionStore::new`] with a custom sweep period.
    ///
    /// A zero `sweep_interval` falls back to [`DEFAULT_SWEEP_INTERVAL`].
    #[must_use]
    pub fn with_sweep_interval(ttl: Duration, sweep_interval: Duration) -> Arc<Self> {
        let store = Arc::new(Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        });

        let sweep_interval = if sweep_interval.is_zero() {
            DEFAULT_SWEEP_INTERVAL
        } else {
            sweep_interval
        };
        spawn_sweeper(Arc::downgrade(&store), sweep_interval);

        store
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of stored entries, expired ones included until they are evicted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every expired entry and return how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, expires_at| now < *expires_at);
        before - sessions.len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Instant>> {
        // Every critical section leaves the map consistent, so a poisoned lock is still usable.
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for MemorySessionStore {
    fn create(&self) -> Result<String, SessionError> {
        loop {
            let session_id = generate_session_id()?;
            let expires_at = Instant::now() + self.ttl;

            if let Entry::Vacant(entry) = self.lock().entry(session_id.clone()) {
                entry.insert(expires_at);
                return Ok(session_id);
            }

            debug!("session id collision, drawing a new one");
        }
    }

    fn check(&self, session_id: &str) -> bool {
        let now = Instant::now();
        let mut sessions = self.lock();

        match sessions.get(session_id).copied() {
            Some(expires_at) if now < expires_at => true,
            Some(_) => {
                sessions.remove(session_id);
                false
            }
            None => false,
        }
    }
}

fn spawn_sweeper(store: Weak<MemorySessionStore>, period: Duration) {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let Some(store) = store.upgrade() else {
                debug!("session store dropped, stopping sweeper");
                return;
            };

            let removed = store.sweep();
            if removed > 0 {
                debug!("swept {} expired sessions", removed);
            }
        }
    });
}

fn generate_session_id() -> Result<String, SessionError> {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(SessionError::Entropy)?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tokio::time::sleep;

    const HOUR: Duration = Duration::from_secs(60 * 60);
    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn session_id_is_url_safe_and_wide() {
        let id = generate_session_id().unwrap();
        assert_eq!(id.len(), 43);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(Base64UrlUnpadded::decode_vec(&id).unwrap().len(), SESSION_ID_BYTES);
    }

    #[tokio::test]
    async fn created_session_is_immediately_valid() {
        let store = MemorySessionStore::new(HOUR);
        let id = store.create().unwrap();
        assert!(store.check(&id));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn unknown_session_is_rejected_without_side_effect() {
        let store = MemorySessionStore::new(HOUR);
        let id = store.create().unwrap();

        assert!(!store.check("not-a-session"));
        assert!(!store.check(""));
        assert_eq!(store.len(), 1);
        assert!(store.check(&id));
    }

    #[tokio::test(start_paused = true)]
    async fn session_expires_after_ttl_and_is_evicted() {
        let store = MemorySessionStore::new(HOUR);
        let id = store.create().unwrap();

        sleep(59 * MINUTE).await;
        assert!(store.check(&id));

        sleep(2 * MINUTE).await;
        assert!(!store.check(&id));
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn validity_window_is_half_open() {
        let ttl = Duration::from_secs(10);
        // Keep the sweeper out of the way so only `check` decides.
        let store = MemorySessionStore::with_sweep_interval(ttl, HOUR);
        let id = store.create().unwrap();

        tokio::time::advance(ttl - Duration::from_millis(1)).await;
        assert!(store.check(&id));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(!store.check(&id));
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_removes_only_expired_entries() {
        let store = MemorySessionStore::with_sweep_interval(MINUTE, HOUR);
        let old = store.create().unwrap();

        tokio::time::advance(2 * MINUTE).await;
        let fresh = store.create().unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.sweep(), 1);
        assert_eq!(store.len(), 1);
        assert!(!store.check(&old));
        assert!(store.check(&fresh));
    }

    #[tokio::test(start_paused = true)]
    async fn background_sweeper_reclaims_unchecked_sessions() {
        let store = MemorySessionStore::with_sweep_interval(MINUTE, 5 * MINUTE);
        for _ in 0..10 {
            store.create().unwrap();
        }
        assert_eq!(store.len(), 10);

        sleep(6 * MINUTE).await;

        assert!(store.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_yield_distinct_ids() {
        let store = MemorySessionStore::new(HOUR);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                (0..250)
                    .map(|_| store.create().unwrap())
                    .collect::<Vec<_>>()
            }));
        }

        let mut ids = HashSet::new();
        for handle in handles {
            for id in handle.await.unwrap() {
                assert!(store.check(&id));
                assert!(ids.insert(id));
            }
        }
        assert_eq!(ids.len(), 2000);
        assert_eq!(store.len(), 2000);
    }
}
