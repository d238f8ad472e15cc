//! Paper state persistence with an explicit critical section.
//!
//! The state document is the only shared mutable resource in the system.
//! Every load → mutate → save sequence runs under a `StateLock`: an advisory
//! lock file created next to the document with `create_new`, so a second
//! invocation for the same location fails fast instead of interleaving.
//! Saves write a temp file and rename it over the document.
//!
//! The lock file records its owner's pid and acquisition time. A lock left
//! behind by a crashed invocation is taken over once its owner is no longer
//! running or it is older than the store's stale threshold.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::paper::PaperTradingState;

/// Errors from the paper state store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("paper state at {path} is locked by another invocation")]
    Locked { path: PathBuf },

    #[error("lock {lock} does not guard {path}")]
    LockMismatch { lock: PathBuf, path: PathBuf },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize paper state: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Locks older than this are considered abandoned (15 minutes).
pub const DEFAULT_STALE_LOCK_SECS: i64 = 15 * 60;

/// Contents of a lock file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockOwner {
    pub pid: u32,
    /// Unix seconds.
    pub acquired_at: i64,
}

/// Held for the whole load → mutate → save sequence. Released on drop.
#[derive(Debug)]
pub struct StateLock {
    path: PathBuf,
}

impl StateLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release state lock");
        }
    }
}

/// File-backed store for `PaperTradingState`.
#[derive(Debug, Clone)]
pub struct PaperStore {
    path: PathBuf,
    stale_after_secs: i64,
}

impl PaperStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            stale_after_secs: DEFAULT_STALE_LOCK_SECS,
        }
    }

    /// Age after which a leftover lock is taken over.
    pub fn with_stale_after(mut self, age: chrono::Duration) -> Self {
        self.stale_after_secs = age.num_seconds();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<state file>.lock`
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Acquire the exclusive lock for this state document.
    pub fn lock(&self) -> Result<StateLock, StoreError> {
        self.lock_at(Utc::now())
    }

    /// Acquire the lock, judging staleness of a leftover lock against `now`.
    pub fn lock_at(&self, now: DateTime<Utc>) -> Result<StateLock, StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let owner = LockOwner {
            pid: std::process::id(),
            acquired_at: now.timestamp(),
        };
        if let Some(guard) = self.try_create(&owner)? {
            return Ok(guard);
        }
        if !self.lock_is_stale(now) {
            return Err(StoreError::Locked {
                path: self.path.clone(),
            });
        }

        let lock_path = self.lock_path();
        tracing::warn!(
            path = %lock_path.display(),
            previous = ?self.lock_owner(),
            "taking over stale paper state lock"
        );
        match fs::remove_file(&lock_path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::io(&lock_path, e)),
        }
        // Another invocation may have won the takeover in between.
        self.try_create(&owner)?.ok_or_else(|| StoreError::Locked {
            path: self.path.clone(),
        })
    }

    /// Owner recorded in the lock file, if one exists and is readable.
    pub fn lock_owner(&self) -> Option<LockOwner> {
        let text = fs::read_to_string(self.lock_path()).ok()?;
        serde_json::from_str(&text).ok()
    }

    /// `None` when the lock file already exists.
    fn try_create(&self, owner: &LockOwner) -> Result<Option<StateLock>, StoreError> {
        let lock_path = self.lock_path();
        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(None),
            Err(e) => return Err(StoreError::io(&lock_path, e)),
        };
        // Lock is held from here on.
        let guard = StateLock { path: lock_path };
        serde_json::to_writer(&mut file, owner)?;
        file.flush().map_err(|e| StoreError::io(&guard.path, e))?;
        Ok(Some(guard))
    }

    /// A leftover lock is stale when its owner is known to be dead or it is
    /// older than the threshold. Unreadable lock files are aged by mtime.
    fn lock_is_stale(&self, now: DateTime<Utc>) -> bool {
        let (pid, acquired_at) = match self.lock_owner() {
            Some(owner) => (Some(owner.pid), owner.acquired_at),
            None => match modified_at(&self.lock_path()) {
                Some(ts) => (None, ts),
                None => return false,
            },
        };
        if pid.and_then(process_alive) == Some(false) {
            return true;
        }
        now.timestamp().saturating_sub(acquired_at) > self.stale_after_secs
    }

    /// Load the state under `lock`, or a fresh state when the document is
    /// missing, corrupt or not an object.
    pub fn load(
        &self,
        lock: &StateLock,
        starting_capital: f64,
        now: DateTime<Utc>,
    ) -> Result<PaperTradingState, StoreError> {
        self.check(lock)?;
        self.read(starting_capital, now)
    }

    /// Read the state without taking the lock. For reporting only; never
    /// save what this returns.
    pub fn read(
        &self,
        starting_capital: f64,
        now: DateTime<Utc>,
    ) -> Result<PaperTradingState, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(PaperTradingState::new(starting_capital, now));
            }
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };
        match serde_json::from_str::<PaperTradingState>(&text) {
            Ok(state) => Ok(state),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "unreadable paper state, starting fresh"
                );
                Ok(PaperTradingState::new(starting_capital, now))
            }
        }
    }

    /// Persist `state` atomically under `lock`.
    pub fn save(&self, lock: &StateLock, state: &PaperTradingState) -> Result<(), StoreError> {
        self.check(lock)?;
        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.temp_path();
        fs::write(&tmp, json).map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::io(&self.path, e))?;
        tracing::debug!(path = %self.path.display(), equity = state.equity, "paper state saved");
        Ok(())
    }

    fn check(&self, lock: &StateLock) -> Result<(), StoreError> {
        if lock.path != self.lock_path() {
            return Err(StoreError::LockMismatch {
                lock: lock.path.clone(),
                path: self.path.clone(),
            });
        }
        Ok(())
    }
}

fn modified_at(path: &Path) -> Option<i64> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    Some(DateTime::<Utc>::from(modified).timestamp())
}

/// Whether `pid` is running. `None` when this platform cannot tell.
#[cfg(target_os = "linux")]
fn process_alive(pid: u32) -> Option<bool> {
    let proc = Path::new("/proc");
    if !proc.join("self").exists() {
        return None;
    }
    Some(proc.join(pid.to_string()).exists())
}

#[cfg(not(target_os = "linux"))]
fn process_alive(_pid: u32) -> Option<bool> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn missing_file_gives_fresh_state() {
        let tmp = TempDir::new().unwrap();
        let store = PaperStore::new(tmp.path().join("paper_state.json"));
        let lock = store.lock().unwrap();
        let state = store.load(&lock, 1000.0, now()).unwrap();
        assert_eq!(state.starting_capital, 1000.0);
        assert_eq!(state.equity, 1000.0);
        assert!(state.positions.is_empty());
        assert_eq!(state.created_at, now());
    }

    #[test]
    fn second_lock_fails_until_first_drops() {
        let tmp = TempDir::new().unwrap();
        let store = PaperStore::new(tmp.path().join("paper_state.json"));
        let first = store.lock().unwrap();
        assert!(matches!(store.lock(), Err(StoreError::Locked { .. })));
        drop(first);
        assert!(!store.lock_path().exists());
        assert!(store.lock().is_ok());
    }

    #[test]
    fn lock_file_records_owner() {
        let tmp = TempDir::new().unwrap();
        let store = PaperStore::new(tmp.path().join("paper_state.json"));
        let _lock = store.lock_at(now()).unwrap();
        assert_eq!(
            store.lock_owner(),
            Some(LockOwner {
                pid: std::process::id(),
                acquired_at: now().timestamp(),
            })
        );
    }

    fn leave_lock(store: &PaperStore, pid: u32, acquired_at: i64) {
        let owner = LockOwner { pid, acquired_at };
        fs::write(store.lock_path(), serde_json::to_string(&owner).unwrap()).unwrap();
    }

    #[test]
    fn old_leftover_lock_is_taken_over() {
        let tmp = TempDir::new().unwrap();
        let store = PaperStore::new(tmp.path().join("paper_state.json"));
        let old = now() - chrono::Duration::hours(1);
        leave_lock(&store, std::process::id(), old.timestamp());

        let lock = store.lock_at(now()).unwrap();
        assert_eq!(store.lock_owner().map(|o| o.acquired_at), Some(now().timestamp()));
        drop(lock);
        assert!(!store.lock_path().exists());
    }

    #[test]
    fn recent_lock_of_live_owner_is_respected() {
        let tmp = TempDir::new().unwrap();
        let store = PaperStore::new(tmp.path().join("paper_state.json"))
            .with_stale_after(chrono::Duration::minutes(5));
        let recent = now() - chrono::Duration::minutes(4);
        leave_lock(&store, std::process::id(), recent.timestamp());

        assert!(matches!(store.lock_at(now()), Err(StoreError::Locked { .. })));
        assert!(store.lock_path().exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn leftover_lock_of_dead_process_is_taken_over() {
        let tmp = TempDir::new().unwrap();
        let store = PaperStore::new(tmp.path().join("paper_state.json"));
        // Above any kernel pid_max, so never a running process.
        leave_lock(&store, u32::MAX, now().timestamp());

        assert!(store.lock_at(now()).is_ok());
    }

    #[test]
    fn unreadable_fresh_lock_is_respected() {
        let tmp = TempDir::new().unwrap();
        let store = PaperStore::new(tmp.path().join("paper_state.json"));
        fs::write(store.lock_path(), "").unwrap();

        assert!(matches!(store.lock(), Err(StoreError::Locked { .. })));
    }

    #[test]
    fn lock_for_another_store_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let a = PaperStore::new(tmp.path().join("a.json"));
        let b = PaperStore::new(tmp.path().join("b.json"));
        let lock_a = a.lock().unwrap();
        assert!(matches!(
            b.load(&lock_a, 1000.0, now()),
            Err(StoreError::LockMismatch { .. })
        ));
    }

    #[test]
    fn corrupt_or_non_object_state_starts_fresh() {
        let tmp = TempDir::new().unwrap();
        let store = PaperStore::new(tmp.path().join("paper_state.json"));
        for junk in ["{not json", "[1, 2, 3]", "42"] {
            fs::write(store.path(), junk).unwrap();
            let state = store.read(750.0, now()).unwrap();
            assert_eq!(state.equity, 750.0);
        }
    }

    #[test]
    fn save_is_atomic_and_leaves_no_temp_file() {
        let tmp = TempDir::new().unwrap();
        let store = PaperStore::new(tmp.path().join("nested/paper_state.json"));
        let lock = store.lock().unwrap();
        let mut state = store.load(&lock, 1000.0, now()).unwrap();
        state.equity = 1012.5;
        store.save(&lock, &state).unwrap();

        assert!(store.path().exists());
        assert!(!store.temp_path().exists());
        let back = store.load(&lock, 1000.0, now()).unwrap();
        assert_eq!(back, state);
    }
}
