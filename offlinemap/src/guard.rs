//! Single-flight guard for the offline cache directory.
//!
//! Exporting into the cache and building an offline basemap from it must not
//! overlap. Every operation that touches the cache directory first acquires a
//! [`CacheLease`] from the shared [`CacheGuard`]; a second operation arriving
//! while one is in flight is rejected with the state that blocked it rather
//! than queued.
//!
//! ```text
//!            try_acquire(Exporting)            lease dropped
//!   Idle ─────────────────────────────► Exporting ───────────► Idle
//!     │      try_acquire(Loading)                lease dropped
//!     └───────────────────────────────► Loading ────────────► Idle
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

/// What the cache directory is currently being used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Idle,
    Exporting,
    Loading,
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CacheState::Idle => "idle",
            CacheState::Exporting => "exporting",
            CacheState::Loading => "loading",
        };
        f.write_str(name)
    }
}

/// Returned when the guard is held by another operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheBusy {
    /// The operation currently holding the cache.
    pub held_by: CacheState,
}

impl fmt::Display for CacheBusy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offline cache is busy ({})", self.held_by)
    }
}

impl std::error::Error for CacheBusy {}

/// Shared single-flight guard. Cloning shares the same state.
#[derive(Debug, Clone)]
pub struct CacheGuard {
    state: Arc<Mutex<CacheState>>,
}

impl Default for CacheGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheGuard {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState::Idle)),
        }
    }

    /// Current state.
    pub fn state(&self) -> CacheState {
        *self.state.lock()
    }

    /// Claims the cache for `operation` if it is idle.
    ///
    /// Requesting [`CacheState::Idle`] is meaningless and always succeeds
    /// with a lease that holds nothing.
    pub fn try_acquire(&self, operation: CacheState) -> Result<CacheLease, CacheBusy> {
        if operation == CacheState::Idle {
            return Ok(CacheLease {
                state: None,
                operation,
            });
        }

        let mut state = self.state.lock();
        let held_by = *state;
        if held_by != CacheState::Idle {
            debug!(requested = %operation, held_by = %held_by, "Offline cache busy");
            return Err(CacheBusy { held_by });
        }

        *state = operation;
        debug!(operation = %operation, "Offline cache acquired");
        Ok(CacheLease {
            state: Some(Arc::clone(&self.state)),
            operation,
        })
    }
}

/// Exclusive claim on the cache directory; released on drop.
#[derive(Debug)]
pub struct CacheLease {
    state: Option<Arc<Mutex<CacheState>>>,
    operation: CacheState,
}

impl CacheLease {
    pub fn operation(&self) -> CacheState {
        self.operation
    }
}

impl Drop for CacheLease {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            *state.lock() = CacheState::Idle;
            debug!(operation = %self.operation, "Offline cache released");
        }
    }
}
