//! Online/offline basemap state machine.

use tracing::{debug, info};

use super::types::{
    ActiveBasemap, BasemapError, ItemResourceCache, LiveBasemap, MapMode, OfflineLayer,
    OfflineSession, VectorTileCache,
};
use crate::guard::{CacheGuard, CacheState};
use crate::store::OfflineCacheStore;

/// Owns the map's basemap and is the only thing that changes it.
///
/// ```text
///            set_offline_mode(true)
///   Online ─────────────────────────► Offline(session | none)
///     ▲                                    │
///     └────────────────────────────────────┘
///            set_offline_mode(false)
/// ```
///
/// Entering offline mode again rebuilds the session from disk; the previous
/// session is dropped first.
#[derive(Debug)]
pub struct BasemapSwitcher {
    live: LiveBasemap,
    mode: MapMode,
    store: OfflineCacheStore,
    guard: CacheGuard,
}

impl BasemapSwitcher {
    /// Creates a switcher showing `live`.
    pub fn new(live: LiveBasemap, store: OfflineCacheStore, guard: CacheGuard) -> Self {
        Self {
            live,
            mode: MapMode::Online,
            store,
            guard,
        }
    }

    pub fn mode(&self) -> &MapMode {
        &self.mode
    }

    pub fn is_offline(&self) -> bool {
        matches!(self.mode, MapMode::Offline(_))
    }

    /// The live basemap, whether or not it is shown.
    pub fn live_basemap(&self) -> &LiveBasemap {
        &self.live
    }

    pub fn active_basemap(&self) -> ActiveBasemap<'_> {
        match &self.mode {
            MapMode::Online => ActiveBasemap::Live(&self.live),
            MapMode::Offline(Some(session)) => ActiveBasemap::Offline(session),
            MapMode::Offline(None) => ActiveBasemap::Empty,
        }
    }

    /// Switches between the live basemap and one built from the offline cache.
    ///
    /// With no cache on disk, offline mode shows no basemap; that is not an
    /// error.
    ///
    /// # Errors
    ///
    /// [`BasemapError::Busy`] while an export holds the cache; the current
    /// mode is left unchanged. [`BasemapError::Package`] if the package exists
    /// but cannot be loaded; the switcher is left online.
    pub fn set_offline_mode(&mut self, enabled: bool) -> Result<(), BasemapError> {
        if !enabled {
            if let MapMode::Offline(session) = std::mem::take(&mut self.mode) {
                debug!(had_session = session.is_some(), "Releasing offline session");
            }
            info!(basemap = self.live.name(), "Switched to live basemap");
            return Ok(());
        }

        let _lease = self.guard.try_acquire(CacheState::Loading)?;

        // The old session must be gone before a new one is built
        self.mode = MapMode::Online;

        let Some(handle) = self.store.load_if_present() else {
            info!(root = %self.store.root().display(), "No offline cache, offline basemap is empty");
            self.mode = MapMode::Offline(None);
            return Ok(());
        };

        let tiles = VectorTileCache::open(handle.package_path())?;
        let layer = match handle.resources_path() {
            Some(path) => OfflineLayer::with_resources(tiles, ItemResourceCache::open(path)),
            None => OfflineLayer::without_resources(tiles),
        };
        let session = OfflineSession::new(handle, layer);

        info!(
            tiles = session.layer().tiles().tile_count(),
            has_resources = session.has_resources(),
            "Switched to offline basemap"
        );
        self.mode = MapMode::Offline(Some(session));
        Ok(())
    }
}
