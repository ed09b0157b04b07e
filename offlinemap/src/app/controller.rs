//! The top-level controller.

use std::sync::Arc;

use tracing::{debug, info};

use super::config::AppConfig;
use super::error::AppError;
use crate::basemap::{ActiveBasemap, BaseLayer, BasemapSwitcher, LiveBasemap, MapMode};
use crate::export::{ExportCoordinator, ExportError, ExportEvent, ExportHandle};
use crate::guard::CacheGuard;
use crate::store::OfflineCacheStore;
use crate::tiling::TilingServiceFactory;
use crate::track::{Position, TrackPath, TrackRecorder};
use crate::view::{AutoPanMode, MapViewSurface};

/// Offline map workflow bound to one view.
///
/// Owns the basemap switcher, the track recorder and the offline cache store,
/// and starts exports of whatever the view is currently showing. The switcher
/// and every export share one [`CacheGuard`], so an offline load and an export
/// never touch the cache directory at the same time.
///
/// # Example
///
/// ```ignore
/// use offlinemap::app::{AppConfig, OfflineMapApp};
///
/// let config = AppConfig::new("/data/offlinemap");
/// let factory = Arc::new(config.service_factory());
/// let mut app = OfflineMapApp::new(&config, live, factory, view);
///
/// let mut handle = app.create_offline_area_from_extent()?;
/// while let Some(event) = handle.next_event().await {
///     app.observe(&event);
/// }
/// app.toggle_offline(true)?;
/// ```
pub struct OfflineMapApp<V: MapViewSurface> {
    view: V,
    config: AppConfig,
    store: OfflineCacheStore,
    guard: CacheGuard,
    factory: Arc<dyn TilingServiceFactory>,
    switcher: BasemapSwitcher,
    recorder: TrackRecorder,
    download_progress: u8,
}

impl<V: MapViewSurface> OfflineMapApp<V> {
    /// Wires the components and attaches `view`, which starts recentering on
    /// the device location.
    pub fn new(
        config: &AppConfig,
        live: LiveBasemap,
        factory: Arc<dyn TilingServiceFactory>,
        mut view: V,
    ) -> Self {
        let store = OfflineCacheStore::new(config.cache_directory.clone());
        let guard = CacheGuard::new();
        let switcher = BasemapSwitcher::new(live, store.clone(), guard.clone());
        view.set_auto_pan_mode(AutoPanMode::Recenter);

        Self {
            view,
            config: config.clone(),
            store,
            guard,
            factory,
            switcher,
            recorder: TrackRecorder::new(),
            download_progress: 0,
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn store(&self) -> &OfflineCacheStore {
        &self.store
    }

    pub fn guard(&self) -> &CacheGuard {
        &self.guard
    }

    /// Exports the view's visible area at its current scale.
    ///
    /// Only the first vector-tiled layer of the live basemap is exported;
    /// there is a single cache path, so further vector layers are skipped.
    pub fn create_offline_area_from_extent(&mut self) -> Result<ExportHandle, AppError> {
        let live = self.switcher.live_basemap();
        let mut vector_layers = live.vector_tiled_layers();
        let layer = vector_layers
            .next()
            .ok_or(AppError::Export(ExportError::NoVectorTileLayer))?;
        for skipped in vector_layers {
            info!(url = skipped.url(), "Skipping additional vector tile layer");
        }
        if let Some(other) = live.layers().iter().find(|l| !l.is_vector_tiled()) {
            debug!(url = other.url(), "Non-vector layers are not exported");
        }

        let service = self.factory.service_for(layer.url())?;
        let coordinator = ExportCoordinator::new(service, self.store.clone(), self.guard.clone())
            .with_config(self.config.export.clone());

        let region = self.view.current_region();
        let handle = coordinator.start_export(&region)?;
        self.download_progress = 0;
        Ok(handle)
    }

    /// Records an event from a running export.
    pub fn observe(&mut self, event: &ExportEvent) {
        if let ExportEvent::Progress(p) = event {
            self.download_progress = *p;
        }
    }

    /// Last progress value delivered by an export.
    pub fn download_progress(&self) -> u8 {
        self.download_progress
    }

    /// Switches between the live basemap and the offline cache.
    pub fn toggle_offline(&mut self, enabled: bool) -> Result<(), AppError> {
        self.switcher.set_offline_mode(enabled)?;
        Ok(())
    }

    pub fn is_offline(&self) -> bool {
        self.switcher.is_offline()
    }

    pub fn map_mode(&self) -> &MapMode {
        self.switcher.mode()
    }

    pub fn active_basemap(&self) -> ActiveBasemap<'_> {
        self.switcher.active_basemap()
    }

    pub fn live_layers(&self) -> &[BaseLayer] {
        self.switcher.live_basemap().layers()
    }

    /// Turns path recording on or off. Enabling always starts a fresh path.
    pub fn set_tracking(&mut self, enabled: bool) -> bool {
        self.recorder.set_tracking(enabled, &mut self.view)
    }

    pub fn is_tracking(&self) -> bool {
        self.recorder.is_tracking()
    }

    /// Feeds a location sample. Returns whether it was recorded.
    pub fn on_position_sample(&mut self, sample: Position) -> bool {
        self.recorder.on_position_sample(sample, &mut self.view)
    }

    pub fn track_path(&self) -> &TrackPath {
        self.recorder.path()
    }
}
