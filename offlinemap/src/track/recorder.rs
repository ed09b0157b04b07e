//! Edge-triggered track recorder.

use tracing::{debug, info};

use super::path::{Position, TrackPath};
use crate::view::{AutoPanMode, MapViewSurface};

/// Records location samples into a [`TrackPath`] while tracking is on.
///
/// Samples arriving while tracking is off are dropped, not buffered. Turning
/// tracking on clears the path; turning it off freezes it.
#[derive(Debug, Default)]
pub struct TrackRecorder {
    tracking: bool,
    path: TrackPath,
}

impl TrackRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    pub fn path(&self) -> &TrackPath {
        &self.path
    }

    /// Turns tracking on or off. Returns `false` only when disabling while
    /// already disabled.
    ///
    /// Enabling always starts a fresh path, even if tracking was already on:
    /// the path is cleared, redrawn empty and the view switched to
    /// [`AutoPanMode::CompassNavigation`].
    pub fn set_tracking<V: MapViewSurface + ?Sized>(&mut self, enabled: bool, view: &mut V) -> bool {
        if !enabled && !self.tracking {
            return false;
        }
        self.tracking = enabled;

        if enabled {
            self.path.clear();
            view.set_auto_pan_mode(AutoPanMode::CompassNavigation);
            view.set_track_geometry(&self.path.to_polyline());
            info!("Tracking started");
        } else {
            info!(samples = self.path.len(), "Tracking stopped");
        }
        true
    }

    /// Handles one location update. Returns whether it was recorded.
    pub fn on_position_sample<V: MapViewSurface + ?Sized>(
        &mut self,
        sample: Position,
        view: &mut V,
    ) -> bool {
        if !self.tracking {
            return false;
        }

        self.path.push(sample);
        // Panning by the user drops the view out of compass mode
        view.set_auto_pan_mode(AutoPanMode::CompassNavigation);
        view.set_track_geometry(&self.path.to_polyline());

        debug!(
            lat = sample.latitude,
            lon = sample.longitude,
            samples = self.path.len(),
            "Track sample recorded"
        );
        true
    }
}
