//! Map view surface.
//!
//! The workflow never renders anything itself. It reads the visible area and
//! scale from a view to choose what to export, tells the view how to follow
//! the device location, and hands it the tracked path to draw.
//! [`HeadlessView`] is an in-memory surface for the CLI and tests.

use std::fmt;

use crate::region::{Extent, Region};
use crate::track::Polyline;

/// How the view follows the device location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoPanMode {
    #[default]
    Off,
    /// Keep the location on screen, recentering when it drifts out.
    Recenter,
    /// Keep the location near the bottom, map rotated to the course.
    Navigation,
    /// Keep the location centered, map rotated to the compass heading.
    CompassNavigation,
}

impl fmt::Display for AutoPanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AutoPanMode::Off => "off",
            AutoPanMode::Recenter => "recenter",
            AutoPanMode::Navigation => "navigation",
            AutoPanMode::CompassNavigation => "compass navigation",
        };
        f.write_str(name)
    }
}

/// What the workflow needs from an on-screen map.
pub trait MapViewSurface {
    /// Currently visible extent in WGS84 degrees. Longitudes may fall outside
    /// `[-180, 180]` after panning across the antimeridian.
    fn visible_area(&self) -> Extent;

    /// Current display scale denominator.
    fn map_scale(&self) -> f64;

    fn auto_pan_mode(&self) -> AutoPanMode;

    fn set_auto_pan_mode(&mut self, mode: AutoPanMode);

    /// Replaces the drawn track geometry.
    fn set_track_geometry(&mut self, path: &Polyline);

    /// Visible area and scale as an export region.
    fn current_region(&self) -> Region {
        Region::new(self.visible_area(), self.map_scale())
    }
}

/// A view with no screen, holding whatever it was last told.
#[derive(Debug, Clone)]
pub struct HeadlessView {
    visible_area: Extent,
    scale: f64,
    auto_pan_mode: AutoPanMode,
    track: Polyline,
    track_updates: usize,
}

impl HeadlessView {
    pub fn new(visible_area: Extent, scale: f64) -> Self {
        Self {
            visible_area,
            scale,
            auto_pan_mode: AutoPanMode::Off,
            track: Polyline::default(),
            track_updates: 0,
        }
    }

    /// Moves the view.
    pub fn set_viewpoint(&mut self, visible_area: Extent, scale: f64) {
        self.visible_area = visible_area;
        self.scale = scale;
    }

    /// Last geometry handed to the view.
    pub fn track(&self) -> &Polyline {
        &self.track
    }

    /// How many times the track geometry was replaced.
    pub fn track_updates(&self) -> usize {
        self.track_updates
    }
}

impl MapViewSurface for HeadlessView {
    fn visible_area(&self) -> Extent {
        self.visible_area
    }

    fn map_scale(&self) -> f64 {
        self.scale
    }

    fn auto_pan_mode(&self) -> AutoPanMode {
        self.auto_pan_mode
    }

    fn set_auto_pan_mode(&mut self, mode: AutoPanMode) {
        self.auto_pan_mode = mode;
    }

    fn set_track_geometry(&mut self, path: &Polyline) {
        self.track = path.clone();
        self.track_updates += 1;
    }
}
