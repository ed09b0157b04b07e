//! Track path storage and geometry.

use std::time::Instant;

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A single location sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// When this sample was taken.
    pub timestamp: Instant,
}

impl Position {
    /// Create a position sample stamped now.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self::with_timestamp(latitude, longitude, Instant::now())
    }

    /// Create a position sample with explicit timestamp.
    pub fn with_timestamp(latitude: f64, longitude: f64, timestamp: Instant) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
        }
    }
}

/// Positions recorded while tracking, oldest first. Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackPath {
    positions: Vec<Position>,
}

impl TrackPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, position: Position) {
        self.positions.push(position);
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Builds the display geometry from the full sequence.
    pub fn to_polyline(&self) -> Polyline {
        Polyline {
            points: self
                .positions
                .iter()
                .map(|p| (p.longitude, p.latitude))
                .collect(),
        }
    }
}

/// Line geometry drawn for a track, as `(lon, lat)` vertices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
}

impl Polyline {
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Great-circle length in meters.
    pub fn length_meters(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| haversine_m(w[0], w[1]))
            .sum()
    }
}

fn haversine_m((lon1, lat1): (f64, f64), (lon2, lat2): (f64, f64)) -> f64 {
    let (lat1, lat2) = (lat1.to_radians(), lat2.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().asin()
}
