//! Region types and errors

use std::fmt;

use serde::{Deserialize, Serialize};

/// Errors produced when parsing or validating a region.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionError {
    /// Wrong number of comma-separated values in a bbox string
    InvalidBbox(String),
    /// A coordinate was not a finite number
    NotFinite(String),
    /// South edge is north of the north edge
    InvertedLatitude { ymin: f64, ymax: f64 },
    /// Reference scale must be positive
    InvalidScale(f64),
}

impl fmt::Display for RegionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionError::InvalidBbox(s) => {
                write!(f, "Invalid bbox '{}': expected XMIN,YMIN,XMAX,YMAX", s)
            }
            RegionError::NotFinite(s) => write!(f, "Coordinate '{}' is not a finite number", s),
            RegionError::InvertedLatitude { ymin, ymax } => {
                write!(f, "South edge {} lies north of north edge {}", ymin, ymax)
            }
            RegionError::InvalidScale(scale) => {
                write!(f, "Reference scale must be positive, got {}", scale)
            }
        }
    }
}

impl std::error::Error for RegionError {}

/// An axis-aligned bounding box in WGS84 degrees.
///
/// Longitudes are not required to lie in `[-180, 180]`; see
/// [`normalize_central_meridian`](super::normalize_central_meridian).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Extent {
    /// Creates an extent from its four edges.
    pub const fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Width in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// Height in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Area in square degrees; zero or negative for degenerate extents.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Center point as (lat, lon).
    pub fn center(&self) -> (f64, f64) {
        (
            (self.ymin + self.ymax) / 2.0,
            (self.xmin + self.xmax) / 2.0,
        )
    }

    /// Smallest extent covering both.
    pub fn union(&self, other: &Extent) -> Extent {
        Extent::new(
            self.xmin.min(other.xmin),
            self.ymin.min(other.ymin),
            self.xmax.max(other.xmax),
            self.ymax.max(other.ymax),
        )
    }

    /// Parses `XMIN,YMIN,XMAX,YMAX`.
    pub fn parse_bbox(s: &str) -> Result<Self, RegionError> {
        let values: Vec<&str> = s.split(',').map(str::trim).collect();
        if values.len() != 4 {
            return Err(RegionError::InvalidBbox(s.to_string()));
        }

        let mut parsed = [0.0f64; 4];
        for (slot, raw) in parsed.iter_mut().zip(&values) {
            let value: f64 = raw
                .parse()
                .map_err(|_| RegionError::InvalidBbox(s.to_string()))?;
            if !value.is_finite() {
                return Err(RegionError::NotFinite(raw.to_string()));
            }
            *slot = value;
        }

        let [xmin, ymin, xmax, ymax] = parsed;
        if ymin > ymax {
            return Err(RegionError::InvertedLatitude { ymin, ymax });
        }

        Ok(Extent::new(xmin, ymin, xmax, ymax))
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.5}, {:.5}, {:.5}, {:.5}]",
            self.xmin, self.ymin, self.xmax, self.ymax
        )
    }
}

/// A geographic extent plus the reference scale it was viewed at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    extent: Extent,
    reference_scale: f64,
}

impl Region {
    /// Creates a region without validation.
    pub fn new(extent: Extent, reference_scale: f64) -> Self {
        Self {
            extent,
            reference_scale,
        }
    }

    /// Creates a region, rejecting non-positive scales.
    pub fn try_new(extent: Extent, reference_scale: f64) -> Result<Self, RegionError> {
        if !(reference_scale.is_finite() && reference_scale > 0.0) {
            return Err(RegionError::InvalidScale(reference_scale));
        }
        Ok(Self::new(extent, reference_scale))
    }

    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    pub fn reference_scale(&self) -> f64 {
        self.reference_scale
    }

    /// Returns a copy with the scale multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.extent, self.reference_scale * factor)
    }
}

/// A region whose parts all lie within `[-180, 180]` longitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRegion {
    parts: Vec<Extent>,
    reference_scale: f64,
}

impl NormalizedRegion {
    pub(super) fn from_parts(parts: Vec<Extent>, reference_scale: f64) -> Self {
        Self {
            parts,
            reference_scale,
        }
    }

    /// The non-overlapping extents making up this region (one or two).
    pub fn parts(&self) -> &[Extent] {
        &self.parts
    }

    pub fn reference_scale(&self) -> f64 {
        self.reference_scale
    }

    /// Whether normalization split the region at the antimeridian.
    pub fn crosses_antimeridian(&self) -> bool {
        self.parts.len() > 1
    }

    /// Bounding box of all parts.
    pub fn bounding_extent(&self) -> Extent {
        let mut parts = self.parts.iter();
        match parts.next() {
            Some(first) => parts.fold(*first, |acc, p| acc.union(p)),
            None => Extent::new(0.0, 0.0, 0.0, 0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bbox() {
        let extent = Extent::parse_bbox("-10.5, 40, 5, 50.25").unwrap();
        assert_eq!(extent, Extent::new(-10.5, 40.0, 5.0, 50.25));
    }

    #[test]
    fn test_parse_bbox_wrong_arity() {
        let err = Extent::parse_bbox("1,2,3").unwrap_err();
        assert!(matches!(err, RegionError::InvalidBbox(_)));
    }

    #[test]
    fn test_parse_bbox_inverted_latitude() {
        let err = Extent::parse_bbox("0,50,10,40").unwrap_err();
        assert!(matches!(err, RegionError::InvertedLatitude { .. }));
    }

    #[test]
    fn test_parse_bbox_rejects_nan() {
        let err = Extent::parse_bbox("NaN,0,1,1").unwrap_err();
        assert!(matches!(err, RegionError::NotFinite(_)));
    }

    #[test]
    fn test_region_try_new_rejects_zero_scale() {
        let err = Region::try_new(Extent::new(0.0, 0.0, 1.0, 1.0), 0.0).unwrap_err();
        assert_eq!(err, RegionError::InvalidScale(0.0));
    }

    #[test]
    fn test_region_scaled() {
        let region = Region::new(Extent::new(0.0, 0.0, 1.0, 1.0), 20_000.0);
        let scaled = region.scaled(0.1);
        assert!((scaled.reference_scale() - 2_000.0).abs() < 1e-9);
        assert_eq!(scaled.extent(), region.extent());
    }

    #[test]
    fn test_bounding_extent_of_split_region() {
        let region = NormalizedRegion::from_parts(
            vec![
                Extent::new(170.0, 0.0, 180.0, 10.0),
                Extent::new(-180.0, 0.0, -170.0, 10.0),
            ],
            1.0,
        );
        assert_eq!(
            region.bounding_extent(),
            Extent::new(-180.0, 0.0, 180.0, 10.0)
        );
    }
}
