//! Geographic regions used to bound an export request.
//!
//! A [`Region`] is what the map view reports: its visible extent plus the
//! scale it is being displayed at. Views that have been panned across the
//! antimeridian report longitudes outside `[-180, 180]`, or an extent whose
//! west edge lies east of its east edge. Before such a region is handed to a
//! tiling service it must be normalized with [`normalize_central_meridian`],
//! which produces one or two well-formed parts that together cover the same
//! area.
//!
//! # Example
//!
//! ```
//! use offlinemap::region::{normalize_central_meridian, Extent, Region};
//!
//! // A view straddling the antimeridian near Fiji
//! let region = Region::new(Extent::new(170.0, -20.0, 190.0, -10.0), 50_000.0);
//! let normalized = normalize_central_meridian(&region);
//!
//! assert_eq!(normalized.parts().len(), 2);
//! assert!(normalized.bounding_extent().area() > 0.0);
//! ```

mod types;

pub use types::{Extent, NormalizedRegion, Region, RegionError};

/// Full longitude span of the world in degrees.
pub const WORLD_SPAN_DEG: f64 = 360.0;

/// Western limit of normalized longitude.
pub const MIN_LON: f64 = -180.0;

/// Eastern limit of normalized longitude.
pub const MAX_LON: f64 = 180.0;

/// Web Mercator latitude limit.
pub const MAX_LAT: f64 = 85.051_128_78;

/// Widths below this are treated as empty slivers and dropped.
const SLIVER_EPSILON_DEG: f64 = 1e-9;

/// Wraps a longitude into `[-180, 180)`.
#[inline]
pub fn wrap_longitude(lon: f64) -> f64 {
    let wrapped = (lon - MIN_LON).rem_euclid(WORLD_SPAN_DEG) + MIN_LON;
    // rem_euclid can round up to exactly 180 for tiny negative inputs
    if wrapped >= MAX_LON {
        MIN_LON
    } else {
        wrapped
    }
}

/// Normalizes a region so no part crosses the antimeridian.
///
/// The west edge is wrapped into `[-180, 180)`. If the region then extends
/// past 180°, it is split into an eastern part ending at 180° and a western
/// part starting at -180°. A region spanning 360° or more collapses to the
/// whole world. An extent with `xmin > xmax` is read as wrapping eastward
/// through the antimeridian, which is how views report a crossing once their
/// coordinates have already been wrapped.
///
/// Latitudes are clamped to the Web Mercator limits. The reference scale is
/// carried through unchanged.
pub fn normalize_central_meridian(region: &Region) -> NormalizedRegion {
    let extent = region.extent();
    let ymin = extent.ymin.clamp(-MAX_LAT, MAX_LAT);
    let ymax = extent.ymax.clamp(-MAX_LAT, MAX_LAT);

    let mut span = extent.xmax - extent.xmin;
    if span < 0.0 {
        span += WORLD_SPAN_DEG;
    }

    if span >= WORLD_SPAN_DEG {
        let world = Extent::new(MIN_LON, ymin, MAX_LON, ymax);
        return NormalizedRegion::from_parts(vec![world], region.reference_scale());
    }

    let west = wrap_longitude(extent.xmin);
    let east = west + span;

    let parts = if east <= MAX_LON {
        vec![Extent::new(west, ymin, east, ymax)]
    } else {
        let overflow = east - WORLD_SPAN_DEG;
        let mut parts = Vec::with_capacity(2);
        if MAX_LON - west > SLIVER_EPSILON_DEG {
            parts.push(Extent::new(west, ymin, MAX_LON, ymax));
        }
        if overflow - MIN_LON > SLIVER_EPSILON_DEG {
            parts.push(Extent::new(MIN_LON, ymin, overflow, ymax));
        }
        parts
    };

    NormalizedRegion::from_parts(parts, region.reference_scale())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_wrap_longitude() {
        assert_eq!(wrap_longitude(0.0), 0.0);
        assert_eq!(wrap_longitude(190.0), -170.0);
        assert_eq!(wrap_longitude(-190.0), 170.0);
        assert_eq!(wrap_longitude(180.0), -180.0);
        assert_eq!(wrap_longitude(540.0), -180.0);
    }

    #[test]
    fn test_region_inside_world_is_unchanged() {
        let region = Region::new(Extent::new(-10.0, 40.0, 5.0, 50.0), 100_000.0);
        let normalized = normalize_central_meridian(&region);

        assert_eq!(normalized.parts(), &[Extent::new(-10.0, 40.0, 5.0, 50.0)]);
        assert_eq!(normalized.reference_scale(), 100_000.0);
        assert!(!normalized.crosses_antimeridian());
    }

    #[test]
    fn test_region_past_180_is_split() {
        let region = Region::new(Extent::new(170.0, -20.0, 190.0, -10.0), 50_000.0);
        let normalized = normalize_central_meridian(&region);

        assert!(normalized.crosses_antimeridian());
        assert_eq!(
            normalized.parts(),
            &[
                Extent::new(170.0, -20.0, 180.0, -10.0),
                Extent::new(-180.0, -20.0, -170.0, -10.0),
            ]
        );
    }

    #[test]
    fn test_region_shifted_a_whole_world_east() {
        // View panned one full revolution east of the dateline
        let region = Region::new(Extent::new(350.0, 0.0, 370.0, 10.0), 1.0);
        let normalized = normalize_central_meridian(&region);

        assert_eq!(normalized.parts(), &[Extent::new(-10.0, 0.0, 10.0, 10.0)]);
    }

    #[test]
    fn test_inverted_extent_is_read_as_crossing() {
        let region = Region::new(Extent::new(175.0, 0.0, -175.0, 5.0), 1.0);
        let normalized = normalize_central_meridian(&region);

        assert_eq!(normalized.parts().len(), 2);
        assert_eq!(normalized.parts()[0], Extent::new(175.0, 0.0, 180.0, 5.0));
        assert_eq!(normalized.parts()[1], Extent::new(-180.0, 0.0, -175.0, 5.0));
    }

    #[test]
    fn test_whole_world_span() {
        let region = Region::new(Extent::new(-200.0, -10.0, 200.0, 10.0), 1.0);
        let normalized = normalize_central_meridian(&region);

        assert_eq!(
            normalized.parts(),
            &[Extent::new(-180.0, -10.0, 180.0, 10.0)]
        );
    }

    #[test]
    fn test_latitude_is_clamped() {
        let region = Region::new(Extent::new(0.0, -89.0, 10.0, 89.0), 1.0);
        let normalized = normalize_central_meridian(&region);
        let bbox = normalized.bounding_extent();

        assert_eq!(bbox.ymin, -MAX_LAT);
        assert_eq!(bbox.ymax, MAX_LAT);
    }

    #[test]
    fn test_edge_exactly_on_antimeridian_is_not_split() {
        let region = Region::new(Extent::new(170.0, 0.0, 180.0, 10.0), 1.0);
        let normalized = normalize_central_meridian(&region);

        assert_eq!(normalized.parts().len(), 1);
        assert!(!normalized.crosses_antimeridian());
    }

    proptest! {
        #[test]
        fn prop_crossing_regions_have_positive_area(
            west in -540.0f64..540.0,
            width in 0.001f64..359.0,
            south in -80.0f64..79.0,
            height in 0.001f64..1.0,
        ) {
            let region = Region::new(
                Extent::new(west, south, west + width, south + height),
                10_000.0,
            );
            let normalized = normalize_central_meridian(&region);

            prop_assert!(normalized.bounding_extent().area() > 0.0);
            for part in normalized.parts() {
                prop_assert!(part.width() > 0.0);
                prop_assert!(part.xmin >= MIN_LON && part.xmax <= MAX_LON);
            }

            // Total covered width is preserved across the split
            let covered: f64 = normalized.parts().iter().map(|p| p.width()).sum();
            prop_assert!((covered - width).abs() < 1e-6);
        }
    }
}
