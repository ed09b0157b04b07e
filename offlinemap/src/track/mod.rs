//! Live location tracking.
//!
//! [`TrackRecorder`] appends location samples to an in-memory [`TrackPath`]
//! while tracking is enabled and redraws the full [`Polyline`] on the view
//! after every accepted sample.

mod path;
mod recorder;

pub use crate::view::AutoPanMode;
pub use path::{Polyline, Position, TrackPath};
pub use recorder::TrackRecorder;
