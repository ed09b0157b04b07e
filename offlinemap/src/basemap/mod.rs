//! Basemap switching between the live service and the offline cache.

mod switcher;
mod types;

pub use switcher::BasemapSwitcher;
pub use types::{
    ActiveBasemap, BaseLayer, BasemapError, ItemResourceCache, LiveBasemap, MapMode,
    OfflineLayer, OfflineSession, VectorTileCache,
};
