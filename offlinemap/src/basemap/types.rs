//! Basemap types.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::coord::TileCoord;
use crate::guard::{CacheBusy, CacheState};
use crate::package::{PackageError, PackageHeader, TilePackage};
use crate::store::OfflineCacheHandle;

/// One layer of a live basemap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseLayer {
    /// Vector tiles that can be exported for offline use.
    VectorTiled { url: String },
    /// Raster tiles; never exported.
    Raster { url: String },
}

impl BaseLayer {
    pub fn url(&self) -> &str {
        match self {
            BaseLayer::VectorTiled { url } | BaseLayer::Raster { url } => url,
        }
    }

    pub fn is_vector_tiled(&self) -> bool {
        matches!(self, BaseLayer::VectorTiled { .. })
    }
}

/// The networked basemap shown while online.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveBasemap {
    name: String,
    layers: Vec<BaseLayer>,
}

impl LiveBasemap {
    pub fn new(name: impl Into<String>, layers: Vec<BaseLayer>) -> Self {
        Self {
            name: name.into(),
            layers,
        }
    }

    /// A basemap with one vector tile layer.
    pub fn vector(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(name, vec![BaseLayer::VectorTiled { url: url.into() }])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layers(&self) -> &[BaseLayer] {
        &self.layers
    }

    /// Vector-tiled layers in drawing order.
    pub fn vector_tiled_layers(&self) -> impl Iterator<Item = &BaseLayer> {
        self.layers.iter().filter(|l| l.is_vector_tiled())
    }
}

/// Tiles loaded from the offline package.
#[derive(Debug)]
pub struct VectorTileCache {
    package: TilePackage,
}

impl VectorTileCache {
    pub fn open(path: &Path) -> Result<Self, PackageError> {
        Ok(Self {
            package: TilePackage::open(path)?,
        })
    }

    pub fn header(&self) -> &PackageHeader {
        self.package.header()
    }

    pub fn tile_count(&self) -> u64 {
        self.package.tile_count()
    }

    pub fn tile(&self, coord: &TileCoord) -> Option<&[u8]> {
        self.package.tile(coord)
    }
}

/// Style resources exported next to the package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemResourceCache {
    path: PathBuf,
    style: Option<PathBuf>,
}

impl ItemResourceCache {
    pub fn open(path: &Path) -> Self {
        let style = path.join("styles").join("root.json");
        Self {
            path: path.to_path_buf(),
            style: style.is_file().then_some(style),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Style document, if one was exported.
    pub fn style_path(&self) -> Option<&Path> {
        self.style.as_deref()
    }
}

/// The base layer built from the offline cache.
#[derive(Debug)]
pub struct OfflineLayer {
    tiles: VectorTileCache,
    resources: Option<ItemResourceCache>,
}

impl OfflineLayer {
    /// Layer styled by exported resources.
    pub fn with_resources(tiles: VectorTileCache, resources: ItemResourceCache) -> Self {
        Self {
            tiles,
            resources: Some(resources),
        }
    }

    /// Layer using the package's own default style.
    pub fn without_resources(tiles: VectorTileCache) -> Self {
        Self {
            tiles,
            resources: None,
        }
    }

    pub fn tiles(&self) -> &VectorTileCache {
        &self.tiles
    }

    pub fn resources(&self) -> Option<&ItemResourceCache> {
        self.resources.as_ref()
    }
}

/// Everything built while offline mode is active. Dropping the session frees
/// the loaded tiles.
#[derive(Debug)]
pub struct OfflineSession {
    handle: OfflineCacheHandle,
    layer: OfflineLayer,
}

impl OfflineSession {
    pub(super) fn new(handle: OfflineCacheHandle, layer: OfflineLayer) -> Self {
        Self { handle, layer }
    }

    pub fn handle(&self) -> &OfflineCacheHandle {
        &self.handle
    }

    pub fn layer(&self) -> &OfflineLayer {
        &self.layer
    }

    pub fn has_resources(&self) -> bool {
        self.layer.resources.is_some()
    }
}

/// Which basemap the map shows.
#[derive(Debug, Default)]
pub enum MapMode {
    #[default]
    Online,
    /// Offline, with a session when a cache was present.
    Offline(Option<OfflineSession>),
}

/// Borrowed view of what the map is drawing.
#[derive(Debug, Clone, Copy)]
pub enum ActiveBasemap<'a> {
    Live(&'a LiveBasemap),
    Offline(&'a OfflineSession),
    /// Offline with no cache: no base imagery.
    Empty,
}

impl fmt::Display for ActiveBasemap<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActiveBasemap::Live(basemap) => write!(f, "live basemap '{}'", basemap.name()),
            ActiveBasemap::Offline(session) => write!(
                f,
                "offline basemap ({} tiles, {})",
                session.layer().tiles().tile_count(),
                if session.has_resources() {
                    "with resources"
                } else {
                    "default style"
                }
            ),
            ActiveBasemap::Empty => write!(f, "no basemap"),
        }
    }
}

/// Errors from switching basemaps.
#[derive(Debug)]
pub enum BasemapError {
    /// The cache is being exported into.
    Busy(CacheState),
    /// The offline package could not be loaded.
    Package(PackageError),
}

impl fmt::Display for BasemapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BasemapError::Busy(state) => write!(f, "offline cache is busy ({})", state),
            BasemapError::Package(e) => write!(f, "failed to load offline basemap: {}", e),
        }
    }
}

impl std::error::Error for BasemapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BasemapError::Package(e) => Some(e),
            BasemapError::Busy(_) => None,
        }
    }
}

impl From<CacheBusy> for BasemapError {
    fn from(busy: CacheBusy) -> Self {
        BasemapError::Busy(busy.held_by)
    }
}

impl From<PackageError> for BasemapError {
    fn from(e: PackageError) -> Self {
        BasemapError::Package(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_tiled_layers_filter() {
        let basemap = LiveBasemap::new(
            "streets",
            vec![
                BaseLayer::Raster {
                    url: "https://raster".to_string(),
                },
                BaseLayer::VectorTiled {
                    url: "https://vector/a".to_string(),
                },
                BaseLayer::VectorTiled {
                    url: "https://vector/b".to_string(),
                },
            ],
        );

        let urls: Vec<&str> = basemap.vector_tiled_layers().map(|l| l.url()).collect();
        assert_eq!(urls, vec!["https://vector/a", "https://vector/b"]);
    }

    #[test]
    fn test_item_resources_without_style() {
        let temp = tempfile::TempDir::new().unwrap();
        let resources = ItemResourceCache::open(temp.path());
        assert_eq!(resources.style_path(), None);
        assert_eq!(resources.path(), temp.path());
    }

    #[test]
    fn test_busy_error_display() {
        let err = BasemapError::from(CacheBusy {
            held_by: CacheState::Exporting,
        });
        assert_eq!(err.to_string(), "offline cache is busy (exporting)");
    }
}
