//! Vector tile export over HTTP.
//!
//! Talks to a vector tile server exposing a JSON description at
//! `{url}?f=json`, tiles at a template such as `tile/{z}/{y}/{x}.pbf`, and an
//! optional default style under `resources/styles/root.json`.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::http::{AsyncHttpClient, AsyncReqwestClient, DEFAULT_HTTP_TIMEOUT};
use super::types::{
    BoxFuture, ExportArtifacts, ExportDestination, ExportParameters, ExportProgressCallback,
    ServiceError, TilingService, TilingServiceFactory,
};
use crate::coord::{level_for_scale, tiles_for_extent, TileCoord, TileRange, MAX_ZOOM, MIN_ZOOM};
use crate::package::{PackageHeader, TilePackageWriter};
use crate::region::NormalizedRegion;

/// Default number of concurrent tile requests.
pub const DEFAULT_PARALLEL_REQUESTS: usize = 8;

/// Default cap on tiles per export when the service advertises no limit.
pub const DEFAULT_MAX_EXPORT_TILES: u64 = 100_000;

/// Tile template used when the service does not advertise one.
const DEFAULT_TILE_TEMPLATE: &str = "tile/{z}/{y}/{x}.pbf";

/// Name of the style document inside the resource bundle.
const STYLE_FILE_NAME: &str = "root.json";

/// Share of the progress bar spent on tiles; the rest covers resources.
const TILE_PROGRESS_SHARE: u64 = 95;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceInfo {
    #[serde(default)]
    tiles: Vec<String>,
    #[serde(default)]
    tile_info: Option<TileInfo>,
    #[serde(default)]
    default_styles: Option<String>,
    #[serde(default = "default_export_allowed")]
    export_tiles_allowed: bool,
    #[serde(default)]
    max_export_tiles_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TileInfo {
    #[serde(default)]
    lods: Vec<Lod>,
}

#[derive(Debug, Deserialize)]
struct Lod {
    level: u8,
}

fn default_export_allowed() -> bool {
    true
}

impl ServiceInfo {
    /// Deepest level the service publishes.
    fn max_level(&self) -> u8 {
        self.tile_info
            .as_ref()
            .and_then(|info| info.lods.iter().map(|lod| lod.level).max())
            .unwrap_or(MAX_ZOOM)
            .min(MAX_ZOOM)
    }

    fn tile_template(&self) -> &str {
        self.tiles
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_TILE_TEMPLATE)
    }
}

/// Tiling service backed by a vector tile server.
pub struct HttpTilingService<C: AsyncHttpClient = AsyncReqwestClient> {
    client: C,
    url: String,
    parallel: usize,
    max_level: Option<u8>,
    max_tiles: u64,
}

impl HttpTilingService<AsyncReqwestClient> {
    /// Creates a service for `url` using a reqwest client.
    pub fn new(url: impl Into<String>) -> Result<Self, ServiceError> {
        Ok(Self::with_client(url, AsyncReqwestClient::new()?))
    }
}

impl<C: AsyncHttpClient> HttpTilingService<C> {
    /// Creates a service for `url` using the given HTTP client.
    pub fn with_client(url: impl Into<String>, client: C) -> Self {
        let url = url.into().trim_end_matches('/').to_string();
        Self {
            client,
            url,
            parallel: DEFAULT_PARALLEL_REQUESTS,
            max_level: None,
            max_tiles: DEFAULT_MAX_EXPORT_TILES,
        }
    }

    /// Sets how many tiles are fetched concurrently.
    pub fn with_parallel_requests(mut self, parallel: usize) -> Self {
        self.parallel = parallel.max(1);
        self
    }

    /// Caps the deepest exported level regardless of scale.
    pub fn with_max_level(mut self, level: Option<u8>) -> Self {
        self.max_level = level;
        self
    }

    /// Caps how many tiles one export may request. A service limit below
    /// this one still applies.
    pub fn with_max_tiles(mut self, max_tiles: u64) -> Self {
        self.max_tiles = max_tiles.max(1);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_info(&self) -> Result<ServiceInfo, ServiceError> {
        let url = format!("{}?f=json", self.url);
        let body = self.client.get(&url).await?;
        serde_json::from_slice(&body).map_err(|e| ServiceError::InvalidResponse {
            url,
            reason: e.to_string(),
        })
    }

    fn tile_url(&self, template: &str, coord: &TileCoord) -> String {
        let path = template
            .replace("{z}", &coord.zoom.to_string())
            .replace("{y}", &coord.row.to_string())
            .replace("{x}", &coord.col.to_string());
        if path.starts_with("http://") || path.starts_with("https://") {
            path
        } else {
            format!("{}/{}", self.url, path.trim_start_matches('/'))
        }
    }

    async fn suggest_parameters(
        &self,
        region: &NormalizedRegion,
        max_scale: f64,
    ) -> Result<ExportParameters, ServiceError> {
        let info = self.fetch_info().await?;
        if !info.export_tiles_allowed {
            return Err(ServiceError::Unsupported(
                "Tile export is not allowed by this service".to_string(),
            ));
        }

        let mut max_level = level_for_scale(max_scale, info.max_level());
        if let Some(cap) = self.max_level {
            max_level = max_level.min(cap);
        }

        let limit = info
            .max_export_tiles_count
            .map_or(self.max_tiles, |advertised| advertised.min(self.max_tiles));
        let mut estimated_tiles = estimate_tiles(region, MIN_ZOOM, max_level)?;
        while estimated_tiles > limit && max_level > MIN_ZOOM {
            max_level -= 1;
            estimated_tiles = estimate_tiles(region, MIN_ZOOM, max_level)?;
        }
        if estimated_tiles > limit {
            return Err(ServiceError::Unsupported(format!(
                "Export needs {} tiles, more than the limit of {}",
                estimated_tiles, limit
            )));
        }

        debug!(
            max_scale,
            max_level,
            estimated_tiles,
            parts = region.parts().len(),
            "Suggested export parameters"
        );

        Ok(ExportParameters {
            region: region.clone(),
            min_level: MIN_ZOOM,
            max_level,
            estimated_tiles,
        })
    }

    async fn run_export(
        &self,
        parameters: &ExportParameters,
        destination: &ExportDestination,
        on_progress: ExportProgressCallback,
    ) -> Result<ExportArtifacts, ServiceError> {
        let info = self.fetch_info().await?;
        let template = info.tile_template().to_string();
        let estimated = estimate_tiles(&parameters.region, parameters.min_level, parameters.max_level)?;
        if estimated > self.max_tiles {
            return Err(ServiceError::Unsupported(format!(
                "Export needs up to {} tiles, more than the limit of {}",
                estimated, self.max_tiles
            )));
        }
        let levels = level_ranges(&parameters.region, parameters.min_level, parameters.max_level)?;
        let total = walk_tiles(&levels).count() as u64;

        info!(
            source = %self.url,
            tiles = total,
            min_level = parameters.min_level,
            max_level = parameters.max_level,
            "Exporting vector tiles"
        );
        on_progress(0);

        let header = PackageHeader::new(
            self.url.clone(),
            parameters.region.clone(),
            parameters.min_level,
            parameters.max_level,
        );
        let mut writer = TilePackageWriter::create(&destination.package_path, header)
            .map_err(|e| ServiceError::job("Failed to create tile package", e.to_string()))?;

        let mut fetches = stream::iter(walk_tiles(&levels))
            .map(|coord| {
                let url = self.tile_url(&template, &coord);
                async move { (coord, self.client.get(&url).await) }
            })
            .buffer_unordered(self.parallel);

        let mut done = 0u64;
        let mut skipped = 0u64;
        while let Some((coord, result)) = fetches.next().await {
            match result {
                Ok(data) => writer
                    .add_tile(coord, &data)
                    .map_err(|e| ServiceError::job("Failed to write tile package", e.to_string()))?,
                // Empty tiles are simply absent on the server
                Err(ServiceError::NotFound(_)) => skipped += 1,
                Err(e) => return Err(e),
            }
            done += 1;
            on_progress((done * TILE_PROGRESS_SHARE / total.max(1)) as u8);
        }

        let has_resources = match info.default_styles.as_deref() {
            Some(styles) => self.fetch_style(styles, &destination.resources_path).await?,
            None => false,
        };

        let package = writer
            .finish()
            .map_err(|e| ServiceError::job("Failed to finish tile package", e.to_string()))?;
        on_progress(100);

        info!(
            tiles = package.tile_count,
            skipped,
            bytes = package.payload_bytes,
            has_resources,
            "Vector tile export complete"
        );
        Ok(ExportArtifacts {
            package,
            has_resources,
        })
    }

    /// Downloads the default style into `resources/styles/root.json`.
    ///
    /// Returns `false` when the service has no style document.
    async fn fetch_style(&self, styles: &str, resources: &Path) -> Result<bool, ServiceError> {
        let url = format!(
            "{}/{}/{}",
            self.url,
            styles.trim_matches('/'),
            STYLE_FILE_NAME
        );
        let body = match self.client.get(&url).await {
            Ok(body) => body,
            Err(ServiceError::NotFound(_)) => {
                warn!(url = %url, "Service advertises a style but has none");
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        let dir = resources.join("styles");
        fs::create_dir_all(&dir)
            .and_then(|()| fs::write(dir.join(STYLE_FILE_NAME), &body))
            .map_err(|e| ServiceError::job("Failed to write item resources", e.to_string()))?;

        debug!(path = %dir.display(), bytes = body.len(), "Wrote style resources");
        Ok(true)
    }
}

impl<C: AsyncHttpClient> TilingService for HttpTilingService<C> {
    fn source(&self) -> &str {
        &self.url
    }

    fn default_export_parameters<'a>(
        &'a self,
        region: &'a NormalizedRegion,
        max_scale: f64,
    ) -> BoxFuture<'a, Result<ExportParameters, ServiceError>> {
        Box::pin(self.suggest_parameters(region, max_scale))
    }

    fn export<'a>(
        &'a self,
        parameters: &'a ExportParameters,
        destination: &'a ExportDestination,
        on_progress: ExportProgressCallback,
    ) -> BoxFuture<'a, Result<ExportArtifacts, ServiceError>> {
        Box::pin(self.run_export(parameters, destination, on_progress))
    }
}

/// Builds [`HttpTilingService`]s sharing one HTTP configuration.
#[derive(Debug, Clone)]
pub struct HttpTilingServiceFactory {
    timeout: Duration,
    parallel: usize,
    max_level: Option<u8>,
    max_tiles: u64,
}

impl Default for HttpTilingServiceFactory {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_HTTP_TIMEOUT,
            parallel: DEFAULT_PARALLEL_REQUESTS,
            max_level: None,
            max_tiles: DEFAULT_MAX_EXPORT_TILES,
        }
    }
}

impl HttpTilingServiceFactory {
    pub fn new(timeout: Duration, parallel: usize, max_level: Option<u8>) -> Self {
        Self {
            timeout,
            parallel,
            max_level,
            max_tiles: DEFAULT_MAX_EXPORT_TILES,
        }
    }

    pub fn with_max_tiles(mut self, max_tiles: u64) -> Self {
        self.max_tiles = max_tiles;
        self
    }
}

impl TilingServiceFactory for HttpTilingServiceFactory {
    fn service_for(&self, url: &str) -> Result<Arc<dyn TilingService>, ServiceError> {
        let client = AsyncReqwestClient::with_timeout(self.timeout)?;
        let service = HttpTilingService::with_client(url, client)
            .with_parallel_requests(self.parallel)
            .with_max_level(self.max_level)
            .with_max_tiles(self.max_tiles);
        Ok(Arc::new(service))
    }
}

/// Upper bound on tiles for the levels, counting shared low-level tiles once
/// per region part.
fn estimate_tiles(region: &NormalizedRegion, min_level: u8, max_level: u8) -> Result<u64, ServiceError> {
    let levels = level_ranges(region, min_level, max_level)?;
    Ok(levels.iter().flatten().map(TileRange::len).sum())
}

/// Tile ranges per level, one per region part.
fn level_ranges(
    region: &NormalizedRegion,
    min_level: u8,
    max_level: u8,
) -> Result<Vec<Vec<TileRange>>, ServiceError> {
    (min_level..=max_level)
        .map(|level| {
            region
                .parts()
                .iter()
                .map(|part| tiles_for_extent(part, level).map_err(invalid_region))
                .collect()
        })
        .collect()
}

/// Every tile in `levels`, each once, generated on demand. A tile shared by
/// two parts of the same level is yielded for the first part only.
fn walk_tiles(levels: &[Vec<TileRange>]) -> impl Iterator<Item = TileCoord> + '_ {
    levels.iter().flat_map(|ranges| {
        ranges.iter().enumerate().flat_map(move |(i, range)| {
            let earlier = &ranges[..i];
            range
                .iter()
                .filter(move |coord| !earlier.iter().any(|r| r.contains(coord)))
        })
    })
}

fn invalid_region(e: crate::coord::CoordError) -> ServiceError {
    ServiceError::job("Export region is invalid", e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::scale_for_level;
    use crate::package::TilePackage;
    use crate::region::{normalize_central_meridian, Extent, Region};
    use crate::tiling::http::tests::MockAsyncHttpClient;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const URL: &str = "https://tiles.example.com/VectorTileServer";

    fn info_json(max_level: u8, styles: bool) -> String {
        let lods: Vec<String> = (0..=max_level)
            .map(|l| format!(r#"{{"level":{},"scale":{}}}"#, l, scale_for_level(l)))
            .collect();
        let styles = if styles {
            r#","defaultStyles":"resources/styles""#
        } else {
            ""
        };
        format!(
            r#"{{"tiles":["tile/{{z}}/{{y}}/{{x}}.pbf"],"tileInfo":{{"lods":[{}]}}{}}}"#,
            lods.join(","),
            styles
        )
    }

    fn world() -> NormalizedRegion {
        normalize_central_meridian(&Region::new(
            Extent::new(-180.0, -85.0, 180.0, 85.0),
            scale_for_level(2),
        ))
    }

    fn mock_with_tiles(max_level: u8, styles: bool) -> MockAsyncHttpClient {
        let mut mock = MockAsyncHttpClient::default().with(
            &format!("{}?f=json", URL),
            info_json(max_level, styles),
        );
        for z in 0..=max_level {
            let n = 1u32 << z;
            for y in 0..n {
                for x in 0..n {
                    mock = mock.with(
                        &format!("{}/tile/{}/{}/{}.pbf", URL, z, y, x),
                        format!("tile {}/{}/{}", z, y, x),
                    );
                }
            }
        }
        mock
    }

    fn destination(temp: &TempDir) -> ExportDestination {
        ExportDestination {
            package_path: temp.path().join("vectorTiles.vtpk"),
            resources_path: temp.path().join("itemResources"),
        }
    }

    #[tokio::test]
    async fn test_parameters_follow_requested_scale() {
        let service = HttpTilingService::with_client(URL, mock_with_tiles(4, false));

        let params = service
            .default_export_parameters(&world(), scale_for_level(2))
            .await
            .unwrap();

        assert_eq!(params.min_level, 0);
        assert_eq!(params.max_level, 2);
        assert_eq!(params.estimated_tiles, 1 + 4 + 16);
    }

    #[tokio::test]
    async fn test_parameters_capped_by_service_and_config() {
        let service = HttpTilingService::with_client(URL, mock_with_tiles(1, false));
        let params = service
            .default_export_parameters(&world(), scale_for_level(6))
            .await
            .unwrap();
        assert_eq!(params.max_level, 1);

        let service =
            HttpTilingService::with_client(URL, mock_with_tiles(4, false)).with_max_level(Some(0));
        let params = service
            .default_export_parameters(&world(), scale_for_level(4))
            .await
            .unwrap();
        assert_eq!(params.max_level, 0);
    }

    #[tokio::test]
    async fn test_parameters_respect_export_limit() {
        let mock = MockAsyncHttpClient::default().with(
            &format!("{}?f=json", URL),
            r#"{"tileInfo":{"lods":[{"level":0},{"level":1},{"level":2}]},"maxExportTilesCount":5}"#,
        );
        let service = HttpTilingService::with_client(URL, mock);

        let params = service
            .default_export_parameters(&world(), scale_for_level(2))
            .await
            .unwrap();

        assert_eq!(params.max_level, 1);
        assert_eq!(params.estimated_tiles, 5);
    }

    #[tokio::test]
    async fn test_default_tile_limit_applies_without_advertised_limit() {
        let mock = MockAsyncHttpClient::default()
            .with(&format!("{}?f=json", URL), info_json(16, false));
        let service = HttpTilingService::with_client(URL, mock);

        let params = service
            .default_export_parameters(&world(), scale_for_level(15))
            .await
            .unwrap();

        assert!(params.estimated_tiles <= DEFAULT_MAX_EXPORT_TILES);
        // 1 + 4 + ... + 4^8 = 87381 fits, adding level 9 does not
        assert_eq!(params.max_level, 8);
        assert_eq!(params.estimated_tiles, 87_381);
    }

    #[tokio::test]
    async fn test_configured_tile_limit_is_stricter_than_service() {
        let mock = MockAsyncHttpClient::default().with(
            &format!("{}?f=json", URL),
            r#"{"tileInfo":{"lods":[{"level":0},{"level":1},{"level":2}]},"maxExportTilesCount":100}"#,
        );
        let service = HttpTilingService::with_client(URL, mock).with_max_tiles(5);

        let params = service
            .default_export_parameters(&world(), scale_for_level(2))
            .await
            .unwrap();

        assert_eq!(params.max_level, 1);
        assert_eq!(params.estimated_tiles, 5);
    }

    #[tokio::test]
    async fn test_region_too_large_for_limit_is_refused() {
        let service =
            HttpTilingService::with_client(URL, mock_with_tiles(2, false)).with_max_tiles(1);
        // Crossing the antimeridian gives two parts, each needing the level 0 tile
        let region = normalize_central_meridian(&Region::new(
            Extent::new(170.0, -10.0, 190.0, 10.0),
            scale_for_level(0),
        ));

        let err = service
            .default_export_parameters(&region, scale_for_level(0))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unsupported(_)));
    }

    #[tokio::test]
    async fn test_export_refuses_parameters_over_limit() {
        let temp = TempDir::new().unwrap();
        let service =
            HttpTilingService::with_client(URL, mock_with_tiles(2, false)).with_max_tiles(4);
        let params = ExportParameters {
            region: world(),
            min_level: 0,
            max_level: 2,
            estimated_tiles: 0,
        };

        let err = service
            .export(&params, &destination(&temp), Box::new(|_| {}))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Unsupported(_)));
        assert!(!temp.path().join("vectorTiles.vtpk").exists());
    }

    #[tokio::test]
    async fn test_export_disallowed() {
        let mock = MockAsyncHttpClient::default().with(
            &format!("{}?f=json", URL),
            r#"{"exportTilesAllowed":false}"#,
        );
        let service = HttpTilingService::with_client(URL, mock);

        let err = service
            .default_export_parameters(&world(), scale_for_level(2))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unsupported(_)));
    }

    #[tokio::test]
    async fn test_invalid_service_description() {
        let mock = MockAsyncHttpClient::default().with(&format!("{}?f=json", URL), "<html>");
        let service = HttpTilingService::with_client(URL, mock);

        let err = service
            .default_export_parameters(&world(), scale_for_level(2))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn test_export_writes_package_and_style() {
        let temp = TempDir::new().unwrap();
        let mock = mock_with_tiles(2, true).with(
            &format!("{}/resources/styles/root.json", URL),
            r#"{"version":8}"#,
        );
        let service = HttpTilingService::with_client(URL, mock).with_parallel_requests(3);
        let params = service
            .default_export_parameters(&world(), scale_for_level(2))
            .await
            .unwrap();
        let dest = destination(&temp);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let artifacts = service
            .export(&params, &dest, Box::new(move |p| sink.lock().unwrap().push(p)))
            .await
            .unwrap();

        assert_eq!(artifacts.package.tile_count, 21);
        assert!(artifacts.has_resources);
        assert_eq!(
            fs::read_to_string(dest.resources_path.join("styles/root.json")).unwrap(),
            r#"{"version":8}"#
        );

        let package = TilePackage::open(&dest.package_path).unwrap();
        assert_eq!(package.tile_count(), 21);
        assert_eq!(package.header().source, URL);
        assert_eq!(
            package.tile(&TileCoord::new(2, 3, 1)),
            Some("tile 2/3/1".as_bytes())
        );

        let seen = seen.lock().unwrap();
        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn test_missing_tiles_are_skipped() {
        let temp = TempDir::new().unwrap();
        // Only level 0 tile exists on the server
        let mock = MockAsyncHttpClient::default()
            .with(&format!("{}?f=json", URL), info_json(1, false))
            .with(&format!("{}/tile/0/0/0.pbf", URL), "root");
        let service = HttpTilingService::with_client(URL, mock);
        let params = service
            .default_export_parameters(&world(), scale_for_level(1))
            .await
            .unwrap();

        let artifacts = service
            .export(&params, &destination(&temp), Box::new(|_| {}))
            .await
            .unwrap();

        assert_eq!(artifacts.package.tile_count, 1);
        assert!(!artifacts.has_resources);
        assert!(!temp.path().join("itemResources").exists());
    }

    #[tokio::test]
    async fn test_tile_failure_fails_export() {
        let temp = TempDir::new().unwrap();
        let mock = mock_with_tiles(1, false).with_error(
            &format!("{}/tile/1/0/1.pbf", URL),
            ServiceError::Http {
                url: "tile".to_string(),
                reason: "HTTP 500".to_string(),
            },
        );
        let service = HttpTilingService::with_client(URL, mock);
        let params = service
            .default_export_parameters(&world(), scale_for_level(1))
            .await
            .unwrap();

        let err = service
            .export(&params, &destination(&temp), Box::new(|_| {}))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Http { .. }));
        assert!(TilePackage::open(&temp.path().join("vectorTiles.vtpk")).is_err());
    }

    #[test]
    fn test_tile_url_templates() {
        let service = HttpTilingService::with_client(
            format!("{}/", URL),
            MockAsyncHttpClient::default(),
        );
        let coord = TileCoord::new(3, 5, 7);

        assert_eq!(
            service.tile_url(DEFAULT_TILE_TEMPLATE, &coord),
            format!("{}/tile/3/5/7.pbf", URL)
        );
        assert_eq!(
            service.tile_url("https://cdn.example.com/{z}/{x}/{y}.pbf", &coord),
            "https://cdn.example.com/3/7/5.pbf"
        );
    }

    #[test]
    fn test_antimeridian_region_tiles_counted_once() {
        let region = normalize_central_meridian(&Region::new(
            Extent::new(170.0, -10.0, 190.0, 10.0),
            scale_for_level(1),
        ));
        let params = ExportParameters {
            region,
            min_level: 0,
            max_level: 1,
            estimated_tiles: 0,
        };

        let levels = level_ranges(&params.region, params.min_level, params.max_level).unwrap();
        let coords: Vec<TileCoord> = walk_tiles(&levels).collect();
        // Level 0: one tile shared by both parts. Level 1: both columns, both rows.
        assert_eq!(coords.len(), 1 + 4);
        let unique: std::collections::BTreeSet<_> = coords.iter().copied().collect();
        assert_eq!(unique.len(), coords.len());
    }
}
