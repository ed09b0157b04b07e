//! Export coordinator and job handle.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::ExportConfig;
use super::error::{ExportError, ExportStage};
use super::job::{ExportEvent, ExportJob, ExportReport, JobStatus};
use super::progress::ProgressTracker;
use crate::guard::{CacheGuard, CacheLease, CacheState};
use crate::package::{PackageError, TilePackage};
use crate::region::{normalize_central_meridian, Region};
use crate::store::{OfflineCacheStore, StagingArea};
use crate::tiling::{ExportDestination, ExportProgressCallback, ServiceError, TilingService};

/// Holds every progress value plus the terminal event, so sends never block.
const EVENT_CHANNEL_CAPACITY: usize = 128;

static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(1);

/// Starts export jobs that fill the offline cache store.
///
/// Each job runs in its own tokio task:
///
/// 1. Normalize the region and request default parameters from the tiling
///    service, down to `reference_scale × densification_factor`.
/// 2. Prepare the store (staging directory, or clear-first).
/// 3. Run the service export into the prepared directory.
/// 4. Re-open the package to validate it, then commit it into place.
///
/// A job holds the cache guard in [`CacheState::Exporting`] from the moment
/// it is started until just before its terminal event is sent.
pub struct ExportCoordinator {
    service: Arc<dyn TilingService>,
    store: OfflineCacheStore,
    guard: CacheGuard,
    config: ExportConfig,
}

impl ExportCoordinator {
    pub fn new(service: Arc<dyn TilingService>, store: OfflineCacheStore, guard: CacheGuard) -> Self {
        Self {
            service,
            store,
            guard,
            config: ExportConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ExportConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn store(&self) -> &OfflineCacheStore {
        &self.store
    }

    pub fn guard(&self) -> &CacheGuard {
        &self.guard
    }

    pub fn service(&self) -> &Arc<dyn TilingService> {
        &self.service
    }

    /// Starts exporting `region` into the offline cache.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Busy`] without starting anything if another
    /// export or an offline basemap load holds the cache. Every other failure
    /// is delivered through the returned handle.
    pub fn start_export(&self, region: &Region) -> Result<ExportHandle, ExportError> {
        let lease = self.guard.try_acquire(CacheState::Exporting)?;

        let id = NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed);
        let job = Arc::new(Mutex::new(ExportJob {
            id,
            status: JobStatus::Running,
            progress: 0,
        }));
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (result_tx, result_rx) = oneshot::channel();
        let cancellation = CancellationToken::new();

        info!(
            job = id,
            extent = %region.extent(),
            scale = region.reference_scale(),
            source = self.service.source(),
            "Starting export"
        );

        let task = ExportTask {
            id,
            region: region.clone(),
            service: Arc::clone(&self.service),
            store: self.store.clone(),
            config: self.config.clone(),
            job: Arc::clone(&job),
            events: events_tx.clone(),
            cancellation: cancellation.clone(),
            lease,
        };

        let terminal_job = Arc::clone(&job);
        tokio::spawn(async move {
            let result = task.run().await;

            let event = ExportEvent::terminal(&result);
            terminal_job.lock().status = event.status();
            match &result {
                Ok(report) => info!(
                    job = id,
                    tiles = report.tile_count,
                    bytes = report.payload_bytes,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "Export succeeded"
                ),
                Err(ExportError::Cancelled) => info!(job = id, "Export cancelled"),
                Err(e) => warn!(
                    job = id,
                    message = %e.message(),
                    detail = e.detail().as_deref().unwrap_or(""),
                    "Export failed"
                ),
            }

            if events_tx.try_send(event).is_err() {
                debug!(job = id, "Export event receiver dropped");
            }
            let _ = result_tx.send(result);
        });

        Ok(ExportHandle {
            job,
            events: events_rx,
            result: result_rx,
            cancellation,
        })
    }
}

/// Handle to a running export.
///
/// Progress and the terminal outcome arrive on the event stream; the full
/// result, including the error value, resolves once through
/// [`result`](Self::result).
pub struct ExportHandle {
    job: Arc<Mutex<ExportJob>>,
    events: mpsc::Receiver<ExportEvent>,
    result: oneshot::Receiver<Result<ExportReport, ExportError>>,
    cancellation: CancellationToken,
}

impl ExportHandle {
    pub fn id(&self) -> u64 {
        self.job.lock().id
    }

    /// Current job snapshot.
    pub fn job(&self) -> ExportJob {
        *self.job.lock()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv_event(&mut self) -> Result<ExportEvent, mpsc::error::TryRecvError> {
        self.events.try_recv()
    }

    /// Waits for the next event. Returns `None` after the terminal event has
    /// been received.
    pub async fn next_event(&mut self) -> Option<ExportEvent> {
        self.events.recv().await
    }

    /// Get mutable access to the event receiver.
    pub fn events_receiver(&mut self) -> &mut mpsc::Receiver<ExportEvent> {
        &mut self.events
    }

    /// Requests cancellation. The job ends with [`JobStatus::Cancelled`]
    /// unless it already finished.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Token that cancels this job, e.g. for a Ctrl+C handler.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Waits for the job to finish.
    pub async fn result(self) -> Result<ExportReport, ExportError> {
        self.result.await.unwrap_or(Err(ExportError::Aborted))
    }
}

struct ExportTask {
    id: u64,
    region: Region,
    service: Arc<dyn TilingService>,
    store: OfflineCacheStore,
    config: ExportConfig,
    job: Arc<Mutex<ExportJob>>,
    events: mpsc::Sender<ExportEvent>,
    cancellation: CancellationToken,
    lease: CacheLease,
}

impl ExportTask {
    async fn run(self) -> Result<ExportReport, ExportError> {
        let started = Instant::now();
        debug!(job = self.id, operation = %self.lease.operation(), "Export task running");

        let normalized = normalize_central_meridian(&self.region);
        let max_scale = self.region.reference_scale() * self.config.densification_factor;
        debug!(
            job = self.id,
            parts = normalized.parts().len(),
            crosses_antimeridian = normalized.crosses_antimeridian(),
            max_scale,
            "Requesting export parameters"
        );

        let parameters = self
            .stage(
                ExportStage::Parameters,
                self.config.parameters_timeout,
                self.service.default_export_parameters(&normalized, max_scale),
            )
            .await?;

        // Nothing on disk changes until parameters are known
        let staging = self.store.prepare_export(self.config.replace_policy)?;
        let destination = ExportDestination {
            package_path: staging.package_path(),
            resources_path: staging.resources_path(),
        };

        info!(
            job = self.id,
            min_level = parameters.min_level,
            max_level = parameters.max_level,
            estimated_tiles = parameters.estimated_tiles,
            dir = %staging.dir().display(),
            "Export job started"
        );

        let exported = self
            .stage(
                ExportStage::Export,
                self.config.export_timeout,
                self.service
                    .export(&parameters, &destination, self.progress_callback()),
            )
            .await;
        let artifacts = match exported {
            Ok(artifacts) => artifacts,
            Err(e) => return Err(abandon(staging, e)),
        };

        let package_path = destination.package_path.clone();
        let validated =
            tokio::task::spawn_blocking(move || TilePackage::open(&package_path).map(|p| p.summary().clone()))
                .await;
        let summary = match validated {
            Ok(Ok(summary)) => summary,
            Ok(Err(e)) => return Err(abandon(staging, e.into())),
            Err(_) => return Err(abandon(staging, ExportError::Aborted)),
        };
        if summary != artifacts.package {
            let mismatch = PackageError::corrupt(
                &destination.package_path,
                format!(
                    "expected {} tiles with digest {}, found {} with {}",
                    artifacts.package.tile_count,
                    artifacts.package.digest,
                    summary.tile_count,
                    summary.digest
                ),
            );
            return Err(abandon(staging, mismatch.into()));
        }

        if self.cancellation.is_cancelled() {
            return Err(abandon(staging, ExportError::Cancelled));
        }

        let handle = staging.commit()?;

        Ok(ExportReport {
            handle,
            tile_count: summary.tile_count,
            payload_bytes: summary.payload_bytes,
            digest: summary.digest,
            min_level: parameters.min_level,
            max_level: parameters.max_level,
            elapsed: started.elapsed(),
        })
    }

    /// Runs one service call under the stage's timeout and the job's
    /// cancellation token.
    async fn stage<T>(
        &self,
        stage: ExportStage,
        limit: Duration,
        call: impl Future<Output = Result<T, ServiceError>>,
    ) -> Result<T, ExportError> {
        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(ExportError::Cancelled),
            outcome = tokio::time::timeout(limit, call) => match outcome {
                Ok(result) => result.map_err(ExportError::Service),
                Err(_) => Err(ExportError::TimedOut { stage, after: limit }),
            },
        }
    }

    /// Publishes each forward step of service progress exactly once.
    fn progress_callback(&self) -> ExportProgressCallback {
        let id = self.id;
        let tracker = Mutex::new(ProgressTracker::new());
        let job = Arc::clone(&self.job);
        let events = self.events.clone();

        Box::new(move |raw| {
            // Held while sending so concurrent reports cannot reorder events
            let mut tracker = tracker.lock();
            if let Some(value) = tracker.update(raw) {
                job.lock().progress = value;
                debug!(job = id, progress = value, "Export progress");
                let _ = events.try_send(ExportEvent::Progress(value));
            }
        })
    }
}

/// Discards a staging area after a failed export and passes the error on.
fn abandon(staging: StagingArea, error: ExportError) -> ExportError {
    let dir = staging.dir().to_path_buf();
    if let Err(e) = staging.discard() {
        warn!(dir = %dir.display(), error = %e, "Failed to discard export artifacts");
    }
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::TileCoord;
    use crate::package::{PackageHeader, TilePackageWriter};
    use crate::region::{Extent, NormalizedRegion};
    use crate::store::ReplacePolicy;
    use crate::tiling::{BoxFuture, ExportArtifacts, ExportParameters};
    use std::fs;
    use tempfile::TempDir;

    /// Tiling service that writes a small package locally.
    #[derive(Default)]
    struct FakeService {
        tiles: u32,
        export_delay: Option<Duration>,
        parameters_delay: Option<Duration>,
        fail_export: Option<ServiceError>,
        misreport_summary: bool,
        requested_scale: Mutex<Option<f64>>,
    }

    impl FakeService {
        fn with_tiles(tiles: u32) -> Self {
            Self {
                tiles,
                ..Default::default()
            }
        }
    }

    impl TilingService for FakeService {
        fn source(&self) -> &str {
            "fake://tiles"
        }

        fn default_export_parameters<'a>(
            &'a self,
            region: &'a NormalizedRegion,
            max_scale: f64,
        ) -> BoxFuture<'a, Result<ExportParameters, ServiceError>> {
            Box::pin(async move {
                *self.requested_scale.lock() = Some(max_scale);
                if let Some(delay) = self.parameters_delay {
                    tokio::time::sleep(delay).await;
                }
                Ok(ExportParameters {
                    region: region.clone(),
                    min_level: 0,
                    max_level: 3,
                    estimated_tiles: self.tiles as u64,
                })
            })
        }

        fn export<'a>(
            &'a self,
            parameters: &'a ExportParameters,
            destination: &'a ExportDestination,
            on_progress: ExportProgressCallback,
        ) -> BoxFuture<'a, Result<ExportArtifacts, ServiceError>> {
            Box::pin(async move {
                let header = PackageHeader::new(self.source(), parameters.region.clone(), 0, 3);
                let mut writer = TilePackageWriter::create(&destination.package_path, header)
                    .map_err(|e| ServiceError::job("create", e.to_string()))?;

                on_progress(0);
                for i in 0..self.tiles {
                    if let Some(delay) = self.export_delay {
                        tokio::time::sleep(delay).await;
                    }
                    writer
                        .add_tile(TileCoord::new(3, i, i), format!("tile {}", i).as_bytes())
                        .map_err(|e| ServiceError::job("write", e.to_string()))?;
                    let pct = ((i + 1) * 100 / self.tiles.max(1)) as u8;
                    // Repeat and regress to exercise filtering
                    on_progress(pct);
                    on_progress(pct);
                    on_progress(pct.saturating_sub(10));
                }

                if let Some(e) = &self.fail_export {
                    return Err(e.clone());
                }

                let mut package = writer
                    .finish()
                    .map_err(|e| ServiceError::job("finish", e.to_string()))?;
                if self.misreport_summary {
                    package.tile_count += 1;
                }
                on_progress(100);
                Ok(ExportArtifacts {
                    package,
                    has_resources: false,
                })
            })
        }
    }

    fn region() -> Region {
        Region::new(Extent::new(-10.0, -10.0, 10.0, 10.0), 100_000.0)
    }

    fn populated_store(temp: &TempDir) -> OfflineCacheStore {
        let store = OfflineCacheStore::new(temp.path().join("offlinemap"));
        fs::create_dir_all(store.root()).unwrap();
        fs::write(store.root().join("sentinel"), b"x").unwrap();
        store
    }

    fn coordinator(service: FakeService, store: OfflineCacheStore) -> ExportCoordinator {
        ExportCoordinator::new(Arc::new(service), store, CacheGuard::new())
    }

    async fn drain(handle: &mut ExportHandle) -> Vec<ExportEvent> {
        let mut events = Vec::new();
        while let Some(event) = handle.next_event().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_successful_export_commits_package() {
        let temp = TempDir::new().unwrap();
        let store = populated_store(&temp);
        let coordinator = coordinator(FakeService::with_tiles(4), store.clone());

        let mut handle = coordinator.start_export(&region()).unwrap();
        let events = drain(&mut handle).await;
        let job = handle.job();
        let report = handle.result().await.unwrap();

        assert_eq!(report.tile_count, 4);
        assert_eq!(job.status, JobStatus::Succeeded);
        assert_eq!(job.progress, 100);

        let progress: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                ExportEvent::Progress(p) => Some(*p),
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![0, 25, 50, 75, 100]);
        assert!(matches!(events.last(), Some(ExportEvent::Succeeded(_))));
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);

        assert!(!store.root().join("sentinel").exists());
        let handle = store.load_if_present().unwrap();
        assert_eq!(TilePackage::open(handle.package_path()).unwrap().tile_count(), 4);
        assert_eq!(coordinator.guard().state(), CacheState::Idle);
    }

    #[tokio::test]
    async fn test_requested_scale_applies_densification() {
        let temp = TempDir::new().unwrap();
        let service = Arc::new(FakeService::with_tiles(1));
        let coordinator = ExportCoordinator::new(
            Arc::clone(&service) as Arc<dyn TilingService>,
            populated_store(&temp),
            CacheGuard::new(),
        );

        coordinator.start_export(&region()).unwrap().result().await.unwrap();

        let requested = (*service.requested_scale.lock()).unwrap();
        assert!((requested - 10_000.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_second_export_is_rejected_while_running() {
        let temp = TempDir::new().unwrap();
        let service = FakeService {
            tiles: 2,
            export_delay: Some(Duration::from_millis(50)),
            ..Default::default()
        };
        let coordinator = coordinator(service, populated_store(&temp));

        let handle = coordinator.start_export(&region()).unwrap();
        let second = coordinator.start_export(&region());
        assert!(matches!(second, Err(ExportError::Busy(CacheState::Exporting))));

        handle.result().await.unwrap();
        assert!(coordinator.start_export(&region()).is_ok());
    }

    #[tokio::test]
    async fn test_failed_staged_export_keeps_previous_cache() {
        let temp = TempDir::new().unwrap();
        let store = populated_store(&temp);
        let service = FakeService {
            tiles: 2,
            fail_export: Some(ServiceError::job("Export failed", "server error")),
            ..Default::default()
        };
        let coordinator = coordinator(service, store.clone());

        let mut handle = coordinator.start_export(&region()).unwrap();
        let events = drain(&mut handle).await;
        let err = handle.result().await.unwrap_err();

        assert_eq!(err.message(), "Export failed");
        assert_eq!(
            events.last(),
            Some(&ExportEvent::Failed {
                message: "Export failed".to_string(),
                detail: Some("server error".to_string()),
            })
        );
        assert!(store.root().join("sentinel").exists());
        assert!(!temp.path().join("offlinemap.staging").exists());
    }

    #[tokio::test]
    async fn test_failed_clear_first_export_leaves_store_empty() {
        let temp = TempDir::new().unwrap();
        let store = populated_store(&temp);
        let service = FakeService {
            tiles: 2,
            fail_export: Some(ServiceError::job("Export failed", "server error")),
            ..Default::default()
        };
        let coordinator = coordinator(service, store.clone())
            .with_config(ExportConfig::new().with_replace_policy(ReplacePolicy::ClearFirst));

        let err = coordinator.start_export(&region()).unwrap().result().await.unwrap_err();

        assert!(matches!(err, ExportError::Service(_)));
        assert!(!store.root().join("sentinel").exists());
        assert!(store.load_if_present().is_none());
    }

    #[tokio::test]
    async fn test_summary_mismatch_fails_validation() {
        let temp = TempDir::new().unwrap();
        let store = populated_store(&temp);
        let service = FakeService {
            tiles: 2,
            misreport_summary: true,
            ..Default::default()
        };
        let coordinator = coordinator(service, store.clone());

        let err = coordinator.start_export(&region()).unwrap().result().await.unwrap_err();

        assert!(matches!(err, ExportError::Package(PackageError::Corrupt { .. })));
        assert!(store.root().join("sentinel").exists());
    }

    #[tokio::test]
    async fn test_parameters_timeout() {
        let temp = TempDir::new().unwrap();
        let store = populated_store(&temp);
        let service = FakeService {
            tiles: 1,
            parameters_delay: Some(Duration::from_secs(5)),
            ..Default::default()
        };
        let coordinator = coordinator(service, store.clone()).with_config(
            ExportConfig::new().with_parameters_timeout(Duration::from_millis(20)),
        );

        let mut handle = coordinator.start_export(&region()).unwrap();
        let events = drain(&mut handle).await;
        let err = handle.result().await.unwrap_err();

        assert!(matches!(
            err,
            ExportError::TimedOut {
                stage: ExportStage::Parameters,
                ..
            }
        ));
        assert_eq!(events, vec![ExportEvent::TimedOut(ExportStage::Parameters)]);
        // The store was never touched
        assert!(store.root().join("sentinel").exists());
    }

    #[tokio::test]
    async fn test_cancel_during_export() {
        let temp = TempDir::new().unwrap();
        let store = populated_store(&temp);
        let service = FakeService {
            tiles: 100,
            export_delay: Some(Duration::from_millis(20)),
            ..Default::default()
        };
        let coordinator = coordinator(service, store.clone());

        let mut handle = coordinator.start_export(&region()).unwrap();
        // Wait for the job to start producing progress
        assert_eq!(handle.next_event().await, Some(ExportEvent::Progress(0)));
        handle.cancel();
        assert!(handle.is_cancelled());

        let events = drain(&mut handle).await;
        assert_eq!(events.last(), Some(&ExportEvent::Cancelled));
        assert_eq!(handle.job().status, JobStatus::Cancelled);
        assert!(matches!(handle.result().await, Err(ExportError::Cancelled)));

        assert!(store.root().join("sentinel").exists());
        assert!(!temp.path().join("offlinemap.staging").exists());
        assert_eq!(coordinator.guard().state(), CacheState::Idle);
    }

    #[tokio::test]
    async fn test_store_error_aborts_before_export() {
        let service = FakeService::with_tiles(1);
        let coordinator = ExportCoordinator::new(
            Arc::new(service),
            OfflineCacheStore::new("/"),
            CacheGuard::new(),
        );

        let err = coordinator.start_export(&region()).unwrap().result().await.unwrap_err();
        assert!(matches!(err, ExportError::Store(_)));
    }
}
