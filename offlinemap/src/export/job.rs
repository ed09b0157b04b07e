//! Export job state and events.

use std::fmt;
use std::time::Duration;

use super::error::{ExportError, ExportStage};
use crate::store::OfflineCacheHandle;

/// Lifecycle of an export job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Fetching parameters or writing tiles.
    Running,
    Succeeded,
    Failed,
    Cancelled,
    TimedOut,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
            JobStatus::TimedOut => "timed out",
        };
        f.write_str(name)
    }
}

/// Snapshot of one export job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportJob {
    /// Process-unique job id.
    pub id: u64,
    pub status: JobStatus,
    /// Last published progress in `[0, 100]`.
    pub progress: u8,
}

/// What a successful export produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    /// Handle to the committed cache.
    pub handle: OfflineCacheHandle,
    pub tile_count: u64,
    pub payload_bytes: u64,
    /// Hex SHA-256 recorded in the package.
    pub digest: String,
    pub min_level: u8,
    pub max_level: u8,
    pub elapsed: Duration,
}

/// Event delivered on an export's event stream.
///
/// Zero or more `Progress` events with strictly increasing values are
/// followed by exactly one terminal event.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportEvent {
    Progress(u8),
    Succeeded(ExportReport),
    Failed {
        message: String,
        detail: Option<String>,
    },
    Cancelled,
    TimedOut(ExportStage),
}

impl ExportEvent {
    /// Builds the terminal event for a job outcome.
    pub fn terminal(result: &Result<ExportReport, ExportError>) -> Self {
        match result {
            Ok(report) => ExportEvent::Succeeded(report.clone()),
            Err(ExportError::Cancelled) => ExportEvent::Cancelled,
            Err(ExportError::TimedOut { stage, .. }) => ExportEvent::TimedOut(*stage),
            Err(e) => ExportEvent::Failed {
                message: e.message(),
                detail: e.detail(),
            },
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExportEvent::Progress(_))
    }

    /// Job status this event leaves the job in.
    pub fn status(&self) -> JobStatus {
        match self {
            ExportEvent::Progress(_) => JobStatus::Running,
            ExportEvent::Succeeded(_) => JobStatus::Succeeded,
            ExportEvent::Failed { .. } => JobStatus::Failed,
            ExportEvent::Cancelled => JobStatus::Cancelled,
            ExportEvent::TimedOut(_) => JobStatus::TimedOut,
        }
    }
}
