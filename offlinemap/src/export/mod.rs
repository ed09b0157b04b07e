//! Export coordination.
//!
//! [`ExportCoordinator::start_export`] turns a [`Region`](crate::region::Region)
//! into an offline cache: it asks the tiling service for parameters, prepares
//! the store, runs the export and commits the validated package. The caller
//! gets an [`ExportHandle`] carrying a stream of [`ExportEvent`]s and a
//! resolve-once result.
//!
//! # Event ordering
//!
//! ```text
//! Progress(0) → Progress(p1) → … → Progress(pn) → Succeeded | Failed | Cancelled | TimedOut
//! ```
//!
//! Progress values strictly increase and stay within `[0, 100]`. Exactly one
//! terminal event is sent, always last.

mod config;
mod coordinator;
mod error;
mod job;
mod progress;

pub use config::{
    ExportConfig, DEFAULT_DENSIFICATION_FACTOR, DEFAULT_EXPORT_TIMEOUT, DEFAULT_PARAMETERS_TIMEOUT,
};
pub use coordinator::{ExportCoordinator, ExportHandle};
pub use error::{ExportError, ExportStage};
pub use job::{ExportEvent, ExportJob, ExportReport, JobStatus};
pub use progress::{ProgressTracker, PROGRESS_COMPLETE};
