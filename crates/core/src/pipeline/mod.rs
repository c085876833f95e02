//! Upload-to-catalog conversion pipeline.
//!
//! A run moves through `RECEIVED → STAGED → PROBED → ENCODING → PERSISTED`.
//! The staged raw upload is removed on every exit path. A failed or cancelled
//! run leaves no metadata file, so it never shows up in the catalog.

mod runner;
mod staging;
mod tracker;
mod types;

pub use runner::ConversionPipeline;
pub use staging::StagedFile;
pub use tracker::{ActiveJob, JobTracker, TrackedJob};
pub use types::{PipelineError, PipelineStage, ProgressCallback, Upload};
