//! Batch export.
//!
//! Applies one watermark with one [`WatermarkConfig`] to an ordered list of
//! source images and writes each result into a single output directory.
//!
//! ## Per-item behavior
//!
//! For every source, in order:
//!
//! 1. Load it. A missing or undecodable file becomes a failure for that item.
//! 2. Composite the shared watermark onto it.
//! 3. Flatten to opaque RGB (alpha dropped) and encode next to the other
//!    outputs as `<stem>_watermarked<ext>`, with the job's quality.
//! 4. Report progress, whether the item succeeded or failed.
//!
//! A bad item never aborts the batch. The only fatal errors are the ones that
//! make every item pointless: the watermark cannot be loaded.
//!
//! ## Output Structure
//!
//! ```text
//! output/
//! ├── dawn_watermarked.jpg
//! ├── logo-test_watermarked.png
//! └── ...
//! ```
//!
//! Two sources with the same stem write to the same file; the later one wins.
//! The exporter logs a warning when that happens but does not rename.
//!
//! ## Threading
//!
//! [`run_batch`] is synchronous. [`spawn_batch`] runs it on one background
//! thread and streams [`ProgressEvent`]s over a channel so the foreground
//! can render progress without sharing state with the worker. Nothing stops
//! a caller from starting two batches at once; don't.

use crate::imaging::{
    BackendError, ImageBackend, Quality, RustBackend, WatermarkConfig, composite_with_layout,
};
use crate::naming::{display_label, output_path};
use image::DynamicImage;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to load watermark: {0}")]
    Watermark(#[source] BackendError),
    #[error("Batch worker panicked")]
    WorkerPanicked,
}

/// Everything one batch run needs. Built fresh per run, never persisted.
#[derive(Debug, Clone)]
pub struct BatchJob {
    /// Source images, in processing order. Duplicates are allowed.
    pub sources: Vec<PathBuf>,
    pub watermark: PathBuf,
    pub config: WatermarkConfig,
    pub output_dir: PathBuf,
    pub quality: Quality,
}

/// Result of one source image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOutcome {
    /// Path of the written file.
    Success(PathBuf),
    /// `"<path>: <reason>"`.
    Failure(String),
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Success(_))
    }
}

/// Aggregate result of a batch: per-item outcomes in job order plus counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub outcomes: Vec<ItemOutcome>,
    pub succeeded: usize,
    pub failed: usize,
    /// True if the run stopped early because cancellation was requested.
    pub cancelled: bool,
}

impl BatchResult {
    fn record(&mut self, outcome: ItemOutcome) {
        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.outcomes.push(outcome);
    }

    pub fn processed(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failures(&self) -> impl Iterator<Item = &str> {
        self.outcomes.iter().filter_map(|o| match o {
            ItemOutcome::Failure(reason) => Some(reason.as_str()),
            ItemOutcome::Success(_) => None,
        })
    }
}

/// Emitted after each item, successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// 1-based position in the job.
    pub index: usize,
    pub total: usize,
    /// File name of the source just processed.
    pub label: String,
    /// Whether the watermark overhung the image and was cropped.
    pub clipped: bool,
    pub outcome: ItemOutcome,
}

/// Run `job` with the production backend.
///
/// `on_progress` is called once per item, after the item finishes. When the
/// batch runs under [`spawn_batch`] the callback executes on the worker
/// thread, not the caller's.
pub fn run_batch(
    job: &BatchJob,
    cancel: Option<&AtomicBool>,
    on_progress: impl FnMut(&ProgressEvent),
) -> Result<BatchResult, ExportError> {
    run_batch_with_backend(&RustBackend::new(), job, cancel, on_progress)
}

/// Run a batch using a specific backend (allows testing with mock).
pub fn run_batch_with_backend(
    backend: &impl ImageBackend,
    job: &BatchJob,
    cancel: Option<&AtomicBool>,
    mut on_progress: impl FnMut(&ProgressEvent),
) -> Result<BatchResult, ExportError> {
    let watermark = backend.load(&job.watermark).map_err(ExportError::Watermark)?;

    if let Err(e) = std::fs::create_dir_all(&job.output_dir) {
        // Not fatal: each write will fail and be reported per item
        warn!(
            output_dir = %job.output_dir.display(),
            error = %e,
            "could not create output directory"
        );
    }

    let total = job.sources.len();
    info!(total, watermark = %job.watermark.display(), "starting batch");

    let mut result = BatchResult::default();
    let mut written = HashSet::new();

    for (i, source) in job.sources.iter().enumerate() {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            info!(processed = i, total, "batch cancelled");
            result.cancelled = true;
            break;
        }

        let (outcome, clipped) = match export_one(backend, &watermark, source, job) {
            Ok((output, clipped)) => {
                if !written.insert(output.clone()) {
                    warn!(
                        output = %output.display(),
                        source = %source.display(),
                        "output path already written in this batch; overwriting"
                    );
                }
                debug!(source = %source.display(), output = %output.display(), "exported");
                (ItemOutcome::Success(output), clipped)
            }
            Err(e) => {
                warn!(source = %source.display(), error = %e, "item failed");
                (ItemOutcome::Failure(e.to_string()), false)
            }
        };

        on_progress(&ProgressEvent {
            index: i + 1,
            total,
            label: display_label(source),
            clipped,
            outcome: outcome.clone(),
        });
        result.record(outcome);
    }

    info!(
        succeeded = result.succeeded,
        failed = result.failed,
        "batch finished"
    );
    Ok(result)
}

/// Load, composite, flatten and save a single source.
fn export_one(
    backend: &impl ImageBackend,
    watermark: &DynamicImage,
    source: &Path,
    job: &BatchJob,
) -> Result<(PathBuf, bool), BackendError> {
    let output = output_path(source, &job.output_dir)
        .ok_or_else(|| BackendError::load(source, "path has no file name"))?;

    let base = backend.load(source)?;
    let (composited, layout) = composite_with_layout(&base, watermark, &job.config);
    let flattened = DynamicImage::ImageRgb8(composited.to_rgb8());

    backend.save(&flattened, &output, job.quality)?;
    Ok((output, layout.is_clipped()))
}

/// Handle to a batch running on a background thread.
pub struct BatchHandle {
    /// One event per finished item; closes when the worker finishes.
    pub events: Receiver<ProgressEvent>,
    cancel: Arc<AtomicBool>,
    worker: JoinHandle<Result<BatchResult, ExportError>>,
}

impl BatchHandle {
    /// Ask the worker to stop before its next item. The current item completes.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Wait for the worker and return its result.
    pub fn join(self) -> Result<BatchResult, ExportError> {
        self.worker
            .join()
            .map_err(|_| ExportError::WorkerPanicked)?
    }
}

/// Run `job` on a background thread with the production backend.
pub fn spawn_batch(job: BatchJob) -> BatchHandle {
    spawn_batch_with_backend(RustBackend::new(), job)
}

/// Run `job` on a background thread using a specific backend.
pub fn spawn_batch_with_backend<B>(backend: B, job: BatchJob) -> BatchHandle
where
    B: ImageBackend + 'static,
{
    let (tx, rx) = mpsc::channel();
    let cancel = Arc::new(AtomicBool::new(false));
    let worker_cancel = Arc::clone(&cancel);

    let worker = thread::spawn(move || {
        run_batch_with_backend(&backend, &job, Some(&worker_cancel), |event| {
            // Receiver dropped means nobody is watching; keep working
            let _ = tx.send(event.clone());
        })
    });

    BatchHandle {
        events: rx,
        cancel,
        worker,
    }
}
