//! Print job queue and orchestration.
//!
//! A single background worker takes jobs in arrival order and runs each one
//! to completion (settle -> normalize -> print) before starting the next.
//! Every failure is contained in its job: it is logged, counted, and the
//! worker moves on.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use image_processor::{ImageProcessError, NormalizeOptions, normalize};
use receipt_printer::Printer;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::print_job::{self, Footer, PrintError};
use super::settle::{SettlePolicy, wait_for_settle};
use super::watcher::{SharedWatchState, WatchPhase};
use crate::config::AppConfig;

/// Maximum number of queued print jobs before the watcher waits.
pub const QUEUE_CAPACITY: usize = 100;

/// A newly observed photo waiting to be printed.
#[derive(Debug, Clone)]
pub struct PrintJob {
    /// The photo as reported by the filesystem.
    pub source: PathBuf,
    /// When the watcher accepted it.
    pub observed_at: DateTime<Utc>,
}

/// How a job ended.
#[derive(Debug)]
pub enum JobOutcome {
    /// Printed completely.
    Printed { artifact: PathBuf },
    /// The source vanished or could not be stat'ed while settling.
    SourceUnavailable(std::io::Error),
    /// Decoding or processing failed; nothing was written.
    NormalizeFailed(ImageProcessError),
    /// The processing task panicked or was cancelled.
    NormalizeAborted(tokio::task::JoinError),
    /// The artifact exists on disk but printing failed.
    PrintFailed { artifact: PathBuf, error: PrintError },
}

impl JobOutcome {
    pub fn is_printed(&self) -> bool {
        matches!(self, Self::Printed { .. })
    }
}

/// Counters across the worker's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub total_processed: u64,
    pub failed: u64,
}

/// Everything a job needs; owned by the worker.
#[derive(Debug)]
pub struct Pipeline<P> {
    printer: P,
    normalize: NormalizeOptions,
    settle: SettlePolicy,
    footer: Footer,
    state: SharedWatchState,
    stats: QueueStats,
}

impl<P: Printer> Pipeline<P> {
    pub fn new(
        printer: P,
        normalize: NormalizeOptions,
        settle: SettlePolicy,
        footer: Footer,
        state: SharedWatchState,
    ) -> Self {
        Self {
            printer,
            normalize,
            settle,
            footer,
            state,
            stats: QueueStats::default(),
        }
    }

    pub fn from_config(printer: P, config: &AppConfig, state: SharedWatchState) -> Self {
        Self::new(
            printer,
            config.normalize_options(),
            config.settle_policy(),
            Footer::new(config.footer_text.clone()),
            state,
        )
    }

    pub fn stats(&self) -> QueueStats {
        self.stats
    }

    pub fn printer(&self) -> &P {
        &self.printer
    }

    /// Run one job to completion. Never fails; the outcome says what happened.
    pub async fn process(&mut self, job: PrintJob) -> JobOutcome {
        self.state.with(|s| s.set_phase(WatchPhase::Dispatching));
        let outcome = self.execute(&job).await;
        self.state.with(|s| s.set_phase(WatchPhase::Idle));

        self.stats.total_processed += 1;
        let source = job.source.display();
        match &outcome {
            JobOutcome::Printed { artifact } => {
                let elapsed = Utc::now() - job.observed_at;
                tracing::info!(
                    %source,
                    artifact = %artifact.display(),
                    elapsed_ms = elapsed.num_milliseconds(),
                    "Print job completed"
                );
            }
            JobOutcome::SourceUnavailable(e) => {
                self.stats.failed += 1;
                tracing::error!(%source, error = %e, "Photo disappeared before processing");
            }
            JobOutcome::NormalizeFailed(e) => {
                self.stats.failed += 1;
                tracing::error!(%source, error = %e, "Error processing image");
            }
            JobOutcome::NormalizeAborted(e) => {
                self.stats.failed += 1;
                tracing::error!(%source, error = %e, "Image processing task aborted");
            }
            JobOutcome::PrintFailed { artifact, error } => {
                self.stats.failed += 1;
                tracing::error!(
                    %source,
                    artifact = %artifact.display(),
                    error = %error,
                    "Print job failed, artifact kept on disk"
                );
            }
        }
        outcome
    }

    async fn execute(&mut self, job: &PrintJob) -> JobOutcome {
        if let Err(e) = wait_for_settle(&job.source, &self.settle).await {
            return JobOutcome::SourceUnavailable(e);
        }

        let source = job.source.clone();
        let options = self.normalize.clone();
        let artifact = match tokio::task::spawn_blocking(move || normalize(&source, &options)).await
        {
            Ok(Ok(artifact)) => artifact,
            Ok(Err(e)) => return JobOutcome::NormalizeFailed(e),
            Err(e) => return JobOutcome::NormalizeAborted(e),
        };

        let artifact = artifact.path().to_path_buf();
        match print_job::run(&mut self.printer, &artifact, &self.footer).await {
            Ok(()) => JobOutcome::Printed { artifact },
            Err(error) => JobOutcome::PrintFailed { artifact, error },
        }
    }
}

/// Background worker loop. Processes jobs one at a time.
///
/// Cancellation is only observed between jobs, so an in-flight job always
/// finishes. Returns the pipeline so the caller can inspect or reuse it.
pub async fn worker_loop<P: Printer>(
    mut pipeline: Pipeline<P>,
    mut rx: mpsc::Receiver<PrintJob>,
    token: CancellationToken,
) -> Pipeline<P> {
    tracing::info!("Print queue worker started (capacity={QUEUE_CAPACITY})");
    loop {
        let job = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            job = rx.recv() => job,
        };
        let Some(job) = job else {
            break;
        };
        pipeline.process(job).await;
    }

    let stats = pipeline.stats();
    tracing::info!(
        processed = stats.total_processed,
        failed = stats.failed,
        "Print queue worker stopped"
    );
    pipeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::tests::{Call, RecordingPrinter, write_photo};
    use crate::services::watcher::{IngestionWatcher, WatchEvent};
    use std::path::Path;

    fn pipeline(printer: RecordingPrinter, out: &Path) -> Pipeline<RecordingPrinter> {
        Pipeline::new(
            printer,
            NormalizeOptions::new(out).with_target_width(64),
            SettlePolicy::IMMEDIATE,
            Footer::new("footer"),
            SharedWatchState::new(),
        )
    }

    fn job(path: PathBuf) -> PrintJob {
        PrintJob {
            source: path,
            observed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_process_prints_and_keeps_artifact() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let photo = write_photo(src.path(), "photo.jpg", 128, 96);
        let mut pipeline = pipeline(RecordingPrinter::default(), out.path());

        let outcome = pipeline.process(job(photo)).await;

        let JobOutcome::Printed { artifact } = outcome else {
            panic!("expected a printed job, got {outcome:?}");
        };
        assert!(artifact.is_file());
        assert_eq!(pipeline.printer().calls.first(), Some(&Call::Raster(64, 48)));
        assert_eq!(pipeline.stats(), QueueStats { total_processed: 1, failed: 0 });
    }

    #[tokio::test]
    async fn test_failed_print_does_not_block_next_job() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let a = write_photo(src.path(), "a.jpg", 64, 64);
        let b = write_photo(src.path(), "b.png", 64, 32);
        let mut pipeline = pipeline(RecordingPrinter::failing_rasters(1), out.path());

        let first = pipeline.process(job(a)).await;
        let second = pipeline.process(job(b)).await;

        assert!(matches!(first, JobOutcome::PrintFailed { ref artifact, .. } if artifact.is_file()));
        assert!(second.is_printed());
        assert_eq!(pipeline.printer().rasters(), 1);
        assert_eq!(pipeline.stats(), QueueStats { total_processed: 2, failed: 1 });
    }

    #[tokio::test]
    async fn test_corrupt_photo_is_contained() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let broken = src.path().join("broken.jpg");
        std::fs::write(&broken, b"not an image").unwrap();
        let good = write_photo(src.path(), "good.jpg", 64, 64);
        let mut pipeline = pipeline(RecordingPrinter::default(), out.path());

        assert!(matches!(
            pipeline.process(job(broken)).await,
            JobOutcome::NormalizeFailed(_)
        ));
        assert!(pipeline.process(job(good)).await.is_printed());
        assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_missing_source_is_contained() {
        let out = tempfile::tempdir().unwrap();
        let mut pipeline = pipeline(RecordingPrinter::default(), out.path());
        let outcome = pipeline.process(job(out.path().join("vanished.jpg"))).await;
        assert!(matches!(outcome, JobOutcome::SourceUnavailable(_)));
        assert_eq!(pipeline.state.phase(), WatchPhase::Idle);
    }

    #[tokio::test]
    async fn test_watcher_and_worker_end_to_end() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let a = write_photo(src.path(), "a.jpg", 64, 64);
        let b = write_photo(src.path(), "b.png", 64, 64);
        let notes = src.path().join("notes.txt");
        std::fs::write(&notes, b"hello").unwrap();

        let state = SharedWatchState::new();
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let watcher = IngestionWatcher::new(state.clone(), tx);
        let mut pipeline = pipeline(RecordingPrinter::failing_rasters(1), out.path());
        pipeline.state = state.clone();
        let token = CancellationToken::new();
        let worker = tokio::spawn(worker_loop(pipeline, rx, token.clone()));

        for event in [
            WatchEvent::Created(a.clone()),
            WatchEvent::Created(a.clone()),
            WatchEvent::Created(notes),
            WatchEvent::Created(b),
            WatchEvent::Created(a),
        ] {
            assert!(watcher.handle_event(event).await);
        }
        // Closing the queue lets the worker drain and exit.
        drop(watcher);

        let pipeline = worker.await.unwrap();
        assert_eq!(pipeline.stats(), QueueStats { total_processed: 2, failed: 1 });
        assert_eq!(pipeline.printer().rasters(), 1);
        assert_eq!(state.dispatched_count(), 2);
        assert_eq!(state.phase(), WatchPhase::Idle);
    }

    #[tokio::test]
    async fn test_worker_stops_on_cancel() {
        let out = tempfile::tempdir().unwrap();
        let (_tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let token = CancellationToken::new();
        let worker = tokio::spawn(worker_loop(
            pipeline(RecordingPrinter::default(), out.path()),
            rx,
            token.clone(),
        ));

        token.cancel();
        let pipeline = worker.await.unwrap();
        assert_eq!(pipeline.stats().total_processed, 0);
    }
}
