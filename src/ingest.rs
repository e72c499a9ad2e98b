//! Batched, failure-isolated ingestion of user-supplied files.
//!
//! The pipeline filters the input down to image-typed files, then works
//! through them in fixed-size batches. Within a batch every extraction runs
//! concurrently and the batch joins wait-for-all, recording each outcome
//! independently; between batches the pipeline publishes progress and
//! yields to the scheduler so the interactive surface stays responsive
//! during large uploads.
//!
//! No per-file failure is a pipeline failure: files without GPS metadata
//! and unreadable files alike are dropped with a diagnostic and counted as
//! processed.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::config::IngestConfig;
use crate::error::{PhotoMapError, Result};
use crate::extract::GeotagExtractor;
use crate::types::{FileHandle, IngestProgress, Photo};

/// Ingestion pipeline over a geotag extractor.
///
/// Cheap to clone per session; each [`start`](Self::start) call gets a
/// fresh progress context, so overlapping sessions cannot corrupt each
/// other's counters.
pub struct IngestPipeline<E> {
    extractor: Arc<E>,
    config: IngestConfig,
}

impl<E> Clone for IngestPipeline<E> {
    fn clone(&self) -> Self {
        Self {
            extractor: Arc::clone(&self.extractor),
            config: self.config.clone(),
        }
    }
}

impl<E: GeotagExtractor + 'static> IngestPipeline<E> {
    pub fn new(extractor: E) -> Self {
        Self {
            extractor: Arc::new(extractor),
            config: IngestConfig::default(),
        }
    }

    pub fn with_config(extractor: E, config: IngestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            extractor: Arc::new(extractor),
            config,
        })
    }

    /// Start an ingestion session over `files`.
    ///
    /// Non-image files are silently dropped before counting `total`. The
    /// session runs as a background task on the current tokio runtime; the
    /// caller observes progress through the returned session and collects
    /// the accumulated photos with [`IngestSession::finish`].
    pub fn start(&self, files: Vec<FileHandle>) -> IngestSession {
        let images: Vec<FileHandle> = files.into_iter().filter(FileHandle::is_image).collect();
        let total = images.len();

        let (tx, rx) = watch::channel(IngestProgress {
            processed: 0,
            total,
        });
        let extractor = Arc::clone(&self.extractor);
        let batch_size = self.config.batch_size;
        let handle = tokio::spawn(run_session(images, extractor, batch_size, tx));

        IngestSession {
            progress: rx,
            handle,
        }
    }
}

/// One in-flight ingestion session.
pub struct IngestSession {
    progress: watch::Receiver<IngestProgress>,
    handle: tokio::task::JoinHandle<Vec<Photo>>,
}

impl IngestSession {
    /// Latest published progress. Monotone within the session.
    pub fn progress(&self) -> IngestProgress {
        *self.progress.borrow()
    }

    /// A receiver for awaiting progress changes.
    pub fn subscribe(&self) -> watch::Receiver<IngestProgress> {
        self.progress.clone()
    }

    /// Wait for the session to complete and take its output.
    ///
    /// The output is a set keyed by generated id; per-file failures have
    /// already been dropped, so its length is at most `total`.
    pub async fn finish(self) -> Result<Vec<Photo>> {
        self.handle
            .await
            .map_err(|err| PhotoMapError::IngestTask(err.to_string()))
    }
}

async fn run_session<E: GeotagExtractor + 'static>(
    files: Vec<FileHandle>,
    extractor: Arc<E>,
    batch_size: usize,
    progress: watch::Sender<IngestProgress>,
) -> Vec<Photo> {
    let total = files.len();
    let mut photos: Vec<Photo> = Vec::new();
    let mut processed = 0usize;

    let mut queue = files.into_iter();
    loop {
        // batches run strictly in submission order
        let batch: Vec<FileHandle> = queue.by_ref().take(batch_size).collect();
        if batch.is_empty() {
            break;
        }
        let batch_len = batch.len();

        let mut tasks = JoinSet::new();
        for file in batch {
            let extractor = Arc::clone(&extractor);
            tasks.spawn(async move { process_file(file, extractor.as_ref()) });
        }

        // wait-for-all join: completion order within the batch is
        // irrelevant, every outcome is recorded independently
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(photo)) => photos.push(photo),
                Ok(None) => {}
                Err(err) => log::warn!("extraction task aborted: {err}"),
            }
        }

        processed += batch_len;
        let _ = progress.send(IngestProgress { processed, total });

        // hand control back to the scheduler before the next batch
        tokio::task::yield_now().await;
    }

    log::debug!(
        "ingestion session complete: {} of {} files geotagged",
        photos.len(),
        total
    );
    photos
}

/// Settle one file: a `Photo` on success, `None` for any dropped file.
fn process_file<E: GeotagExtractor>(file: FileHandle, extractor: &E) -> Option<Photo> {
    match extractor.extract(&file.bytes) {
        Ok(Some(tag)) if tag.is_valid() => {
            let id = Uuid::now_v7();
            let url = file
                .display_url
                .unwrap_or_else(|| format!("memory://photos/{id}"));
            Some(Photo {
                id,
                url,
                name: file.name,
                lat: tag.lat,
                lng: tag.lng,
            })
        }
        Ok(Some(tag)) => {
            log::warn!(
                "dropping {}: coordinates out of range ({}, {})",
                file.name,
                tag.lat,
                tag.lng
            );
            None
        }
        Ok(None) => {
            log::warn!("dropping {}: no GPS metadata", file.name);
            None
        }
        Err(err) => {
            log::warn!("dropping {}: {err}", file.name);
            None
        }
    }
}
