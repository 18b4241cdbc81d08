//! The batch runner: documents → pages → transcription, with durable
//! progress after every document.
//!
//! Strictly sequential by design — one page at a time, one document at a
//! time, a fixed sleep after every API call. The external rate limit is
//! the bottleneck, not local compute, so concurrency would only trade
//! simplicity for 429s.
//!
//! Failure discipline:
//! * a page failure becomes a [`PageOutcome::Error`] and the loop moves to
//!   the next page;
//! * a document fault (unreadable PDF, artifact write failure) is recorded
//!   in the progress file's failure list and the loop moves to the next
//!   document;
//! * only pre-flight conditions (no documents, unknown model, missing
//!   credential, corrupt progress file) abort the run.

use crate::config::TranscribeConfig;
use crate::error::TranscribeError;
use crate::output::{self, BatchRecord, PageOutcome};
use crate::pipeline::client::PageTranscriber;
use crate::pipeline::rasterize::Rasterizer;
use crate::pipeline::retry::transcribe_with_retry;
use crate::progress::ProgressCallback;
use crate::store::{CompletedEntry, FailureRecord, ProgressState, ProgressStore};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Tally of one `run` invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub pages_ok: usize,
    pub pages_failed: usize,
    pub documents_completed: usize,
    pub documents_failed: usize,
    pub documents_skipped: usize,
}

/// Drives a whole batch through rasterisation, retry-wrapped transcription,
/// artifact writing, and progress checkpointing.
pub struct BatchRunner {
    config: TranscribeConfig,
    rasterizer: Arc<dyn Rasterizer>,
    client: Arc<dyn PageTranscriber>,
    store: ProgressStore,
    callback: Option<ProgressCallback>,
}

impl BatchRunner {
    pub fn new(
        config: TranscribeConfig,
        rasterizer: Arc<dyn Rasterizer>,
        client: Arc<dyn PageTranscriber>,
    ) -> Self {
        let store = ProgressStore::new(&config.progress_path);
        Self {
            config,
            rasterizer,
            client,
            store,
            callback: None,
        }
    }

    pub fn with_callback(mut self, callback: ProgressCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Process every matching, not-yet-completed document under `input`.
    ///
    /// `input` may be a single `.pdf` file or a directory scanned
    /// (non-recursively) for `.pdf` files in name order.
    pub async fn run(&self, input: &Path) -> Result<BatchSummary, TranscribeError> {
        let documents = discover_documents(input)?;
        info!("Found {} document(s) under {}", documents.len(), input.display());

        // A fresh state when resume is off: completed entries from earlier
        // runs are neither consulted nor preserved, matching the
        // whole-file-rewrite persistence model.
        let mut state = if self.config.resume {
            self.store.load()?
        } else {
            ProgressState::default()
        };

        let mut summary = BatchSummary::default();

        for pdf_path in &documents {
            let pdf_name = file_name(pdf_path);

            if self.config.resume && state.completed.contains_key(&pdf_name) {
                info!("Skipping {} (already completed)", pdf_name);
                if let Some(cb) = &self.callback {
                    cb.on_document_skipped(&pdf_name);
                }
                summary.documents_skipped += 1;
                continue;
            }

            if let Some(cb) = &self.callback {
                cb.on_document_start(&pdf_name);
            }

            match self.process_document(pdf_path, &pdf_name).await {
                Ok(record) => {
                    summary.pages_ok += record.pages.iter().filter(|p| p.is_success()).count();
                    summary.pages_failed += record.pages.iter().filter(|p| !p.is_success()).count();
                    summary.documents_completed += 1;

                    state.completed.insert(
                        pdf_name.clone(),
                        CompletedEntry {
                            timestamp: Utc::now(),
                            pages: record.pages_processed,
                            model: record.model.clone(),
                        },
                    );
                    self.store.save(&mut state)?;

                    if let Some(cb) = &self.callback {
                        cb.on_document_complete(&pdf_name, record.pages_processed);
                    }
                }
                Err(e) => {
                    let error = e.to_string();
                    warn!("Document {} failed: {}", pdf_name, error);
                    state.failed.push(FailureRecord {
                        file: pdf_name.clone(),
                        error: error.clone(),
                        timestamp: Utc::now(),
                    });
                    self.store.save(&mut state)?;
                    summary.documents_failed += 1;

                    if let Some(cb) = &self.callback {
                        cb.on_document_failed(&pdf_name, &error);
                    }
                }
            }
        }

        info!(
            "Batch complete: {} pages ok, {} pages failed, {} document(s) skipped",
            summary.pages_ok, summary.pages_failed, summary.documents_skipped
        );
        Ok(summary)
    }

    /// Rasterise, transcribe, and persist one document.
    ///
    /// Any `Err` from here is a document-level fault the caller records and
    /// survives.
    async fn process_document(
        &self,
        pdf_path: &Path,
        pdf_name: &str,
    ) -> Result<BatchRecord, TranscribeError> {
        info!("Processing {} (DPI={})", pdf_name, self.config.dpi);
        let images = self.rasterizer.rasterize(pdf_path, self.config.dpi).await?;
        let total_pages = images.len();

        let selected: Vec<_> = images
            .into_iter()
            .filter(|img| {
                self.config
                    .pages
                    .map_or(true, |range| range.contains(img.page_num))
            })
            .collect();
        info!("Pages to process: {} of {}", selected.len(), total_pages);

        if let Some(cb) = &self.callback {
            cb.on_rasterized(pdf_name, total_pages, selected.len());
        }

        let mut record = BatchRecord {
            pdf_name: pdf_name.to_string(),
            total_pages,
            pages_processed: selected.len(),
            model: self.config.model_key.clone(),
            thinking_level: self.config.thinking,
            timestamp: Utc::now(),
            pages: Vec::with_capacity(selected.len()),
        };

        for image in &selected {
            let outcome =
                transcribe_with_retry(self.client.as_ref(), image, self.config.max_attempts).await;

            if let PageOutcome::Error { message, .. } = &outcome {
                warn!("Page {} of {}: {}", image.page_num, pdf_name, message);
            }
            if let Some(cb) = &self.callback {
                cb.on_page_done(image.page_num, outcome.is_success());
            }
            record.pages.push(outcome);

            // Pace every request, the last page of a document included.
            sleep(Duration::from_secs_f64(self.config.delay_secs)).await;
        }

        let (json_path, text_path) = output::write_artifacts(&record, &self.config.output_dir)?;
        info!(
            "Saved {} and {}",
            json_path.display(),
            text_path.display()
        );

        Ok(record)
    }
}

/// Resolve the input path to an ordered list of PDF documents.
fn discover_documents(input: &Path) -> Result<Vec<PathBuf>, TranscribeError> {
    let not_found = || TranscribeError::NoDocuments {
        path: input.to_path_buf(),
    };

    if input.is_dir() {
        let mut pdfs: Vec<PathBuf> = std::fs::read_dir(input)
            .map_err(|_| not_found())?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.is_file()
                    && p.extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
            })
            .collect();
        pdfs.sort();
        if pdfs.is_empty() {
            return Err(not_found());
        }
        Ok(pdfs)
    } else if input.is_file() {
        Ok(vec![input.to_path_buf()])
    } else {
        Err(not_found())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
