//! # scriptoria
//!
//! Batch-transcribe scanned manuscript PDFs with vision LLMs.
//!
//! Scanned handwritten archives defeat conventional OCR — dense mathematical
//! notation, French running text, and diagrams come out as noise. This crate
//! rasterises each page into a PNG, hands it to a vision model (Gemini or
//! Claude) with a transcription prompt, and collects LaTeX/plain-text output
//! per page, checkpointing progress after every document so a multi-hour run
//! over a large archive survives crashes, rate limits, and Ctrl-C.
//!
//! ## Pipeline Overview
//!
//! ```text
//! archive dir
//!  │
//!  ├─ 1. Discover   sorted *.pdf files, minus already-completed ones
//!  ├─ 2. Rasterise  pages → PNG via pdfium (spawn_blocking)
//!  ├─ 3. Transcribe one page at a time, retrying rate limits with backoff
//!  ├─ 4. Write      json/<doc>.json + text/<doc>.tex
//!  └─ 5. Checkpoint progress.json rewritten after every document
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scriptoria::{
//!     BatchRunner, LlmTranscriber, PdfiumRasterizer, TranscribeConfig,
//! };
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TranscribeConfig::builder().model("gemini-flash").build()?;
//!     let spec = scriptoria::models::lookup_or_err(&config.model_key)?;
//!     // Reads GEMINI_API_KEY / ANTHROPIC_API_KEY; fails fast if absent.
//!     let client = Arc::new(LlmTranscriber::from_registry(spec, &config)?);
//!
//!     let runner = BatchRunner::new(config, Arc::new(PdfiumRasterizer), client);
//!     let summary = runner.run(Path::new("archives/")).await?;
//!     println!("{} pages transcribed, {} failed", summary.pages_ok, summary.pages_failed);
//!     Ok(())
//! }
//! ```
//!
//! ## Choosing a Model
//!
//! | Key | Model | $/page | Best for |
//! |-----|-------|--------|----------|
//! | `gemini-flash` | gemini-2.0-flash | $0.002 | Default — cheap bulk runs |
//! | `gemini-pro`   | gemini-1.5-pro   | $0.010 | Harder handwriting |
//! | `claude-sonnet`| claude-sonnet-4  | $0.006 | Balance |
//! | `claude-opus`  | claude-opus-4-5  | $0.030 | Highest accuracy |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `scriptoria` binary (clap + anyhow + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod download;
pub mod error;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod runner;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PageRange, ThinkingLevel, TranscribeConfig, TranscribeConfigBuilder};
pub use download::{download_archive, read_manifest, DownloadReport, DEFAULT_WORKERS};
pub use error::TranscribeError;
pub use models::{ModelSpec, DEFAULT_MODEL, MODELS};
pub use output::{write_artifacts, BatchRecord, PageOutcome};
pub use pipeline::client::{LlmTranscriber, PageTranscriber};
pub use pipeline::rasterize::{PageImage, PdfiumRasterizer, Rasterizer};
pub use pipeline::retry::{rate_limit_backoff, transcribe_with_retry};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use runner::{BatchRunner, BatchSummary};
pub use store::{CompletedEntry, FailureRecord, ProgressState, ProgressStore};
