//! Error types for the scriptoria library.
//!
//! Only *fatal* conditions live here. A page whose transcription fails is
//! not an error in the Rust sense — it becomes a
//! [`crate::output::PageOutcome::Error`] entry inside the batch record and
//! the run continues. Likewise a document that blows up mid-run is recorded
//! in the progress file's failure list and the runner moves on. The variants
//! below are the conditions that either abort the whole run before any work
//! is done (bad model key, missing credential, no input) or make it
//! impossible to continue safely (corrupt progress file).

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors returned by the scriptoria library.
#[derive(Debug, Error)]
pub enum TranscribeError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// No PDF documents matched the input path.
    #[error("No PDF documents found at '{path}'\nPass a .pdf file or a directory containing .pdf files.")]
    NoDocuments { path: PathBuf },

    /// The requested model key is not in the registry.
    #[error("Unknown model '{key}'\nAvailable models: {available}")]
    UnknownModel { key: String, available: String },

    // ── Provider errors ───────────────────────────────────────────────────
    /// The selected provider could not be initialised (missing API key etc.).
    ///
    /// Surfaced when the client is constructed, before any document is
    /// rasterised or any request sent.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Document errors ───────────────────────────────────────────────────
    /// The PDF could not be opened or a page could not be rendered.
    #[error("Rasterisation failed for '{path}': {detail}")]
    Rasterization { path: PathBuf, detail: String },

    // ── Progress-store errors ─────────────────────────────────────────────
    /// The progress file exists but does not deserialise.
    ///
    /// Deliberately fatal: silently starting from an empty state would
    /// re-transcribe every completed document at real API cost. Repair or
    /// delete the file to continue.
    #[error("Progress file '{path}' is corrupt: {detail}\nRepair it or delete it to start fresh (completed documents will be reprocessed).")]
    ProgressCorrupt { path: PathBuf, detail: String },

    /// I/O failure reading or writing the progress file.
    #[error("Failed to access progress file '{path}': {source}")]
    ProgressIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not write a result artifact.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Download errors ───────────────────────────────────────────────────
    /// The bulk downloader could not be set up (client build, manifest, dir).
    #[error("Download setup failed: {0}")]
    Download(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder or page-range validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_model_display_lists_alternatives() {
        let e = TranscribeError::UnknownModel {
            key: "gpt-nano".into(),
            available: "gemini-flash, claude-sonnet".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("gpt-nano"), "got: {msg}");
        assert!(msg.contains("gemini-flash"), "got: {msg}");
    }

    #[test]
    fn provider_not_configured_display() {
        let e = TranscribeError::ProviderNotConfigured {
            provider: "gemini".into(),
            hint: "Set GEMINI_API_KEY".into(),
        };
        assert!(e.to_string().contains("gemini"));
        assert!(e.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn progress_corrupt_display_mentions_path() {
        let e = TranscribeError::ProgressCorrupt {
            path: PathBuf::from("output/progress.json"),
            detail: "expected value at line 1".into(),
        };
        assert!(e.to_string().contains("progress.json"));
    }
}
