//! Batch record types and the result writer.
//!
//! A finished document produces two artifacts under the output directory:
//!
//! * `json/<stem>.json` — the full [`BatchRecord`], machine-readable;
//! * `text/<stem>.tex`  — the transcriptions concatenated in page order,
//!   each under a `% --- Page N ---` delimiter comment, with inline
//!   `% [ERROR: …]` markers for failed pages.
//!
//! Both are plain whole-file overwrites. Re-running a document replaces its
//! artifacts; nothing is appended or merged.

use crate::error::TranscribeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Outcome of transcribing one page.
///
/// Success and failure are variants of one tagged type so a caller can
/// never read a `text` field off a failed page or an error message off a
/// successful one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageOutcome {
    Success {
        page_num: usize,
        text: String,
        model: String,
        provider: String,
    },
    Error {
        page_num: usize,
        message: String,
        model: String,
        provider: String,
    },
}

impl PageOutcome {
    /// 1-indexed page number, regardless of outcome.
    pub fn page_num(&self) -> usize {
        match self {
            PageOutcome::Success { page_num, .. } | PageOutcome::Error { page_num, .. } => {
                *page_num
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PageOutcome::Success { .. })
    }
}

/// Everything produced for one document in one run.
///
/// `total_pages` is the full rasterised page count; `pages_processed` is
/// the count after page-range filtering. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub pdf_name: String,
    pub total_pages: usize,
    pub pages_processed: usize,
    /// Registry key the run was started with, e.g. `gemini-flash`.
    pub model: String,
    pub thinking_level: crate::config::ThinkingLevel,
    pub timestamp: DateTime<Utc>,
    /// Per-page outcomes in page order.
    pub pages: Vec<PageOutcome>,
}

/// Write both artifacts for a batch record, returning their paths.
///
/// Creates `json/` and `text/` under `output_dir` as needed and overwrites
/// any prior artifact for the same document.
pub fn write_artifacts(
    record: &BatchRecord,
    output_dir: &Path,
) -> Result<(PathBuf, PathBuf), TranscribeError> {
    let stem = Path::new(&record.pdf_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| record.pdf_name.clone());

    let json_dir = output_dir.join("json");
    let text_dir = output_dir.join("text");
    for dir in [&json_dir, &text_dir] {
        fs::create_dir_all(dir).map_err(|e| TranscribeError::OutputWrite {
            path: dir.clone(),
            source: e,
        })?;
    }

    let json_path = json_dir.join(format!("{stem}.json"));
    let json = serde_json::to_string_pretty(record)
        .map_err(|e| TranscribeError::Internal(format!("Record serialisation failed: {e}")))?;
    fs::write(&json_path, json).map_err(|e| TranscribeError::OutputWrite {
        path: json_path.clone(),
        source: e,
    })?;

    let text_path = text_dir.join(format!("{stem}.tex"));
    fs::write(&text_path, render_text(record)).map_err(|e| TranscribeError::OutputWrite {
        path: text_path.clone(),
        source: e,
    })?;

    debug!(
        "Wrote artifacts for {}: {} and {}",
        record.pdf_name,
        json_path.display(),
        text_path.display()
    );
    Ok((json_path, text_path))
}

/// Render the plain-text/LaTeX view of a batch record.
pub fn render_text(record: &BatchRecord) -> String {
    let mut out = String::new();
    out.push_str(&format!("% Transcription of {}\n", record.pdf_name));
    out.push_str(&format!("% Model: {}\n", record.model));
    out.push_str(&format!("% Date: {}\n", record.timestamp.to_rfc3339()));
    out.push_str(&format!("% Total pages: {}\n", record.total_pages));
    out.push_str(&format!("%{}\n\n", "=".repeat(79)));

    for page in &record.pages {
        out.push_str(&format!("\n% --- Page {} ---\n\n", page.page_num()));
        match page {
            PageOutcome::Success { text, .. } => out.push_str(text),
            PageOutcome::Error { message, .. } => {
                out.push_str(&format!("% [ERROR: {message}]"));
            }
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThinkingLevel;

    fn sample_record() -> BatchRecord {
        BatchRecord {
            pdf_name: "119.pdf".into(),
            total_pages: 3,
            pages_processed: 2,
            model: "gemini-flash".into(),
            thinking_level: ThinkingLevel::Low,
            timestamp: Utc::now(),
            pages: vec![
                PageOutcome::Success {
                    page_num: 1,
                    text: "Soit $X$ un schéma.".into(),
                    model: "gemini-2.0-flash".into(),
                    provider: "gemini".into(),
                },
                PageOutcome::Error {
                    page_num: 2,
                    message: "HTTP 500".into(),
                    model: "gemini-2.0-flash".into(),
                    provider: "gemini".into(),
                },
            ],
        }
    }

    #[test]
    fn record_round_trips_through_json() {
        let record = sample_record();
        let json = serde_json::to_string(&record).unwrap();
        let back: BatchRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }

    #[test]
    fn outcome_tag_is_status_field() {
        let json = serde_json::to_value(&sample_record().pages[0]).unwrap();
        assert_eq!(json["status"], "success");
        let json = serde_json::to_value(&sample_record().pages[1]).unwrap();
        assert_eq!(json["status"], "error");
    }

    #[test]
    fn rendered_text_delimits_pages_and_marks_errors() {
        let text = render_text(&sample_record());
        assert!(text.starts_with("% Transcription of 119.pdf\n"));
        assert!(text.contains("% --- Page 1 ---"));
        assert!(text.contains("Soit $X$ un schéma."));
        assert!(text.contains("% --- Page 2 ---"));
        assert!(text.contains("% [ERROR: HTTP 500]"));
    }

    #[test]
    fn artifacts_written_and_json_matches_record() {
        let dir = tempfile::tempdir().unwrap();
        let record = sample_record();
        let (json_path, text_path) = write_artifacts(&record, dir.path()).unwrap();

        assert_eq!(json_path, dir.path().join("json/119.json"));
        assert_eq!(text_path, dir.path().join("text/119.tex"));

        let back: BatchRecord =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(record, back);
    }

    #[test]
    fn rewriting_overwrites_prior_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let mut record = sample_record();
        write_artifacts(&record, dir.path()).unwrap();

        record.pages.truncate(1);
        record.pages_processed = 1;
        let (json_path, _) = write_artifacts(&record, dir.path()).unwrap();
        let back: BatchRecord =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(back.pages.len(), 1);
    }
}
