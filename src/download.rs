//! Bulk archive downloader, independent of the transcription path.
//!
//! Fetches a manifest of files from one base URL with a fixed pool of
//! workers. Each file's failure is isolated and reported on its own; the
//! only shared state is an atomic completion counter used for log lines.
//! Some archive hosts serve expired certificates, hence the opt-in
//! `insecure` escape hatch.

use crate::error::TranscribeError;
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{info, warn};

/// Number of concurrent download workers.
pub const DEFAULT_WORKERS: usize = 5;

/// Outcome of one file fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub file: String,
    /// `Ok(bytes written)` or the error text.
    pub result: Result<u64, String>,
}

/// Tally of a whole download run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub ok: usize,
    pub failed: usize,
    pub outcomes: Vec<DownloadOutcome>,
}

/// Fetch every file in `files` from `base_url` into `out_dir`.
///
/// `workers` bounds concurrency (0 is treated as 1). Only setup problems —
/// unbuildable HTTP client, uncreatable output directory — are fatal;
/// per-file failures land in the report.
pub async fn download_archive(
    base_url: &str,
    files: &[String],
    out_dir: &Path,
    workers: usize,
    insecure: bool,
) -> Result<DownloadReport, TranscribeError> {
    std::fs::create_dir_all(out_dir)
        .map_err(|e| TranscribeError::Download(format!("cannot create {}: {e}", out_dir.display())))?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .danger_accept_invalid_certs(insecure)
        .build()
        .map_err(|e| TranscribeError::Download(format!("HTTP client build failed: {e}")))?;

    let base = base_url.trim_end_matches('/');
    let total = files.len();
    let completed = AtomicUsize::new(0);
    info!("Downloading {} file(s) to {}", total, out_dir.display());

    let outcomes: Vec<DownloadOutcome> = stream::iter(files.iter().map(|file| {
        let client = client.clone();
        let url = format!("{base}/{file}");
        let dest = out_dir.join(file);
        let completed = &completed;
        let file = file.clone();
        async move {
            let result = fetch_one(&client, &url, &dest).await;
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            match &result {
                Ok(bytes) => info!("[{done}/{total}] {file} ({bytes} bytes)"),
                Err(e) => warn!("[{done}/{total}] {file} FAILED: {e}"),
            }
            DownloadOutcome { file, result }
        }
    }))
    .buffer_unordered(workers.max(1))
    .collect()
    .await;

    let ok = outcomes.iter().filter(|o| o.result.is_ok()).count();
    Ok(DownloadReport {
        ok,
        failed: outcomes.len() - ok,
        outcomes,
    })
}

/// Fetch a single URL to a destination path.
async fn fetch_one(client: &reqwest::Client, url: &str, dest: &Path) -> Result<u64, String> {
    let response = client.get(url).send().await.map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("HTTP {}", response.status()));
    }
    let bytes = response.bytes().await.map_err(|e| e.to_string())?;
    tokio::fs::write(dest, &bytes)
        .await
        .map_err(|e| e.to_string())?;
    Ok(bytes.len() as u64)
}

/// Read a manifest file: one filename per line, blanks and `#` comments
/// skipped.
pub fn read_manifest(path: &Path) -> Result<Vec<String>, TranscribeError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| TranscribeError::Download(format!("cannot read manifest {}: {e}", path.display())))?;
    let files: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect();
    if files.is_empty() {
        return Err(TranscribeError::Download(format!(
            "manifest {} lists no files",
            path.display()
        )));
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_skips_blanks_and_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.txt");
        std::fs::write(&path, "# archive files\n1.pdf\n\n  2.pdf  \n#skip\n162-1.pdf\n").unwrap();
        assert_eq!(
            read_manifest(&path).unwrap(),
            vec!["1.pdf", "2.pdf", "162-1.pdf"]
        );
    }

    #[test]
    fn empty_manifest_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.txt");
        std::fs::write(&path, "# nothing here\n\n").unwrap();
        assert!(read_manifest(&path).is_err());
    }

    #[tokio::test]
    async fn unreachable_host_fails_per_file_not_fatally() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec!["a.pdf".to_string(), "b.pdf".to_string()];
        let report = download_archive(
            "http://127.0.0.1:9", // discard port, nothing listens
            &files,
            dir.path(),
            2,
            false,
        )
        .await
        .unwrap();

        assert_eq!(report.ok, 0);
        assert_eq!(report.failed, 2);
        assert_eq!(report.outcomes.len(), 2);
        for outcome in &report.outcomes {
            assert!(outcome.result.is_err());
        }
    }
}
