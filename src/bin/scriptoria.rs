//! CLI binary for scriptoria.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `TranscribeConfig` and renders progress.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use scriptoria::{
    download_archive, read_manifest, BatchProgressCallback, BatchRunner, LlmTranscriber,
    PageRange, PdfiumRasterizer, ProgressCallback, ProgressStore, ThinkingLevel,
    TranscribeConfig, DEFAULT_WORKERS, MODELS,
};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: one bar per document, log lines around it. The batch
/// loop is sequential, so a plain `Mutex<Option<ProgressBar>>` suffices.
struct CliProgressCallback {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(None),
        })
    }

    fn println(&self, line: String) {
        match self.bar.lock().unwrap().as_ref() {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_document_start(&self, pdf_name: &str) {
        eprintln!("{} {}", cyan("◆"), bold(pdf_name));
    }

    fn on_document_skipped(&self, pdf_name: &str) {
        eprintln!("{} {}  {}", dim("·"), pdf_name, dim("skipped (already completed)"));
    }

    fn on_rasterized(&self, _pdf_name: &str, total: usize, selected: usize) {
        let bar = ProgressBar::new(selected as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} pages  ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        bar.set_prefix("Transcribing");
        bar.enable_steady_tick(Duration::from_millis(80));
        bar.println(format!("  {} of {} pages selected", selected, total));
        *self.bar.lock().unwrap() = Some(bar);
    }

    fn on_page_done(&self, page_num: usize, success: bool) {
        let guard = self.bar.lock().unwrap();
        if let Some(bar) = guard.as_ref() {
            if !success {
                bar.println(format!("  {} page {}", red("✗"), page_num));
            }
            bar.inc(1);
        }
    }

    fn on_document_complete(&self, pdf_name: &str, pages_processed: usize) {
        if let Some(bar) = self.bar.lock().unwrap().take() {
            bar.finish_and_clear();
        }
        eprintln!("  {} {} ({} pages)", green("✔"), pdf_name, pages_processed);
    }

    fn on_document_failed(&self, pdf_name: &str, error: &str) {
        if let Some(bar) = self.bar.lock().unwrap().take() {
            bar.finish_and_clear();
        }
        // Keep long provider errors to one tidy line.
        let msg: String = error.chars().take(120).collect();
        eprintln!("  {} {}  {}", red("✘"), pdf_name, red(&msg));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Transcribe one PDF with the default model
  scriptoria transcribe 119.pdf

  # Whole archive directory, resuming past progress
  scriptoria transcribe archives/ --model claude-sonnet

  # Pages 1-10 only, slower pacing for a free-tier key
  scriptoria transcribe archives/119.pdf --pages 1-10 --delay 15

  # Re-run everything, ignoring the progress file
  scriptoria transcribe archives/ --no-resume

  # Show what is done and what failed
  scriptoria status

  # Fetch the source archive (expired certificate on the host)
  scriptoria fetch --manifest archive.txt --base-url https://archive.example.org/ --insecure

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY       Google Gemini API key (gemini-* models)
  ANTHROPIC_API_KEY    Anthropic API key (claude-* models)
"#;

/// Transcribe scanned manuscript PDFs using vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "scriptoria",
    version,
    about = "Transcribe scanned manuscript PDFs using vision LLMs",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Transcribe a PDF file or a directory of PDFs.
    Transcribe {
        /// PDF file or directory to transcribe.
        input: PathBuf,

        /// Model key (see `list-models`).
        #[arg(short, long, default_value = scriptoria::DEFAULT_MODEL)]
        model: String,

        /// Page range to transcribe: '5', '1-10', or '3-'.
        #[arg(short, long)]
        pages: Option<String>,

        /// Do not skip documents already marked complete.
        #[arg(long)]
        no_resume: bool,

        /// Delay between API calls in seconds. Use 15+ for free-tier keys.
        #[arg(short, long, default_value_t = 1.0)]
        delay: f64,

        /// Rasterisation DPI (72-400).
        #[arg(long, default_value_t = 150)]
        dpi: u32,

        /// Max API attempts per page (rate-limit retries included).
        #[arg(long, default_value_t = 3)]
        retries: u32,

        /// Thinking level: low, medium, high.
        #[arg(long, value_enum, default_value = "low")]
        thinking: ThinkingArg,

        /// Directory for json/, text/, and progress.json.
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,
    },

    /// Show completed and failed documents from the progress file.
    Status {
        /// Directory holding progress.json.
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,
    },

    /// List available models and their per-page cost estimates.
    ListModels,

    /// Bulk-download archive PDFs listed in a manifest file.
    Fetch {
        /// Manifest file: one filename per line, '#' comments allowed.
        #[arg(long)]
        manifest: PathBuf,

        /// Base URL the filenames are appended to.
        #[arg(long)]
        base_url: String,

        /// Destination directory.
        #[arg(long, default_value = "archives")]
        out: PathBuf,

        /// Concurrent download workers.
        #[arg(long, default_value_t = DEFAULT_WORKERS)]
        workers: usize,

        /// Skip TLS certificate verification (hosts with expired certs).
        #[arg(long)]
        insecure: bool,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ThinkingArg {
    Low,
    Medium,
    High,
}

impl From<ThinkingArg> for ThinkingLevel {
    fn from(v: ThinkingArg) -> Self {
        match v {
            ThinkingArg::Low => ThinkingLevel::Low,
            ThinkingArg::Medium => ThinkingLevel::Medium,
            ThinkingArg::High => ThinkingLevel::High,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress rendering owns the terminal during transcription; keep
    // library logs quiet unless asked.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        match cli.command {
            // These render their own output; library logs would interleave.
            Command::Transcribe { .. } | Command::Fetch { .. } => "error",
            _ => "info",
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Transcribe {
            input,
            model,
            pages,
            no_resume,
            delay,
            dpi,
            retries,
            thinking,
            output_dir,
        } => {
            run_transcribe(
                input, model, pages, !no_resume, delay, dpi, retries, thinking.into(), output_dir,
                cli.quiet,
            )
            .await
        }
        Command::Status { output_dir } => run_status(&output_dir),
        Command::ListModels => {
            run_list_models();
            Ok(())
        }
        Command::Fetch {
            manifest,
            base_url,
            out,
            workers,
            insecure,
        } => run_fetch(&manifest, &base_url, &out, workers, insecure).await,
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_transcribe(
    input: PathBuf,
    model: String,
    pages: Option<String>,
    resume: bool,
    delay: f64,
    dpi: u32,
    retries: u32,
    thinking: ThinkingLevel,
    output_dir: PathBuf,
    quiet: bool,
) -> Result<()> {
    let spec = scriptoria::models::lookup_or_err(&model)?;

    let mut builder = TranscribeConfig::builder()
        .model(&model)
        .dpi(dpi)
        .delay_secs(delay)
        .max_attempts(retries)
        .resume(resume)
        .thinking(thinking)
        .output_dir(output_dir);
    if let Some(ref spec_str) = pages {
        let range: PageRange = spec_str.parse()?;
        builder = builder.pages(range);
    }
    let config = builder.build().context("Invalid configuration")?;

    // Fails here, before any rasterisation, if the provider key is missing.
    let client = Arc::new(LlmTranscriber::from_registry(spec, &config)?);

    if !quiet {
        eprintln!("{}", bold("scriptoria"));
        eprintln!("Model: {} ({})", model, spec.id);
        eprintln!("Cost estimate: ~${:.3}/page\n", spec.cost_per_page);
    }

    let mut runner = BatchRunner::new(config, Arc::new(PdfiumRasterizer), client);
    if !quiet {
        let callback: ProgressCallback = CliProgressCallback::new();
        runner = runner.with_callback(callback);
    }

    let summary = runner.run(&input).await?;

    if !quiet {
        eprintln!("\n{}", bold("Summary"));
        eprintln!("  Pages transcribed: {}", summary.pages_ok);
        eprintln!("  Pages failed:      {}", summary.pages_failed);
        eprintln!(
            "  Documents:         {} done, {} failed, {} skipped",
            summary.documents_completed, summary.documents_failed, summary.documents_skipped
        );
    }
    Ok(())
}

fn run_status(output_dir: &std::path::Path) -> Result<()> {
    let store = ProgressStore::new(output_dir.join("progress.json"));
    let state = store.load()?;

    if state.completed.is_empty() && state.failed.is_empty() {
        println!("No progress recorded yet.");
        return Ok(());
    }

    println!("{:<28} {:>6}  {:<14} {}", bold("Document"), "Pages", "Model", "Date");
    for (name, entry) in &state.completed {
        println!(
            "{:<28} {:>6}  {:<14} {}",
            name,
            entry.pages,
            entry.model,
            entry.timestamp.format("%Y-%m-%d")
        );
    }

    if !state.failed.is_empty() {
        println!("\n{}", red(&format!("Failed: {} document(s)", state.failed.len())));
        for failure in &state.failed {
            println!(
                "  {:<26} {}  {}",
                failure.file,
                failure.timestamp.format("%Y-%m-%d"),
                dim(&failure.error.chars().take(80).collect::<String>())
            );
        }
    }

    if let Some(updated) = state.last_updated {
        println!("\n{}", dim(&format!("Last updated: {}", updated.to_rfc3339())));
    }
    Ok(())
}

fn run_list_models() {
    println!("{:<14} {:<28} {:<10} {:>10}", bold("Key"), "Model", "Provider", "Cost/page");
    for spec in MODELS {
        println!(
            "{:<14} {:<28} {:<10} {:>10}",
            spec.key,
            spec.id,
            spec.provider,
            format!("${:.3}", spec.cost_per_page)
        );
    }
}

async fn run_fetch(
    manifest: &std::path::Path,
    base_url: &str,
    out: &std::path::Path,
    workers: usize,
    insecure: bool,
) -> Result<()> {
    let files = read_manifest(manifest)?;
    println!("Downloading {} file(s) to '{}'...", files.len(), out.display());

    let report = download_archive(base_url, &files, out, workers, insecure)
        .await
        .context("Download failed")?;

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(bytes) => println!("{} {} ({} bytes)", green("[OK]"), outcome.file, bytes),
            Err(e) => println!("{} {} - {}", red("[FAIL]"), outcome.file, e),
        }
    }
    println!("\nComplete: {} downloaded, {} failed", report.ok, report.failed);

    if report.ok == 0 {
        anyhow::bail!("every download failed");
    }
    Ok(())
}
