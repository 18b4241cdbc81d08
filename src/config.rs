//! Configuration types for a transcription run.
//!
//! Everything a run needs is collected in [`TranscribeConfig`], built via
//! [`TranscribeConfigBuilder`]. One struct for all knobs keeps configs easy
//! to log, clone into workers, and diff between runs.

use crate::error::TranscribeError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Configuration for a batch transcription run.
///
/// # Example
/// ```rust
/// use scriptoria::TranscribeConfig;
///
/// let config = TranscribeConfig::builder()
///     .model("claude-sonnet")
///     .delay_secs(2.0)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct TranscribeConfig {
    /// Model-registry key selecting the model and provider. Default: `gemini-flash`.
    pub model_key: String,

    /// Rasterisation DPI. Range: 72–400. Default: 150.
    ///
    /// 150 DPI keeps handwriting legible to the model while the PNG stays
    /// well below API upload limits. Raise it for faint pencil scans.
    pub dpi: u32,

    /// Delay slept after every API call, in seconds. Default: 1.0.
    ///
    /// Applied after the last page of a document too — the pacing is per
    /// request, not per document. Use 15+ on a free-tier key (5 req/min).
    pub delay_secs: f64,

    /// Maximum API attempts per page, rate-limit retries included. Default: 3.
    pub max_attempts: u32,

    /// Skip documents already marked complete in the progress file. Default: true.
    pub resume: bool,

    /// Vendor thinking/quality level, recorded in the batch record. Default: Low.
    pub thinking: ThinkingLevel,

    /// Sampling temperature for the model call. Default: 1.0.
    pub temperature: f32,

    /// Maximum tokens the model may generate per page. Default: 8192.
    ///
    /// Dense manuscript pages of LaTeX routinely exceed 4k output tokens;
    /// a low cap truncates the transcription mid-formula.
    pub max_tokens: usize,

    /// Optional 1-indexed page range; `None` transcribes every page.
    pub pages: Option<PageRange>,

    /// Directory receiving `json/` and `text/` artifacts. Default: `output`.
    pub output_dir: PathBuf,

    /// Path of the progress file. Default: `output/progress.json`.
    pub progress_path: PathBuf,

    /// Custom transcription prompt. If None, uses the built-in default.
    pub prompt: Option<String>,
}

impl Default for TranscribeConfig {
    fn default() -> Self {
        Self {
            model_key: crate::models::DEFAULT_MODEL.to_string(),
            dpi: 150,
            delay_secs: 1.0,
            max_attempts: 3,
            resume: true,
            thinking: ThinkingLevel::default(),
            temperature: 1.0,
            max_tokens: 8192,
            pages: None,
            output_dir: PathBuf::from("output"),
            progress_path: PathBuf::from("output/progress.json"),
            prompt: None,
        }
    }
}

impl TranscribeConfig {
    /// Create a new builder for `TranscribeConfig`.
    pub fn builder() -> TranscribeConfigBuilder {
        TranscribeConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`TranscribeConfig`].
#[derive(Debug)]
pub struct TranscribeConfigBuilder {
    config: TranscribeConfig,
}

impl TranscribeConfigBuilder {
    pub fn model(mut self, key: impl Into<String>) -> Self {
        self.config.model_key = key.into();
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn delay_secs(mut self, secs: f64) -> Self {
        self.config.delay_secs = secs.max(0.0);
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.max_attempts = n.max(1);
        self
    }

    pub fn resume(mut self, v: bool) -> Self {
        self.config.resume = v;
        self
    }

    pub fn thinking(mut self, level: ThinkingLevel) -> Self {
        self.config.thinking = level;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn pages(mut self, range: PageRange) -> Self {
        self.config.pages = Some(range);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.config.progress_path = dir.join("progress.json");
        self.config.output_dir = dir;
        self
    }

    pub fn progress_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.progress_path = path.into();
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = Some(prompt.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<TranscribeConfig, TranscribeError> {
        let c = &self.config;
        if c.model_key.is_empty() {
            return Err(TranscribeError::InvalidConfig(
                "Model key must not be empty".into(),
            ));
        }
        if c.max_attempts == 0 {
            return Err(TranscribeError::InvalidConfig(
                "max_attempts must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Vendor-specific reasoning depth requested from the model.
///
/// `Low` is the right default for transcription: the task is perception,
/// not reasoning, and higher levels mostly add latency and cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThinkingLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl ThinkingLevel {
    /// Wire name of the level.
    pub fn as_str(&self) -> &'static str {
        match self {
            ThinkingLevel::Low => "low",
            ThinkingLevel::Medium => "medium",
            ThinkingLevel::High => "high",
        }
    }
}

/// A 1-indexed inclusive page range.
///
/// Parsed from `"N"` (single page), `"N-M"` (inclusive range) or `"N-"`
/// (open-ended from N).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: usize,
    /// Inclusive upper bound; `None` means "to the end of the document".
    pub end: Option<usize>,
}

impl PageRange {
    /// Whether the given 1-indexed page number falls inside the range.
    pub fn contains(&self, page_num: usize) -> bool {
        page_num >= self.start && self.end.is_none_or(|e| page_num <= e)
    }
}

impl FromStr for PageRange {
    type Err = TranscribeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parse_num = |part: &str| -> Result<usize, TranscribeError> {
            part.trim().parse::<usize>().map_err(|_| {
                TranscribeError::InvalidConfig(format!("Invalid page number '{part}' in '{s}'"))
            })
        };

        let range = match s.split_once('-') {
            Some((start, "")) => PageRange {
                start: parse_num(start)?,
                end: None,
            },
            Some((start, end)) => PageRange {
                start: parse_num(start)?,
                end: Some(parse_num(end)?),
            },
            None => {
                let page = parse_num(s)?;
                PageRange {
                    start: page,
                    end: Some(page),
                }
            }
        };

        if range.start < 1 {
            return Err(TranscribeError::InvalidConfig(
                "Pages are 1-indexed, minimum is 1".into(),
            ));
        }
        if let Some(end) = range.end {
            if end < range.start {
                return Err(TranscribeError::InvalidConfig(format!(
                    "Invalid page range '{s}': start must be <= end"
                )));
            }
        }
        Ok(range)
    }
}
