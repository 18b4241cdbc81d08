//! Pipeline stages for page transcription.
//!
//! ```text
//! rasterize ──▶ client ──▶ retry
//! (pdfium)     (vision LLM) (rate-limit backoff)
//! ```
//!
//! 1. [`rasterize`] — render a PDF into ordered page PNGs; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 2. [`client`]    — one page image in, one [`crate::output::PageOutcome`]
//!    out; the only stage with network I/O
//! 3. [`retry`]     — wraps the client call with bounded backoff for
//!    rate-limit errors only

pub mod client;
pub mod rasterize;
pub mod retry;
