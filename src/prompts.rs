//! Transcription prompt for manuscript pages.
//!
//! Centralised so changing the instructions is a one-place edit and unit
//! tests can inspect the prompt without touching a live model. Callers
//! override it via [`crate::config::TranscribeConfig::prompt`].

/// Default prompt sent with every page image.
///
/// Tuned for handwritten mathematical archives: French running text,
/// dense category-theory and algebraic-geometry notation, diagrams.
pub const TRANSCRIPTION_PROMPT: &str = r#"You are an expert in transcribing mathematical manuscripts.

This is a scanned page from a handwritten mathematical archive.
The documents contain:
- Handwritten mathematical notes in French
- Mathematical formulas, diagrams, and category theory
- Dense notation in algebraic geometry and homological algebra

Transcribe this page accurately:
1. Use LaTeX for ALL mathematical notation: $x^2$, $\mathcal{O}_X$, $\lim_{n \to \infty}$
2. Preserve French text exactly as written
3. Mark diagrams as: [DIAGRAM: brief description]
4. Mark illegible sections as: [illegible]
5. Preserve structure (headers, numbered items, etc.)

Begin transcription:"#;
