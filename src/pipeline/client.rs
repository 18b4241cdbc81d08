//! Transcription client: one page image in, one [`PageOutcome`] out.
//!
//! The production implementation drives a vision model through the
//! `edgequake-llm` provider layer, so the gemini and anthropic variants
//! share one code path and the API key plumbing lives in the provider
//! factory. The trait exists so tests (and the retry controller's tests in
//! particular) can substitute a scripted client.
//!
//! A client call never returns `Err`: API failures are data, folded into
//! [`PageOutcome::Error`] with the raw error text preserved — the retry
//! controller sniffs that text for rate-limit signatures.

use crate::config::{ThinkingLevel, TranscribeConfig};
use crate::error::TranscribeError;
use crate::models::ModelSpec;
use crate::output::PageOutcome;
use crate::pipeline::rasterize::PageImage;
use crate::prompts::TRANSCRIPTION_PROMPT;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use tracing::debug;

/// Transcribes a single page image.
#[async_trait]
pub trait PageTranscriber: Send + Sync {
    async fn transcribe(&self, image: &PageImage) -> PageOutcome;
}

/// Production transcriber over an `edgequake-llm` provider.
///
/// Constructed once per run and passed by reference into every call site —
/// there is no global client handle.
pub struct LlmTranscriber {
    provider: Arc<dyn LLMProvider>,
    model_id: String,
    provider_name: String,
    prompt: String,
    temperature: f32,
    max_tokens: usize,
    /// `CompletionOptions` has no vendor thinking knob yet, so this is
    /// logged here and recorded in the batch record, not sent on the wire.
    thinking: ThinkingLevel,
}

impl LlmTranscriber {
    /// Build a transcriber for a registry entry.
    ///
    /// Fails with [`TranscribeError::ProviderNotConfigured`] when the
    /// provider's API key is absent — before any document is touched.
    pub fn from_registry(
        spec: &ModelSpec,
        config: &TranscribeConfig,
    ) -> Result<Self, TranscribeError> {
        let provider =
            ProviderFactory::create_llm_provider(spec.provider, spec.id).map_err(|e| {
                TranscribeError::ProviderNotConfigured {
                    provider: spec.provider.to_string(),
                    hint: format!(
                        "Set the {} API key in the environment.\nError: {e}",
                        spec.provider
                    ),
                }
            })?;

        Ok(Self {
            provider,
            model_id: spec.id.to_string(),
            provider_name: spec.provider.to_string(),
            prompt: config
                .prompt
                .clone()
                .unwrap_or_else(|| TRANSCRIPTION_PROMPT.to_string()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            thinking: config.thinking,
        })
    }
}

#[async_trait]
impl PageTranscriber for LlmTranscriber {
    async fn transcribe(&self, image: &PageImage) -> PageOutcome {
        let b64 = STANDARD.encode(&image.png);
        let image_data = ImageData::new(b64, "image/png").with_detail("high");

        let messages = vec![
            ChatMessage::system(self.prompt.as_str()),
            // VLM APIs require a user turn; the image carries the content.
            ChatMessage::user_with_images("", vec![image_data]),
        ];

        let options = CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        };

        match self.provider.chat(&messages, Some(&options)).await {
            Ok(response) => {
                debug!(
                    "Page {} ({} thinking): {} input tokens, {} output tokens",
                    image.page_num,
                    self.thinking.as_str(),
                    response.prompt_tokens,
                    response.completion_tokens
                );
                let text = if response.content.trim().is_empty() {
                    "[No text detected]".to_string()
                } else {
                    response.content
                };
                PageOutcome::Success {
                    page_num: image.page_num,
                    text,
                    model: self.model_id.clone(),
                    provider: self.provider_name.clone(),
                }
            }
            Err(e) => PageOutcome::Error {
                page_num: image.page_num,
                message: e.to_string(),
                model: self.model_id.clone(),
                provider: self.provider_name.clone(),
            },
        }
    }
}
