//! Model registry: the fixed set of vision models this tool knows how to use.
//!
//! Each entry maps a short key (what the operator types) to the provider
//! name understood by the `edgequake-llm` factory, the exact model ID, and
//! a rough per-page cost used for pre-run estimates.

use crate::error::TranscribeError;

/// One entry in the model registry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelSpec {
    /// Short key used on the command line, e.g. `gemini-flash`.
    pub key: &'static str,
    /// Exact model identifier sent to the API.
    pub id: &'static str,
    /// Provider name as understood by `edgequake_llm::ProviderFactory`.
    pub provider: &'static str,
    /// Approximate USD cost per transcribed page at 150 DPI.
    pub cost_per_page: f64,
}

/// Registry key used when the operator does not pick a model.
pub const DEFAULT_MODEL: &str = "gemini-flash";

/// All models this tool can drive.
pub const MODELS: &[ModelSpec] = &[
    ModelSpec {
        key: "gemini-flash",
        id: "gemini-2.0-flash",
        provider: "gemini",
        cost_per_page: 0.002,
    },
    ModelSpec {
        key: "gemini-pro",
        id: "gemini-1.5-pro",
        provider: "gemini",
        cost_per_page: 0.01,
    },
    ModelSpec {
        key: "claude-opus",
        id: "claude-opus-4-5-20251101",
        provider: "anthropic",
        cost_per_page: 0.03,
    },
    ModelSpec {
        key: "claude-sonnet",
        id: "claude-sonnet-4-20250514",
        provider: "anthropic",
        cost_per_page: 0.006,
    },
];

/// Look up a registry entry by key.
pub fn lookup(key: &str) -> Option<&'static ModelSpec> {
    MODELS.iter().find(|m| m.key == key)
}

/// Look up a registry entry, or fail with the list of valid keys.
pub fn lookup_or_err(key: &str) -> Result<&'static ModelSpec, TranscribeError> {
    lookup(key).ok_or_else(|| TranscribeError::UnknownModel {
        key: key.to_string(),
        available: MODELS
            .iter()
            .map(|m| m.key)
            .collect::<Vec<_>>()
            .join(", "),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_is_registered() {
        assert!(lookup(DEFAULT_MODEL).is_some());
    }

    #[test]
    fn lookup_known_key() {
        let spec = lookup("claude-sonnet").unwrap();
        assert_eq!(spec.provider, "anthropic");
        assert_eq!(spec.id, "claude-sonnet-4-20250514");
    }

    #[test]
    fn lookup_unknown_key_errs_with_alternatives() {
        let err = lookup_or_err("gpt-nano").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("gpt-nano"));
        assert!(msg.contains("gemini-flash"));
        assert!(msg.contains("claude-opus"));
    }

    #[test]
    fn keys_are_unique() {
        for (i, a) in MODELS.iter().enumerate() {
            for b in &MODELS[i + 1..] {
                assert_ne!(a.key, b.key);
            }
        }
    }
}
