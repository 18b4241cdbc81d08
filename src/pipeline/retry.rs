//! Bounded retry with backoff for rate-limited transcription calls.
//!
//! Rate-limit responses are the only retryable error class: everything
//! else (auth failure, malformed request, 500s) returns to the caller
//! immediately as a page-level error outcome. When the provider embeds a
//! `retry in <N>s` hint in the error text we honour it plus a one-second
//! buffer; otherwise the wait grows linearly — 15 s, 30 s, 45 s across the
//! attempt loop, whether or not earlier waits were server-directed.
//!
//! Exhausting all attempts returns the last error outcome unchanged. A
//! page that failed after three rate-limited attempts looks the same in
//! the batch record as one that failed immediately; the retry trail lives
//! in the logs.

use crate::output::PageOutcome;
use crate::pipeline::client::PageTranscriber;
use crate::pipeline::rasterize::PageImage;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Server hint fragment, e.g. "Please retry in 37.5s".
static RETRY_HINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"retry in (\d+\.?\d*)\s*s").expect("retry-hint regex is valid"));

/// Base wait for the linear fallback schedule, in seconds.
const BACKOFF_STEP_SECS: f64 = 15.0;

/// Buffer added on top of a server-suggested wait, in seconds.
const HINT_BUFFER_SECS: f64 = 1.0;

/// Compute the wait before the next attempt, or `None` if the error is not
/// a rate limit and must not be retried.
///
/// `attempt` is the 0-based index of the call that just failed; the linear
/// fallback is `15 × (attempt + 1)` seconds.
pub fn rate_limit_backoff(message: &str, attempt: usize) -> Option<Duration> {
    if !is_rate_limited(message) {
        return None;
    }

    let lowered = message.to_lowercase();
    let secs = RETRY_HINT
        .captures(&lowered)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(|hinted| hinted + HINT_BUFFER_SECS)
        .unwrap_or(BACKOFF_STEP_SECS * (attempt + 1) as f64);

    Some(Duration::from_secs_f64(secs))
}

/// Whether the error text carries a rate-limit signature.
fn is_rate_limited(message: &str) -> bool {
    message.contains("429") || message.contains("RESOURCE_EXHAUSTED")
}

/// Transcribe one page, retrying rate-limited failures up to
/// `max_attempts` total calls.
///
/// Returns the first success, the first non-retryable error, or — after
/// exhaustion — the last rate-limited error outcome.
pub async fn transcribe_with_retry(
    client: &dyn PageTranscriber,
    image: &PageImage,
    max_attempts: u32,
) -> PageOutcome {
    let mut attempt: u32 = 0;
    loop {
        let outcome = client.transcribe(image).await;

        let message = match &outcome {
            PageOutcome::Success { .. } => return outcome,
            PageOutcome::Error { message, .. } => message.clone(),
        };

        let Some(delay) = rate_limit_backoff(&message, attempt as usize) else {
            return outcome;
        };

        attempt += 1;
        if attempt >= max_attempts.max(1) {
            return outcome;
        }

        warn!(
            "Page {}: rate limited, waiting {:.1}s before retry {}/{}",
            image.page_num,
            delay.as_secs_f64(),
            attempt,
            max_attempts
        );
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    // ── Backoff computation ──────────────────────────────────────────────

    #[test]
    fn non_rate_limit_errors_are_not_retryable() {
        assert_eq!(rate_limit_backoff("HTTP 500 internal error", 0), None);
        assert_eq!(rate_limit_backoff("invalid api key", 2), None);
        assert_eq!(rate_limit_backoff("", 0), None);
    }

    #[test]
    fn server_hint_gets_one_second_buffer() {
        let d = rate_limit_backoff("429 Too Many Requests. Please retry in 7s.", 0).unwrap();
        assert_eq!(d, Duration::from_secs_f64(8.0));
    }

    #[test]
    fn server_hint_parses_fractional_seconds_case_insensitively() {
        let d = rate_limit_backoff("RESOURCE_EXHAUSTED: Retry in 2.5s", 1).unwrap();
        assert_eq!(d, Duration::from_secs_f64(3.5));
    }

    #[test]
    fn missing_hint_falls_back_to_linear_schedule() {
        assert_eq!(
            rate_limit_backoff("error 429", 0).unwrap(),
            Duration::from_secs_f64(15.0)
        );
        assert_eq!(
            rate_limit_backoff("error 429", 1).unwrap(),
            Duration::from_secs_f64(30.0)
        );
        assert_eq!(
            rate_limit_backoff("RESOURCE_EXHAUSTED", 2).unwrap(),
            Duration::from_secs_f64(45.0)
        );
    }

    // ── Retry loop ───────────────────────────────────────────────────────

    /// Scripted client: replays a fixed sequence of outcomes and counts calls.
    struct ScriptedClient {
        outcomes: Vec<PageOutcome>,
        calls: AtomicUsize,
    }

    impl ScriptedClient {
        fn new(outcomes: Vec<PageOutcome>) -> Self {
            Self {
                outcomes,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageTranscriber for ScriptedClient {
        async fn transcribe(&self, _image: &PageImage) -> PageOutcome {
            let i = self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcomes[i.min(self.outcomes.len() - 1)].clone()
        }
    }

    fn page() -> PageImage {
        PageImage {
            page_num: 1,
            png: vec![0u8; 4],
        }
    }

    fn success() -> PageOutcome {
        PageOutcome::Success {
            page_num: 1,
            text: "ok".into(),
            model: "m".into(),
            provider: "p".into(),
        }
    }

    fn error(message: &str) -> PageOutcome {
        PageOutcome::Error {
            page_num: 1,
            message: message.into(),
            model: "m".into(),
            provider: "p".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn success_returns_after_one_call() {
        let client = ScriptedClient::new(vec![success()]);
        let out = transcribe_with_retry(&client, &page(), 3).await;
        assert!(out.is_success());
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_error_returns_immediately_without_sleeping() {
        let client = ScriptedClient::new(vec![error("HTTP 500 internal")]);
        let before = Instant::now();
        let out = transcribe_with_retry(&client, &page(), 3).await;
        // Paused clock only advances when something sleeps.
        assert_eq!(before.elapsed(), Duration::ZERO);
        assert_eq!(client.calls(), 1);
        assert_eq!(out, error("HTTP 500 internal"));
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_rate_limit_makes_exactly_max_attempts_calls() {
        let client = ScriptedClient::new(vec![error("429 quota exceeded")]);
        let before = Instant::now();
        let out = transcribe_with_retry(&client, &page(), 3).await;

        assert_eq!(client.calls(), 3);
        assert_eq!(out, error("429 quota exceeded"));
        // Two waits on the linear schedule: 15s then 30s.
        assert_eq!(before.elapsed(), Duration::from_secs_f64(45.0));
    }

    #[tokio::test(start_paused = true)]
    async fn server_hint_drives_the_wait() {
        let client = ScriptedClient::new(vec![
            error("429: please retry in 7s"),
            success(),
        ]);
        let before = Instant::now();
        let out = transcribe_with_retry(&client, &page(), 3).await;

        assert!(out.is_success());
        assert_eq!(client.calls(), 2);
        assert_eq!(before.elapsed(), Duration::from_secs_f64(8.0));
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_grows_across_mixed_hint_and_fallback_waits() {
        // First failure carries a hint, second does not: the fallback for
        // the second failure is still the second step (30s), not 15s.
        let client = ScriptedClient::new(vec![
            error("429: retry in 5s"),
            error("429 quota exceeded"),
            success(),
        ]);
        let before = Instant::now();
        let out = transcribe_with_retry(&client, &page(), 3).await;

        assert!(out.is_success());
        assert_eq!(client.calls(), 3);
        assert_eq!(before.elapsed(), Duration::from_secs_f64(6.0 + 30.0));
    }

    #[tokio::test(start_paused = true)]
    async fn recovery_after_one_rate_limit() {
        let client = ScriptedClient::new(vec![error("RESOURCE_EXHAUSTED"), success()]);
        let out = transcribe_with_retry(&client, &page(), 3).await;
        assert!(out.is_success());
        assert_eq!(client.calls(), 2);
    }
}
