//! Model Gateway — one `complete` call over any supported provider.
//!
//! Owns the rate-limit-aware retry/backoff policy. Terminal failures never
//! escape `complete`: the caller always gets text, possibly the fixed
//! fallback message. Conversations degrade, they do not crash.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tokio::time::sleep;

use crate::config::GatewaySettings;

use super::errors::GatewayError;
use super::provider::{self, Provider};
use super::types::{ChatMessage, CompletionResponse, ProviderRequest};

// ─── Constants ───────────────────────────────────────────────────────────────

/// TCP connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Total per-request deadline. One slow provider call must not hold a turn
/// open indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Maximum number of call attempts before giving up on a rate-limited
/// provider.
const MAX_ATTEMPTS: u32 = 5;

/// Base delay for exponential backoff when the provider gives no hint.
const BASE_DELAY_SECS: f64 = 1.0;

/// Returned to the caller when retries are exhausted or the transport fails.
/// User-safe: no status codes, no exception text.
pub const FALLBACK_MESSAGE: &str =
    "I encountered an error due to rate limits or network issues. Please try again later.";

// ─── ModelClient ─────────────────────────────────────────────────────────────

/// The "send conversation, get completion text" capability.
///
/// Failures are degraded to text by the implementation — callers treat every
/// return value as a valid assistant reply.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> String;
}

// ─── ModelGateway ────────────────────────────────────────────────────────────

/// HTTP gateway to a single configured provider.
pub struct ModelGateway {
    http: HttpClient,
    provider: Provider,
    settings: GatewaySettings,
}

impl ModelGateway {
    /// Construct a gateway from settings.
    ///
    /// Fails fast on an unsupported provider name or a missing endpoint for
    /// providers that require one (Azure, Vertex). These are configuration
    /// errors and are never retried.
    pub fn new(settings: GatewaySettings) -> Result<Self, GatewayError> {
        let provider: Provider = settings.provider.parse()?;

        if provider.requires_endpoint() && settings.endpoint.is_none() {
            return Err(GatewayError::EndpointRequired {
                provider: provider.name().to_string(),
            });
        }

        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Transport {
                provider: provider.name().to_string(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            provider,
            settings,
        })
    }

    /// The provider this gateway was constructed for.
    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Build the outbound request for the configured provider.
    ///
    /// Pure mapping — exposed for inspection and tests.
    pub fn build_request(&self, messages: &[ChatMessage]) -> ProviderRequest {
        provider::build_request(
            self.provider,
            self.settings.endpoint.as_deref(),
            self.settings.api_key.as_deref(),
            &self.settings.model,
            messages,
        )
    }

    /// One raw call attempt: POST, check status, extract completion text.
    async fn try_complete(&self, messages: &[ChatMessage]) -> Result<String, GatewayError> {
        let req = self.build_request(messages);

        tracing::debug!(
            provider = self.provider.name(),
            url = %req.url,
            message_count = messages.len(),
            "sending completion request"
        );

        let mut builder = self.http.post(&req.url).json(&req.body);
        for (name, value) in &req.headers {
            builder = builder.header(*name, value);
        }

        let response = builder.send().await.map_err(|e| GatewayError::Transport {
            provider: self.provider.name().to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse =
            response
                .json()
                .await
                .map_err(|e| GatewayError::MalformedResponse {
                    reason: e.to_string(),
                })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(GatewayError::MalformedResponse {
                reason: "response contained no choices".into(),
            })?
            .message
            .content
            .unwrap_or_default();

        Ok(content)
    }
}

#[async_trait]
impl ModelClient for ModelGateway {
    async fn complete(&self, messages: &[ChatMessage]) -> String {
        complete_with_retry(self.provider.name(), |_| self.try_complete(messages)).await
    }
}

// ─── Retry Policy ────────────────────────────────────────────────────────────

/// Drive `attempt_fn` through the retry policy.
///
/// Up to [`MAX_ATTEMPTS`] calls. Rate-limit responses (HTTP 429) sleep and
/// retry — honoring a provider-suggested wait when the error body carries
/// one, otherwise exponential backoff. Any other failure, or exhaustion,
/// yields [`FALLBACK_MESSAGE`].
async fn complete_with_retry<F, Fut>(provider_name: &str, mut attempt_fn: F) -> String
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<String, GatewayError>>,
{
    for attempt in 0..MAX_ATTEMPTS {
        match attempt_fn(attempt).await {
            Ok(text) => return text,
            Err(err) if err.is_rate_limit() => {
                tracing::warn!(
                    provider = provider_name,
                    attempt = attempt + 1,
                    "rate limit hit"
                );

                let hint = err.http_body().and_then(retry_after_hint);
                let delay = backoff_delay(attempt, hint);

                tracing::warn!(
                    provider = provider_name,
                    delay_secs = delay.as_secs_f64(),
                    hinted = hint.is_some(),
                    "retrying after backoff"
                );
                sleep(delay).await;
            }
            Err(err) => {
                tracing::error!(provider = provider_name, error = %err, "completion call failed");
                return FALLBACK_MESSAGE.to_string();
            }
        }
    }

    tracing::error!(
        provider = provider_name,
        attempts = MAX_ATTEMPTS,
        "rate limit retries exhausted"
    );
    FALLBACK_MESSAGE.to_string()
}

/// Delay before the next attempt: provider hint if present, else
/// `BASE_DELAY * 2^attempt` (attempt is 0-indexed: 1s, 2s, 4s, 8s, 16s).
fn backoff_delay(attempt: u32, hint: Option<f64>) -> Duration {
    let secs = hint.unwrap_or_else(|| BASE_DELAY_SECS * f64::powi(2.0, attempt as i32));
    Duration::from_secs_f64(secs)
}

/// Scan an error body for a provider-suggested wait of the form
/// `"try again in <number>s"` (e.g. OpenAI's rate-limit messages embed
/// `"Please try again in 1.538s"`).
fn retry_after_hint(body: &str) -> Option<f64> {
    const MARKER: &str = "try again in ";

    let start = body.find(MARKER)? + MARKER.len();
    let rest = &body[start..];

    let digits: String = rest
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    // The number must be terminated by the seconds unit.
    if !rest[digits.len()..].starts_with('s') {
        return None;
    }

    digits.parse::<f64>().ok()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tokio::time::Instant;

    fn rate_limited(body: &str) -> GatewayError {
        GatewayError::Http {
            status: 429,
            body: body.to_string(),
        }
    }

    // ── retry_after_hint ──

    #[test]
    fn test_hint_parsed_from_plain_text() {
        assert_eq!(retry_after_hint("Please try again in 2.5s."), Some(2.5));
    }

    #[test]
    fn test_hint_parsed_from_json_error_body() {
        let body = r#"{"error":{"message":"Rate limit reached. Please try again in 1.538s.","type":"tokens"}}"#;
        assert_eq!(retry_after_hint(body), Some(1.538));
    }

    #[test]
    fn test_hint_absent() {
        assert_eq!(retry_after_hint("too many requests"), None);
    }

    #[test]
    fn test_hint_requires_seconds_unit() {
        assert_eq!(retry_after_hint("try again in 20 minutes"), None);
    }

    #[test]
    fn test_hint_integer_seconds() {
        assert_eq!(retry_after_hint("try again in 6s"), Some(6.0));
    }

    // ── backoff_delay ──

    #[test]
    fn test_backoff_sequence_without_hint() {
        let secs: Vec<f64> = (0..5)
            .map(|a| backoff_delay(a, None).as_secs_f64())
            .collect();
        assert_eq!(secs, vec![1.0, 2.0, 4.0, 8.0, 16.0]);
    }

    #[test]
    fn test_backoff_hint_overrides() {
        assert_eq!(backoff_delay(3, Some(2.5)).as_secs_f64(), 2.5);
    }

    // ── complete_with_retry (virtual clock) ──

    #[tokio::test(start_paused = true)]
    async fn test_exactly_five_attempts_then_fallback() {
        let calls = Cell::new(0u32);
        let started = Instant::now();

        let out = complete_with_retry("openai", |_| {
            calls.set(calls.get() + 1);
            async { Err(rate_limited("busy")) }
        })
        .await;

        assert_eq!(calls.get(), 5);
        assert_eq!(out, FALLBACK_MESSAGE);
        // No hint: 1 + 2 + 4 + 8 + 16 seconds of backoff.
        assert_eq!(started.elapsed(), Duration::from_secs(31));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hinted_wait_is_honored_exactly() {
        let calls = Cell::new(0u32);
        let started = Instant::now();

        let out = complete_with_retry("openai", |_| {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n == 1 {
                    Err(rate_limited(
                        r#"{"error":{"message":"Please try again in 2.5s."}}"#,
                    ))
                } else {
                    Ok("recovered".to_string())
                }
            }
        })
        .await;

        assert_eq!(out, "recovered");
        assert_eq!(calls.get(), 2);
        assert_eq!(started.elapsed(), Duration::from_secs_f64(2.5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_rate_limit_http_error_fails_immediately() {
        let calls = Cell::new(0u32);

        let out = complete_with_retry("openai", |_| {
            calls.set(calls.get() + 1);
            async {
                Err(GatewayError::Http {
                    status: 500,
                    body: "internal".into(),
                })
            }
        })
        .await;

        assert_eq!(calls.get(), 1);
        assert_eq!(out, FALLBACK_MESSAGE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_fails_immediately() {
        let out = complete_with_retry("ollama", |_| async {
            Err(GatewayError::Transport {
                provider: "ollama".into(),
                reason: "connection refused".into(),
            })
        })
        .await;

        assert_eq!(out, FALLBACK_MESSAGE);
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let out = complete_with_retry("openai", |_| async { Ok("hello".to_string()) }).await;
        assert_eq!(out, "hello");
    }

    // ── construction ──

    #[test]
    fn test_new_rejects_unknown_provider() {
        let settings = GatewaySettings {
            provider: "watson".into(),
            api_key: None,
            model: "m".into(),
            endpoint: None,
        };
        assert!(matches!(
            ModelGateway::new(settings),
            Err(GatewayError::UnsupportedProvider { .. })
        ));
    }

    #[test]
    fn test_new_azure_requires_endpoint() {
        let settings = GatewaySettings {
            provider: "azure".into(),
            api_key: Some("k".into()),
            model: "deploy".into(),
            endpoint: None,
        };
        assert!(matches!(
            ModelGateway::new(settings),
            Err(GatewayError::EndpointRequired { .. })
        ));
    }

    #[test]
    fn test_new_openai_ok_without_endpoint() {
        let settings = GatewaySettings {
            provider: "openai".into(),
            api_key: Some("sk".into()),
            model: "gpt-4o".into(),
            endpoint: None,
        };
        let gw = ModelGateway::new(settings).unwrap();
        assert_eq!(gw.provider(), Provider::OpenAi);
    }
}
