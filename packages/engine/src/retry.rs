//! HTTP retry with exponential backoff for transient errors.
//!
//! Connection failures, timeouts, HTTP 429 and HTTP 5xx are retried.
//! Any other 4xx is permanent and surfaces as [`EngineError::Remote`] with
//! the message from the platform's error body.

use std::time::Duration;

use serde::Deserialize;

use crate::EngineError;

/// Maximum length of a non-JSON error body quoted in error messages.
const BODY_PREVIEW_LEN: usize = 500;

/// How often and how patiently to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    fn delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(1u32 << (attempt.saturating_sub(1)).min(16))
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Sends the request built by `build_request`, retrying transient failures.
///
/// The closure is called once per attempt since builders are consumed by
/// `send()`. Returns the first successful response.
///
/// # Errors
///
/// Returns [`EngineError::Http`] for transport errors that are permanent or
/// outlast the retries, and [`EngineError::Remote`] for error statuses.
#[allow(clippy::future_not_send)]
pub async fn send<F>(build_request: F, policy: RetryPolicy) -> Result<reqwest::Response, EngineError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut attempt = 0;
    loop {
        if attempt > 0 {
            let delay = policy.delay(attempt);
            log::warn!("  retry {attempt}/{} in {delay:?}...", policy.max_retries);
            tokio::time::sleep(delay).await;
        }

        match build_request().send().await {
            Err(e) => {
                if is_transient(&e) && attempt < policy.max_retries {
                    log::warn!("  transient error: {e}");
                    attempt += 1;
                    continue;
                }
                return Err(EngineError::Http(e));
            }
            Ok(response) => {
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    if attempt < policy.max_retries {
                        log::warn!("  HTTP {status}");
                        attempt += 1;
                        continue;
                    }
                    return Err(remote_error(response).await);
                }

                if status.is_client_error() {
                    return Err(remote_error(response).await);
                }

                return Ok(response);
            }
        }
    }
}

/// Converts an error response into [`EngineError::Remote`].
async fn remote_error(response: reqwest::Response) -> EngineError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    EngineError::Remote {
        status,
        message: error_message(&body),
    }
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            error: ErrorDetail {
                message,
                status: Some(code),
            },
        }) => format!("{code}: {message}"),
        Ok(ErrorBody { error }) => error.message,
        Err(_) if body.chars().count() > BODY_PREVIEW_LEN => {
            let preview: String = body.chars().take(BODY_PREVIEW_LEN).collect();
            format!("{preview}...")
        }
        Err(_) => body.to_string(),
    }
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect()
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    use super::*;

    fn fast() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn delay_doubles() {
        let policy = RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_secs(2),
        };
        assert_eq!(policy.delay(1), Duration::from_secs(2));
        assert_eq!(policy.delay(2), Duration::from_secs(4));
        assert_eq!(policy.delay(4), Duration::from_secs(16));
    }

    #[test]
    fn error_message_prefers_platform_status() {
        let body = r#"{"error":{"code":400,"message":"Band 'B99' not found","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(error_message(body), "INVALID_ARGUMENT: Band 'B99' not found");
        assert_eq!(error_message("plain failure"), "plain failure");
    }

    #[tokio::test]
    async fn retries_server_errors_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/flaky", server.uri());
        let response = send(|| client.get(&url), fast()).await.unwrap();
        assert_eq!(response.text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": {"code": 404, "message": "not found"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/missing", server.uri());
        let err = send(|| client.get(&url), fast()).await.unwrap_err();
        match err {
            EngineError::Remote { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn invalid_requests_are_not_retried() {
        let client = reqwest::Client::new();
        let attempts = Cell::new(0);
        let err = send(
            || {
                attempts.set(attempts.get() + 1);
                client.get("http://127.0.0.1:1/").header("x-bad", "line\nbreak")
            },
            RetryPolicy {
                max_retries: 5,
                base_delay: Duration::from_secs(60),
            },
        )
        .await
        .unwrap_err();
        match err {
            EngineError::Http(e) => assert!(!is_transient(&e)),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(attempts.get(), 1);
    }

    #[tokio::test]
    async fn refused_connections_are_retried() {
        let client = reqwest::Client::new();
        let attempts = Cell::new(0);
        let err = send(
            || {
                attempts.set(attempts.get() + 1);
                client.get("http://127.0.0.1:1/")
            },
            fast(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::Http(ref e) if e.is_connect()));
        assert_eq!(attempts.get(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/busy"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/busy", server.uri());
        let err = send(|| client.get(&url), fast()).await.unwrap_err();
        assert!(matches!(err, EngineError::Remote { status: 429, .. }));
    }
}
