//! [`Engine`] implementation over the platform's REST API.
//!
//! Values are computed with `POST {base}/projects/{project}/value:compute`.
//! Thumbnails are created with `POST {base}/projects/{project}/thumbnails`
//! and downloaded with `GET {base}/{name}:getPixels`.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::{
    Engine, EngineError,
    encode::encode,
    expr::{ComputedObject as _, Expr},
    image::Image,
    retry::{self, RetryPolicy},
};

/// Connection settings for [`RestEngine`].
#[derive(Debug, Clone)]
pub struct RestEngineConfig {
    /// API root, without trailing slash.
    pub base_url: String,
    /// Cloud project billed for the computation.
    pub project: String,
    /// OAuth bearer token.
    pub token: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Transient-error retry policy.
    pub retry: RetryPolicy,
}

/// Engine backed by the REST API.
pub struct RestEngine {
    config: RestEngineConfig,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ComputeResponse {
    result: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ThumbnailResponse {
    name: String,
}

impl RestEngine {
    /// Creates an engine with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Http`] if the HTTP client cannot be built.
    pub fn new(config: RestEngineConfig) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, client })
    }

    fn project_url(&self, method: &str) -> String {
        format!(
            "{}/projects/{}/{method}",
            self.config.base_url.trim_end_matches('/'),
            self.config.project
        )
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, EngineError> {
        let response = retry::send(
            || {
                self.client
                    .post(url)
                    .bearer_auth(&self.config.token)
                    .json(body)
            },
            self.config.retry,
        )
        .await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait::async_trait]
impl Engine for RestEngine {
    async fn compute(&self, expr: &Expr) -> Result<serde_json::Value, EngineError> {
        let url = self.project_url("value:compute");
        log::debug!(
            "Computing {} at {url}",
            expr.function_name().unwrap_or("constant")
        );
        let body = json!({ "expression": encode(expr) });
        let response: ComputeResponse = serde_json::from_value(self.post_json(&url, &body).await?)?;
        response.result.ok_or_else(|| EngineError::Decode {
            message: "compute response has no result".to_string(),
        })
    }

    async fn thumbnail(&self, image: &Image) -> Result<Vec<u8>, EngineError> {
        let url = self.project_url("thumbnails");
        let body = json!({
            "expression": encode(image.expr()),
            "fileFormat": "PNG",
        });
        let created: ThumbnailResponse =
            serde_json::from_value(self.post_json(&url, &body).await?)?;
        log::debug!("Created thumbnail {}", created.name);

        let pixels_url = format!(
            "{}/{}:getPixels",
            self.config.base_url.trim_end_matches('/'),
            created.name
        );
        let response = retry::send(
            || {
                self.client
                    .get(&pixels_url)
                    .bearer_auth(&self.config.token)
            },
            self.config.retry,
        )
        .await?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Reads the bearer token from the environment variable `env_var`.
///
/// # Errors
///
/// Returns [`EngineError::Auth`] if the variable is unset or blank.
pub fn resolve_token(env_var: &str) -> Result<String, EngineError> {
    match std::env::var(env_var) {
        Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(EngineError::Auth {
            message: format!(
                "{env_var} environment variable not set (expected an OAuth access token, \
                 e.g. from `gcloud auth print-access-token`)"
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, header, method, path},
    };

    use super::*;
    use crate::collection::ImageCollection;

    fn engine(server: &MockServer) -> RestEngine {
        RestEngine::new(RestEngineConfig {
            base_url: format!("{}/v1/", server.uri()),
            project: "demo".to_string(),
            token: "secret".to_string(),
            timeout: Duration::from_secs(5),
            retry: RetryPolicy {
                max_retries: 1,
                base_delay: Duration::from_millis(1),
            },
        })
        .unwrap()
    }

    #[tokio::test]
    async fn compute_posts_encoded_expression() {
        let server = MockServer::start().await;
        let size = ImageCollection::load("COPERNICUS/S2_SR_HARMONIZED").size();
        Mock::given(method("POST"))
            .and(path("/v1/projects/demo/value:compute"))
            .and(header("authorization", "Bearer secret"))
            .and(body_partial_json(json!({ "expression": encode(&size) })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": 12 })))
            .expect(1)
            .mount(&server)
            .await;

        let value = engine(&server).compute(&size).await.unwrap();
        assert_eq!(value, json!(12));
    }

    #[tokio::test]
    async fn compute_surfaces_platform_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/projects/demo/value:compute"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "code": 400,
                    "message": "Collection.size: Parameter 'collection' is required.",
                    "status": "INVALID_ARGUMENT"
                }
            })))
            .mount(&server)
            .await;

        let err = engine(&server)
            .compute(&ImageCollection::load("x").size())
            .await
            .unwrap_err();
        match err {
            EngineError::Remote { status, message } => {
                assert_eq!(status, 400);
                assert!(message.starts_with("INVALID_ARGUMENT"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn compute_without_result_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let err = engine(&server)
            .compute(&ImageCollection::load("x").size())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Decode { .. }));
    }

    #[tokio::test]
    async fn thumbnail_creates_then_downloads() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/projects/demo/thumbnails"))
            .and(body_partial_json(json!({ "fileFormat": "PNG" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "projects/demo/thumbnails/abc123"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/projects/demo/thumbnails/abc123:getPixels"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"\x89PNG".to_vec()))
            .mount(&server)
            .await;

        let image = ImageCollection::load("x").median();
        let png = engine(&server).thumbnail(&image).await.unwrap();
        assert_eq!(png, b"\x89PNG");
    }

    #[test]
    fn blank_token_is_rejected() {
        let err = resolve_token("LULC_ENGINE_TEST_TOKEN_THAT_IS_NEVER_SET").unwrap_err();
        assert!(matches!(err, EngineError::Auth { .. }));
    }
}
