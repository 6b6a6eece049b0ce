//! OpenAI-compatible REST provider

use super::{ChatCompletion, ChatCompletionRequest, ModelInfo, ProviderApi, ProviderError, ProviderResult};
use crate::{Result, ValidatorConfig};
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::error::Error as _;
use std::time::Duration;
use tracing::debug;

/// HTTP client for the OpenAI REST API and compatible proxies
pub struct OpenAiClient {
    client: reqwest::Client,
    api_base: String,
    api_key: SecretString,
    connectivity_timeout: Duration,
    request_timeout: Duration,
}

/// `{"error": {"message": ...}}` envelope used by the provider for failures
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl OpenAiClient {
    /// Create a client from the resolved configuration
    ///
    /// An absent credential produces a client with an empty bearer token; the
    /// format stage stops the pipeline before it is used.
    pub fn new(config: &ValidatorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("keyprobe/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base(),
            api_key: SecretString::new(config.credential_str().to_string()),
            connectivity_timeout: config.connectivity_timeout,
            request_timeout: config.request_timeout,
        })
    }

    /// Get full URL for an endpoint
    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.api_base, path.trim_start_matches('/'))
    }

    fn authorized(&self, request: RequestBuilder, timeout: Duration) -> RequestBuilder {
        request
            .bearer_auth(self.api_key.expose_secret())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .timeout(timeout)
    }

    /// Send a request and turn non-2xx responses into [`ProviderError::Status`]
    async fn send(&self, request: RequestBuilder) -> ProviderResult<reqwest::Response> {
        let response = request.send().await.map_err(classify_transport)?;
        if response.status().is_success() {
            return Ok(response);
        }
        Err(Self::status_error(response).await)
    }

    /// Consume a response into [`ProviderError::Status`], keeping its body
    async fn status_error(response: reqwest::Response) -> ProviderError {
        let code = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = structured_message(&body).unwrap_or_else(|| body.trim().to_string());
        debug!(status = code, "Provider returned error status");

        ProviderError::Status {
            code,
            body,
            message,
        }
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ProviderResult<T> {
        let bytes = response.bytes().await.map_err(classify_transport)?;
        serde_json::from_slice(&bytes).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ProviderApi for OpenAiClient {
    async fn list_models(&self) -> ProviderResult<()> {
        let url = self.url("models");
        debug!(%url, "Listing models");

        let request = self.authorized(self.client.get(&url), self.connectivity_timeout);
        let response = self.send(request).await?;
        // Only 200 counts as connected; other 2xx codes are unexpected here
        if response.status() != StatusCode::OK {
            return Err(Self::status_error(response).await);
        }
        Ok(())
    }

    async fn retrieve_model(&self, model_id: &str) -> ProviderResult<ModelInfo> {
        let url = self.url(&format!("models/{model_id}"));
        debug!(%url, "Retrieving model");

        let request = self.authorized(self.client.get(&url), self.request_timeout);
        let response = self.send(request).await?;
        Self::decode(response).await
    }

    async fn create_chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> ProviderResult<ChatCompletion> {
        let url = self.url("chat/completions");
        debug!(%url, model = %request.model, max_tokens = request.max_tokens, "Creating chat completion");

        let builder = self.authorized(self.client.post(&url), self.request_timeout).json(request);
        let response = self.send(builder).await?;
        Self::decode(response).await
    }
}

fn structured_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error.message)
        .filter(|message| !message.trim().is_empty())
}

fn classify_transport(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout
    } else if err.is_connect() {
        ProviderError::Connect(error_chain(&err))
    } else if err.is_decode() {
        ProviderError::Decode(error_chain(&err))
    } else {
        ProviderError::Transport(error_chain(&err))
    }
}

/// Render an error with its sources, `outer: inner: root`
fn error_chain(err: &reqwest::Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !rendered.contains(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        source = cause.source();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_message_is_extracted() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error","code":"invalid_api_key"}}"#;
        assert_eq!(
            structured_message(body).as_deref(),
            Some("Incorrect API key provided")
        );
    }

    #[test]
    fn test_unstructured_bodies_have_no_message() {
        assert_eq!(structured_message("<html>bad gateway</html>"), None);
        assert_eq!(structured_message(r#"{"error":{"message":""}}"#), None);
        assert_eq!(structured_message(r#"{"detail":"nope"}"#), None);
    }

    #[test]
    fn test_url_joins_paths() {
        let config = ValidatorConfig::default().with_endpoint_base("http://127.0.0.1:9/v1/");
        let client = OpenAiClient::new(&config).unwrap();
        assert_eq!(client.url("models"), "http://127.0.0.1:9/v1/models");
        assert_eq!(client.url("/models/gpt-4"), "http://127.0.0.1:9/v1/models/gpt-4");
    }
}
