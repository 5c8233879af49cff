//! Reqwest implementation of the language-model port.

use async_trait::async_trait;
use reqwest::{header, Client as ReqwestClient, Response};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::error::LlmApiError;
use super::rate_limiter::TokenBucketRateLimiter;
use super::retry::RetryPolicy;
use super::streaming::chunk_stream;
use super::types::{MessageRequest, MessageResponse};
use crate::domain::models::LlmConfig;
use crate::domain::ports::{ChatMessage, ChunkStream, LlmClient, LlmResult};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// System prompt attached to structured-output requests.
const JSON_SYSTEM_PROMPT: &str =
    "Respond with a single valid JSON object and nothing else. No prose, no markdown fences.";

/// HTTP client for the Anthropic Messages API.
///
/// Wraps reqwest with connection pooling, a token-bucket rate limiter, and
/// exponential-backoff retry of transient errors. Failures always surface
/// as errors; an empty completion is reported, never silently returned.
pub struct AnthropicClient {
    http: ReqwestClient,
    base_url: String,
    model: String,
    temperature: f64,
    rate_limiter: TokenBucketRateLimiter,
    retry: RetryPolicy,
}

impl AnthropicClient {
    /// Build a client from configuration. The API key comes from the config
    /// or the `ANTHROPIC_API_KEY` environment variable.
    pub fn new(config: &LlmConfig) -> Result<Self, LlmApiError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .ok_or_else(|| {
                LlmApiError::AuthenticationFailed(
                    "no API key configured; set llm.api_key or ANTHROPIC_API_KEY".to_string(),
                )
            })?;

        let scrubbed = if api_key.len() > 8 {
            format!("{}...[REDACTED]", &api_key[..8])
        } else {
            "[REDACTED]".to_string()
        };
        info!(
            base_url = %config.base_url,
            model = %config.model,
            timeout_secs = config.timeout_secs,
            api_key = %scrubbed,
            "initializing language model client"
        );

        let mut headers = header::HeaderMap::new();
        headers.insert(
            "x-api-key",
            header::HeaderValue::from_str(&api_key)
                .map_err(|e| LlmApiError::InvalidRequest(format!("invalid API key: {e}")))?,
        );
        headers.insert(
            "anthropic-version",
            header::HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let http = ReqwestClient::builder()
            .pool_max_idle_per_host(10)
            .timeout(Duration::from_secs(config.timeout_secs))
            .tcp_nodelay(true)
            .default_headers(headers)
            .build()
            .map_err(LlmApiError::from)?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            rate_limiter: TokenBucketRateLimiter::new(config.rate_limit_rps),
            retry: RetryPolicy::new(&config.retry),
        })
    }

    fn request(&self, messages: Vec<ChatMessage>, temperature: f64, max_tokens: u32) -> MessageRequest {
        MessageRequest {
            model: self.model.clone(),
            messages,
            max_tokens,
            temperature: Some(temperature),
            system: None,
            stream: None,
        }
    }

    /// Rate-limited, retried completion request.
    #[instrument(skip(self, request), fields(model = %request.model, max_tokens = request.max_tokens))]
    async fn send(&self, request: &MessageRequest) -> Result<MessageResponse, LlmApiError> {
        self.rate_limiter.acquire().await;
        let result = self
            .retry
            .execute(|| async { self.execute_request(request).await })
            .await;
        match &result {
            Ok(response) => debug!(
                input_tokens = response.usage.input_tokens,
                output_tokens = response.usage.output_tokens,
                "completion request succeeded"
            ),
            Err(err) => warn!(error = %err, "completion request failed"),
        }
        result
    }

    async fn execute_request(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, LlmApiError> {
        let url = format!("{}/v1/messages", self.base_url);
        let response = self.http.post(&url).json(request).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.json::<MessageResponse>().await?)
    }

    async fn check_status(response: Response) -> Result<Response, LlmApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read error body".to_string());
        Err(LlmApiError::from_status(status, body))
    }

    fn completion_text(response: &MessageResponse) -> Result<String, LlmApiError> {
        let text = response.text();
        if text.is_empty() {
            Err(LlmApiError::EmptyResponse)
        } else {
            Ok(text)
        }
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        temperature: f64,
        max_tokens: u32,
    ) -> LlmResult<String> {
        let request = self.request(messages.to_vec(), temperature, max_tokens);
        let response = self.send(&request).await?;
        Ok(Self::completion_text(&response)?)
    }

    async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        temperature: f64,
        max_tokens: u32,
    ) -> LlmResult<ChunkStream> {
        let mut request = self.request(messages.to_vec(), temperature, max_tokens);
        request.stream = Some(true);

        self.rate_limiter.acquire().await;
        let url = format!("{}/v1/messages", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(LlmApiError::from)?;
        let response = Self::check_status(response).await?;
        Ok(chunk_stream(response))
    }

    async fn generate_json(&self, prompt: &str, max_tokens: u32) -> LlmResult<String> {
        let mut request = self.request(
            vec![ChatMessage::user(prompt)],
            self.temperature,
            max_tokens,
        );
        request.system = Some(JSON_SYSTEM_PROMPT.to_string());
        let response = self.send(&request).await?;
        Ok(Self::completion_text(&response)?)
    }

    async fn health_check(&self) -> LlmResult<bool> {
        let request = self.request(vec![ChatMessage::user("ping")], 0.0, 1);
        match self.send(&request).await {
            Ok(_) => Ok(true),
            Err(LlmApiError::AuthenticationFailed(_)) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}
