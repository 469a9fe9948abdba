//! HTTP Inference Client - 调用 OpenAI 兼容的对话补全服务
//!
//! 实现 InferenceEnginePort trait
//!
//! 外部推理 API:
//! POST {base_url}/chat/completions
//! Request: {"model": "...", "messages": [...], "temperature": 0, "max_tokens": 3, ...}
//! Response: {"id": "...", "model": "...", "choices": [{"message": {"content": "..."}, "finish_reason": "stop"}]}

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{
    ChatMessage, InferenceEnginePort, InferenceError, InferenceRequest, InferenceResponse,
};

/// 对话补全请求体 (JSON)
#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
}

impl<'a> From<&'a InferenceRequest> for ChatCompletionBody<'a> {
    fn from(request: &'a InferenceRequest) -> Self {
        let params = request.params();
        Self {
            model: request.model(),
            messages: request.messages(),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            top_p: params.top_p,
            frequency_penalty: params.frequency_penalty,
            presence_penalty: params.presence_penalty,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionReply {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<ChoiceReply>,
}

#[derive(Debug, Deserialize)]
struct ChoiceReply {
    message: Option<MessageReply>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageReply {
    content: Option<String>,
}

impl ChatCompletionReply {
    fn into_response(self) -> Result<InferenceResponse, InferenceError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| InferenceError::InvalidResponse("No choices in response".to_string()))?;
        let content = choice
            .message
            .and_then(|m| m.content)
            .ok_or_else(|| InferenceError::InvalidResponse("Choice has no content".to_string()))?;

        Ok(InferenceResponse {
            id: self.id,
            model: self.model,
            content,
            finish_reason: choice.finish_reason,
        })
    }
}

/// HTTP 推理客户端配置
#[derive(Debug, Clone)]
pub struct HttpInferenceClientConfig {
    /// 推理服务基础 URL（含 /v1 之类的前缀）
    pub base_url: String,
    /// Bearer token，本地服务可以不设
    pub api_key: Option<String>,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpInferenceClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/v1".to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

impl HttpInferenceClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// HTTP 推理客户端
pub struct HttpInferenceClient {
    client: Client,
    config: HttpInferenceClientConfig,
}

impl HttpInferenceClient {
    /// 创建新的 HTTP 推理客户端
    pub fn new(config: HttpInferenceClientConfig) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| InferenceError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 获取补全 URL
    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// 获取健康检查 URL
    fn models_url(&self) -> String {
        format!("{}/models", self.config.base_url.trim_end_matches('/'))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) if !key.is_empty() => builder.bearer_auth(key),
            _ => builder,
        }
    }
}

#[async_trait]
impl InferenceEnginePort for HttpInferenceClient {
    async fn complete(&self, request: &InferenceRequest) -> Result<InferenceResponse, InferenceError> {
        let body = ChatCompletionBody::from(request);

        tracing::debug!(
            url = %self.completions_url(),
            model = %body.model,
            prompt_len = request.prompt().len(),
            max_tokens = body.max_tokens,
            "Sending chat completion request"
        );

        let response = self
            .authorize(self.client.post(self.completions_url()))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Timeout
                } else if e.is_connect() {
                    InferenceError::NetworkError(format!("Cannot connect to inference service: {}", e))
                } else {
                    InferenceError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let error_text = response.text().await.unwrap_or_default();
            return Err(InferenceError::RateLimited(error_text));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(InferenceError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let reply: ChatCompletionReply = response
            .json()
            .await
            .map_err(|e| InferenceError::InvalidResponse(format!("Failed to decode body: {}", e)))?;
        let result = reply.into_response()?;

        tracing::debug!(
            response_id = %result.id,
            finish_reason = ?result.finish_reason,
            content_len = result.content.len(),
            "Chat completion finished"
        );

        Ok(result)
    }

    async fn health_check(&self) -> bool {
        match self
            .authorize(self.client.get(self.models_url()))
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
