//! Inference Engine Port - LLM 推理引擎抽象
//!
//! 定义对话式推理的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 推理错误
///
/// 重试层对所有错误一视同仁
#[derive(Debug, Clone, Error)]
pub enum InferenceError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 消息角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// 对话消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// 采样参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            max_tokens: 256,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }
}

impl SamplingParams {
    /// Yes/No 分类：确定性输出，只需几个 token
    pub fn classification() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: 3,
            ..Default::default()
        }
    }

    /// 回复生成：较长输出，惩罚重复
    pub fn reply() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 256,
            frequency_penalty: 2.0,
            presence_penalty: 0.5,
            ..Default::default()
        }
    }
}

/// 推理请求
///
/// 构造后不可变
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceRequest {
    model: String,
    messages: Vec<ChatMessage>,
    params: SamplingParams,
}

impl InferenceRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>, params: SamplingParams) -> Self {
        Self {
            model: model.into(),
            messages,
            params,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn params(&self) -> &SamplingParams {
        &self.params
    }

    /// 最后一条用户消息的内容（用于日志和测试桩）
    pub fn prompt(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }
}

/// 推理响应
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceResponse {
    /// 服务端响应 ID（用于追踪）
    pub id: String,
    pub model: String,
    /// 生成的文本
    pub content: String,
    pub finish_reason: Option<String>,
}

/// Inference Engine Port
///
/// 外部推理服务的抽象接口
#[async_trait]
pub trait InferenceEnginePort: Send + Sync {
    /// 执行一次对话补全
    async fn complete(&self, request: &InferenceRequest) -> Result<InferenceResponse, InferenceError>;

    /// 检查推理服务是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
