//! 应用层错误定义

use thiserror::Error;

use crate::application::ports::PlatformError;
use crate::application::services::BatchError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 某一阶段的批量推理失败
    #[error("{stage} stage failed: {source}")]
    Inference {
        stage: &'static str,
        #[source]
        source: BatchError,
    },

    /// 平台调用失败
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl ApplicationError {
    /// 创建推理阶段错误
    pub fn inference(stage: &'static str, source: BatchError) -> Self {
        Self::Inference { stage, source }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }
}
