//! Platform Port - 社交平台抽象
//!
//! 只包含流水线需要的三个操作：列出帖子、拉取评论树、回复评论

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{CommentNode, Submission};

/// 平台错误
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Platform Port
#[async_trait]
pub trait PlatformPort: Send + Sync {
    /// 列出社区中最新的帖子
    async fn list_new_submissions(
        &self,
        community: &str,
        limit: u32,
    ) -> Result<Vec<Submission>, PlatformError>;

    /// 拉取帖子的完整评论树（展开所有 "load more"）
    async fn fetch_comment_tree(&self, submission_id: &str) -> Result<Vec<CommentNode>, PlatformError>;

    /// 回复指定评论，返回新评论 ID
    async fn post_reply(&self, comment_id: &str, text: &str) -> Result<String, PlatformError>;
}
