//! Reply Approver Port - 发帖前的人工确认

use async_trait::async_trait;
use serde::Serialize;

/// 待发送的回复
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyCandidate {
    /// 被回复的评论 ID
    pub comment_id: String,
    pub comment_body: String,
    pub reply: String,
}

/// Reply Approver Port
#[async_trait]
pub trait ReplyApproverPort: Send + Sync {
    /// 返回 true 表示允许发送
    async fn approve(&self, candidate: &ReplyCandidate) -> bool;
}
