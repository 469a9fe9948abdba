//! Approval Adapters - 回复发送前的确认方式

mod console_approver;

pub use console_approver::ConsoleApprover;

use async_trait::async_trait;

use crate::application::ports::{ReplyApproverPort, ReplyCandidate};

/// 全部同意（测试及无人值守场景）
pub struct AutoApprover;

#[async_trait]
impl ReplyApproverPort for AutoApprover {
    async fn approve(&self, candidate: &ReplyCandidate) -> bool {
        tracing::debug!(comment_id = %candidate.comment_id, "Auto-approving reply");
        true
    }
}
