//! Scout Pipeline - 帖子筛选 → 评论筛选 → 生成回复 → 人工确认后发送
//!
//! 每个阶段的批量推理都是同步屏障：上一批全部完成后才进入下一阶段

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::application::error::ApplicationError;
use crate::application::ports::{PlatformPort, ReplyApproverPort, ReplyCandidate};
use crate::application::services::{Classifier, ReplyGenerator};
use crate::domain::{
    filter_bot_authors, flatten_comment_tree, AffirmativeMatch, FlatComment, PromptTemplate,
    Submission,
};

/// 流水线配置
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// 社区名（如 subreddit）
    pub community: String,
    pub submission_limit: u32,
    /// 只打印不发送
    pub dry_run: bool,
    pub bot_accounts: Vec<String>,
    /// 每次发送后的等待时间
    pub post_delay: Duration,
    pub thread_match: AffirmativeMatch,
    pub comment_match: AffirmativeMatch,
    pub thread_prompt: PromptTemplate,
    pub comment_prompt: PromptTemplate,
    pub reply_prompt: PromptTemplate,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            community: "politics".to_string(),
            submission_limit: 50,
            dry_run: true,
            bot_accounts: vec!["automoderator".to_string(), "autotldr".to_string()],
            post_delay: Duration::from_secs(10),
            thread_match: AffirmativeMatch::Substring,
            comment_match: AffirmativeMatch::FirstToken,
            thread_prompt: PromptTemplate::thread_interest(),
            comment_prompt: PromptTemplate::comment_interest(),
            reply_prompt: PromptTemplate::comment_reply(),
        }
    }
}

/// 运行结果汇总
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScoutReport {
    pub threads_scanned: usize,
    pub threads_of_interest: Vec<Submission>,
    pub comments_scanned: usize,
    pub comments_of_interest: usize,
    pub candidates: Vec<ReplyCandidate>,
    pub replies_posted: usize,
    pub replies_rejected: usize,
    pub post_failures: usize,
}

pub struct ScoutPipeline {
    config: PipelineConfig,
    platform: Arc<dyn PlatformPort>,
    classifier: Classifier,
    generator: ReplyGenerator,
    approver: Arc<dyn ReplyApproverPort>,
}

impl ScoutPipeline {
    pub fn new(
        config: PipelineConfig,
        platform: Arc<dyn PlatformPort>,
        classifier: Classifier,
        generator: ReplyGenerator,
        approver: Arc<dyn ReplyApproverPort>,
    ) -> Self {
        Self {
            config,
            platform,
            classifier,
            generator,
            approver,
        }
    }

    pub async fn run(&self) -> Result<ScoutReport, ApplicationError> {
        if self.config.community.trim().is_empty() {
            return Err(ApplicationError::validation("Community cannot be empty"));
        }

        let mut report = ScoutReport::default();

        let submissions = self
            .platform
            .list_new_submissions(&self.config.community, self.config.submission_limit)
            .await?;
        report.threads_scanned = submissions.len();

        let threads = self.find_threads_of_interest(submissions).await?;
        for thread in &threads {
            tracing::info!(submission_id = %thread.id, title = %thread.title, "Thread of interest");
        }
        report.threads_of_interest = threads.clone();

        let comments = self.collect_comments(&threads).await?;
        report.comments_scanned = comments.len();

        let comments = self.find_comments_of_interest(comments).await?;
        report.comments_of_interest = comments.len();

        report.candidates = self.draft_replies(comments).await?;

        if self.config.dry_run {
            for candidate in &report.candidates {
                tracing::info!(
                    comment_id = %candidate.comment_id,
                    comment = %candidate.comment_body,
                    reply = %candidate.reply,
                    "Dry run: reply not posted"
                );
            }
        } else {
            self.deliver_replies(&mut report).await;
        }

        tracing::info!(
            threads_scanned = report.threads_scanned,
            threads_of_interest = report.threads_of_interest.len(),
            comments_scanned = report.comments_scanned,
            comments_of_interest = report.comments_of_interest,
            replies_drafted = report.candidates.len(),
            replies_posted = report.replies_posted,
            "Scout run finished"
        );
        Ok(report)
    }

    /// 按标题筛选帖子
    async fn find_threads_of_interest(
        &self,
        submissions: Vec<Submission>,
    ) -> Result<Vec<Submission>, ApplicationError> {
        let titles: Vec<&str> = submissions.iter().map(|s| s.title.as_str()).collect();
        let decisions = self
            .classifier
            .classify(&titles, &self.config.thread_prompt, self.config.thread_match)
            .await
            .map_err(|e| ApplicationError::inference("thread interest", e))?;

        Ok(submissions
            .into_iter()
            .zip(decisions)
            .filter_map(|(submission, keep)| keep.then_some(submission))
            .collect())
    }

    /// 逐个拉取评论树并展平，去掉机器人账号
    async fn collect_comments(
        &self,
        threads: &[Submission],
    ) -> Result<Vec<FlatComment>, ApplicationError> {
        let mut comments = Vec::new();
        for thread in threads {
            let tree = self.platform.fetch_comment_tree(&thread.id).await?;
            let flat = flatten_comment_tree(&tree);
            tracing::debug!(submission_id = %thread.id, comments = flat.len(), "Comment tree fetched");
            comments.extend(flat);
        }

        let before = comments.len();
        let comments = filter_bot_authors(comments, &self.config.bot_accounts);
        tracing::debug!(removed = before - comments.len(), "Bot comments filtered");
        Ok(comments)
    }

    async fn find_comments_of_interest(
        &self,
        comments: Vec<FlatComment>,
    ) -> Result<Vec<FlatComment>, ApplicationError> {
        let bodies: Vec<&str> = comments.iter().map(|c| c.body.as_str()).collect();
        let decisions = self
            .classifier
            .classify(&bodies, &self.config.comment_prompt, self.config.comment_match)
            .await
            .map_err(|e| ApplicationError::inference("comment interest", e))?;

        Ok(comments
            .into_iter()
            .zip(decisions)
            .filter_map(|(comment, keep)| keep.then_some(comment))
            .collect())
    }

    async fn draft_replies(
        &self,
        comments: Vec<FlatComment>,
    ) -> Result<Vec<ReplyCandidate>, ApplicationError> {
        let bodies: Vec<&str> = comments.iter().map(|c| c.body.as_str()).collect();
        let replies = self
            .generator
            .generate(&bodies, &self.config.reply_prompt)
            .await
            .map_err(|e| ApplicationError::inference("reply generation", e))?;

        Ok(comments
            .into_iter()
            .zip(replies)
            .map(|(comment, reply)| ReplyCandidate {
                comment_id: comment.id,
                comment_body: comment.body,
                reply,
            })
            .collect())
    }

    /// 人工确认后发送，每次发送后等待 `post_delay`
    async fn deliver_replies(&self, report: &mut ScoutReport) {
        for candidate in &report.candidates {
            if !self.approver.approve(candidate).await {
                tracing::info!(comment_id = %candidate.comment_id, "Reply rejected");
                report.replies_rejected += 1;
                continue;
            }

            match self
                .platform
                .post_reply(&candidate.comment_id, &candidate.reply)
                .await
            {
                Ok(reply_id) => {
                    tracing::info!(
                        comment_id = %candidate.comment_id,
                        reply_id = %reply_id,
                        "Reply posted"
                    );
                    report.replies_posted += 1;
                }
                Err(e) => {
                    tracing::error!(comment_id = %candidate.comment_id, error = %e, "Failed to post reply");
                    report.post_failures += 1;
                }
            }

            if !self.config.post_delay.is_zero() {
                tokio::time::sleep(self.config.post_delay).await;
            }
        }
    }
}
