//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::time::Duration;

use crate::application::services::RetryPolicy;
use crate::application::PipelineConfig;
use crate::domain::{AffirmativeMatch, PromptTemplate};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 推理服务配置
    #[serde(default)]
    pub inference: InferenceConfig,

    /// 批量派发配置
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Reddit 配置
    #[serde(default)]
    pub reddit: RedditConfig,

    /// 流水线配置
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// 提示词配置
    #[serde(default)]
    pub prompts: PromptsConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// 组装流水线配置
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            community: self.reddit.subreddit.clone(),
            submission_limit: self.reddit.submission_limit,
            dry_run: self.pipeline.dry_run,
            bot_accounts: self.pipeline.bot_accounts.clone(),
            post_delay: Duration::from_secs(self.pipeline.post_delay_secs),
            thread_match: self.pipeline.thread_match,
            comment_match: self.pipeline.comment_match,
            thread_prompt: self.prompts.thread_interest.clone(),
            comment_prompt: self.prompts.comment_interest.clone(),
            reply_prompt: self.prompts.comment_reply.clone(),
        }
    }
}

/// 推理服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct InferenceConfig {
    /// OpenAI 兼容服务的基础 URL
    #[serde(default = "default_inference_url")]
    pub base_url: String,

    /// API Key（本地服务可不设）
    #[serde(default)]
    pub api_key: Option<String>,

    /// 模型名称
    #[serde(default = "default_model")]
    pub model: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_inference_timeout")]
    pub timeout_secs: u64,
}

fn default_inference_url() -> String {
    "http://localhost:8000/v1".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_inference_timeout() -> u64 {
    60
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: default_inference_url(),
            api_key: None,
            model: default_model(),
            timeout_secs: default_inference_timeout(),
        }
    }
}

/// 批量派发配置
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// 每个请求的最大尝试次数
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// 重试间隔（毫秒）
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// 最大并发请求数，0 表示不限制
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    5000
}

fn default_max_concurrent() -> usize {
    8
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

impl DispatchConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.retry_delay_ms))
    }
}

/// Reddit 配置
#[derive(Debug, Clone, Deserialize)]
pub struct RedditConfig {
    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub client_secret: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// 要扫描的 subreddit
    #[serde(default = "default_subreddit")]
    pub subreddit: String,

    /// 每次扫描的帖子数（1-100）
    #[serde(default = "default_submission_limit")]
    pub submission_limit: u32,
}

fn default_user_agent() -> String {
    "clogger/0.1".to_string()
}

fn default_subreddit() -> String {
    "politics".to_string()
}

fn default_submission_limit() -> u32 {
    50
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            username: String::new(),
            password: String::new(),
            user_agent: default_user_agent(),
            subreddit: default_subreddit(),
            submission_limit: default_submission_limit(),
        }
    }
}

/// 流水线配置
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSettings {
    /// 只打印回复，不发送
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,

    /// 忽略的机器人账号（大小写不敏感）
    #[serde(default = "default_bot_accounts")]
    pub bot_accounts: Vec<String>,

    /// 每次发送后的等待时间（秒）
    #[serde(default = "default_post_delay")]
    pub post_delay_secs: u64,

    /// 帖子分类的匹配规则
    #[serde(default)]
    pub thread_match: AffirmativeMatch,

    /// 评论分类的匹配规则
    #[serde(default = "default_comment_match")]
    pub comment_match: AffirmativeMatch,
}

fn default_dry_run() -> bool {
    true
}

fn default_bot_accounts() -> Vec<String> {
    vec!["automoderator".to_string(), "autotldr".to_string()]
}

fn default_post_delay() -> u64 {
    10
}

fn default_comment_match() -> AffirmativeMatch {
    AffirmativeMatch::FirstToken
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            dry_run: default_dry_run(),
            bot_accounts: default_bot_accounts(),
            post_delay_secs: default_post_delay(),
            thread_match: AffirmativeMatch::Substring,
            comment_match: default_comment_match(),
        }
    }
}

/// 提示词配置
#[derive(Debug, Clone, Deserialize)]
pub struct PromptsConfig {
    #[serde(default = "PromptTemplate::thread_interest")]
    pub thread_interest: PromptTemplate,

    #[serde(default = "PromptTemplate::comment_interest")]
    pub comment_interest: PromptTemplate,

    #[serde(default = "PromptTemplate::comment_reply")]
    pub comment_reply: PromptTemplate,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            thread_interest: PromptTemplate::thread_interest(),
            comment_interest: PromptTemplate::comment_interest(),
            comment_reply: PromptTemplate::comment_reply(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
