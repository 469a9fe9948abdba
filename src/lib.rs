//! Clogger - 话题帖子扫描与回复生成
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - 提示词模板、Yes/No 归约规则、评论树
//!
//! 应用层 (application/):
//! - Ports: InferenceEngine, Platform, ReplyApprover
//! - Services: 带重试的并发批量推理派发，分类与回复生成
//! - Pipeline: 帖子筛选 → 评论筛选 → 回复生成 → 确认发送
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: OpenAI 兼容推理客户端、Reddit 客户端、测试用 Fake 客户端
//! - Approval: 终端确认

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
