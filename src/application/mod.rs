//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（InferenceEngine、Platform、ReplyApprover）
//! - services: 请求构造、重试、批量派发、分类与回复生成
//! - pipeline: 完整的扫描流水线
//! - error: 应用层错误定义

pub mod error;
pub mod pipeline;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use pipeline::{PipelineConfig, ScoutPipeline, ScoutReport};

pub use ports::{
    ChatMessage, InferenceEnginePort, InferenceError, InferenceRequest, InferenceResponse,
    PlatformError, PlatformPort, ReplyApproverPort, ReplyCandidate, Role, SamplingParams,
};

pub use services::{
    build_request, retry_with_policy, BatchCoordinator, BatchError, Classifier, DispatchError,
    ReplyGenerator, RetryPolicy, RetryingDispatcher,
};
