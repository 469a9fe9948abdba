//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod inference_engine;
mod platform;
mod reply_approver;

pub use inference_engine::{
    ChatMessage, InferenceEnginePort, InferenceError, InferenceRequest, InferenceResponse, Role,
    SamplingParams,
};
pub use platform::{PlatformError, PlatformPort};
pub use reply_approver::{ReplyApproverPort, ReplyCandidate};
