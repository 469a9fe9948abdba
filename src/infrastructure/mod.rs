//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod adapters;
pub mod approval;

pub use adapters::{
    FakeInferenceClient, FakeReply, HttpInferenceClient, HttpInferenceClientConfig, RedditClient,
    RedditClientConfig,
};
pub use approval::{AutoApprover, ConsoleApprover};
