//! Application Services - LLM 派发子系统
//!
//! request_builder → retry（单请求重试）→ batch（并发批量派发）→ classifier / reply_generator

mod batch;
mod classifier;
mod reply_generator;
mod request_builder;
mod retry;

pub use batch::{BatchCoordinator, BatchError};
pub use classifier::Classifier;
pub use reply_generator::ReplyGenerator;
pub use request_builder::build_request;
pub use retry::{retry_with_policy, DispatchError, RetryPolicy, RetryingDispatcher};
