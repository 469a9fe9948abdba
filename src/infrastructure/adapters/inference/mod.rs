//! Inference Adapter - 推理引擎实现

mod fake_inference_client;
mod http_inference_client;

pub use fake_inference_client::{FakeInferenceClient, FakeReply};
pub use http_inference_client::*;
