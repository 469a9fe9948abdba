//! Reply Generator - 批量生成回复

use std::sync::Arc;

use super::batch::{BatchCoordinator, BatchError};
use super::request_builder::build_request;
use crate::application::ports::SamplingParams;
use crate::domain::PromptTemplate;

pub struct ReplyGenerator {
    coordinator: Arc<BatchCoordinator>,
    model: String,
    params: SamplingParams,
}

impl ReplyGenerator {
    pub fn new(coordinator: Arc<BatchCoordinator>, model: impl Into<String>) -> Self {
        Self {
            coordinator,
            model: model.into(),
            params: SamplingParams::reply(),
        }
    }

    /// 返回模型原始输出，不做任何处理
    pub async fn generate<S: AsRef<str>>(
        &self,
        texts: &[S],
        template: &PromptTemplate,
    ) -> Result<Vec<String>, BatchError> {
        let requests: Vec<_> = texts
            .iter()
            .map(|text| build_request(template, text.as_ref(), &self.model, &self.params))
            .collect();

        let replies: Vec<String> = self
            .coordinator
            .dispatch_batch(&requests)
            .await?
            .into_iter()
            .map(|response| response.content)
            .collect();

        tracing::info!(count = replies.len(), "Replies generated");
        Ok(replies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::InferenceError;
    use crate::application::services::RetryPolicy;
    use crate::infrastructure::adapters::{FakeInferenceClient, FakeReply};
    use std::time::Duration;

    fn generator(engine: Arc<FakeInferenceClient>) -> ReplyGenerator {
        let coordinator = BatchCoordinator::new(engine, RetryPolicy::new(2, Duration::from_millis(1)), 0);
        ReplyGenerator::new(Arc::new(coordinator), "test-model")
    }

    #[tokio::test]
    async fn test_replies_are_raw_and_ordered() {
        let engine = Arc::new(FakeInferenceClient::new(|prompt: &str, _attempt: u32| {
            FakeReply::text(format!("  Write your senator about {}!\n", prompt))
                .after(Duration::from_millis(if prompt == "first" { 30 } else { 0 }))
        }));
        let template = PromptTemplate::new("{}").unwrap();
        let replies = generator(engine)
            .generate(&["first", "second"], &template)
            .await
            .unwrap();

        assert_eq!(
            replies,
            vec![
                "  Write your senator about first!\n".to_string(),
                "  Write your senator about second!\n".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_surfaces_batch_error() {
        let engine = Arc::new(FakeInferenceClient::new(|_prompt: &str, _attempt: u32| {
            FakeReply::fail(InferenceError::Timeout)
        }));
        let template = PromptTemplate::comment_reply();
        let err = generator(engine.clone())
            .generate(&["only"], &template)
            .await
            .unwrap_err();

        assert_eq!(err.index, 0);
        assert_eq!(engine.total_calls(), 2);
    }
}
