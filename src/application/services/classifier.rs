//! Classifier - 批量 Yes/No 分类

use std::sync::Arc;

use super::batch::{BatchCoordinator, BatchError};
use super::request_builder::build_request;
use crate::application::ports::SamplingParams;
use crate::domain::{AffirmativeMatch, PromptTemplate};

/// 分类器
///
/// 每个文本构造一个请求，整体作为一批派发，再按规则把回答归约为布尔值
pub struct Classifier {
    coordinator: Arc<BatchCoordinator>,
    model: String,
    params: SamplingParams,
}

impl Classifier {
    pub fn new(coordinator: Arc<BatchCoordinator>, model: impl Into<String>) -> Self {
        Self {
            coordinator,
            model: model.into(),
            params: SamplingParams::classification(),
        }
    }

    /// 返回值与输入等长，第 i 项对应第 i 个文本
    pub async fn classify<S: AsRef<str>>(
        &self,
        texts: &[S],
        template: &PromptTemplate,
        rule: AffirmativeMatch,
    ) -> Result<Vec<bool>, BatchError> {
        let requests: Vec<_> = texts
            .iter()
            .map(|text| build_request(template, text.as_ref(), &self.model, &self.params))
            .collect();

        let responses = self.coordinator.dispatch_batch(&requests).await?;
        let decisions: Vec<bool> = responses
            .iter()
            .map(|response| rule.is_affirmative(&response.content))
            .collect();

        tracing::info!(
            total = decisions.len(),
            positive = decisions.iter().filter(|d| **d).count(),
            rule = %rule,
            "Classification finished"
        );
        Ok(decisions)
    }
}
