//! Retrying Dispatcher - 固定间隔的有界重试
//!
//! `retry_with_policy` 是通用的高阶函数，`RetryingDispatcher` 把它套在推理引擎上。
//! 所有失败都会重试；最后一次失败返回 `RetriesExhausted`，并保留最后一个错误作为 source

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::application::ports::{
    InferenceEnginePort, InferenceError, InferenceRequest, InferenceResponse,
};

/// 单个请求的派发错误
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{target}: gave up after {attempts} attempts")]
    RetriesExhausted {
        attempts: u32,
        target: String,
        #[source]
        source: InferenceError,
    },
}

impl DispatchError {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::RetriesExhausted { attempts, .. } => *attempts,
        }
    }

    /// 最后一次尝试的错误
    pub fn last_error(&self) -> &InferenceError {
        match self {
            Self::RetriesExhausted { source, .. } => source,
        }
    }
}

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最大尝试次数（含第一次），0 按 1 处理
    pub max_attempts: u32,
    /// 两次尝试之间的固定等待时间
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

/// 按策略执行 `op`，`op` 接收从 1 开始的尝试序号
pub async fn retry_with_policy<T, F, Fut>(
    policy: RetryPolicy,
    target: &str,
    mut op: F,
) -> Result<T, DispatchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, InferenceError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(target_name = %target, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) if attempt >= max_attempts => {
                tracing::error!(
                    target_name = %target,
                    attempts = attempt,
                    error = %error,
                    "Retries exhausted"
                );
                return Err(DispatchError::RetriesExhausted {
                    attempts: attempt,
                    target: target.to_string(),
                    source: error,
                });
            }
            Err(error) => {
                tracing::warn!(
                    target_name = %target,
                    attempt,
                    max_attempts,
                    error = %error,
                    "Attempt failed, retrying"
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
        }
    }
}

/// 带重试的单请求派发器
#[derive(Clone)]
pub struct RetryingDispatcher {
    engine: Arc<dyn InferenceEnginePort>,
    policy: RetryPolicy,
}

impl RetryingDispatcher {
    pub fn new(engine: Arc<dyn InferenceEnginePort>, policy: RetryPolicy) -> Self {
        Self { engine, policy }
    }

    pub async fn dispatch(
        &self,
        request: &InferenceRequest,
    ) -> Result<InferenceResponse, DispatchError> {
        self.dispatch_labeled(request, request.model()).await
    }

    /// 与 `dispatch` 相同，日志中使用给定的标签
    pub async fn dispatch_labeled(
        &self,
        request: &InferenceRequest,
        target: &str,
    ) -> Result<InferenceResponse, DispatchError> {
        let engine = self.engine.as_ref();
        retry_with_policy(self.policy, target, move |_attempt| engine.complete(request)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{ChatMessage, SamplingParams};
    use crate::infrastructure::adapters::{FakeInferenceClient, FakeReply};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1))
    }

    fn request(text: &str) -> InferenceRequest {
        InferenceRequest::new("test-model", vec![ChatMessage::user(text)], SamplingParams::default())
    }

    #[tokio::test]
    async fn test_succeeds_on_last_allowed_attempt() {
        let engine = Arc::new(FakeInferenceClient::new(|_prompt: &str, attempt: u32| {
            if attempt < 3 {
                FakeReply::fail(InferenceError::RateLimited("slow down".into()))
            } else {
                FakeReply::text("ok")
            }
        }));
        let dispatcher = RetryingDispatcher::new(engine.clone(), fast_policy(3));

        let response = dispatcher.dispatch(&request("hello")).await.unwrap();
        assert_eq!(response.content, "ok");
        assert_eq!(engine.calls_for("hello"), 3);
    }

    #[tokio::test]
    async fn test_first_success_stops_retrying() {
        let engine = Arc::new(FakeInferenceClient::always("fine"));
        let dispatcher = RetryingDispatcher::new(engine.clone(), fast_policy(5));

        dispatcher.dispatch(&request("hello")).await.unwrap();
        assert_eq!(engine.total_calls(), 1);
    }

    #[tokio::test]
    async fn test_always_failing_gives_up_after_exactly_max_attempts() {
        let engine = Arc::new(FakeInferenceClient::new(|_prompt: &str, attempt: u32| {
            FakeReply::fail(InferenceError::ServiceError(format!("boom {}", attempt)))
        }));
        let dispatcher = RetryingDispatcher::new(engine.clone(), fast_policy(3));

        let err = dispatcher.dispatch(&request("hello")).await.unwrap_err();
        assert!(matches!(err, DispatchError::RetriesExhausted { attempts: 3, .. }));
        assert_eq!(engine.calls_for("hello"), 3);

        // 保留最后一次的原始错误
        assert!(matches!(
            err.last_error(),
            InferenceError::ServiceError(msg) if msg == "boom 3"
        ));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let calls = AtomicU32::new(0);
        let result: Result<(), DispatchError> =
            retry_with_policy(fast_policy(0), "zero", |_attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(InferenceError::Timeout) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_attempt_numbers_are_sequential() {
        let mut seen = Vec::new();
        let value = retry_with_policy(fast_policy(4), "seq", |attempt| {
            seen.push(attempt);
            async move {
                if attempt == 4 {
                    Ok(attempt)
                } else {
                    Err(InferenceError::Timeout)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 4);
        assert_eq!(seen, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_fixed_delay_between_attempts() {
        let policy = RetryPolicy::new(3, Duration::from_millis(20));
        let started = std::time::Instant::now();
        let _: Result<(), DispatchError> =
            retry_with_policy(policy, "delay", |_attempt| async { Err(InferenceError::Timeout) })
                .await;

        // 两次等待，第三次失败后不再等待
        assert!(started.elapsed() >= Duration::from_millis(40));
    }
}
