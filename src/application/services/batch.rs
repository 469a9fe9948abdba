//! Batch Coordinator - 并发派发一批推理请求
//!
//! 所有请求在当前任务上并发执行（不 spawn），结果顺序与输入顺序一一对应。
//! 信号量限制同时在途的请求数；`max_concurrent = 0` 表示不限制。
//! 任意一个请求重试耗尽即整批失败，其余在途请求随之被丢弃

use std::sync::Arc;
use std::time::Instant;

use futures_util::future::{join_all, try_join_all};
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::Instrument;
use uuid::Uuid;

use super::retry::{DispatchError, RetryPolicy, RetryingDispatcher};
use crate::application::ports::{InferenceEnginePort, InferenceRequest, InferenceResponse};

/// 批量派发失败
#[derive(Debug, Error)]
#[error("Batch request #{index} failed")]
pub struct BatchError {
    /// 失败请求在输入中的位置
    pub index: usize,
    #[source]
    pub source: DispatchError,
}

/// 批量协调器
pub struct BatchCoordinator {
    dispatcher: RetryingDispatcher,
    limiter: Option<Arc<Semaphore>>,
}

impl BatchCoordinator {
    pub fn new(
        engine: Arc<dyn InferenceEnginePort>,
        policy: RetryPolicy,
        max_concurrent: usize,
    ) -> Self {
        Self::with_dispatcher(RetryingDispatcher::new(engine, policy), max_concurrent)
    }

    pub fn with_dispatcher(dispatcher: RetryingDispatcher, max_concurrent: usize) -> Self {
        let limiter = (max_concurrent > 0).then(|| Arc::new(Semaphore::new(max_concurrent)));
        Self {
            dispatcher,
            limiter,
        }
    }

    /// 派发整批请求，全部成功才返回
    ///
    /// 返回值第 i 项对应第 i 个请求
    pub async fn dispatch_batch(
        &self,
        requests: &[InferenceRequest],
    ) -> Result<Vec<InferenceResponse>, BatchError> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let batch_id = Uuid::new_v4();
        let started = Instant::now();
        tracing::info!(batch_id = %batch_id, size = requests.len(), "Dispatching batch");

        let dispatches = requests.iter().enumerate().map(|(index, request)| async move {
            self.dispatch_one(batch_id, index, request)
                .await
                .map_err(|source| BatchError { index, source })
        });

        match try_join_all(dispatches).await {
            Ok(responses) => {
                tracing::info!(
                    batch_id = %batch_id,
                    size = responses.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Batch completed"
                );
                Ok(responses)
            }
            Err(e) => {
                tracing::error!(
                    batch_id = %batch_id,
                    index = e.index,
                    error = %e.source,
                    "Batch aborted"
                );
                Err(e)
            }
        }
    }

    /// 派发整批请求并等待全部结束，逐项返回结果
    pub async fn dispatch_batch_settled(
        &self,
        requests: &[InferenceRequest],
    ) -> Vec<Result<InferenceResponse, DispatchError>> {
        if requests.is_empty() {
            return Vec::new();
        }

        let batch_id = Uuid::new_v4();
        tracing::info!(batch_id = %batch_id, size = requests.len(), "Dispatching settled batch");

        let results = join_all(
            requests
                .iter()
                .enumerate()
                .map(|(index, request)| self.dispatch_one(batch_id, index, request)),
        )
        .await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        tracing::info!(
            batch_id = %batch_id,
            size = results.len(),
            failed,
            "Settled batch completed"
        );
        results
    }

    async fn dispatch_one(
        &self,
        batch_id: Uuid,
        index: usize,
        request: &InferenceRequest,
    ) -> Result<InferenceResponse, DispatchError> {
        let span = tracing::debug_span!("dispatch", batch_id = %batch_id, index);
        async {
            // 信号量从不关闭，acquire 不会失败
            let _permit = match &self.limiter {
                Some(limiter) => limiter.acquire().await.ok(),
                None => None,
            };
            let target = format!("{}#{}", request.model(), index);
            self.dispatcher.dispatch_labeled(request, &target).await
        }
        .instrument(span)
        .await
    }
}
