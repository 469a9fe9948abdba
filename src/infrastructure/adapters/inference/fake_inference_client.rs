//! Fake Inference Client - 用于测试的推理客户端
//!
//! 按脚本返回结果，不实际调用推理服务。
//! 脚本以 (prompt, 该 prompt 的第几次调用) 为输入，可返回文本、错误以及延迟

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::application::ports::{
    InferenceEnginePort, InferenceError, InferenceRequest, InferenceResponse,
};

/// 脚本化的单次响应
#[derive(Debug, Clone)]
pub struct FakeReply {
    outcome: Result<String, InferenceError>,
    delay: Duration,
}

impl FakeReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            outcome: Ok(content.into()),
            delay: Duration::ZERO,
        }
    }

    pub fn fail(error: InferenceError) -> Self {
        Self {
            outcome: Err(error),
            delay: Duration::ZERO,
        }
    }

    /// 延迟一段时间后再返回
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

type Script = dyn Fn(&str, u32) -> FakeReply + Send + Sync;

/// Fake Inference Client
pub struct FakeInferenceClient {
    script: Box<Script>,
    model: String,
    /// prompt -> 调用次数
    attempts: DashMap<String, u32>,
    total_calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    /// 成功返回的 prompt，按完成顺序
    completed: Mutex<Vec<String>>,
}

impl FakeInferenceClient {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&str, u32) -> FakeReply + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            model: "fake-model".to_string(),
            attempts: DashMap::new(),
            total_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            completed: Mutex::new(Vec::new()),
        }
    }

    /// 始终返回同一段文本
    pub fn always(content: impl Into<String>) -> Self {
        let content = content.into();
        Self::new(move |_prompt: &str, _attempt: u32| FakeReply::text(content.clone()))
    }

    /// 按 prompt 查表返回，未命中的 prompt 返回 `fallback`
    pub fn from_table<I, K, V>(table: I, fallback: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let table: std::collections::HashMap<String, String> = table
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let fallback = fallback.into();
        Self::new(move |prompt: &str, _attempt: u32| {
            FakeReply::text(table.get(prompt).cloned().unwrap_or_else(|| fallback.clone()))
        })
    }

    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, prompt: &str) -> u32 {
        self.attempts.get(prompt).map(|v| *v).unwrap_or(0)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn completion_order(&self) -> Vec<String> {
        self.completed
            .lock()
            .map(|completed| completed.clone())
            .unwrap_or_default()
    }
}

/// 请求结束（包括被取消）时减少在途计数
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl InferenceEnginePort for FakeInferenceClient {
    async fn complete(&self, request: &InferenceRequest) -> Result<InferenceResponse, InferenceError> {
        let prompt = request.prompt().to_string();
        let attempt = {
            let mut entry = self.attempts.entry(prompt.clone()).or_insert(0);
            *entry += 1;
            *entry
        };
        self.total_calls.fetch_add(1, Ordering::SeqCst);

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        let reply = (self.script)(&prompt, attempt);
        tracing::debug!(
            prompt_len = prompt.len(),
            attempt,
            delay_ms = reply.delay.as_millis() as u64,
            "FakeInferenceClient: returning scripted reply"
        );

        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }

        let content = reply.outcome?;
        if let Ok(mut completed) = self.completed.lock() {
            completed.push(prompt);
        }

        Ok(InferenceResponse {
            id: format!("fake-{}", uuid::Uuid::new_v4()),
            model: self.model.clone(),
            content,
            finish_reason: Some("stop".to_string()),
        })
    }
}
