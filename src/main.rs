//! Clogger - 话题帖子扫描与回复生成
//!
//! 流程: 拉取最新帖子 → 按标题分类 → 拉取评论树 → 按内容分类 → 生成回复 → 逐条确认后发送

use std::sync::Arc;

use clogger::application::{BatchCoordinator, Classifier, ReplyGenerator, ScoutPipeline};
use clogger::application::ports::InferenceEnginePort;
use clogger::config::{load_config, print_config, LogConfig};
use clogger::infrastructure::adapters::{
    HttpInferenceClient, HttpInferenceClientConfig, RedditClient, RedditClientConfig,
};
use clogger::infrastructure::approval::ConsoleApprover;

fn init_tracing(log: &LogConfig) {
    let log_filter = format!("{},clogger={}", log.level, log.level);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if log.json {
        tracing_subscriber::fmt().json().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    init_tracing(&config.log);

    tracing::info!("Clogger - thread scout");
    print_config(&config);

    // 创建推理客户端
    let mut inference_config = HttpInferenceClientConfig::new(&config.inference.base_url)
        .with_timeout(config.inference.timeout_secs);
    if let Some(api_key) = &config.inference.api_key {
        inference_config = inference_config.with_api_key(api_key);
    }
    let engine = Arc::new(HttpInferenceClient::new(inference_config)?);
    if !engine.health_check().await {
        tracing::warn!(url = %config.inference.base_url, "Inference service health check failed");
    }

    // 创建 Reddit 客户端
    let reddit_config = RedditClientConfig {
        client_id: config.reddit.client_id.clone(),
        client_secret: config.reddit.client_secret.clone(),
        username: config.reddit.username.clone(),
        password: config.reddit.password.clone(),
        user_agent: config.reddit.user_agent.clone(),
        ..Default::default()
    };
    let platform = Arc::new(RedditClient::new(reddit_config)?);

    // 分类器与回复生成共享同一个批量协调器（共享并发上限）
    let coordinator = Arc::new(BatchCoordinator::new(
        engine,
        config.dispatch.retry_policy(),
        config.dispatch.max_concurrent,
    ));
    let classifier = Classifier::new(coordinator.clone(), &config.inference.model);
    let generator = ReplyGenerator::new(coordinator, &config.inference.model);

    let pipeline = ScoutPipeline::new(
        config.pipeline_config(),
        platform,
        classifier,
        generator,
        Arc::new(ConsoleApprover::stdio()),
    );

    let report = pipeline.run().await?;

    tracing::info!(
        threads_of_interest = report.threads_of_interest.len(),
        replies_drafted = report.candidates.len(),
        replies_posted = report.replies_posted,
        "Done"
    );

    Ok(())
}
