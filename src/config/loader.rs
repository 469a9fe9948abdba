//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `CLOGGER_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `CLOGGER_INFERENCE__BASE_URL=http://127.0.0.1:8000/v1`
/// - `CLOGGER_DISPATCH__MAX_CONCURRENT=4`
/// - `CLOGGER_REDDIT__CLIENT_SECRET=...`
/// - `CLOGGER_PIPELINE__DRY_RUN=false`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("inference.base_url", "http://localhost:8000/v1")?
        .set_default("inference.model", "gpt-3.5-turbo")?
        .set_default("inference.timeout_secs", 60)?
        .set_default("dispatch.max_attempts", 3)?
        .set_default("dispatch.retry_delay_ms", 5000)?
        .set_default("dispatch.max_concurrent", 8)?
        .set_default("reddit.user_agent", "clogger/0.1")?
        .set_default("reddit.subreddit", "politics")?
        .set_default("reddit.submission_limit", 50)?
        .set_default("pipeline.dry_run", true)?
        .set_default("pipeline.post_delay_secs", 10)?
        .set_default("pipeline.thread_match", "substring")?
        .set_default("pipeline.comment_match", "first_token")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 例如: CLOGGER_REDDIT__SUBREDDIT=scotus
    builder = builder.add_source(
        Environment::with_prefix("CLOGGER")
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("pipeline.bot_accounts")
            .try_parsing(true),
    );

    // 4. 构建配置
    let config = builder.build()?;

    // 5. 反序列化为 AppConfig
    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    // 6. 验证配置
    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.inference.base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Inference URL cannot be empty".to_string(),
        ));
    }

    if config.inference.model.is_empty() {
        return Err(ConfigError::ValidationError(
            "Model cannot be empty".to_string(),
        ));
    }

    if config.dispatch.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "max_attempts must be at least 1".to_string(),
        ));
    }

    if config.reddit.subreddit.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Subreddit cannot be empty".to_string(),
        ));
    }

    if !(1..=100).contains(&config.reddit.submission_limit) {
        return Err(ConfigError::ValidationError(
            "submission_limit must be between 1 and 100".to_string(),
        ));
    }

    Ok(())
}

fn mask(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "****"
    }
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Inference URL: {}", config.inference.base_url);
    tracing::info!("Inference API Key: {}", mask(config.inference.api_key.as_deref().unwrap_or("")));
    tracing::info!("Model: {}", config.inference.model);
    tracing::info!("Max Attempts: {}", config.dispatch.max_attempts);
    tracing::info!("Retry Delay: {}ms", config.dispatch.retry_delay_ms);
    if config.dispatch.max_concurrent == 0 {
        tracing::info!("Max Concurrent: unbounded");
    } else {
        tracing::info!("Max Concurrent: {}", config.dispatch.max_concurrent);
    }
    tracing::info!("Subreddit: r/{}", config.reddit.subreddit);
    tracing::info!("Reddit User: {}", config.reddit.username);
    tracing::info!("Reddit Secret: {}", mask(&config.reddit.client_secret));
    tracing::info!("Dry Run: {}", config.pipeline.dry_run);
    tracing::info!("Bot Accounts: {:?}", config.pipeline.bot_accounts);
    tracing::info!(
        "Match Rules: thread={}, comment={}",
        config.pipeline.thread_match,
        config.pipeline.comment_match
    );
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AffirmativeMatch;
    use std::io::Write;
    use std::sync::Mutex;

    /// 环境变量是进程级的，读取配置的测试需串行
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_attempts() {
        let mut config = AppConfig::default();
        config.dispatch.max_attempts = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_model() {
        let mut config = AppConfig::default();
        config.inference.model = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_submission_limit() {
        let mut config = AppConfig::default();
        config.reddit.submission_limit = 500;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[inference]
model = "local-instruct"

[dispatch]
max_concurrent = 2
retry_delay_ms = 100

[reddit]
subreddit = "scotus"

[pipeline]
dry_run = false
bot_accounts = ["SomeBot"]
thread_match = "first_token"

[prompts]
thread_interest = "Is this about courts? {{}}"
"#
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.inference.model, "local-instruct");
        assert_eq!(config.inference.base_url, "http://localhost:8000/v1");
        assert_eq!(config.dispatch.max_concurrent, 2);
        assert_eq!(config.dispatch.max_attempts, 3);
        assert_eq!(config.reddit.subreddit, "scotus");
        assert!(!config.pipeline.dry_run);
        assert_eq!(config.pipeline.bot_accounts, vec!["SomeBot".to_string()]);
        assert_eq!(config.pipeline.thread_match, AffirmativeMatch::FirstToken);
        assert_eq!(config.prompts.thread_interest.render("x"), "Is this about courts? x");
    }

    #[test]
    fn test_env_overrides_file_and_defaults() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[dispatch]
max_concurrent = 2

[pipeline]
dry_run = true
bot_accounts = ["SomeBot"]
"#
        )
        .unwrap();

        let vars = [
            ("CLOGGER_PIPELINE__BOT_ACCOUNTS", "BotA,botb"),
            ("CLOGGER_DISPATCH__MAX_CONCURRENT", "4"),
            ("CLOGGER_PIPELINE__DRY_RUN", "false"),
            ("CLOGGER_REDDIT__PASSWORD", "12345"),
        ];
        for (key, value) in vars {
            std::env::set_var(key, value);
        }
        let result = load_config_from_path(Some(file.path()));
        for (key, _) in vars {
            std::env::remove_var(key);
        }

        let config = result.unwrap();
        assert_eq!(
            config.pipeline.bot_accounts,
            vec!["BotA".to_string(), "botb".to_string()]
        );
        assert_eq!(config.dispatch.max_concurrent, 4);
        assert!(!config.pipeline.dry_run);
        // 数字形式的密码仍保持字符串
        assert_eq!(config.reddit.password, "12345");
        assert_eq!(config.dispatch.max_attempts, 3);
    }

    #[test]
    fn test_prompt_without_placeholder_rejected() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[prompts]\ncomment_reply = \"no slot\"").unwrap();

        assert!(matches!(
            load_config_from_path(Some(file.path())),
            Err(ConfigError::ParseError(_))
        ));
    }
}
