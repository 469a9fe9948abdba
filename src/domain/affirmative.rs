//! Affirmative Matching - 将模型的 Yes/No 回答归约为布尔值
//!
//! 两种规则并存：
//! - `Substring`: 小写后的全文包含 "yes"（帖子标题分类使用）
//! - `FirstToken`: 第一个空白分隔的词小写后严格等于 "yes"（评论分类使用）
//!
//! 不匹配的一律视为否定，没有 "unknown" 状态

use serde::{Deserialize, Serialize};

/// 肯定词
pub const AFFIRMATIVE_TOKEN: &str = "yes";

/// 肯定回答匹配规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffirmativeMatch {
    /// 全文包含
    #[default]
    Substring,
    /// 首词精确匹配
    FirstToken,
}

impl AffirmativeMatch {
    pub fn is_affirmative(self, response: &str) -> bool {
        match self {
            Self::Substring => response.trim().to_lowercase().contains(AFFIRMATIVE_TOKEN),
            Self::FirstToken => response
                .split_whitespace()
                .next()
                .map(|token| token.to_lowercase() == AFFIRMATIVE_TOKEN)
                .unwrap_or(false),
        }
    }
}

impl std::fmt::Display for AffirmativeMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Substring => write!(f, "substring"),
            Self::FirstToken => write!(f, "first_token"),
        }
    }
}
