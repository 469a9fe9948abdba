//! Prompt Templates - 提示词模板
//!
//! 模板包含一个 `{}` 占位符，渲染时原样替换为输入文本（不转义、不截断）

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 模板占位符
pub const PLACEHOLDER: &str = "{}";

/// 判断帖子标题是否与主题相关
pub const DEFAULT_THREAD_INTEREST_PROMPT: &str = "\
You are an attentive social media moderator. From the title of a discussion thread alone, \
decide whether the thread will clearly discuss the US Supreme Court or any of its justices.
Answer with exactly one word, 'Yes' or 'No'.
Title: {}
Answer:";

/// 判断评论是否与主题相关
pub const DEFAULT_COMMENT_INTEREST_PROMPT: &str = "\
You are a careful political analyst. Decide whether the following comment talks about \
judicial ethics, corruption, congressional oversight, or checks and balances.
Answer with exactly one word, 'Yes' or 'No'.
Comment: {}
Answer:";

/// 生成回复
pub const DEFAULT_COMMENT_REPLY_PROMPT: &str = "\
You are a friendly, well-read forum user. You want readers to know that Congress has the \
constitutional authority to regulate the federal judiciary, and that this is one of the few \
topics with support from both parties. Write like a casual social media reply: at most two \
short sentences, matching the emotional tone of the person you answer. Respond to what they \
care about without quoting or addressing them directly, and nudge them to contact their \
Representative and Senators.
Output only the text of the reply.

Comment: {}
Reply:";

/// 模板错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("Prompt template has no '{{}}' placeholder")]
    MissingPlaceholder,
}

/// 提示词模板
///
/// 不变量: 至少包含一个 `{}` 占位符；渲染只替换第一个
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PromptTemplate(String);

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self, PromptError> {
        let template = template.into();
        if !template.contains(PLACEHOLDER) {
            return Err(PromptError::MissingPlaceholder);
        }
        Ok(Self(template))
    }

    /// 用输入文本填充占位符
    pub fn render(&self, text: &str) -> String {
        self.0.replacen(PLACEHOLDER, text, 1)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn thread_interest() -> Self {
        Self(DEFAULT_THREAD_INTEREST_PROMPT.to_string())
    }

    pub fn comment_interest() -> Self {
        Self(DEFAULT_COMMENT_INTEREST_PROMPT.to_string())
    }

    pub fn comment_reply() -> Self {
        Self(DEFAULT_COMMENT_REPLY_PROMPT.to_string())
    }
}

impl TryFrom<String> for PromptTemplate {
    type Error = PromptError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PromptTemplate> for String {
    fn from(value: PromptTemplate) -> Self {
        value.0
    }
}

impl std::fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
