//! Domain Layer - 领域层
//!
//! - prompt: 提示词模板
//! - affirmative: Yes/No 回答归约规则
//! - thread: 帖子、评论树及展平

pub mod affirmative;
pub mod prompt;
pub mod thread;

pub use affirmative::AffirmativeMatch;
pub use prompt::{PromptError, PromptTemplate};
pub use thread::{
    filter_bot_authors, flatten_comment_tree, CommentNode, FlatComment, Submission,
    DELETED_AUTHOR,
};
