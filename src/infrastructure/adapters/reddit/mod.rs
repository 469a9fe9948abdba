//! Reddit Adapter - 平台端口的 Reddit 实现

mod listing;
mod reddit_client;

pub use reddit_client::{RedditClient, RedditClientConfig};
