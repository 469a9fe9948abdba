//! Reddit Client - 通过 Reddit OAuth API 实现 PlatformPort
//!
//! 认证: 脚本类应用的 password grant，token 缓存到过期前一分钟
//!
//! 使用的接口:
//! - GET  /r/{subreddit}/new
//! - GET  /comments/{id}?sort=top
//! - GET  /api/morechildren
//! - POST /api/comment

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::listing::{
    attach_more_children, comment_tree_from_listing, submissions_from_listing, CommentReply,
    Listing, MoreChildrenReply, MoreStub, TokenReply,
};
use crate::application::ports::{PlatformError, PlatformPort};
use crate::domain::{CommentNode, Submission};

/// morechildren 每次最多请求的 ID 数
const MORE_CHILDREN_BATCH: usize = 100;
/// 展开 "load more" 的最大轮数
const MAX_EXPANSION_ROUNDS: usize = 32;
/// 提前刷新 token 的时间
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Reddit 客户端配置
#[derive(Debug, Clone)]
pub struct RedditClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
    /// OAuth API 地址
    pub api_base: String,
    /// token 接口地址
    pub token_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for RedditClientConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            username: String::new(),
            password: String::new(),
            user_agent: "clogger/0.1".to_string(),
            api_base: "https://oauth.reddit.com".to_string(),
            token_url: "https://www.reddit.com/api/v1/access_token".to_string(),
            timeout_secs: 30,
        }
    }
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }
}

/// Reddit 客户端
pub struct RedditClient {
    client: Client,
    config: RedditClientConfig,
    token: RwLock<Option<AccessToken>>,
}

impl RedditClient {
    pub fn new(config: RedditClientConfig) -> Result<Self, PlatformError> {
        for (name, value) in [
            ("client_id", &config.client_id),
            ("client_secret", &config.client_secret),
            ("username", &config.username),
            ("password", &config.password),
        ] {
            if value.is_empty() {
                return Err(PlatformError::AuthError(format!("Reddit {} is not set", name)));
            }
        }

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PlatformError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            config,
            token: RwLock::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base.trim_end_matches('/'), path)
    }

    /// 获取有效的 access token，必要时刷新
    async fn access_token(&self) -> Result<String, PlatformError> {
        if let Some(token) = self.token.read().await.as_ref() {
            if token.is_fresh() {
                return Ok(token.value.clone());
            }
        }

        let mut guard = self.token.write().await;
        if let Some(token) = guard.as_ref() {
            if token.is_fresh() {
                return Ok(token.value.clone());
            }
        }

        tracing::debug!(username = %self.config.username, "Requesting Reddit access token");
        let response = self
            .client
            .post(&self.config.token_url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", self.config.username.as_str()),
                ("password", self.config.password.as_str()),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlatformError::AuthError(format!("HTTP {}", status)));
        }

        let reply: TokenReply = response
            .json()
            .await
            .map_err(|e| PlatformError::InvalidResponse(e.to_string()))?;
        let value = match (reply.access_token, reply.error) {
            (Some(value), _) => value,
            (None, Some(error)) => return Err(PlatformError::AuthError(error)),
            (None, None) => {
                return Err(PlatformError::AuthError("No access token in reply".to_string()))
            }
        };

        tracing::info!(expires_in = reply.expires_in, "Reddit access token acquired");
        *guard = Some(AccessToken {
            value: value.clone(),
            expires_at: Instant::now() + Duration::from_secs(reply.expires_in),
        });
        Ok(value)
    }

    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response, PlatformError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                // 强制下次重新获取 token
                *self.token.write().await = None;
                Err(PlatformError::AuthError(format!("HTTP {}: {}", status, error_text)))
            }
            StatusCode::NOT_FOUND => Err(PlatformError::NotFound(error_text)),
            _ => Err(PlatformError::ServiceError(format!("HTTP {}: {}", status, error_text))),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, PlatformError> {
        let token = self.access_token().await?;
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .query(query)
            .query(&[("raw_json", "1")])
            .send()
            .await
            .map_err(map_transport_error)?;

        self.check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| PlatformError::InvalidResponse(format!("{}: {}", path, e)))
    }

    /// 展开所有 "load more"
    async fn expand_more(
        &self,
        submission_id: &str,
        tree: &mut Vec<CommentNode>,
        mut stubs: Vec<MoreStub>,
    ) -> Result<(), PlatformError> {
        let link_id = format!("t3_{}", submission_id);

        for round in 0..MAX_EXPANSION_ROUNDS {
            if stubs.is_empty() {
                return Ok(());
            }

            let ids: Vec<String> = stubs.drain(..).flat_map(|stub| stub.children).collect();
            tracing::debug!(submission_id = %submission_id, round, ids = ids.len(), "Expanding more comments");

            for chunk in ids.chunks(MORE_CHILDREN_BATCH) {
                let reply: MoreChildrenReply = self
                    .get_json(
                        "/api/morechildren",
                        &[
                            ("api_type", "json".to_string()),
                            ("link_id", link_id.clone()),
                            ("children", chunk.join(",")),
                            ("sort", "top".to_string()),
                        ],
                    )
                    .await?;

                if !reply.json.errors.is_empty() {
                    return Err(PlatformError::ServiceError(format!(
                        "morechildren: {:?}",
                        reply.json.errors
                    )));
                }
                let things = reply.json.data.map(|d| d.things).unwrap_or_default();
                stubs.extend(attach_more_children(tree, things)?);
            }
        }

        if !stubs.is_empty() {
            tracing::warn!(
                submission_id = %submission_id,
                remaining = stubs.len(),
                "Stopped expanding more comments"
            );
        }
        Ok(())
    }
}

fn map_transport_error(e: reqwest::Error) -> PlatformError {
    if e.is_connect() {
        PlatformError::NetworkError(format!("Cannot connect to Reddit: {}", e))
    } else {
        PlatformError::NetworkError(e.to_string())
    }
}

#[async_trait]
impl PlatformPort for RedditClient {
    async fn list_new_submissions(
        &self,
        community: &str,
        limit: u32,
    ) -> Result<Vec<Submission>, PlatformError> {
        let listing: Listing = self
            .get_json(&format!("/r/{}/new", community), &[("limit", limit.to_string())])
            .await?;
        let submissions = submissions_from_listing(listing)?;

        tracing::info!(community = %community, count = submissions.len(), "Fetched new submissions");
        Ok(submissions)
    }

    async fn fetch_comment_tree(&self, submission_id: &str) -> Result<Vec<CommentNode>, PlatformError> {
        // 返回 [帖子 Listing, 评论 Listing]
        let listings: Vec<Listing> = self
            .get_json(
                &format!("/comments/{}", submission_id),
                &[("sort", "top".to_string())],
            )
            .await?;
        let comments = listings.into_iter().nth(1).ok_or_else(|| {
            PlatformError::InvalidResponse("Comment listing missing".to_string())
        })?;

        let mut stubs = Vec::new();
        let mut tree = comment_tree_from_listing(comments, 0, &mut stubs)?;
        self.expand_more(submission_id, &mut tree, stubs).await?;

        tracing::info!(
            submission_id = %submission_id,
            comments = tree.iter().map(CommentNode::count).sum::<usize>(),
            "Fetched comment tree"
        );
        Ok(tree)
    }

    async fn post_reply(&self, comment_id: &str, text: &str) -> Result<String, PlatformError> {
        let token = self.access_token().await?;
        let thing_id = format!("t1_{}", comment_id);
        let response = self
            .client
            .post(self.url("/api/comment"))
            .bearer_auth(token)
            .form(&[
                ("api_type", "json"),
                ("thing_id", thing_id.as_str()),
                ("text", text),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;

        let reply: CommentReply = self
            .check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| PlatformError::InvalidResponse(e.to_string()))?;
        reply.into_comment_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RedditClientConfig {
        RedditClientConfig {
            client_id: "id".into(),
            client_secret: "secret".into(),
            username: "user".into(),
            password: "pass".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let mut config = config();
        config.password = String::new();
        assert!(matches!(
            RedditClient::new(config),
            Err(PlatformError::AuthError(msg)) if msg.contains("password")
        ));
    }

    #[test]
    fn test_url_join() {
        let mut config = config();
        config.api_base = "https://oauth.reddit.com/".into();
        let client = RedditClient::new(config).unwrap();
        assert_eq!(client.url("/r/politics/new"), "https://oauth.reddit.com/r/politics/new");
    }

    #[test]
    fn test_token_freshness() {
        let fresh = AccessToken {
            value: "t".into(),
            expires_at: Instant::now() + Duration::from_secs(3600),
        };
        let stale = AccessToken {
            value: "t".into(),
            expires_at: Instant::now() + Duration::from_secs(30),
        };
        assert!(fresh.is_fresh());
        assert!(!stale.is_fresh());
    }
}
