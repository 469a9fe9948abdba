//! Reddit JSON 结构与评论树转换
//!
//! Reddit 的 Listing 中每个元素为 `{"kind": "...", "data": {...}}`：
//! - t1: 评论
//! - t3: 帖子
//! - more: "load more" 占位，children 为未展开的评论 ID

use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::application::ports::PlatformError;
use crate::domain::{CommentNode, Submission};

pub(crate) const KIND_COMMENT: &str = "t1";
pub(crate) const KIND_LINK: &str = "t3";
pub(crate) const KIND_MORE: &str = "more";

#[derive(Debug, Deserialize)]
pub(crate) struct Listing {
    pub data: ListingData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListingData {
    #[serde(default)]
    pub children: Vec<RawThing>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawThing {
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

impl RawThing {
    pub fn parse<T: DeserializeOwned>(self) -> Result<T, PlatformError> {
        serde_json::from_value(self.data).map_err(|e| {
            PlatformError::InvalidResponse(format!("Malformed '{}' thing: {}", self.kind, e))
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LinkData {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentData {
    pub id: String,
    pub author: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub created_utc: f64,
    /// 没有回复时为空字符串，否则为 Listing
    #[serde(default)]
    pub replies: Value,
    /// morechildren 返回的扁平评论带有 parent_id（fullname）
    #[serde(default)]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MoreData {
    #[serde(default)]
    pub children: Vec<String>,
}

/// 评论树中未展开的 "load more"
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MoreStub {
    pub children: Vec<String>,
}

pub(crate) fn timestamp(created_utc: f64) -> DateTime<Utc> {
    Utc.timestamp_opt(created_utc as i64, 0)
        .single()
        .unwrap_or_default()
}

impl CommentData {
    fn into_node(self, depth: usize) -> CommentNode {
        CommentNode::new(
            self.id,
            self.author,
            timestamp(self.created_utc),
            self.body,
            depth,
        )
    }
}

pub(crate) fn submissions_from_listing(listing: Listing) -> Result<Vec<Submission>, PlatformError> {
    listing
        .data
        .children
        .into_iter()
        .filter(|thing| thing.kind == KIND_LINK)
        .map(|thing| {
            let link: LinkData = thing.parse()?;
            Ok(Submission {
                id: link.id,
                title: link.title,
            })
        })
        .collect()
}

/// 将评论 Listing 转为评论树，同时收集所有 "more" 占位
pub(crate) fn comment_tree_from_listing(
    listing: Listing,
    depth: usize,
    stubs: &mut Vec<MoreStub>,
) -> Result<Vec<CommentNode>, PlatformError> {
    let mut nodes = Vec::new();

    for thing in listing.data.children {
        match thing.kind.as_str() {
            KIND_COMMENT => {
                let mut data: CommentData = thing.parse()?;
                let replies = std::mem::take(&mut data.replies);
                let mut node = data.into_node(depth);
                if replies.is_object() {
                    let listing: Listing = serde_json::from_value(replies).map_err(|e| {
                        PlatformError::InvalidResponse(format!("Malformed replies: {}", e))
                    })?;
                    node.replies = comment_tree_from_listing(listing, depth + 1, stubs)?;
                }
                nodes.push(node);
            }
            KIND_MORE => {
                let more: MoreData = thing.parse()?;
                if !more.children.is_empty() {
                    stubs.push(MoreStub {
                        children: more.children,
                    });
                }
            }
            _ => {}
        }
    }

    Ok(nodes)
}

/// morechildren 接口的响应
#[derive(Debug, Deserialize)]
pub(crate) struct MoreChildrenReply {
    pub json: MoreChildrenJson,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MoreChildrenJson {
    #[serde(default)]
    pub errors: Vec<Value>,
    pub data: Option<MoreChildrenData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MoreChildrenData {
    #[serde(default)]
    pub things: Vec<RawThing>,
}

/// 查找指定 ID 的评论（迭代）
fn find_node_mut<'a>(nodes: &'a mut [CommentNode], id: &str) -> Option<&'a mut CommentNode> {
    let mut stack: Vec<&'a mut CommentNode> = nodes.iter_mut().collect();
    while let Some(node) = stack.pop() {
        if node.id == id {
            return Some(node);
        }
        stack.extend(node.replies.iter_mut());
    }
    None
}

/// 把 morechildren 返回的扁平评论挂回树上，返回新的 "more" 占位
///
/// 父评论总是先于子评论出现，按顺序挂载即可
pub(crate) fn attach_more_children(
    tree: &mut Vec<CommentNode>,
    things: Vec<RawThing>,
) -> Result<Vec<MoreStub>, PlatformError> {
    let mut stubs = Vec::new();

    for thing in things {
        match thing.kind.as_str() {
            KIND_COMMENT => {
                let mut data: CommentData = thing.parse()?;
                let parent = data.parent_id.take().unwrap_or_default();

                if parent.starts_with("t3_") {
                    tree.push(data.into_node(0));
                } else if let Some(parent_node) =
                    find_node_mut(tree, parent.trim_start_matches("t1_"))
                {
                    let depth = parent_node.depth + 1;
                    parent_node.replies.push(data.into_node(depth));
                } else {
                    tracing::debug!(comment_id = %data.id, parent = %parent, "Orphan comment dropped");
                }
            }
            KIND_MORE => {
                let more: MoreData = thing.parse()?;
                if !more.children.is_empty() {
                    stubs.push(MoreStub {
                        children: more.children,
                    });
                }
            }
            _ => {}
        }
    }

    Ok(stubs)
}

/// 发表评论接口的响应
#[derive(Debug, Deserialize)]
pub(crate) struct CommentReply {
    pub json: CommentReplyJson,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentReplyJson {
    #[serde(default)]
    pub errors: Vec<Value>,
    pub data: Option<MoreChildrenData>,
}

impl CommentReply {
    /// 返回新评论 ID
    pub fn into_comment_id(self) -> Result<String, PlatformError> {
        if !self.json.errors.is_empty() {
            let errors: Vec<String> = self.json.errors.iter().map(Value::to_string).collect();
            return Err(PlatformError::ServiceError(errors.join(", ")));
        }

        let thing = self
            .json
            .data
            .and_then(|data| data.things.into_iter().next())
            .ok_or_else(|| PlatformError::InvalidResponse("No comment in reply".to_string()))?;
        let data: CommentData = thing.parse()?;
        Ok(data.id)
    }
}

/// OAuth token 接口的响应
///
/// 认证失败时 Reddit 仍可能返回 200，但只带 error 字段
#[derive(Debug, Deserialize)]
pub(crate) struct TokenReply {
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: u64,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMENTS_JSON: &str = r#"{
        "kind": "Listing",
        "data": {"children": [
            {"kind": "t1", "data": {
                "id": "c1", "author": "alice", "body": "top", "created_utc": 1700000000.0,
                "replies": {"kind": "Listing", "data": {"children": [
                    {"kind": "t1", "data": {"id": "c2", "author": null, "body": "nested",
                        "created_utc": 1700000100.0, "replies": ""}},
                    {"kind": "more", "data": {"id": "m1", "children": ["c5", "c6"]}}
                ]}}
            }},
            {"kind": "t1", "data": {"id": "c3", "author": "bob", "body": "second",
                "created_utc": 1700000200.0, "replies": ""}},
            {"kind": "more", "data": {"id": "m2", "children": ["c7"]}},
            {"kind": "more", "data": {"id": "_", "children": []}}
        ]}
    }"#;

    #[test]
    fn test_submissions_from_listing() {
        let listing: Listing = serde_json::from_str(
            r#"{"data": {"children": [
                {"kind": "t3", "data": {"id": "s1", "title": "Court news"}},
                {"kind": "t3", "data": {"id": "s2", "title": "Other"}}
            ]}}"#,
        )
        .unwrap();
        let submissions = submissions_from_listing(listing).unwrap();
        assert_eq!(submissions.len(), 2);
        assert_eq!(submissions[0].id, "s1");
        assert_eq!(submissions[0].title, "Court news");
    }

    #[test]
    fn test_comment_tree_and_more_stubs() {
        let listing: Listing = serde_json::from_str(COMMENTS_JSON).unwrap();
        let mut stubs = Vec::new();
        let tree = comment_tree_from_listing(listing, 0, &mut stubs).unwrap();

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].id, "c1");
        assert_eq!(tree[0].replies[0].id, "c2");
        assert_eq!(tree[0].replies[0].depth, 1);
        assert_eq!(tree[0].replies[0].author, crate::domain::DELETED_AUTHOR);
        assert_eq!(tree[1].created_utc.timestamp(), 1_700_000_200);

        assert_eq!(
            stubs,
            vec![
                MoreStub { children: vec!["c5".into(), "c6".into()] },
                MoreStub { children: vec!["c7".into()] },
            ]
        );
    }

    #[test]
    fn test_attach_more_children() {
        let listing: Listing = serde_json::from_str(COMMENTS_JSON).unwrap();
        let mut stubs = Vec::new();
        let mut tree = comment_tree_from_listing(listing, 0, &mut stubs).unwrap();

        let reply: MoreChildrenReply = serde_json::from_str(
            r#"{"json": {"errors": [], "data": {"things": [
                {"kind": "t1", "data": {"id": "c5", "author": "eve", "body": "more 1",
                    "created_utc": 1.0, "parent_id": "t1_c2", "replies": ""}},
                {"kind": "t1", "data": {"id": "c6", "author": "fay", "body": "more 2",
                    "created_utc": 2.0, "parent_id": "t1_c5", "replies": ""}},
                {"kind": "t1", "data": {"id": "c7", "author": "gus", "body": "top more",
                    "created_utc": 3.0, "parent_id": "t3_s1", "replies": ""}},
                {"kind": "t1", "data": {"id": "c9", "author": "hal", "body": "orphan",
                    "created_utc": 4.0, "parent_id": "t1_missing", "replies": ""}},
                {"kind": "more", "data": {"id": "m3", "children": ["c8"]}}
            ]}}}"#,
        )
        .unwrap();

        let things = reply.json.data.unwrap().things;
        let next = attach_more_children(&mut tree, things).unwrap();

        assert_eq!(next, vec![MoreStub { children: vec!["c8".into()] }]);
        let c5 = &tree[0].replies[0].replies[0];
        assert_eq!(c5.id, "c5");
        assert_eq!(c5.depth, 2);
        assert_eq!(c5.replies[0].id, "c6");
        assert_eq!(c5.replies[0].depth, 3);
        assert_eq!(tree.len(), 3);
        assert_eq!(tree[2].id, "c7");
        assert_eq!(tree[2].depth, 0);
    }

    #[test]
    fn test_comment_reply_parsing() {
        let ok: CommentReply = serde_json::from_str(
            r#"{"json": {"errors": [], "data": {"things": [
                {"kind": "t1", "data": {"id": "new1", "body": "hi"}}]}}}"#,
        )
        .unwrap();
        assert_eq!(ok.into_comment_id().unwrap(), "new1");

        let limited: CommentReply = serde_json::from_str(
            r#"{"json": {"errors": [["RATELIMIT", "you are doing that too much", "ratelimit"]]}}"#,
        )
        .unwrap();
        assert!(matches!(
            limited.into_comment_id(),
            Err(PlatformError::ServiceError(msg)) if msg.contains("RATELIMIT")
        ));
    }

    #[test]
    fn test_token_reply_with_error() {
        let reply: TokenReply = serde_json::from_str(r#"{"error": "invalid_grant"}"#).unwrap();
        assert!(reply.access_token.is_none());
        assert_eq!(reply.error.as_deref(), Some("invalid_grant"));
    }
}
