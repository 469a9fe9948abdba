//! Thread Model - 帖子与评论树
//!
//! 评论树使用拥有所有权的节点 + 子节点列表表示，
//! 展平时使用显式栈做先序深度优先遍历，避免深层回复导致递归过深

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 作者被删除时的占位名
pub const DELETED_AUTHOR: &str = "[deleted]";

/// 社区中的一个帖子
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub title: String,
}

/// 评论树节点
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentNode {
    pub id: String,
    pub author: String,
    pub created_utc: DateTime<Utc>,
    pub body: String,
    /// 顶层评论为 0
    pub depth: usize,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    pub fn new(
        id: impl Into<String>,
        author: Option<String>,
        created_utc: DateTime<Utc>,
        body: impl Into<String>,
        depth: usize,
    ) -> Self {
        Self {
            id: id.into(),
            author: author.unwrap_or_else(|| DELETED_AUTHOR.to_string()),
            created_utc,
            body: body.into(),
            depth,
            replies: Vec::new(),
        }
    }

    /// 子树中的评论总数（含自身）
    pub fn count(&self) -> usize {
        let mut total = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            total += 1;
            stack.extend(node.replies.iter());
        }
        total
    }
}

/// 展平后的评论，携带父评论 ID
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatComment {
    pub id: String,
    pub author: String,
    pub created_utc: DateTime<Utc>,
    pub body: String,
    pub depth: usize,
    /// 顶层评论没有父评论
    pub parent_id: Option<String>,
}

/// 将评论树展平为列表
///
/// 顺序与递归先序遍历一致：父评论在前，然后依次是它的回复子树，再到下一个兄弟评论
pub fn flatten_comment_tree(tree: &[CommentNode]) -> Vec<FlatComment> {
    let mut flattened = Vec::new();
    let mut stack: Vec<(&CommentNode, Option<&str>)> =
        tree.iter().rev().map(|node| (node, None)).collect();

    while let Some((node, parent_id)) = stack.pop() {
        flattened.push(FlatComment {
            id: node.id.clone(),
            author: node.author.clone(),
            created_utc: node.created_utc,
            body: node.body.clone(),
            depth: node.depth,
            parent_id: parent_id.map(str::to_string),
        });

        for reply in node.replies.iter().rev() {
            stack.push((reply, Some(node.id.as_str())));
        }
    }

    flattened
}

/// 过滤机器人账号的评论（大小写不敏感）
pub fn filter_bot_authors<S: AsRef<str>>(
    comments: Vec<FlatComment>,
    bot_accounts: &[S],
) -> Vec<FlatComment> {
    let bots: HashSet<String> = bot_accounts
        .iter()
        .map(|name| name.as_ref().to_lowercase())
        .collect();

    comments
        .into_iter()
        .filter(|comment| !bots.contains(&comment.author.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, author: &str, depth: usize) -> CommentNode {
        CommentNode::new(id, Some(author.to_string()), Utc::now(), format!("body {}", id), depth)
    }

    fn sample_tree() -> Vec<CommentNode> {
        let mut a = node("a", "alice", 0);
        let mut a1 = node("a1", "bob", 1);
        a1.replies.push(node("a1x", "carol", 2));
        a.replies.push(a1);
        a.replies.push(node("a2", "dave", 1));
        let b = node("b", "AutoModerator", 0);
        vec![a, b]
    }

    #[test]
    fn test_flatten_preorder_with_parents() {
        let flat = flatten_comment_tree(&sample_tree());
        let ids: Vec<&str> = flat.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "a1", "a1x", "a2", "b"]);

        let parents: Vec<Option<&str>> = flat.iter().map(|c| c.parent_id.as_deref()).collect();
        assert_eq!(
            parents,
            vec![None, Some("a"), Some("a1"), Some("a"), None]
        );
        assert_eq!(flat[2].depth, 2);
    }

    #[test]
    fn test_flatten_deep_chain_without_recursion() {
        let depth = 10_000;
        let mut current = node(&format!("c{}", depth), "deep", depth);
        for i in (0..depth).rev() {
            let mut parent = node(&format!("c{}", i), "deep", i);
            parent.replies.push(current);
            current = parent;
        }
        let tree = vec![current];

        let flat = flatten_comment_tree(&tree);
        assert_eq!(flat.len(), depth + 1);
        assert_eq!(flat.last().unwrap().parent_id.as_deref(), Some("c9999"));

        // 深链的 Drop 同样是递归的，这里手动拆开
        let mut stack = tree;
        while let Some(mut n) = stack.pop() {
            stack.append(&mut n.replies);
        }
    }

    #[test]
    fn test_deleted_author_placeholder() {
        let n = CommentNode::new("x", None, Utc::now(), "gone", 0);
        assert_eq!(n.author, DELETED_AUTHOR);
    }

    #[test]
    fn test_count() {
        let tree = sample_tree();
        assert_eq!(tree[0].count(), 4);
    }

    #[test]
    fn test_filter_bot_authors_case_insensitive() {
        let flat = flatten_comment_tree(&sample_tree());
        let kept = filter_bot_authors(flat, &["automoderator", "AutoTLDR"]);
        assert_eq!(kept.len(), 4);
        assert!(kept.iter().all(|c| c.author != "AutoModerator"));
    }
}
