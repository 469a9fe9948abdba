//! Console Approver - 终端逐条确认
//!
//! 显示评论与回复，输入以空格开头的一行表示同意发送，其余输入或 EOF 均视为拒绝

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines, Stdin, Stdout};
use tokio::sync::Mutex;

use crate::application::ports::{ReplyApproverPort, ReplyCandidate};

struct Console<R, W> {
    lines: Lines<R>,
    output: W,
}

pub struct ConsoleApprover<R, W> {
    console: Mutex<Console<R, W>>,
}

impl ConsoleApprover<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> ConsoleApprover<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(input: R, output: W) -> Self {
        Self {
            console: Mutex::new(Console {
                lines: input.lines(),
                output,
            }),
        }
    }

    pub fn into_output(self) -> W {
        self.console.into_inner().output
    }
}

fn prompt_text(candidate: &ReplyCandidate) -> String {
    format!(
        "COMMENT: {}\nREPLY: {}\nEnter a single space to approve this reply: ",
        candidate.comment_body, candidate.reply
    )
}

#[async_trait]
impl<R, W> ReplyApproverPort for ConsoleApprover<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn approve(&self, candidate: &ReplyCandidate) -> bool {
        let mut console = self.console.lock().await;

        let text = prompt_text(candidate);
        if let Err(e) = console.output.write_all(text.as_bytes()).await {
            tracing::warn!(error = %e, "Failed to write approval prompt");
            return false;
        }
        if let Err(e) = console.output.flush().await {
            tracing::warn!(error = %e, "Failed to flush approval prompt");
            return false;
        }

        match console.lines.next_line().await {
            Ok(Some(line)) => line.starts_with(' '),
            Ok(None) => {
                tracing::warn!("Approval input closed, rejecting reply");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read approval input");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str) -> ReplyCandidate {
        ReplyCandidate {
            comment_id: id.to_string(),
            comment_body: format!("comment {}", id),
            reply: format!("reply {}", id),
        }
    }

    #[tokio::test]
    async fn test_space_prefix_approves() {
        let input: &[u8] = b" \nno\n  yes\n";
        let approver = ConsoleApprover::new(input, Vec::new());

        assert!(approver.approve(&candidate("a")).await);
        assert!(!approver.approve(&candidate("b")).await);
        assert!(approver.approve(&candidate("c")).await);
        // EOF
        assert!(!approver.approve(&candidate("d")).await);

        let output = String::from_utf8(approver.into_output()).unwrap();
        assert!(output.contains("COMMENT: comment a\nREPLY: reply a"));
        assert_eq!(output.matches("Enter a single space").count(), 4);
    }

    /// 写入成功但 flush 失败的输出
    struct BrokenFlush;

    impl AsyncWrite for BrokenFlush {
        fn poll_write(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            buf: &[u8],
        ) -> std::task::Poll<std::io::Result<usize>> {
            std::task::Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "terminal gone",
            )))
        }

        fn poll_shutdown(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_flush_failure_rejects() {
        let input: &[u8] = b" \n";
        let approver = ConsoleApprover::new(input, BrokenFlush);
        assert!(!approver.approve(&candidate("a")).await);
    }

    #[tokio::test]
    async fn test_empty_line_rejects() {
        let input: &[u8] = b"\n";
        let approver = ConsoleApprover::new(input, Vec::new());
        assert!(!approver.approve(&candidate("a")).await);
    }
}
