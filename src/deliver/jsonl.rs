// src/deliver/jsonl.rs
use anyhow::{Context, Result};
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use super::{Delivery, OutboundAction};

/// Writes every outbound operation as one JSON object per line.
///
/// Used by the binary (stdout) so another process can do the actual platform
/// calls, and by tests with an in-memory writer.
pub struct JsonLinesDelivery<W> {
    out: Mutex<W>,
}

#[derive(Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum Line<'a> {
    Deliver(&'a OutboundAction),
    Delete {
        #[serde(rename = "messageId")]
        message_id: &'a str,
        #[serde(rename = "channelId")]
        channel_id: &'a str,
    },
}

impl JsonLinesDelivery<tokio::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W> JsonLinesDelivery<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    async fn write_line(&self, line: &Line<'_>) -> Result<()> {
        let mut buf = serde_json::to_vec(line).context("serialize outbound line")?;
        buf.push(b'\n');
        let mut out = self.out.lock().await;
        out.write_all(&buf).await.context("write outbound line")?;
        out.flush().await.context("flush outbound line")?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl<W> Delivery for JsonLinesDelivery<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn deliver(&self, action: &OutboundAction) -> Result<()> {
        self.write_line(&Line::Deliver(action)).await
    }

    async fn delete_trigger(&self, action: &OutboundAction) -> Result<()> {
        self.write_line(&Line::Delete {
            message_id: &action.message_id,
            channel_id: &action.channel_id,
        })
        .await
    }

    fn name(&self) -> &'static str {
        "jsonl"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deliver::MentionPolicy;
    use crate::rules::ReplyMode;

    #[tokio::test]
    async fn writes_camel_case_lines() {
        let sink = JsonLinesDelivery::new(Vec::<u8>::new());
        let action = OutboundAction {
            rule_id: "greet:0".into(),
            message_id: "m1".into(),
            channel_id: "c1".into(),
            mode: ReplyMode::Send,
            content: "hi <@42>".into(),
            mentions: MentionPolicy {
                parse: vec![],
                users: vec!["42".into()],
                replied_user: true,
            },
            delete_trigger: true,
        };
        sink.deliver(&action).await.unwrap();
        sink.delete_trigger(&action).await.unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["op"], "deliver");
        assert_eq!(lines[0]["ruleId"], "greet:0");
        assert_eq!(lines[0]["mode"], "send");
        assert_eq!(lines[0]["mentions"]["repliedUser"], true);
        assert_eq!(lines[1]["op"], "delete");
        assert_eq!(lines[1]["messageId"], "m1");
    }
}
