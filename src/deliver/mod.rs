// src/deliver/mod.rs
//! Outbound side: what the evaluator hands to the chat platform.

pub mod jsonl;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::rules::{Action, ReplyMode};

pub use jsonl::JsonLinesDelivery;

/// Mention categories the platform may parse out of the rendered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MentionKind {
    Roles,
    Everyone,
}

/// Explicit allow-list of pings for one outgoing message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentionPolicy {
    pub parse: Vec<MentionKind>,
    pub users: Vec<String>,
    /// Whether the author of the replied-to message gets pinged.
    pub replied_user: bool,
}

impl MentionPolicy {
    pub fn for_action(action: &Action, author_id: &str) -> Self {
        let am = action.allowed_mentions;
        let mut parse = Vec::new();
        if am.everyone {
            parse.push(MentionKind::Everyone);
        }
        if am.roles {
            parse.push(MentionKind::Roles);
        }
        let users = if am.users {
            vec![author_id.to_string()]
        } else {
            Vec::new()
        };
        Self {
            parse,
            users,
            replied_user: action.mention_author,
        }
    }
}

/// One rendered reply, ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundAction {
    pub rule_id: String,
    pub message_id: String,
    pub channel_id: String,
    pub mode: ReplyMode,
    pub content: String,
    pub mentions: MentionPolicy,
    /// Ask the platform to delete the triggering message after a successful send.
    pub delete_trigger: bool,
}

/// The chat-platform collaborator. Implementations own their permission checks.
#[async_trait::async_trait]
pub trait Delivery: Send + Sync {
    /// Post `action.content` to the channel or as a reply, per `action.mode`.
    async fn deliver(&self, action: &OutboundAction) -> Result<()>;
    /// Delete the message that triggered `action`.
    async fn delete_trigger(&self, action: &OutboundAction) -> Result<()>;
    fn name(&self) -> &'static str;
}
