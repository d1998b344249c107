// src/message.rs
use serde::{Deserialize, Serialize};

/// An incoming chat message as handed over by the platform collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    pub id: String,
    pub author_id: String,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_is_bot: bool,
    #[serde(default)]
    pub content: Option<String>,
    pub channel_id: String,
    /// `None` for direct messages.
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub role_ids: Vec<String>,
}

impl InboundMessage {
    pub fn is_dm(&self) -> bool {
        self.guild_id.is_none()
    }

    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_json_defaults_to_dm_without_roles() {
        let m: InboundMessage =
            serde_json::from_str(r#"{"id":"1","authorId":"42","channelId":"c"}"#).unwrap();
        assert!(m.is_dm());
        assert!(!m.author_is_bot);
        assert!(m.role_ids.is_empty());
        assert_eq!(m.text(), "");
    }
}
