// src/rules.rs
//! Canonical rule model produced by `config::normalize`.
//!
//! Everything here is plain immutable data. Compiled matchers are kept out of
//! `Rule` and live in the side table of `engine::CompiledRuleSet`.

use serde::{Deserialize, Serialize};

use crate::config::defaults;

/// How a rule's triggers are compared against message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchMode {
    Exact,
    Contains,
    StartsWith,
    EndsWith,
    Wildcard,
    Regex,
}

impl MatchMode {
    /// Unknown or missing values fall back to `Wildcard`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("exact") => Self::Exact,
            Some("contains") => Self::Contains,
            Some("startsWith") => Self::StartsWith,
            Some("endsWith") => Self::EndsWith,
            Some("regex") => Self::Regex,
            Some("wildcard") => Self::Wildcard,
            _ => defaults::MATCH_MODE,
        }
    }
}

/// Partition used for cooldown buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CooldownScope {
    User,
    Channel,
    Guild,
}

impl CooldownScope {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("channel") => Self::Channel,
            Some("guild") => Self::Guild,
            Some("user") => Self::User,
            _ => defaults::PER,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Channel => "channel",
            Self::Guild => "guild",
        }
    }
}

/// Whether the reply is posted as a plain channel message or as a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyMode {
    Reply,
    Send,
}

impl ReplyMode {
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw {
            Some("reply") => Some(Self::Reply),
            Some("send") => Some(Self::Send),
            _ => None,
        }
    }
}

/// Process-wide settings. Defaults come from `config::defaults`.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub reply_mode_default: ReplyMode,
    pub ignore_bots: bool,
    pub ignore_dms: bool,
    pub ignore_prefixes: Vec<String>,
    pub ignore_urls: bool,
    pub default_cooldown_ms: u64,
    pub max_message_length: usize,
    pub log_matches: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reply_mode_default: defaults::REPLY_MODE,
            ignore_bots: defaults::IGNORE_BOTS,
            ignore_dms: defaults::IGNORE_DMS,
            ignore_prefixes: Vec::new(),
            ignore_urls: defaults::IGNORE_URLS,
            default_cooldown_ms: defaults::COOLDOWN_MS,
            max_message_length: defaults::MAX_MESSAGE_LENGTH,
            log_matches: defaults::LOG_MATCHES,
        }
    }
}

/// Allow/deny lists. Deny always wins; an empty allow list does not restrict.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Where {
    pub allow_channels: Vec<String>,
    pub deny_channels: Vec<String>,
    pub allow_roles: Vec<String>,
    pub deny_roles: Vec<String>,
    pub allow_users: Vec<String>,
    pub deny_users: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowedMentions {
    pub users: bool,
    pub roles: bool,
    pub everyone: bool,
}

impl Default for AllowedMentions {
    fn default() -> Self {
        Self {
            users: defaults::MENTION_USERS,
            roles: defaults::MENTION_ROLES,
            everyone: defaults::MENTION_EVERYONE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub mode: ReplyMode,
    pub mention_author: bool,
    pub allowed_mentions: AllowedMentions,
    pub delete_trigger_message: bool,
    pub replies: Vec<String>,
}

/// A normalized, immutable rule. `triggers` and `action.replies` are never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub id: String,
    pub enabled: bool,
    pub case_insensitive: bool,
    pub min_words: Option<usize>,
    pub max_words: Option<usize>,
    pub cooldown_ms: u64,
    pub per: CooldownScope,
    pub match_mode: MatchMode,
    pub triggers: Vec<String>,
    pub scope: Where,
    pub action: Action,
}

impl Rule {
    /// Word-count bounds check (bounds are inclusive).
    pub fn accepts_word_count(&self, words: usize) -> bool {
        if let Some(min) = self.min_words {
            if words < min {
                return false;
            }
        }
        if let Some(max) = self.max_words {
            if words > max {
                return false;
            }
        }
        true
    }
}

/// Ordered rules plus the settings they were loaded with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    pub settings: Settings,
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_modes_fall_back() {
        assert_eq!(MatchMode::parse(Some("startsWith")), MatchMode::StartsWith);
        assert_eq!(MatchMode::parse(Some("STARTSWITH")), MatchMode::Wildcard);
        assert_eq!(MatchMode::parse(None), MatchMode::Wildcard);
        assert_eq!(CooldownScope::parse(Some("server")), CooldownScope::User);
        assert_eq!(ReplyMode::parse(Some("dm")), None);
    }

    #[test]
    fn settings_default_table() {
        let s = Settings::default();
        assert_eq!(s.reply_mode_default, ReplyMode::Reply);
        assert!(s.ignore_bots && s.ignore_dms);
        assert!(!s.ignore_urls && !s.log_matches);
        assert_eq!(s.default_cooldown_ms, 3000);
        assert_eq!(s.max_message_length, 4000);
    }
}
