// src/cooldown.rs
use std::collections::HashMap;

use chrono::{DateTime, Duration as ChronoDuration, Utc};

use crate::message::InboundMessage;
use crate::rules::{CooldownScope, Rule};

/// Bucket used for `guild` scope when the message has no guild.
pub const DM_BUCKET: &str = "dm";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CooldownKey {
    pub rule_id: String,
    pub scope: CooldownScope,
    pub bucket: String,
}

impl CooldownKey {
    pub fn for_message(rule: &Rule, msg: &InboundMessage) -> Self {
        let bucket = match rule.per {
            CooldownScope::Guild => msg.guild_id.as_deref().unwrap_or(DM_BUCKET),
            CooldownScope::Channel => msg.channel_id.as_str(),
            CooldownScope::User => msg.author_id.as_str(),
        };
        Self {
            rule_id: rule.id.clone(),
            scope: rule.per,
            bucket: bucket.to_string(),
        }
    }
}

/// Per-(rule, scope, bucket) cooldown gate.
/// - First trigger in a bucket always passes.
/// - `cooldown_ms == 0` never blocks, but the timestamp is still recorded.
/// - Entries are never evicted; they live as long as the tracker.
#[derive(Debug, Clone, Default)]
pub struct CooldownTracker {
    last_fired: HashMap<CooldownKey, DateTime<Utc>>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check-and-set: returns true and records `now` if `rule` may fire for `msg`.
    pub fn try_consume(&mut self, rule: &Rule, msg: &InboundMessage, now: DateTime<Utc>) -> bool {
        let key = CooldownKey::for_message(rule, msg);
        if rule.cooldown_ms > 0 {
            if let Some(prev) = self.last_fired.get(&key) {
                let ms = i64::try_from(rule.cooldown_ms).unwrap_or(i64::MAX);
                let cooldown = ChronoDuration::milliseconds(ms);
                if now.signed_duration_since(*prev) < cooldown {
                    return false;
                }
            }
        }
        self.last_fired.insert(key, now);
        true
    }

    pub fn last_fired(&self, key: &CooldownKey) -> Option<DateTime<Utc>> {
        self.last_fired.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.last_fired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_fired.is_empty()
    }
}
