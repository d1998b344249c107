// src/config/normalize.rs
//! Strict construction of `Settings` / `Rule` from an untyped document.
//!
//! Nothing in here fails: a field of the wrong type falls back to its default,
//! a rule or entry without triggers or replies is dropped, and the rest of the
//! set survives. Only reading/parsing the source (see `config::mod`) is fatal.

use std::collections::HashSet;

use rand::Rng;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::defaults;
use crate::rules::{
    Action, AllowedMentions, CooldownScope, MatchMode, ReplyMode, Rule, RuleSet, Settings, Where,
};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Build a canonical `RuleSet` from a parsed config document.
///
/// `rng` is only used for ids of rules that do not declare one.
pub fn normalize<R: Rng>(doc: &Value, rng: &mut R) -> RuleSet {
    let settings = normalize_settings(doc.get("settings"));

    let raw_rules = doc
        .get("rules")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut seen = HashSet::new();
    let mut rules = Vec::with_capacity(raw_rules.len());
    for raw in raw_rules.iter().filter_map(Value::as_object) {
        for rule in expand_rule(raw, &settings, rng) {
            if !seen.insert(rule.id.clone()) {
                warn!(target: "responder", rule = %rule.id, "duplicate rule id, dropping later rule");
                continue;
            }
            rules.push(rule);
        }
    }

    RuleSet { settings, rules }
}

fn normalize_settings(v: Option<&Value>) -> Settings {
    let empty = Map::new();
    let s = v.and_then(Value::as_object).unwrap_or(&empty);

    Settings {
        reply_mode_default: ReplyMode::parse(str_field(s.get("replyModeDefault")))
            .unwrap_or(defaults::REPLY_MODE),
        ignore_bots: flag(s.get("ignoreBots"), defaults::IGNORE_BOTS),
        ignore_dms: flag(s.get("ignoreDMs"), defaults::IGNORE_DMS),
        ignore_prefixes: string_list(s.get("ignorePrefixes")),
        ignore_urls: flag(s.get("ignoreURLs"), defaults::IGNORE_URLS),
        default_cooldown_ms: non_negative(s.get("defaultCooldownMs"))
            .map(|n| n as u64)
            .unwrap_or(defaults::COOLDOWN_MS),
        max_message_length: non_negative(s.get("maxMessageLength"))
            .map(|n| n as usize)
            .unwrap_or(defaults::MAX_MESSAGE_LENGTH),
        log_matches: flag(s.get("logMatches"), defaults::LOG_MATCHES),
    }
}

/// Expand one raw rule into zero or more canonical rules.
///
/// A rule with a non-empty `entries` array yields one rule per object entry
/// (`<baseId>:<index>`); otherwise the inline `triggers` / `action.replies`
/// form a single rule.
fn expand_rule<R: Rng>(
    raw: &Map<String, Value>,
    settings: &Settings,
    rng: &mut R,
) -> Vec<Rule> {
    let base_id = scalar_string(raw.get("id")).unwrap_or_else(|| random_id(rng));
    let parent_match = str_field(raw.get("match"));

    let base = Rule {
        id: base_id.clone(),
        enabled: flag(raw.get("enabled"), defaults::RULE_ENABLED),
        case_insensitive: flag(raw.get("caseInsensitive"), defaults::CASE_INSENSITIVE),
        min_words: non_negative(raw.get("minWords")).map(|n| n.ceil() as usize),
        max_words: non_negative(raw.get("maxWords")).map(|n| n.floor() as usize),
        cooldown_ms: finite(raw.get("cooldownMs"))
            .map(|n| n.max(0.0) as u64)
            .unwrap_or(settings.default_cooldown_ms),
        per: CooldownScope::parse(str_field(raw.get("per"))),
        match_mode: MatchMode::parse(parent_match),
        triggers: Vec::new(),
        scope: normalize_where(raw.get("where")),
        action: normalize_action(raw.get("action"), settings.reply_mode_default),
    };

    let entries = raw
        .get("entries")
        .and_then(Value::as_array)
        .filter(|e| !e.is_empty());

    let candidates: Vec<Rule> = match entries {
        Some(entries) => entries
            .iter()
            .filter_map(Value::as_object)
            .enumerate()
            .map(|(idx, e)| {
                let mut rule = base.clone();
                rule.id = format!("{base_id}:{idx}");
                rule.match_mode = MatchMode::parse(str_field(e.get("match")).or(parent_match));
                rule.triggers = string_list(e.get("triggers"));
                rule.action.replies = string_list(e.get("replies"));
                rule
            })
            .collect(),
        None => {
            let mut rule = base;
            rule.triggers = string_list(raw.get("triggers"));
            rule.action.replies = string_list(raw.get("action").and_then(|a| a.get("replies")));
            vec![rule]
        }
    };

    candidates
        .into_iter()
        .filter(|r| {
            let keep = !r.triggers.is_empty() && !r.action.replies.is_empty();
            if !keep {
                debug!(
                    target: "responder",
                    rule = %r.id,
                    triggers = r.triggers.len(),
                    replies = r.action.replies.len(),
                    "dropping rule without triggers or replies"
                );
            }
            keep
        })
        .collect()
}

fn normalize_where(v: Option<&Value>) -> Where {
    Where {
        allow_channels: string_list(v.and_then(|w| w.get("allowChannels"))),
        deny_channels: string_list(v.and_then(|w| w.get("denyChannels"))),
        allow_roles: string_list(v.and_then(|w| w.get("allowRoles"))),
        deny_roles: string_list(v.and_then(|w| w.get("denyRoles"))),
        allow_users: string_list(v.and_then(|w| w.get("allowUsers"))),
        deny_users: string_list(v.and_then(|w| w.get("denyUsers"))),
    }
}

/// Replies are filled in per rule/entry by the caller.
fn normalize_action(v: Option<&Value>, default_mode: ReplyMode) -> Action {
    let am = v.and_then(|a| a.get("allowedMentions"));
    Action {
        mode: ReplyMode::parse(str_field(v.and_then(|a| a.get("mode")))).unwrap_or(default_mode),
        mention_author: flag(v.and_then(|a| a.get("mentionAuthor")), defaults::MENTION_AUTHOR),
        allowed_mentions: AllowedMentions {
            users: flag(am.and_then(|m| m.get("users")), defaults::MENTION_USERS),
            roles: flag(am.and_then(|m| m.get("roles")), defaults::MENTION_ROLES),
            everyone: flag(am.and_then(|m| m.get("everyone")), defaults::MENTION_EVERYONE),
        },
        delete_trigger_message: flag(
            v.and_then(|a| a.get("deleteTriggerMessage")),
            defaults::DELETE_TRIGGER,
        ),
        replies: Vec::new(),
    }
}

// --- value helpers ---

fn flag(v: Option<&Value>, default: bool) -> bool {
    v.and_then(Value::as_bool).unwrap_or(default)
}

fn str_field(v: Option<&Value>) -> Option<&str> {
    v.and_then(Value::as_str)
}

fn finite(v: Option<&Value>) -> Option<f64> {
    v.and_then(Value::as_f64).filter(|n| n.is_finite())
}

fn non_negative(v: Option<&Value>) -> Option<f64> {
    finite(v).filter(|n| *n >= 0.0)
}

/// Strings as-is, numbers and booleans via their display form.
fn scalar_string(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Array of scalars → non-empty strings. Anything else → empty list.
fn string_list(v: Option<&Value>) -> Vec<String> {
    v.and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| scalar_string(Some(item)))
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn random_id<R: Rng>(rng: &mut R) -> String {
    let mut id = String::with_capacity(defaults::GENERATED_ID_PREFIX.len() + defaults::GENERATED_ID_LEN);
    id.push_str(defaults::GENERATED_ID_PREFIX);
    for _ in 0..defaults::GENERATED_ID_LEN {
        id.push(BASE36[rng.random_range(0..BASE36.len())] as char);
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use serde_json::json;

    fn norm(doc: Value) -> RuleSet {
        normalize(&doc, &mut StdRng::seed_from_u64(7))
    }

    #[test]
    fn bad_settings_fall_back_to_defaults() {
        let rs = norm(json!({
            "settings": {
                "replyModeDefault": "shout",
                "ignoreBots": "no",
                "defaultCooldownMs": -5,
                "maxMessageLength": "long",
                "ignorePrefixes": "!",
                "logMatches": true
            }
        }));
        let s = &rs.settings;
        assert_eq!(s.reply_mode_default, ReplyMode::Reply);
        assert!(s.ignore_bots);
        assert_eq!(s.default_cooldown_ms, 3000);
        assert_eq!(s.max_message_length, 4000);
        assert!(s.ignore_prefixes.is_empty());
        assert!(s.log_matches);
    }

    #[test]
    fn inline_rule_inherits_settings_cooldown() {
        let rs = norm(json!({
            "settings": { "defaultCooldownMs": 1234, "replyModeDefault": "send" },
            "rules": [{ "id": 9, "triggers": ["hi"], "action": { "replies": ["yo"] } }]
        }));
        let r = &rs.rules[0];
        assert_eq!(r.id, "9");
        assert_eq!(r.cooldown_ms, 1234);
        assert_eq!(r.action.mode, ReplyMode::Send);
        assert_eq!(r.match_mode, MatchMode::Wildcard);
        assert!(r.case_insensitive && r.enabled);
        assert!(r.action.mention_author);
        assert_eq!(r.action.allowed_mentions, AllowedMentions::default());
    }

    #[test]
    fn entries_expand_with_indexed_ids() {
        let rs = norm(json!({
            "rules": [{
                "id": "greet",
                "match": "contains",
                "per": "channel",
                "action": { "mode": "send", "deleteTriggerMessage": true, "replies": ["ignored"] },
                "entries": [
                    { "triggers": ["hello"], "replies": ["hi"] },
                    "not an object",
                    { "triggers": [], "replies": ["dropped"] },
                    { "triggers": ["bye"], "replies": ["ciao"], "match": "exact" }
                ]
            }]
        }));
        let ids: Vec<_> = rs.rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["greet:0", "greet:2"]);
        assert_eq!(rs.rules[0].match_mode, MatchMode::Contains);
        assert_eq!(rs.rules[1].match_mode, MatchMode::Exact);
        for r in &rs.rules {
            assert_eq!(r.per, CooldownScope::Channel);
            assert_eq!(r.action.mode, ReplyMode::Send);
            assert!(r.action.delete_trigger_message);
        }
        assert_eq!(rs.rules[1].action.replies, vec!["ciao"]);
    }

    #[test]
    fn generated_ids_are_prefixed_base36() {
        let rs = norm(json!({
            "rules": [{ "triggers": ["x"], "action": { "replies": ["y"] } }]
        }));
        let id = &rs.rules[0].id;
        assert!(id.starts_with("r_"));
        assert_eq!(id.len(), 10);
        assert!(id[2..].bytes().all(|b| BASE36.contains(&b)));
    }

    #[test]
    fn where_lists_coerce_scalars_and_drop_empties() {
        let w = normalize_where(Some(&json!({
            "allowChannels": [123, "abc", "", null],
            "denyUsers": "not-a-list"
        })));
        assert_eq!(w.allow_channels, vec!["123", "abc"]);
        assert!(w.deny_users.is_empty());
    }

    #[test]
    fn word_bounds_and_negative_cooldown() {
        let rs = norm(json!({
            "rules": [{
                "id": "w", "minWords": 1.5, "maxWords": -2, "cooldownMs": -100,
                "triggers": ["*"], "action": { "replies": ["ok"] }
            }]
        }));
        let r = &rs.rules[0];
        assert_eq!(r.min_words, Some(2));
        assert_eq!(r.max_words, None);
        assert_eq!(r.cooldown_ms, 0);
    }

    #[test]
    fn negative_word_bounds_mean_unbounded() {
        let rs = norm(json!({
            "rules": [{
                "id": "w", "minWords": -3, "maxWords": -1,
                "triggers": ["*"], "action": { "replies": ["ok"] }
            }]
        }));
        let r = &rs.rules[0];
        assert_eq!(r.min_words, None);
        assert_eq!(r.max_words, None);
        assert!(r.accepts_word_count(0));
        assert!(r.accepts_word_count(50));
    }
}
