// src/engine.rs
//! Per-message evaluation.
//!
//! Order of checks:
//! 1. message-level ignores (bot author, DM, empty, ignored prefix, URL)
//! 2. truncate to `max_message_length` characters
//! 3. per rule, in config order: enabled → word bounds → scope → match → cooldown
//!
//! The first rule passing every check fires and evaluation stops. Its cooldown
//! is consumed before delivery is attempted and is not rolled back on failure.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use metrics::counter;
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use tracing::{debug, info, trace, warn};

use crate::config::ConfigFormat;
use crate::cooldown::CooldownTracker;
use crate::deliver::{Delivery, MentionPolicy, OutboundAction};
use crate::matcher::Matcher;
use crate::message::InboundMessage;
use crate::metrics::{ensure_described, DELIVERY_FAILURES_TOTAL, MATCHES_TOTAL, MESSAGES_TOTAL};
use crate::reload::RuleSetHandle;
use crate::render::{pick_reply, render_template};
use crate::rules::{Rule, RuleSet, Settings};

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:https?://|www\.)\S+").expect("url regex"));

/// A published rule set with its matchers compiled in a side table.
#[derive(Debug)]
pub struct CompiledRuleSet {
    rules: RuleSet,
    matchers: HashMap<String, Matcher>,
    loaded_at: DateTime<Utc>,
}

impl CompiledRuleSet {
    pub fn compile(rules: RuleSet) -> Self {
        let matchers = rules
            .rules
            .iter()
            .map(|r| (r.id.clone(), Matcher::for_rule(r)))
            .collect();
        Self {
            rules,
            matchers,
            loaded_at: Utc::now(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.rules.settings
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules.rules
    }

    pub fn matcher(&self, rule_id: &str) -> Option<&Matcher> {
        self.matchers.get(rule_id)
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

/// Why a message was skipped before any rule was looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Bot,
    DirectMessage,
    Empty,
    Prefix,
    Url,
}

pub fn ignore_reason(settings: &Settings, msg: &InboundMessage) -> Option<IgnoreReason> {
    let text = msg.text();
    if settings.ignore_bots && msg.author_is_bot {
        return Some(IgnoreReason::Bot);
    }
    if settings.ignore_dms && msg.is_dm() {
        return Some(IgnoreReason::DirectMessage);
    }
    if text.trim().is_empty() {
        return Some(IgnoreReason::Empty);
    }
    if settings
        .ignore_prefixes
        .iter()
        .any(|p| text.starts_with(p.as_str()))
    {
        return Some(IgnoreReason::Prefix);
    }
    if settings.ignore_urls && URL_RE.is_match(text) {
        return Some(IgnoreReason::Url);
    }
    None
}

/// First `max_chars` characters of `s`.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

pub fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

/// Owns the cooldown state and the reply RNG; reads rules through a handle.
pub struct Evaluator<R = StdRng> {
    rules: RuleSetHandle,
    cooldowns: CooldownTracker,
    rng: R,
}

impl Evaluator<StdRng> {
    pub fn new(rules: RuleSetHandle) -> Self {
        Self::with_rng(rules, StdRng::from_os_rng())
    }
}

impl<R: Rng> Evaluator<R> {
    pub fn with_rng(rules: RuleSetHandle, rng: R) -> Self {
        ensure_described();
        Self {
            rules,
            cooldowns: CooldownTracker::new(),
            rng,
        }
    }

    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    /// Replace the active rule set from raw config text. Cooldowns are kept.
    pub fn reload(&self, raw: &str, format: Option<ConfigFormat>) -> Result<Arc<CompiledRuleSet>> {
        let set = self.rules.reload_from_str(raw, format)?;
        info!(
            target: "responder",
            rules = set.rules().len(),
            loaded_at = %set.loaded_at().to_rfc3339(),
            "rules reloaded"
        );
        Ok(set)
    }

    /// Decide what (if anything) to send for `msg` at time `now`.
    pub fn evaluate(&mut self, msg: &InboundMessage, now: DateTime<Utc>) -> Option<OutboundAction> {
        counter!(MESSAGES_TOTAL).increment(1);
        let snapshot = self.rules.snapshot();
        let settings = snapshot.settings();

        if let Some(reason) = ignore_reason(settings, msg) {
            trace!(target: "responder", msg = %msg.id, ?reason, "message ignored");
            return None;
        }

        let text = truncate_chars(msg.text(), settings.max_message_length);
        let words = word_count(text);

        for rule in snapshot.rules() {
            if !rule.enabled || !rule.accepts_word_count(words) || !rule.scope.permits(msg) {
                continue;
            }
            let matched = snapshot
                .matcher(&rule.id)
                .is_some_and(|m| m.is_match(text));
            if !matched {
                continue;
            }
            if !self.cooldowns.try_consume(rule, msg, now) {
                trace!(target: "responder", rule = %rule.id, msg = %msg.id, "on cooldown");
                continue;
            }

            counter!(MATCHES_TOTAL).increment(1);
            if settings.log_matches {
                info!(
                    target: "responder",
                    rule = %rule.id,
                    user = %msg.author_id,
                    channel = %msg.channel_id,
                    "match"
                );
            }

            let template = pick_reply(&rule.action.replies, &mut self.rng)?;
            return Some(OutboundAction {
                rule_id: rule.id.clone(),
                message_id: msg.id.clone(),
                channel_id: msg.channel_id.clone(),
                mode: rule.action.mode,
                content: render_template(template, msg),
                mentions: MentionPolicy::for_action(&rule.action, &msg.author_id),
                delete_trigger: rule.action.delete_trigger_message,
            });
        }
        None
    }

    /// Evaluate `msg` now and hand the result to `delivery`.
    ///
    /// Returns the action that was attempted. Delivery errors are logged and
    /// swallowed; the trigger message is only deleted after a successful send.
    pub async fn handle(&mut self, msg: &InboundMessage, delivery: &dyn Delivery) -> Option<OutboundAction> {
        let action = self.evaluate(msg, Utc::now())?;
        debug!(
            target: "responder",
            rule = %action.rule_id,
            msg = %action.message_id,
            delivery = delivery.name(),
            "send attempt"
        );

        if let Err(e) = delivery.deliver(&action).await {
            counter!(DELIVERY_FAILURES_TOTAL).increment(1);
            warn!(
                target: "responder",
                rule = %action.rule_id,
                msg = %action.message_id,
                error = %format!("{e:#}"),
                "delivery failed"
            );
            return Some(action);
        }

        if action.delete_trigger {
            if let Err(e) = delivery.delete_trigger(&action).await {
                debug!(
                    target: "responder",
                    msg = %action.message_id,
                    error = %format!("{e:#}"),
                    "trigger message not deleted"
                );
            }
        }
        Some(action)
    }
}
