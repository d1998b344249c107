// src/config/defaults.rs
//! Single table of configuration defaults. Normalization never spells a
//! fallback value anywhere else.

use crate::rules::{CooldownScope, MatchMode, ReplyMode};

// --- settings ---
pub const REPLY_MODE: ReplyMode = ReplyMode::Reply;
pub const IGNORE_BOTS: bool = true;
pub const IGNORE_DMS: bool = true;
pub const IGNORE_URLS: bool = false;
pub const COOLDOWN_MS: u64 = 3_000;
pub const MAX_MESSAGE_LENGTH: usize = 4_000;
pub const LOG_MATCHES: bool = false;

// --- rules ---
pub const RULE_ENABLED: bool = true;
pub const CASE_INSENSITIVE: bool = true;
pub const MATCH_MODE: MatchMode = MatchMode::Wildcard;
pub const PER: CooldownScope = CooldownScope::User;

// --- actions ---
pub const MENTION_AUTHOR: bool = true;
pub const MENTION_USERS: bool = true;
pub const MENTION_ROLES: bool = false;
pub const MENTION_EVERYONE: bool = false;
pub const DELETE_TRIGGER: bool = false;

// --- generated ids: "r_" + 8 chars of base 36 ---
pub const GENERATED_ID_PREFIX: &str = "r_";
pub const GENERATED_ID_LEN: usize = 8;

// --- rule file lookup ---
pub const ENV_RULES_PATH: &str = "RESPONDER_RULES_PATH";
pub const RULES_JSON_PATH: &str = "config/rules.json";
pub const RULES_TOML_PATH: &str = "config/rules.toml";
