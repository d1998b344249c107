// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod cooldown;
pub mod deliver;
pub mod engine;
pub mod matcher;
pub mod message;
pub mod metrics;
pub mod reload;
pub mod render;
pub mod rules;
pub mod scope;

// ---- Re-exports for stable public API ----
pub use crate::config::ConfigFormat;
pub use crate::deliver::{Delivery, JsonLinesDelivery, MentionPolicy, OutboundAction};
pub use crate::engine::{CompiledRuleSet, Evaluator};
pub use crate::message::InboundMessage;
pub use crate::reload::{start_hot_reload_thread, RuleSetHandle};
pub use crate::rules::{Rule, RuleSet, Settings};
