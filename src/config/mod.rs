// src/config/mod.rs
//! Rule file loading.
//!
//! Stage one parses the source (JSON or TOML) into an untyped
//! `serde_json::Value`; stage two (`normalize`) builds the canonical
//! `RuleSet`. Only stage one can fail.

pub mod defaults;
mod normalize;

pub use normalize::normalize;

use anyhow::{anyhow, ensure, Context, Result};
use rand::Rng;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::rules::RuleSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Guess from the file extension; `None` means "try both".
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// Parse raw text into an untyped document. The top level must be a table/object.
pub fn parse_document(s: &str, format: Option<ConfigFormat>) -> Result<Value> {
    // An empty TOML document is a valid empty table; a blank file is never a rule set.
    ensure!(!s.trim().is_empty(), "rules source is empty");
    let doc = match format {
        Some(ConfigFormat::Json) => serde_json::from_str(s).context("parsing rules JSON")?,
        Some(ConfigFormat::Toml) => toml::from_str::<Value>(s).context("parsing rules TOML")?,
        None => serde_json::from_str(s)
            .or_else(|_| toml::from_str::<Value>(s))
            .map_err(|_| anyhow!("unsupported rules format (expected JSON or TOML)"))?,
    };
    ensure!(doc.is_object(), "rules document must be an object with `settings` and `rules`");
    Ok(doc)
}

/// Parse + normalize in one go.
pub fn parse_rules<R: Rng>(s: &str, format: Option<ConfigFormat>, rng: &mut R) -> Result<RuleSet> {
    let doc = parse_document(s, format)?;
    Ok(normalize(&doc, rng))
}

/// Load rules from an explicit path. Supports TOML or JSON formats.
pub fn load_rules_from<R: Rng>(path: &Path, rng: &mut R) -> Result<RuleSet> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading rules from {}", path.display()))?;
    parse_rules(&content, ConfigFormat::from_path(path), rng)
        .with_context(|| format!("loading rules from {}", path.display()))
}

/// Resolve the rule file using env var + fallbacks:
/// 1) $RESPONDER_RULES_PATH
/// 2) config/rules.json
/// 3) config/rules.toml
pub fn resolve_rules_path() -> Result<PathBuf> {
    if let Ok(p) = std::env::var(defaults::ENV_RULES_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return Ok(pb);
        }
        return Err(anyhow!(
            "{} points to non-existent path {}",
            defaults::ENV_RULES_PATH,
            pb.display()
        ));
    }
    for candidate in [defaults::RULES_JSON_PATH, defaults::RULES_TOML_PATH] {
        let pb = PathBuf::from(candidate);
        if pb.exists() {
            return Ok(pb);
        }
    }
    Err(anyhow!(
        "no rules file found (set {} or create {})",
        defaults::ENV_RULES_PATH,
        defaults::RULES_JSON_PATH
    ))
}

/// `resolve_rules_path` + `load_rules_from`.
pub fn load_rules_default<R: Rng>(rng: &mut R) -> Result<(PathBuf, RuleSet)> {
    let path = resolve_rules_path()?;
    let rules = load_rules_from(&path, rng)?;
    Ok((path, rules))
}
