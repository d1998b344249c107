// src/matcher.rs
//! Trigger compilation.
//!
//! A `Matcher` is built once per rule when a rule set is published and is
//! kept in a side table next to the (immutable) rules.

use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::rules::{MatchMode, Rule};

/// Compiled predicate over message text. A rule matches if ANY trigger matches.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// exact / contains / startsWith / endsWith over (optionally folded) text.
    Literal {
        mode: MatchMode,
        fold: bool,
        triggers: Vec<String>,
    },
    /// wildcard and regex triggers.
    Patterns(Vec<Regex>),
    /// A trigger failed to compile; the rule can never fire.
    Never,
}

impl Matcher {
    pub fn for_rule(rule: &Rule) -> Self {
        let ci = rule.case_insensitive;
        match rule.match_mode {
            MatchMode::Regex => compile_all(rule, |t| build(t, ci)),
            MatchMode::Wildcard => compile_all(rule, |t| build(&wildcard_pattern(t), ci)),
            mode => Self::Literal {
                mode,
                fold: ci,
                triggers: rule
                    .triggers
                    .iter()
                    .map(|t| if ci { t.to_lowercase() } else { t.clone() })
                    .collect(),
            },
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Self::Literal {
                mode,
                fold,
                triggers,
            } => {
                let folded;
                let text = if *fold {
                    folded = text.to_lowercase();
                    folded.as_str()
                } else {
                    text
                };
                triggers.iter().any(|t| match mode {
                    MatchMode::Exact => text == t.as_str(),
                    MatchMode::Contains => text.contains(t.as_str()),
                    MatchMode::StartsWith => text.starts_with(t.as_str()),
                    MatchMode::EndsWith => text.ends_with(t.as_str()),
                    // not constructed as Literal
                    MatchMode::Wildcard | MatchMode::Regex => false,
                })
            }
            Self::Patterns(res) => res.iter().any(|re| re.is_match(text)),
            Self::Never => false,
        }
    }
}

fn compile_all<F>(rule: &Rule, compile: F) -> Matcher
where
    F: Fn(&str) -> Result<Regex, regex::Error>,
{
    let mut out = Vec::with_capacity(rule.triggers.len());
    for t in &rule.triggers {
        match compile(t) {
            Ok(re) => out.push(re),
            Err(e) => {
                warn!(
                    target: "responder",
                    rule = %rule.id,
                    trigger = %t,
                    error = %e,
                    "invalid trigger pattern, rule disabled"
                );
                return Matcher::Never;
            }
        }
    }
    Matcher::Patterns(out)
}

fn build(pattern: &str, case_insensitive: bool) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
}

/// `*` → any run of characters (newlines included), everything else literal,
/// anchored at both ends.
///
/// Multi-line messages are matched as a whole: `hi*` accepts `"hi\nthere"`,
/// where a plain `.*` without the `s` flag would stop at the first newline.
pub fn wildcard_pattern(trigger: &str) -> String {
    let body = trigger
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    format!(r"(?s)\A{body}\z")
}
