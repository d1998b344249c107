// src/reload.rs
//! Published rule set + hot reload.
//!
//! Readers take an `Arc` snapshot and never see a half-built set; reload
//! builds a complete `CompiledRuleSet` first and then swaps the pointer.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;
use std::time::{Duration, SystemTime};

use anyhow::Result;
use metrics::counter;
use rand::Rng;
use tracing::{error, info};

use crate::config::{self, ConfigFormat};
use crate::engine::CompiledRuleSet;
use crate::metrics::{ensure_described, RELOADS_TOTAL, RELOAD_FAILURES_TOTAL};
use crate::rules::RuleSet;

pub const ENV_HOT_RELOAD: &str = "RESPONDER_HOT_RELOAD";
pub const POLL_INTERVAL: Duration = Duration::from_millis(800);

/// Thread-safe handle over the currently published rule set.
#[derive(Clone)]
pub struct RuleSetHandle {
    inner: Arc<RwLock<Arc<CompiledRuleSet>>>,
}

impl RuleSetHandle {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(CompiledRuleSet::compile(rules)))),
        }
    }

    /// Consistent view for one evaluation.
    pub fn snapshot(&self) -> Arc<CompiledRuleSet> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// Compile `rules` and swap it in wholesale.
    pub fn publish(&self, rules: RuleSet) -> Arc<CompiledRuleSet> {
        let compiled = Arc::new(CompiledRuleSet::compile(rules));
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::clone(&compiled);
        compiled
    }

    /// Parse `raw` and publish it. On error the current set stays active.
    pub fn reload_from_str(&self, raw: &str, format: Option<ConfigFormat>) -> Result<Arc<CompiledRuleSet>> {
        self.reload_from_str_with_rng(raw, format, &mut rand::rng())
    }

    pub fn reload_from_str_with_rng<R: Rng>(
        &self,
        raw: &str,
        format: Option<ConfigFormat>,
        rng: &mut R,
    ) -> Result<Arc<CompiledRuleSet>> {
        ensure_described();
        match config::parse_rules(raw, format, rng) {
            Ok(rules) => {
                counter!(RELOADS_TOTAL).increment(1);
                Ok(self.publish(rules))
            }
            Err(e) => {
                counter!(RELOAD_FAILURES_TOTAL).increment(1);
                Err(e)
            }
        }
    }

    pub fn reload_from_path(&self, path: &Path) -> Result<Arc<CompiledRuleSet>> {
        ensure_described();
        match config::load_rules_from(path, &mut rand::rng()) {
            Ok(rules) => {
                counter!(RELOADS_TOTAL).increment(1);
                Ok(self.publish(rules))
            }
            Err(e) => {
                counter!(RELOAD_FAILURES_TOTAL).increment(1);
                Err(e)
            }
        }
    }
}

/// Hot reload is on unless RESPONDER_HOT_RELOAD=0.
fn hot_reload_enabled() -> bool {
    std::env::var(ENV_HOT_RELOAD)
        .map(|v| v.trim() != "0")
        .unwrap_or(true)
}

/// Start a polling watcher on `path` that reloads into `handle` when the
/// file's mtime changes. Returns `None` when hot reload is disabled.
pub fn start_hot_reload_thread(handle: RuleSetHandle, path: PathBuf) -> Option<thread::JoinHandle<()>> {
    if !hot_reload_enabled() {
        info!(target: "responder::reload", "hot reload disabled");
        return None;
    }

    let spawned = thread::Builder::new()
        .name("rules-reload".into())
        .spawn(move || {
            let mut last_mtime: Option<SystemTime> = fs::metadata(&path).and_then(|m| m.modified()).ok();
            loop {
                thread::sleep(POLL_INTERVAL);
                let Ok(mtime) = fs::metadata(&path).and_then(|m| m.modified()) else {
                    // File missing or unreadable; keep trying.
                    continue;
                };
                if last_mtime == Some(mtime) {
                    continue;
                }
                last_mtime = Some(mtime);
                match handle.reload_from_path(&path) {
                    Ok(set) => info!(
                        target: "responder::reload",
                        rules = set.rules().len(),
                        path = %path.display(),
                        loaded_at = %set.loaded_at().to_rfc3339(),
                        "rules reloaded"
                    ),
                    Err(e) => error!(
                        target: "responder::reload",
                        path = %path.display(),
                        error = %format!("{e:#}"),
                        "reload failed, keeping previous rules"
                    ),
                }
            }
        });

    match spawned {
        Ok(join) => Some(join),
        Err(e) => {
            error!(target: "responder::reload", error = %e, "could not spawn reload watcher");
            None
        }
    }
}
