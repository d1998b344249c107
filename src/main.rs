//! Auto responder binary.
//! Reads inbound messages as JSON lines on stdin and writes outbound actions
//! as JSON lines on stdout. Logs go to stderr.

use anyhow::{Context, Result};
use auto_responder::{config, start_hot_reload_thread, Evaluator, InboundMessage, JsonLinesDelivery, RuleSetHandle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("RESPONDER_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let (path, rules) =
        config::load_rules_default(&mut rand::rng()).context("loading initial rule set")?;
    info!(
        target: "responder",
        path = %path.display(),
        rules = rules.len(),
        "rules loaded"
    );

    let handle = RuleSetHandle::new(rules);
    start_hot_reload_thread(handle.clone(), path);

    let mut evaluator = Evaluator::new(handle);
    let delivery = JsonLinesDelivery::stdout();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        let msg: InboundMessage = match serde_json::from_str(&line) {
            Ok(m) => m,
            Err(e) => {
                warn!(target: "responder", error = %e, "skipping malformed inbound line");
                continue;
            }
        };
        evaluator.handle(&msg, &delivery).await;
    }

    info!(target: "responder", "stdin closed, shutting down");
    Ok(())
}
