//! Analyze and chat commands - AI-assisted diagnostics

use anyhow::{bail, Context, Result};
use obdpro_core::ExchangeRecord;
use obdpro_uds::ServiceIntent;
use std::path::Path;
use tracing::warn;

use crate::output::{OutputContext, OutputFormat};
use crate::workbench::Workbench;

/// Requests sent to build a log when no saved log is given
const QUICK_SCAN: &[ServiceIntent] = &[ServiceIntent::ReadVin, ServiceIntent::ReadDtcs];

/// Analyse a saved message log, or a fresh quick scan
pub async fn analyze(bench: &Workbench, log_file: Option<&Path>, ctx: &OutputContext) -> Result<()> {
    let assistant = bench.assistant()?;

    let records = match log_file {
        Some(path) => load_log(path)?,
        None => {
            ctx.info("Running quick scan...");
            for intent in QUICK_SCAN {
                if let Err(e) = bench.controller.send_intent(*intent).await {
                    warn!(intent = intent.key(), error = %e, "Quick scan request dropped");
                }
            }
            bench.controller.log_snapshot()
        }
    };

    ctx.info(&format!("Analysing {} log records...", records.len()));
    let Some(report) = assistant.analyze(&records).await else {
        bail!("Nothing to analyse: the message log is empty");
    };

    print_reply("analysis", &report, ctx);
    Ok(())
}

/// Ask the support assistant a question
pub async fn chat(bench: &Workbench, query: &[String], ctx: &OutputContext) -> Result<()> {
    let assistant = bench.assistant()?;
    let query = query.join(" ");

    let Some(reply) = assistant.chat(&query).await else {
        bail!("Empty question");
    };

    print_reply("reply", &reply, ctx);
    Ok(())
}

fn load_log(path: &Path) -> Result<Vec<ExchangeRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read log file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse log file: {}", path.display()))
}

fn print_reply(key: &str, text: &str, ctx: &OutputContext) {
    match ctx.format {
        OutputFormat::Table => println!("{}", text),
        OutputFormat::Json => ctx.print_json(&serde_json::json!({ key: text })),
    }
}
