//! Unlock command - seed/key security access

use anyhow::{bail, Context, Result};
use obdpro_core::ProcedureStatus;
use obdpro_uds::SecurityHandshake;

use crate::output::{OutputContext, OutputFormat};
use crate::workbench::Workbench;

/// Run the two-phase security access handshake
pub async fn unlock(bench: &Workbench, ctx: &OutputContext) -> Result<()> {
    let algorithm = bench
        .config
        .session
        .key
        .build()
        .context("Invalid key configuration")?;
    ctx.info(&format!(
        "Requesting seed (key algorithm: {})...",
        algorithm.name()
    ));

    let handshake = SecurityHandshake::new(algorithm, bench.config.session.key_delay());
    let state = handshake.run(&bench.controller).await;

    if ctx.format == OutputFormat::Json {
        ctx.print_json(&state);
    }

    match state.status {
        ProcedureStatus::Completed => {
            ctx.success(&format!("Security access granted: {}", state.message));
            if ctx.format == OutputFormat::Table && !ctx.quiet {
                ctx.print_status(&bench.controller.ecu_status(true));
            }
            Ok(())
        }
        _ => bail!("Security access failed: {}", state.message),
    }
}
