//! DPF regeneration and firmware flash commands

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use obdpro_core::{ProcedureState, ProcedureStatus, UdsSession};
use obdpro_uds::procedure::{dpf_regeneration, firmware_flash, ProcedureSpec};
use obdpro_uds::{ProcedureRunner, StartOutcome};

use crate::output::{OutputContext, OutputFormat};
use crate::workbench::Workbench;

/// Run a forced DPF regeneration
pub async fn dpf(bench: &Workbench, ctx: &OutputContext) -> Result<()> {
    let procedures = &bench.config.procedures;
    let spec = dpf_regeneration(procedures.dpf, procedures.dpf_routine_control);
    run(bench, spec, false, ctx).await
}

/// Run the firmware flash sequence
///
/// With `enter_session` the programming session is requested first when
/// the ECU is not already in it.
pub async fn flash(bench: &Workbench, enter_session: bool, ctx: &OutputContext) -> Result<()> {
    let spec = firmware_flash(bench.config.procedures.flash);
    run(bench, spec, enter_session, ctx).await
}

async fn run(
    bench: &Workbench,
    spec: ProcedureSpec,
    enter_session: bool,
    ctx: &OutputContext,
) -> Result<()> {
    let runner = ProcedureRunner::new(spec, bench.controller.clone());

    match runner.start().await {
        StartOutcome::Started => {}
        StartOutcome::NeedsSession(UdsSession::Programming) if enter_session => {
            ctx.info("Switching to programming session...");
            bench
                .controller
                .enter_programming_session()
                .await
                .context("Programming session request was dropped")?;
            if runner.start().await != StartOutcome::Started {
                bail!("{}: {}", runner.state().name, runner.state().message);
            }
        }
        StartOutcome::NeedsSession(session) => {
            bail!(
                "{} requires the {} (current: {}). Retry with --enter-session",
                runner.state().name,
                session,
                bench.controller.session()
            );
        }
        StartOutcome::LinkError | StartOutcome::Cancelled => {
            bail!("{}: {}", runner.state().name, runner.state().message);
        }
    }

    let state = follow(&runner, ctx).await?;
    if ctx.format == OutputFormat::Json {
        ctx.print_json(&state);
    }

    match state.status {
        ProcedureStatus::Completed => {
            ctx.success(&format!("{}: {}", state.name, state.message));
            Ok(())
        }
        ProcedureStatus::Idle => {
            ctx.warn(&format!("{}: {}", state.name, state.message));
            Ok(())
        }
        _ => bail!("{}: {}", state.name, state.message),
    }
}

/// Drive a progress bar from the runner until it stops or Ctrl+C aborts it
async fn follow(runner: &ProcedureRunner, ctx: &OutputContext) -> Result<ProcedureState> {
    let pb = if ctx.is_interactive() {
        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}% {msg}")
                .context("Invalid progress template")?
                .progress_chars("=>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut updates = runner.subscribe();
    loop {
        let state = updates.borrow_and_update().clone();
        pb.set_position(u64::from(state.progress));
        pb.set_message(state.message.clone());
        if !state.is_running() {
            pb.finish_with_message(state.message.clone());
            return Ok(state);
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    let state = runner.state();
                    pb.finish_with_message(state.message.clone());
                    return Ok(state);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                runner.abort().await;
                let state = runner.state();
                pb.abandon_with_message(state.message.clone());
                return Ok(state);
            }
        }
    }
}
