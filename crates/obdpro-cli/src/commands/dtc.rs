//! DTC command - read, filter and clear trouble codes

use anyhow::{Context, Result};
use obdpro_core::{DtcSeverity, DtcStatus, Filter};
use obdpro_uds::ServiceIntent;

use crate::output::{DtcRow, OutputContext};
use crate::workbench::Workbench;

/// Read the ECU's DTCs and print the ones matching both filters
pub async fn dtc(
    bench: &Workbench,
    status: Filter<DtcStatus>,
    severity: Filter<DtcSeverity>,
    clear: bool,
    ctx: &OutputContext,
) -> Result<()> {
    if clear {
        bench
            .controller
            .send_intent(ServiceIntent::ClearDtcs)
            .await
            .context("Clear DTCs request was dropped")?;
        ctx.success("Cleared all DTCs");
        return Ok(());
    }

    bench
        .controller
        .send_intent(ServiceIntent::ReadDtcs)
        .await
        .context("Read DTCs request was dropped")?;

    let dtcs = bench.controller.filter_dtcs(status, severity);
    if dtcs.is_empty() && ctx.is_interactive() {
        ctx.info("No DTCs found");
        return Ok(());
    }

    let rows: Vec<DtcRow> = dtcs.iter().map(DtcRow::from).collect();
    ctx.print(&rows);
    Ok(())
}
