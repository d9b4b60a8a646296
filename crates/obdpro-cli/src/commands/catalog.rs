//! Catalog command - list the named diagnostic intents

use anyhow::Result;
use obdpro_uds::ServiceIntent;

use crate::output::{IntentRow, OutputContext};

pub fn catalog(ctx: &OutputContext) -> Result<()> {
    let rows: Vec<IntentRow> = ServiceIntent::ALL
        .iter()
        .copied()
        .map(IntentRow::from)
        .collect();
    ctx.print(&rows);
    Ok(())
}
