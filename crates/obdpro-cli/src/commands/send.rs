//! Send command - raw and catalogued UDS requests

use anyhow::{anyhow, Context, Result};
use obdpro_core::Exchange;
use obdpro_uds::ServiceIntent;

use crate::output::{LogRow, OutputContext, OutputFormat};
use crate::workbench::Workbench;

/// Send one raw service request
pub async fn send(
    bench: &Workbench,
    service_id: &str,
    sub_function: &[String],
    ctx: &OutputContext,
) -> Result<()> {
    let sub_function = sub_function.join(" ");
    let exchange = bench
        .controller
        .send_service(service_id, &sub_function)
        .await
        .with_context(|| format!("Request SID {} was dropped", service_id))?;

    print_exchange(bench, &exchange, ctx);
    Ok(())
}

/// Send a catalogued request by name
pub async fn intent(bench: &Workbench, name: &str, ctx: &OutputContext) -> Result<()> {
    let intent = ServiceIntent::from_name(name).ok_or_else(|| {
        let known: Vec<_> = ServiceIntent::ALL.iter().map(|i| i.key()).collect();
        anyhow!("Unknown intent '{}'. Valid intents: {}", name, known.join(", "))
    })?;

    ctx.info(&format!("{}...", intent.name()));
    let exchange = bench
        .controller
        .send_intent(intent)
        .await
        .with_context(|| format!("{} was dropped", intent.name()))?;

    print_exchange(bench, &exchange, ctx);
    Ok(())
}

fn print_exchange(bench: &Workbench, exchange: &Exchange, ctx: &OutputContext) {
    match ctx.format {
        OutputFormat::Table => {
            let rows = vec![
                LogRow::from(&exchange.request),
                LogRow::from(&exchange.response),
            ];
            ctx.print(&rows);
            if !ctx.quiet {
                ctx.print_status(&bench.controller.ecu_status(true));
            }
        }
        OutputFormat::Json => ctx.print_json(exchange),
    }
}
