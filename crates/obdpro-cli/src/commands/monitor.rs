//! Monitor command - live telemetry polling

use std::sync::Arc;

use anyhow::Result;
use obdpro_core::{SystemClock, TelemetrySnapshot};
use obdpro_uds::TelemetryPoller;
use tokio::sync::broadcast::error::RecvError;

use crate::output::{OutputContext, OutputFormat, TelemetryRow};
use crate::workbench::Workbench;

/// Poll the bridge and print each sample until `samples` arrive or Ctrl+C
pub async fn monitor(bench: &Workbench, samples: Option<usize>, ctx: &OutputContext) -> Result<()> {
    let poller = TelemetryPoller::new(
        bench.bridge.clone(),
        Arc::new(SystemClock),
        &bench.config.telemetry,
    );
    let mut snapshots = poller.snapshots();
    let mut connectivity = poller.connectivity();

    ctx.info(&format!(
        "Polling {} every {} ms",
        bench.bridge.endpoint(),
        bench.config.telemetry.poll_interval_ms
    ));
    ctx.info("Press Ctrl+C to stop");
    poller.start();

    let mut count = 0usize;
    loop {
        if samples.is_some_and(|limit| count >= limit) {
            break;
        }

        tokio::select! {
            snapshot = snapshots.recv() => match snapshot {
                Ok(snapshot) => {
                    print_sample(&snapshot, ctx);
                    count += 1;
                }
                Err(RecvError::Lagged(skipped)) => {
                    ctx.warn(&format!("Skipped {} samples", skipped));
                }
                Err(RecvError::Closed) => break,
            },
            changed = connectivity.changed() => {
                if changed.is_err() {
                    break;
                }
                if !*connectivity.borrow_and_update() {
                    ctx.warn("Bridge unreachable, waiting...");
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    poller.stop();
    if ctx.format == OutputFormat::Table {
        ctx.success(&format!("\nStopped after {} samples", count));
    }
    Ok(())
}

/// Tables print one aligned line per sample; JSON prints one object per line
fn sample_line(snapshot: &TelemetrySnapshot, format: OutputFormat) -> Option<String> {
    match format {
        OutputFormat::Json => serde_json::to_string(snapshot).ok(),
        OutputFormat::Table => {
            let row = TelemetryRow::from(snapshot);
            Some(format!(
                "{}  {:>6} rpm  {:>9}  {:>7}  {:>8}  {:>7}",
                row.time, row.rpm, row.speed, row.coolant, row.throttle, row.voltage
            ))
        }
    }
}

fn print_sample(snapshot: &TelemetrySnapshot, ctx: &OutputContext) {
    if let Some(line) = sample_line(snapshot, ctx.format) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obdpro_core::{Clock, TelemetryReading};

    fn snapshot() -> TelemetrySnapshot {
        TelemetrySnapshot::new(
            TelemetryReading {
                rpm: 812.0,
                coolant_temp: 88.0,
                ..Default::default()
            },
            SystemClock.now(),
        )
    }

    #[test]
    fn test_json_sample_is_one_line() {
        let line = sample_line(&snapshot(), OutputFormat::Json).unwrap();
        assert!(!line.contains('\n'));
        assert!(line.contains("\"coolantTemp\":88.0"));
    }

    #[test]
    fn test_table_sample_shows_rpm() {
        let line = sample_line(&snapshot(), OutputFormat::Table).unwrap();
        assert!(line.contains("812 rpm"));
    }
}
