//! Procedure runner timing and cancellation

use std::sync::Arc;
use std::time::Duration;

use obdpro_core::{ProcedureStatus, SystemClock, UdsSession};
use obdpro_uds::config::ProcedureTiming;
use obdpro_uds::procedure::{dpf_regeneration, firmware_flash, ABORTED_MESSAGE};
use obdpro_uds::{DashboardConfig, DiagnosticController, MockBridge, ProcedureRunner, StartOutcome};

fn setup() -> (Arc<MockBridge>, Arc<DiagnosticController>) {
    let bridge = Arc::new(MockBridge::default());
    let controller = Arc::new(DiagnosticController::new(
        bridge.clone(),
        Arc::new(SystemClock),
        &DashboardConfig::default(),
    ));
    (bridge, controller)
}

fn dpf_timing() -> ProcedureTiming {
    ProcedureTiming {
        interval_ms: 500,
        increment: 2,
    }
}

fn flash_timing() -> ProcedureTiming {
    ProcedureTiming {
        interval_ms: 100,
        increment: 1,
    }
}

#[tokio::test(start_paused = true)]
async fn dpf_completes_after_fifty_ticks() {
    let (bridge, controller) = setup();
    let runner = ProcedureRunner::new(dpf_regeneration(dpf_timing(), true), controller);

    let started = tokio::time::Instant::now();
    assert_eq!(runner.start().await, StartOutcome::Started);
    let state = runner.wait().await;

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(50 * 500));
    assert!(elapsed < Duration::from_millis(51 * 500));
    assert_eq!(state.status, ProcedureStatus::Completed);
    assert_eq!(state.progress, 100);
    assert_eq!(state.message, "Regeneration Successful");
    assert_eq!(
        bridge.sent_requests(),
        vec![("31".to_string(), "01 FF 00".to_string())]
    );
}

#[tokio::test(start_paused = true)]
async fn dpf_message_follows_progress() {
    let (_bridge, controller) = setup();
    let runner = ProcedureRunner::new(dpf_regeneration(dpf_timing(), false), controller);

    runner.start().await;
    assert_eq!(runner.state().message, "Increasing Temp: 450°C");

    tokio::time::sleep(Duration::from_millis(1250)).await;
    let state = runner.state();
    assert_eq!(state.progress, 4);
    assert_eq!(state.message, "Increasing Temp: 458°C");
}

#[tokio::test(start_paused = true)]
async fn abort_halts_progress_and_sends_stop() {
    let (bridge, controller) = setup();
    let runner = ProcedureRunner::new(dpf_regeneration(dpf_timing(), true), controller);

    runner.start().await;
    tokio::time::sleep(Duration::from_millis(1250)).await;
    assert_eq!(runner.state().progress, 4);

    runner.abort().await;
    let state = runner.state();
    assert_eq!(state.status, ProcedureStatus::Idle);
    assert_eq!(state.progress, 0);
    assert_eq!(state.message, ABORTED_MESSAGE);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(runner.state().progress, 0);
    assert_eq!(runner.state().status, ProcedureStatus::Idle);

    let sent = bridge.sent_requests();
    assert_eq!(sent.last(), Some(&("31".to_string(), "02 FF 00".to_string())));
}

#[tokio::test(start_paused = true)]
async fn restart_supersedes_old_timer() {
    let (_bridge, controller) = setup();
    let runner = ProcedureRunner::new(dpf_regeneration(dpf_timing(), false), controller);

    runner.start().await;
    tokio::time::sleep(Duration::from_millis(750)).await;
    runner.start().await;
    assert_eq!(runner.state().progress, 0);

    // Only the new timer ticks: one tick at +500ms from the restart
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(runner.state().progress, 2);
}

#[tokio::test(start_paused = true)]
async fn dropped_kickoff_marks_link_error() {
    let (bridge, controller) = setup();
    bridge.fail_service("31");
    let runner = ProcedureRunner::new(dpf_regeneration(dpf_timing(), true), controller.clone());

    assert_eq!(runner.start().await, StartOutcome::LinkError);
    let state = runner.state();
    assert_eq!(state.status, ProcedureStatus::Failed);
    assert_eq!(state.message, "Link Error");
    assert_eq!(controller.log_len(), 0);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(runner.state().progress, 0);
}

#[tokio::test(start_paused = true)]
async fn flash_is_gated_on_programming_session() {
    let (_bridge, controller) = setup();
    let runner = ProcedureRunner::new(firmware_flash(flash_timing()), controller.clone());

    assert_eq!(
        runner.start().await,
        StartOutcome::NeedsSession(UdsSession::Programming)
    );
    assert_eq!(runner.state().status, ProcedureStatus::Idle);

    controller.enter_programming_session().await.unwrap();
    assert_eq!(runner.start().await, StartOutcome::Started);

    tokio::time::sleep(Duration::from_millis(505)).await;
    assert_eq!(runner.state().message, "Erasing block 0x004000");

    let state = runner.wait().await;
    assert_eq!(state.status, ProcedureStatus::Completed);
    assert_eq!(state.message, "Flash Complete");
}

#[tokio::test(start_paused = true)]
async fn dropping_runner_stops_timer() {
    let (_bridge, controller) = setup();
    let runner = ProcedureRunner::new(dpf_regeneration(dpf_timing(), false), controller);
    let mut updates = runner.subscribe();

    runner.start().await;
    drop(runner);
    tokio::time::sleep(Duration::from_secs(5)).await;

    // No tick ever landed, and the runner's sender is gone
    assert_eq!(updates.borrow_and_update().progress, 0);
    assert!(updates.changed().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn abort_during_failing_kickoff_wins() {
    let (bridge, controller) = setup();
    bridge.set_latency("31 01", Duration::from_millis(500));
    bridge.fail_service("31");
    let runner = ProcedureRunner::new(dpf_regeneration(dpf_timing(), true), controller);

    let (outcome, _) = tokio::join!(runner.start(), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        runner.abort().await;
    });

    assert_eq!(outcome, StartOutcome::Cancelled);
    let state = runner.state();
    assert_eq!(state.status, ProcedureStatus::Idle);
    assert_eq!(state.message, ABORTED_MESSAGE);
}
