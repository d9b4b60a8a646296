//! Built-in procedures

use obdpro_core::UdsSession;

use super::engine::{ProcedureSpec, ServiceRequest};
use crate::config::ProcedureTiming;

/// RoutineControl identifier of the DPF regeneration routine
const DPF_ROUTINE_ID: &str = "FF 00";

/// DPF static regeneration
///
/// With `routine_control` set, start sends `31 01 FF 00` and an abort
/// sends `31 02 FF 00`.
pub fn dpf_regeneration(timing: ProcedureTiming, routine_control: bool) -> ProcedureSpec {
    let (kickoff, stop) = if routine_control {
        (
            Some(ServiceRequest::new("31", format!("01 {}", DPF_ROUTINE_ID))),
            Some(ServiceRequest::new("31", format!("02 {}", DPF_ROUTINE_ID))),
        )
    } else {
        (None, None)
    };

    ProcedureSpec {
        name: "DPF Regeneration".to_string(),
        interval: timing.interval(),
        increment: timing.increment,
        ceiling: 100,
        message: dpf_message,
        terminal_message: "Regeneration Successful".to_string(),
        kickoff,
        stop,
        required_session: None,
    }
}

pub fn dpf_message(progress: u8) -> String {
    format!("Increasing Temp: {}°C", 450 + 2 * u32::from(progress))
}

/// Bootloader flash cycle; only allowed in the Programming session
pub fn firmware_flash(timing: ProcedureTiming) -> ProcedureSpec {
    ProcedureSpec {
        name: "Firmware Flash".to_string(),
        interval: timing.interval(),
        increment: timing.increment,
        ceiling: 100,
        message: flash_message,
        terminal_message: "Flash Complete".to_string(),
        kickoff: None,
        stop: None,
        required_session: Some(UdsSession::Programming),
    }
}

pub fn flash_message(progress: u8) -> String {
    match progress {
        0..=9 => "Erasing block 0x004000".to_string(),
        10..=94 => format!("Transferring segment 0x{:02X}", progress - 10),
        _ => "Verifying checksum".to_string(),
    }
}
