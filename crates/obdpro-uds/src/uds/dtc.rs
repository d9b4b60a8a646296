//! DTC decoding for ReadDTCInformation (0x19) responses
//!
//! Turns a `59 02` reportDTCByStatusMask record into dashboard DTCs
//! according to ISO 14229-1.

use obdpro_core::{Dtc, DtcSeverity, DtcStatus};

use super::parse_hex_bytes;

/// Positive response SID for ReadDTCInformation
const READ_DTC_INFO_RESPONSE: u8 = 0x59;

/// Sub-function codes for ReadDTCInformation (0x19)
pub mod sub_function {
    /// Report number of DTCs matching a status mask
    pub const REPORT_NUMBER_OF_DTC_BY_STATUS_MASK: u8 = 0x01;
    /// Report DTCs matching a status mask
    pub const REPORT_DTC_BY_STATUS_MASK: u8 = 0x02;
}

/// DTC status byte bit definitions per ISO 14229-1
pub mod status_bit {
    /// Bit 0: Test Failed
    pub const TEST_FAILED: u8 = 0x01;
    /// Bit 2: Pending DTC - Test failed but not yet confirmed
    pub const PENDING_DTC: u8 = 0x04;
    /// Bit 3: Confirmed DTC - Malfunction confirmed and stored
    pub const CONFIRMED_DTC: u8 = 0x08;
    /// Bit 7: Warning Indicator Requested
    pub const WARNING_INDICATOR_REQUESTED: u8 = 0x80;
}

/// DTC group covering every DTC, as used by ClearDiagnosticInformation
pub const DTC_GROUP_ALL: [u8; 3] = [0xFF, 0xFF, 0xFF];

/// A DTC number with its raw status byte, as carried on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawDtc {
    /// 3-byte DTC number (high, mid, low)
    pub number: [u8; 3],
    pub status: u8,
}

impl RawDtc {
    pub fn new(high: u8, mid: u8, low: u8, status: u8) -> Self {
        Self {
            number: [high, mid, low],
            status,
        }
    }

    /// Standard DTC string (e.g. P0101, C0420, B1234, U0100)
    pub fn code(&self) -> String {
        let prefix = match (self.number[0] >> 6) & 0x03 {
            0 => 'P',
            1 => 'C',
            2 => 'B',
            _ => 'U',
        };
        // High byte bits 5-4 / 3-0, then the two nibbles of the mid byte
        format!(
            "{}{:01X}{:01X}{:01X}{:01X}",
            prefix,
            (self.number[0] >> 4) & 0x03,
            self.number[0] & 0x0F,
            (self.number[1] >> 4) & 0x0F,
            self.number[1] & 0x0F
        )
    }

    pub fn status(&self) -> DtcStatus {
        if self.status & status_bit::TEST_FAILED != 0 {
            DtcStatus::Active
        } else if self.status & status_bit::PENDING_DTC != 0 {
            DtcStatus::Pending
        } else {
            DtcStatus::Stored
        }
    }

    pub fn severity(&self) -> DtcSeverity {
        if self.status & status_bit::WARNING_INDICATOR_REQUESTED != 0 {
            DtcSeverity::High
        } else if self.status() == DtcStatus::Active {
            DtcSeverity::Medium
        } else {
            DtcSeverity::Low
        }
    }

    pub fn to_dtc(&self) -> Dtc {
        Dtc {
            code: self.code(),
            description: format!("Status 0x{:02X}", self.status),
            status: self.status(),
            severity: self.severity(),
        }
    }
}

/// Parse a reportDTCByStatusMask (0x19 0x02) response
///
/// Response: `0x59 0x02 [statusAvailabilityMask] {[DTC hi] [DTC mid] [DTC lo] [status]}*`
pub fn parse_dtc_by_status_mask_response(response: &[u8]) -> Result<(u8, Vec<RawDtc>), String> {
    if response.len() < 3 {
        return Err(format!("Response too short: {} bytes", response.len()));
    }

    if response[0] != READ_DTC_INFO_RESPONSE {
        return Err(format!("Invalid response SID: 0x{:02X}", response[0]));
    }

    if response[1] != sub_function::REPORT_DTC_BY_STATUS_MASK {
        return Err(format!("Invalid sub-function: 0x{:02X}", response[1]));
    }

    let status_availability_mask = response[2];
    let dtcs = response[3..]
        .chunks_exact(4)
        .map(|chunk| RawDtc::new(chunk[0], chunk[1], chunk[2], chunk[3]))
        .collect();

    Ok((status_availability_mask, dtcs))
}

/// Decode the bridge's reply to a DTC scan into dashboard DTCs
///
/// Returns `None` when the payload is not a `59 02` record (for instance a
/// bare acknowledgement), in which case the caller keeps its current set.
pub fn decode_scan_payload(payload: &str) -> Option<Vec<Dtc>> {
    let bytes = parse_hex_bytes(payload)?;
    parse_dtc_by_status_mask_response(&bytes)
        .ok()
        .map(|(_, raw)| raw.iter().map(RawDtc::to_dtc).collect())
}
