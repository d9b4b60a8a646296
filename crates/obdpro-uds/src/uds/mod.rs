//! UDS (Unified Diagnostic Services) protocol layer
//!
//! Everything here works on the string form the bridge speaks: service ids
//! like `"10"` and sub-function strings like `"02 AA BB CC DD"`.

pub mod catalog;
pub mod codec;
pub mod dtc;

pub use catalog::ServiceIntent;
pub use codec::{Addressing, ACK_PAYLOAD, MALFORMED_RESPONSE_LABEL};

/// Standard UDS service ID constants
pub mod service_id {
    pub const DIAGNOSTIC_SESSION_CONTROL: u8 = 0x10;
    pub const ECU_RESET: u8 = 0x11;
    pub const CLEAR_DIAGNOSTIC_INFO: u8 = 0x14;
    pub const READ_DTC_INFO: u8 = 0x19;
    pub const READ_DATA_BY_ID: u8 = 0x22;
    pub const SECURITY_ACCESS: u8 = 0x27;
    pub const WRITE_DATA_BY_ID: u8 = 0x2E;
    pub const ROUTINE_CONTROL: u8 = 0x31;
    pub const REQUEST_DOWNLOAD: u8 = 0x34;
    pub const TRANSFER_DATA: u8 = 0x36;
    pub const REQUEST_TRANSFER_EXIT: u8 = 0x37;
    pub const TESTER_PRESENT: u8 = 0x3E;
    pub const NEGATIVE_RESPONSE: u8 = 0x7F;

    /// Offset added to a request SID to form its positive response SID
    pub const POSITIVE_RESPONSE_OFFSET: u32 = 0x40;
}

/// DiagnosticSessionControl (0x10) sub-functions
pub mod session_type {
    pub const DEFAULT: u8 = 0x01;
    pub const PROGRAMMING: u8 = 0x02;
    pub const EXTENDED: u8 = 0x03;
    pub const SAFETY_SYSTEM: u8 = 0x04;
}

/// SecurityAccess (0x27) sub-functions for level 1
pub mod security_sub_function {
    /// Request seed (odd)
    pub const REQUEST_SEED: u8 = 0x01;
    /// Send key (even)
    pub const SEND_KEY: u8 = 0x02;
}

/// RoutineControl (0x31) sub-functions
pub mod routine_sub_function {
    pub const START_ROUTINE: u8 = 0x01;
    pub const STOP_ROUTINE: u8 = 0x02;
    pub const REQUEST_ROUTINE_RESULTS: u8 = 0x03;
}

/// Parse a service id string (`"10"`, `"0x27"`, `" 19 "`) as a number
///
/// Returns `None` for anything that is not entirely hex digits.
pub fn parse_service_id(service_id: &str) -> Option<u32> {
    let digits = hex_digits(service_id.trim())?;
    if digits.len() > 8 {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

/// Parse a whitespace-separated hex payload into bytes
///
/// Each token may carry a `0x` prefix; a token with an odd number of
/// digits is read as if it had a leading zero (`"C"` -> `0x0C`).
/// Returns `None` if any token is not hex.
pub fn parse_hex_bytes(payload: &str) -> Option<Vec<u8>> {
    let mut bytes = Vec::new();
    for token in payload.split_whitespace() {
        let token = strip_hex_prefix(token);
        let decoded = if token.len() % 2 == 1 {
            hex::decode(format!("0{}", token))
        } else {
            hex::decode(token)
        };
        bytes.extend(decoded.ok()?);
    }
    Some(bytes)
}

/// Format bytes the way the bridge and the message log show them
/// (`"AA BB CC DD"`)
pub fn format_hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// The digits of a hex token after at most one `0x` prefix, if every one
/// of them is a hex digit
pub(crate) fn hex_digits(token: &str) -> Option<&str> {
    let digits = strip_hex_prefix(token);
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(digits)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_service_id() {
        assert_eq!(parse_service_id("10"), Some(0x10));
        assert_eq!(parse_service_id("0x27"), Some(0x27));
        assert_eq!(parse_service_id(" 2e "), Some(0x2E));
        assert_eq!(parse_service_id("ZZ"), None);
        assert_eq!(parse_service_id(""), None);
        assert_eq!(parse_service_id("1G"), None);
        assert_eq!(parse_service_id("+10"), None);
        assert_eq!(parse_service_id("0x0x27"), None);
        assert_eq!(parse_service_id("0x"), None);
    }

    #[test]
    fn test_parse_hex_bytes() {
        assert_eq!(
            parse_hex_bytes("02 AA BB CC DD"),
            Some(vec![0x02, 0xAA, 0xBB, 0xCC, 0xDD])
        );
        assert_eq!(parse_hex_bytes("FFFFFF"), Some(vec![0xFF, 0xFF, 0xFF]));
        assert_eq!(
            parse_hex_bytes("F1 10 78 B2 A1 C"),
            Some(vec![0xF1, 0x10, 0x78, 0xB2, 0xA1, 0x0C])
        );
        assert_eq!(parse_hex_bytes("ACK!"), None);
        assert_eq!(parse_hex_bytes(""), Some(vec![]));
    }

    #[test]
    fn test_format_hex_bytes() {
        assert_eq!(format_hex_bytes(&[0xAA, 0x0B]), "AA 0B");
        assert_eq!(format_hex_bytes(&[]), "");
    }
}
