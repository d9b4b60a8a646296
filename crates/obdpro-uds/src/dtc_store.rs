//! DTC store with status/severity filtering

use obdpro_core::{Dtc, DtcSeverity, DtcStatus, Filter};
use tracing::debug;

use crate::uds::dtc::{decode_scan_payload, sub_function, DTC_GROUP_ALL};
use crate::uds::{parse_hex_bytes, parse_service_id, service_id};

/// The DTC set currently shown by the dashboard
///
/// Every scan replaces the whole set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DtcStore {
    dtcs: Vec<Dtc>,
}

impl DtcStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_all(&mut self, dtcs: Vec<Dtc>) {
        self.dtcs = dtcs;
    }

    pub fn clear(&mut self) {
        self.dtcs.clear();
    }

    pub fn all(&self) -> &[Dtc] {
        &self.dtcs
    }

    pub fn len(&self) -> usize {
        self.dtcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dtcs.is_empty()
    }

    /// DTCs matching both filters, in store order
    pub fn filter(&self, status: Filter<DtcStatus>, severity: Filter<DtcSeverity>) -> Vec<Dtc> {
        self.dtcs
            .iter()
            .filter(|dtc| status.matches(&dtc.status) && severity.matches(&dtc.severity))
            .cloned()
            .collect()
    }

    /// Update the store from a completed exchange
    ///
    /// `14 FFFFFF` clears the store. A `19 02` scan whose reply decodes as a
    /// `59 02` record replaces it. Returns whether the store changed.
    pub fn observe(&mut self, sid: &str, sub_function: &str, response_payload: &str) -> bool {
        let Some(sid) = parse_service_id(sid) else {
            return false;
        };
        let sub = parse_hex_bytes(sub_function).unwrap_or_default();

        if sid == service_id::CLEAR_DIAGNOSTIC_INFO as u32 && sub == DTC_GROUP_ALL {
            debug!(count = self.dtcs.len(), "Clearing DTCs");
            self.clear();
            return true;
        }

        if sid == service_id::READ_DTC_INFO as u32
            && sub.first() == Some(&sub_function::REPORT_DTC_BY_STATUS_MASK)
        {
            if let Some(dtcs) = decode_scan_payload(response_payload) {
                debug!(count = dtcs.len(), "DTC scan decoded");
                self.set_all(dtcs);
                return true;
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dtc(code: &str, status: DtcStatus, severity: DtcSeverity) -> Dtc {
        Dtc {
            code: code.to_string(),
            description: String::new(),
            status,
            severity,
        }
    }

    fn sample() -> DtcStore {
        let mut store = DtcStore::new();
        store.set_all(vec![
            dtc("P0101", DtcStatus::Active, DtcSeverity::High),
            dtc("P0420", DtcStatus::Stored, DtcSeverity::Low),
            dtc("U0100", DtcStatus::Pending, DtcSeverity::Medium),
            dtc("C0035", DtcStatus::Active, DtcSeverity::Medium),
        ]);
        store
    }

    #[test]
    fn test_filter_all_returns_everything() {
        let store = sample();
        assert_eq!(store.filter(Filter::All, Filter::All), store.all().to_vec());
    }

    #[test]
    fn test_filter_combines_predicates() {
        let store = sample();
        let active = store.filter(Filter::Only(DtcStatus::Active), Filter::All);
        assert_eq!(active.len(), 2);

        let active_medium = store.filter(
            Filter::Only(DtcStatus::Active),
            Filter::Only(DtcSeverity::Medium),
        );
        assert_eq!(active_medium.len(), 1);
        assert_eq!(active_medium[0].code, "C0035");
    }

    #[test]
    fn test_filter_is_pure_and_idempotent() {
        let store = sample();
        let first = store.filter(Filter::Only(DtcStatus::Pending), Filter::All);
        let second = store.filter(Filter::Only(DtcStatus::Pending), Filter::All);
        assert_eq!(first, second);
        assert_eq!(store, sample());
    }

    #[test]
    fn test_set_all_replaces() {
        let mut store = sample();
        store.set_all(vec![dtc("B1234", DtcStatus::Stored, DtcSeverity::Low)]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clear_request_empties_store() {
        let mut store = sample();
        assert!(store.observe("14", "FFFFFF", "54"));
        assert!(store.is_empty());

        let mut spaced = sample();
        assert!(spaced.observe("14", "FF FF FF", "ACK"));
        assert!(spaced.is_empty());
    }

    #[test]
    fn test_scan_replaces_store() {
        let mut store = sample();
        assert!(store.observe("19", "02 08", "59 02 FF 01 23 45 09"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.all()[0].code, "P0123");
    }

    #[test]
    fn test_undecodable_scan_leaves_store() {
        let mut store = sample();
        assert!(!store.observe("19", "02 08", "ACK"));
        assert_eq!(store, sample());
        assert!(!store.observe("22", "F190", "62 F1 90"));
        assert!(!store.observe("??", "FFFFFF", "ACK"));
        assert_eq!(store, sample());
    }
}
