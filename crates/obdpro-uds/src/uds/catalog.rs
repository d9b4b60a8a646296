//! Service catalog: named diagnostic intents and the UDS request each one
//! sends

use serde::{Deserialize, Serialize};

/// A named diagnostic action offered by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceIntent {
    ExtendedSession,
    ProgrammingSession,
    SecurityAccess,
    ReadDtcs,
    ClearDtcs,
    ReadVin,
    EcuReset,
    WriteInjectorCode,
    WriteVin,
}

impl ServiceIntent {
    /// Every intent, in the order the tool panel lists them
    pub const ALL: &'static [ServiceIntent] = &[
        ServiceIntent::ExtendedSession,
        ServiceIntent::SecurityAccess,
        ServiceIntent::ReadDtcs,
        ServiceIntent::ClearDtcs,
        ServiceIntent::ReadVin,
        ServiceIntent::EcuReset,
        ServiceIntent::ProgrammingSession,
        ServiceIntent::WriteInjectorCode,
        ServiceIntent::WriteVin,
    ];

    /// The (service id, sub-function) pair this intent sends
    pub fn lookup(&self) -> (&'static str, &'static str) {
        match self {
            ServiceIntent::ExtendedSession => ("10", "03"),
            ServiceIntent::ProgrammingSession => ("10", "02"),
            ServiceIntent::SecurityAccess => ("27", "01"),
            ServiceIntent::ReadDtcs => ("19", "02 08"),
            ServiceIntent::ClearDtcs => ("14", "FFFFFF"),
            ServiceIntent::ReadVin => ("22", "F190"),
            ServiceIntent::EcuReset => ("11", "01"),
            ServiceIntent::WriteInjectorCode => ("2E", "F1 10 78 B2 A1 C"),
            ServiceIntent::WriteVin => ("2E", "F1 90 57 42 41"),
        }
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            ServiceIntent::ExtendedSession => "Extended Session",
            ServiceIntent::ProgrammingSession => "Programming Session",
            ServiceIntent::SecurityAccess => "Security Access",
            ServiceIntent::ReadDtcs => "Read DTCs",
            ServiceIntent::ClearDtcs => "Clear DTCs",
            ServiceIntent::ReadVin => "Read VIN",
            ServiceIntent::EcuReset => "ECU Reset",
            ServiceIntent::WriteInjectorCode => "Write Injector Code",
            ServiceIntent::WriteVin => "Write VIN",
        }
    }

    /// Find an intent by display name or snake_case key, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = name.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        Self::ALL.iter().copied().find(|intent| {
            intent.name().to_ascii_lowercase() == wanted
                || intent.key().replace('_', " ") == wanted
        })
    }

    /// snake_case key used in config files and on the command line
    pub fn key(&self) -> &'static str {
        match self {
            ServiceIntent::ExtendedSession => "extended_session",
            ServiceIntent::ProgrammingSession => "programming_session",
            ServiceIntent::SecurityAccess => "security_access",
            ServiceIntent::ReadDtcs => "read_dtcs",
            ServiceIntent::ClearDtcs => "clear_dtcs",
            ServiceIntent::ReadVin => "read_vin",
            ServiceIntent::EcuReset => "ecu_reset",
            ServiceIntent::WriteInjectorCode => "write_injector_code",
            ServiceIntent::WriteVin => "write_vin",
        }
    }
}

impl std::fmt::Display for ServiceIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_pairs() {
        assert_eq!(ServiceIntent::ExtendedSession.lookup(), ("10", "03"));
        assert_eq!(ServiceIntent::SecurityAccess.lookup(), ("27", "01"));
        assert_eq!(ServiceIntent::ReadDtcs.lookup(), ("19", "02 08"));
        assert_eq!(ServiceIntent::ClearDtcs.lookup(), ("14", "FFFFFF"));
        assert_eq!(ServiceIntent::ReadVin.lookup(), ("22", "F190"));
        assert_eq!(ServiceIntent::EcuReset.lookup(), ("11", "01"));
    }

    #[test]
    fn test_from_name() {
        assert_eq!(
            ServiceIntent::from_name("Read DTCs"),
            Some(ServiceIntent::ReadDtcs)
        );
        assert_eq!(
            ServiceIntent::from_name("read_vin"),
            Some(ServiceIntent::ReadVin)
        );
        assert_eq!(
            ServiceIntent::from_name("ecu-reset"),
            Some(ServiceIntent::EcuReset)
        );
        assert_eq!(ServiceIntent::from_name("Launch Rocket"), None);
    }

    #[test]
    fn test_all_intents_have_distinct_keys() {
        let mut keys: Vec<_> = ServiceIntent::ALL.iter().map(|i| i.key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), ServiceIntent::ALL.len());
    }
}
