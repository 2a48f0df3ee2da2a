use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The wire string doubles as the serde representation.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(DecisionStatus {
    Apte => "apte",
    Inapte => "inapte",
    AptePartielle => "apte_partielle",
});

str_enum!(LabOutcome {
    Positive => "positive",
    Negative => "negative",
});

str_enum!(ExamStatus {
    Open => "open",
    Closed => "closed",
});

impl Default for ExamStatus {
    fn default() -> Self {
        Self::Open
    }
}

impl DecisionStatus {
    /// Unfit or conditionally fit: the next visit is a retest, not a periodic exam.
    pub fn requires_retest(&self) -> bool {
        matches!(self, Self::Inapte | Self::AptePartielle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn decision_status_round_trip() {
        for (variant, s) in [
            (DecisionStatus::Apte, "apte"),
            (DecisionStatus::Inapte, "inapte"),
            (DecisionStatus::AptePartielle, "apte_partielle"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(DecisionStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn lab_outcome_round_trip() {
        for (variant, s) in [(LabOutcome::Positive, "positive"), (LabOutcome::Negative, "negative")] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(LabOutcome::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn serde_uses_wire_strings() {
        let json = serde_json::to_string(&DecisionStatus::AptePartielle).unwrap();
        assert_eq!(json, "\"apte_partielle\"");
        let parsed: ExamStatus = serde_json::from_str("\"closed\"").unwrap();
        assert_eq!(parsed, ExamStatus::Closed);
    }

    #[test]
    fn unknown_wire_string_rejected_by_serde() {
        assert!(serde_json::from_str::<DecisionStatus>("\"fit\"").is_err());
    }

    #[test]
    fn retest_statuses() {
        assert!(!DecisionStatus::Apte.requires_retest());
        assert!(DecisionStatus::Inapte.requires_retest());
        assert!(DecisionStatus::AptePartielle.requires_retest());
    }

    #[test]
    fn exam_status_defaults_to_open() {
        assert_eq!(ExamStatus::default(), ExamStatus::Open);
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(DecisionStatus::from_str("Apte").is_err());
        assert!(LabOutcome::from_str("").is_err());
        assert!(ExamStatus::from_str("pending").is_err());
    }
}
