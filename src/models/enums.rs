use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
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

str_enum!(ProcessingStatus {
    New => "new",
    TextExtracted => "text_extracted",
    Classified => "classified",
    Summarized => "summarized",
    Filed => "filed",
    FilingError => "filing_error",
    TaggingSkippedNoText => "tagging_skipped_no_text",
});

str_enum!(AuditStatus {
    Success => "SUCCESS",
    Failure => "FAILURE",
    Skipped => "SKIPPED",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn processing_status_round_trip() {
        for (variant, s) in [
            (ProcessingStatus::New, "new"),
            (ProcessingStatus::TextExtracted, "text_extracted"),
            (ProcessingStatus::Classified, "classified"),
            (ProcessingStatus::Summarized, "summarized"),
            (ProcessingStatus::Filed, "filed"),
            (ProcessingStatus::FilingError, "filing_error"),
            (
                ProcessingStatus::TaggingSkippedNoText,
                "tagging_skipped_no_text",
            ),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(ProcessingStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn audit_status_round_trip() {
        for (variant, s) in [
            (AuditStatus::Success, "SUCCESS"),
            (AuditStatus::Failure, "FAILURE"),
            (AuditStatus::Skipped, "SKIPPED"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(AuditStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(ProcessingStatus::from_str("invalid").is_err());
        assert!(AuditStatus::from_str("").is_err());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&ProcessingStatus::TaggingSkippedNoText).unwrap();
        assert_eq!(json, "\"tagging_skipped_no_text\"");
    }
}
