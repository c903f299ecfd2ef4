//! Ledger tuning knobs.
//!
//! ```toml
//! cas_max_retries = 5
//! boleto_due_days = 30
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};
use lente_core::ValidationError;

/// Settings for the settlement services.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerSettings {
    /// Attempts at the version-checked totals update before giving up with
    /// `CONFLICT`.
    #[serde(default = "default_cas_max_retries")]
    pub cas_max_retries: u32,

    /// Due date offset for boletos issued without an explicit due date.
    #[serde(default = "default_boleto_due_days")]
    pub boleto_due_days: u32,
}

fn default_cas_max_retries() -> u32 {
    5
}

fn default_boleto_due_days() -> u32 {
    30
}

impl Default for LedgerSettings {
    fn default() -> Self {
        LedgerSettings {
            cas_max_retries: default_cas_max_retries(),
            boleto_due_days: default_boleto_due_days(),
        }
    }
}

impl LedgerSettings {
    pub fn from_toml_str(raw: &str) -> ServiceResult<Self> {
        let settings: LedgerSettings = toml::from_str(raw).map_err(|e| {
            ServiceError::Validation(ValidationError::InvalidFormat {
                field: "ledger settings".to_string(),
                reason: e.to_string(),
            })
        })?;

        if settings.cas_max_retries == 0 {
            return Err(ValidationError::OutOfRange {
                field: "cas_max_retries".to_string(),
                min: 1,
                max: i64::from(u32::MAX),
            }
            .into());
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_keys() {
        let settings = LedgerSettings::from_toml_str("boleto_due_days = 10").unwrap();
        assert_eq!(settings.cas_max_retries, 5);
        assert_eq!(settings.boleto_due_days, 10);
        assert_eq!(LedgerSettings::from_toml_str("").unwrap(), LedgerSettings::default());
    }

    #[test]
    fn test_zero_retries_rejected() {
        assert!(LedgerSettings::from_toml_str("cas_max_retries = 0").is_err());
        assert!(LedgerSettings::from_toml_str("cas_max_retries = \"many\"").is_err());
    }
}
