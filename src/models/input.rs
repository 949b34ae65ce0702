use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Accepted length range for the drug name / code field.
pub const MIN_DRUG_QUERY_LEN: usize = 2;
pub const MAX_DRUG_QUERY_LEN: usize = 200;

/// Accepted length range for the free-text dosing instructions.
pub const MIN_SIG_TEXT_LEN: usize = 5;
pub const MAX_SIG_TEXT_LEN: usize = 500;

/// Accepted days-supply range.
pub const MIN_DAYS_SUPPLY: u32 = 1;
pub const MAX_DAYS_SUPPLY: u32 = 365;

/// One dispense calculation request. Built at the request boundary and
/// never mutated afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationInput {
    /// Free-text drug name, or a 10/11-digit product code.
    pub drug_query: String,
    /// Free-text dosing instructions (the prescription sig).
    pub sig_text: String,
    /// Days of therapy the dispense must cover.
    pub days_supply: u32,
}

impl CalculationInput {
    pub fn new(drug_query: &str, sig_text: &str, days_supply: u32) -> Self {
        Self {
            drug_query: drug_query.to_string(),
            sig_text: sig_text.to_string(),
            days_supply,
        }
    }

    /// Check every field against its accepted range.
    ///
    /// Trims before measuring, so padding whitespace neither rescues a
    /// too-short value nor sinks a valid one.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let query_len = self.drug_query.trim().len();
        if !(MIN_DRUG_QUERY_LEN..=MAX_DRUG_QUERY_LEN).contains(&query_len) {
            return Err(ValidationError::DrugQueryLength { len: query_len });
        }

        let sig_len = self.sig_text.trim().len();
        if !(MIN_SIG_TEXT_LEN..=MAX_SIG_TEXT_LEN).contains(&sig_len) {
            return Err(ValidationError::SigTextLength { len: sig_len });
        }

        if !(MIN_DAYS_SUPPLY..=MAX_DAYS_SUPPLY).contains(&self.days_supply) {
            return Err(ValidationError::DaysSupplyOutOfRange {
                days: self.days_supply,
            });
        }

        Ok(())
    }
}

/// Field-level validation failures at the request boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("drug name or code must be {MIN_DRUG_QUERY_LEN}-{MAX_DRUG_QUERY_LEN} characters (got {len})")]
    DrugQueryLength { len: usize },

    #[error("dosing instructions must be {MIN_SIG_TEXT_LEN}-{MAX_SIG_TEXT_LEN} characters (got {len})")]
    SigTextLength { len: usize },

    #[error("days supply must be between {MIN_DAYS_SUPPLY} and {MAX_DAYS_SUPPLY} (got {days})")]
    DaysSupplyOutOfRange { days: u32 },
}
