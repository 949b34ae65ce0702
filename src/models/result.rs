use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::identity::DrugIdentity;
use super::input::CalculationInput;
use super::package::PackageSelection;
use super::quantity::QuantityNeed;
use super::sig::StructuredSig;

/// The assembled outcome of one dispense calculation.
///
/// Stage fields are `Option` so the result carries whatever was computed
/// before a fatal step — a caller can always render "as far as we got".
/// `success` holds iff `errors` is empty AND a primary selection exists;
/// no selection with no errors is a legitimate terminal state (manual
/// pharmacist review), not a failure of the pipeline itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationResult {
    pub calculation_id: Uuid,
    pub input: CalculationInput,
    pub identity: Option<DrugIdentity>,
    pub dosing: Option<StructuredSig>,
    pub quantity: Option<QuantityNeed>,
    pub primary: Option<PackageSelection>,
    pub alternatives: Vec<PackageSelection>,
    /// Soft signals: PRN/ambiguous dosing, inactive exclusions, overfill
    /// past threshold, multi-package requirement, degraded lookups.
    pub warnings: Vec<String>,
    /// Hard stops: invalid input, drug not found, uninterpretable dosing.
    pub errors: Vec<String>,
    pub success: bool,
    pub completed_at: DateTime<Utc>,
}
