use serde::{Deserialize, Serialize};

/// The computed dispense quantity for one calculation.
///
/// `total = daily_dose × days_supply` except for the PRN/ambiguous cases
/// (both zeroed) and tapers (summed per step, `daily_dose` is the average).
/// Always non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityNeed {
    pub total: f64,
    pub unit: String,
    pub days_supply: u32,
    pub daily_dose: f64,
}

impl QuantityNeed {
    /// A zeroed quantity: PRN or ambiguous dosing, nothing derivable.
    pub fn undeterminable(unit: &str, days_supply: u32) -> Self {
        Self {
            total: 0.0,
            unit: unit.to_string(),
            days_supply,
            daily_dose: 0.0,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.total == 0.0
    }
}
