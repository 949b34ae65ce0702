//! Quantity calculation from structured dosing.
//!
//! Turns an interpreted SIG into the total quantity needed for a requested
//! days supply. Steady dosing multiplies out directly; taper schedules sum
//! per-step contributions; as-needed dosing cannot be computed exactly and
//! yields a zero quantity unless the caller asks for a ceiling estimate.

use thiserror::Error;

use crate::config::ReasonablenessLimits;
use crate::models::{QuantityNeed, StructuredSig, TaperStep, MAX_DAYS_SUPPLY, MIN_DAYS_SUPPLY};

/// Compute the total quantity needed for `days_supply` days of the given
/// dosing.
///
/// Ambiguous and as-needed sigs have no computable total; both produce a
/// zero [`QuantityNeed`] that carries the unit and days supply forward so
/// downstream stages can still report in the right terms.
pub fn compute_quantity(
    dosing: &StructuredSig,
    days_supply: u32,
) -> Result<QuantityNeed, QuantityError> {
    if !(MIN_DAYS_SUPPLY..=MAX_DAYS_SUPPLY).contains(&days_supply) {
        return Err(QuantityError::DaysSupplyOutOfRange { days: days_supply });
    }
    if dosing.dose_amount < 0.0 {
        return Err(QuantityError::NegativeDose {
            amount: dosing.dose_amount,
        });
    }
    if dosing.is_ambiguous || dosing.is_prn() {
        return Ok(QuantityNeed::undeterminable(&dosing.dose_unit, days_supply));
    }

    let daily_dose = dosing.dose_amount * dosing.times_per_day;
    Ok(QuantityNeed {
        total: daily_dose * days_supply as f64,
        unit: dosing.dose_unit.clone(),
        days_supply,
        daily_dose,
    })
}

/// Compute the total quantity for a taper schedule.
///
/// The schedule defines its own duration: days supply is the sum of step
/// days, and the daily dose is the average over that duration.
pub fn compute_taper_quantity(
    steps: &[TaperStep],
    unit: &str,
) -> Result<QuantityNeed, QuantityError> {
    if steps.is_empty() {
        return Err(QuantityError::EmptyTaperSchedule);
    }
    let mut total_days: u32 = 0;
    for (index, step) in steps.iter().enumerate() {
        if step.days == 0 {
            return Err(QuantityError::InvalidTaperStep {
                index,
                reason: "step lasts zero days".to_string(),
            });
        }
        if step.amount < 0.0 {
            return Err(QuantityError::InvalidTaperStep {
                index,
                reason: format!("negative dose amount {}", step.amount),
            });
        }
        // Step days come from an external interpreter; the running total
        // must not wrap.
        total_days = total_days
            .checked_add(step.days)
            .ok_or_else(|| QuantityError::InvalidTaperStep {
                index,
                reason: "cumulative days overflow".to_string(),
            })?;
    }

    let total: f64 = steps.iter().map(|s| s.amount * s.days as f64).sum();

    Ok(QuantityNeed {
        total,
        unit: unit.to_string(),
        days_supply: total_days,
        daily_dose: total / total_days as f64,
    })
}

/// Ceiling estimate for as-needed dosing.
///
/// An as-needed sig has no exact total, but dispensing still needs a number.
/// This assumes the maximum plausible use: `dose_amount * max_uses_per_day`
/// every day of the supply. Ambiguous sigs stay undeterminable even here.
pub fn estimate_as_needed(
    dosing: &StructuredSig,
    days_supply: u32,
    max_uses_per_day: f64,
) -> Result<QuantityNeed, QuantityError> {
    if !(MIN_DAYS_SUPPLY..=MAX_DAYS_SUPPLY).contains(&days_supply) {
        return Err(QuantityError::DaysSupplyOutOfRange { days: days_supply });
    }
    if dosing.dose_amount < 0.0 {
        return Err(QuantityError::NegativeDose {
            amount: dosing.dose_amount,
        });
    }
    if dosing.is_ambiguous {
        return Ok(QuantityNeed::undeterminable(&dosing.dose_unit, days_supply));
    }
    if !dosing.is_prn() {
        return compute_quantity(dosing, days_supply);
    }

    let daily_dose = dosing.dose_amount * max_uses_per_day;
    Ok(QuantityNeed {
        total: daily_dose * days_supply as f64,
        unit: dosing.dose_unit.clone(),
        days_supply,
        daily_dose,
    })
}

/// Sanity-check a computed quantity against configured limits.
///
/// Returns advisory messages, never errors: an implausible number still
/// flows through the pipeline, flagged for a human to look at.
pub fn assess_reasonableness(need: &QuantityNeed, limits: &ReasonablenessLimits) -> Vec<String> {
    let mut warnings = Vec::new();

    if need.is_zero() {
        warnings.push(
            "Computed quantity is zero; the dosing did not yield a dispensable amount."
                .to_string(),
        );
    }
    if need.total > limits.max_total_quantity {
        warnings.push(format!(
            "Total quantity {:.0} {} is unusually large (above {:.0}). Double-check the dosing interpretation before dispensing.",
            need.total, need.unit, limits.max_total_quantity
        ));
    }
    if need.daily_dose > limits.max_daily_dose {
        warnings.push(format!(
            "Daily dose {:.1} {} is unusually high (above {:.1}). Double-check the dosing interpretation before dispensing.",
            need.daily_dose, need.unit, limits.max_daily_dose
        ));
    }

    warnings
}

/// Errors from quantity computation.
#[derive(Debug, Error)]
pub enum QuantityError {
    #[error("days supply must be between 1 and 365 days, got {days}")]
    DaysSupplyOutOfRange { days: u32 },

    #[error("dose amount cannot be negative, got {amount}")]
    NegativeDose { amount: f64 },

    #[error("taper schedule has no steps")]
    EmptyTaperSchedule,

    #[error("taper step {index} is invalid: {reason}")]
    InvalidTaperStep { index: usize, reason: String },
}
