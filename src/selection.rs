//! Package selection: which marketed package best covers a quantity.
//!
//! Given the packages on the market for a drug and the total quantity
//! needed, pick the dispense with the least waste. Packages large enough
//! to cover the need on their own always outrank packages that need
//! repeating; within either group, lower overfill wins. Only homogeneous
//! repeats of one package size are considered; mixing sizes is out of
//! scope.

use crate::config::SelectionOptions;
use crate::models::{PackageRecord, PackageSelection, QuantityNeed};
use crate::units::units_compatible;

/// Outcome of a selection pass: the best package, runners-up, and any
/// advisory warnings. Selection never fails; an empty market or an
/// undeterminable quantity yields empty selections with a warning.
#[derive(Debug, Clone)]
pub struct SelectionOutcome {
    pub primary: Option<PackageSelection>,
    pub alternatives: Vec<PackageSelection>,
    pub warnings: Vec<String>,
}

impl SelectionOutcome {
    fn empty_with_warning(warning: String) -> Self {
        Self {
            primary: None,
            alternatives: Vec::new(),
            warnings: vec![warning],
        }
    }
}

/// Score and rank candidate packages against the needed quantity.
///
/// Lower score wins. A package at least as large as the total scores its
/// overfill percentage (zero for an exact fit). A package that must be
/// repeated scores `undersize_penalty` plus the overfill of its repeated
/// dispense, which puts every too-small package behind every
/// individually-covering one while still ranking too-small packages by
/// waste among themselves. With `prefer_single_package` off the penalty
/// band disappears and ranking is purely by waste.
pub fn select_packages(
    candidates: &[PackageRecord],
    need: &QuantityNeed,
    options: &SelectionOptions,
) -> SelectionOutcome {
    // Step 1: undeterminable quantity (as-needed or ambiguous dosing)
    if need.is_zero() {
        return SelectionOutcome::empty_with_warning(
            "Quantity could not be determined from the dosing. Manual review required before selecting a package.".to_string(),
        );
    }

    // Step 2: keep active candidates in a compatible unit
    let viable: Vec<&PackageRecord> = candidates
        .iter()
        .filter(|p| p.active && p.size > 0.0 && units_compatible(&p.unit, &need.unit))
        .collect();

    if viable.is_empty() {
        return SelectionOutcome::empty_with_warning(format!(
            "Found no compatible active packages for {:.0} {}.",
            need.total, need.unit
        ));
    }

    // Step 3: score every candidate
    let mut scored: Vec<(f64, PackageSelection)> = viable
        .iter()
        .map(|record| {
            let package_count = (need.total / record.size).ceil() as u32;
            let dispensed = record.size * package_count as f64;
            let overfill = overfill_percent(dispensed, need.total);
            let score = if record.size < need.total && options.prefer_single_package {
                options.undersize_penalty + overfill
            } else {
                overfill
            };
            (
                score,
                PackageSelection {
                    code: record.code.clone(),
                    size: record.size,
                    unit: record.unit.clone(),
                    quantity_to_dispense: dispensed,
                    package_count,
                    overfill_percent: overfill,
                    product_name: record.product_name.clone(),
                    manufacturer: record.manufacturer.clone(),
                },
            )
        })
        .collect();

    // Stable sort: equal scores keep candidate order, so selection is
    // deterministic.
    scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    // Step 4: primary plus capped alternatives
    let mut ranked = scored.into_iter().map(|(_, selection)| selection);
    let primary = ranked.next();
    let alternatives: Vec<PackageSelection> = ranked.take(options.max_alternatives).collect();

    // Step 5: advisory warnings on the winning dispense
    let mut warnings = Vec::new();
    if let Some(ref best) = primary {
        if best.overfill_percent > options.max_overfill_percent {
            warnings.push(format!(
                "Best available package overfills by {:.1}% (threshold {:.0}%).",
                best.overfill_percent, options.max_overfill_percent
            ));
        }
        if best.package_count > 1 {
            warnings.push(format!(
                "{} packages of {} {} are required to cover the quantity.",
                best.package_count, best.size, best.unit
            ));
        }
    }

    SelectionOutcome {
        primary,
        alternatives,
        warnings,
    }
}

/// Waste of a dispense as a percentage of the needed total.
fn overfill_percent(dispensed: f64, total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    (dispensed - total) / total * 100.0
}
