use serde::{Deserialize, Serialize};

/// Structured dosing extracted from free-text instructions by the
/// interpretation service.
///
/// `times_per_day = 0` is the sentinel for as-needed (PRN) dosing.
/// Fractional frequencies are legitimate (0.5 = every other day).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredSig {
    pub dose_amount: f64,
    pub dose_unit: String,
    pub times_per_day: f64,
    pub route: String,
    /// Human-readable restatement of the instructions, for labels.
    pub readable_instructions: String,
    /// True when the text parsed but is clinically underspecified; the
    /// computed quantity cannot be trusted.
    pub is_ambiguous: bool,
    /// Interpreter's question for the prescriber when ambiguous.
    pub clarification: Option<String>,
    pub taper_steps: Option<Vec<TaperStep>>,
}

/// One step of a taper regimen: `amount` per day for `days` days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaperStep {
    pub amount: f64,
    pub days: u32,
}

impl StructuredSig {
    /// Whether this sig is as-needed dosing (no fixed frequency).
    pub fn is_prn(&self) -> bool {
        self.times_per_day <= 0.0 && !self.has_taper()
    }

    /// The taper schedule, when one is present and non-empty. An empty
    /// schedule from the wire is treated as no taper.
    pub fn taper_schedule(&self) -> Option<&[TaperStep]> {
        self.taper_steps.as_deref().filter(|steps| !steps.is_empty())
    }

    fn has_taper(&self) -> bool {
        self.taper_schedule().is_some()
    }
}
