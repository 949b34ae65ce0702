//! DispenseCalculator — drives one dispensing calculation end to end.
//!
//! Connects all the stages: validate → resolve identity → interpret dosing
//! → compute quantity → fetch the package market → select a package. Pure
//! pipeline logic with trait-based DI over the external collaborators; no
//! HTTP or transport concerns live here.
//!
//! The pipeline never propagates a failure to the caller. Fatal steps stop
//! the pass and land in `errors`; degraded steps append to `warnings` and
//! the pass continues with whatever is left.

use chrono::Utc;
use futures_util::future::join_all;
use uuid::Uuid;

use crate::cache::IdentityCache;
use crate::config::{EngineConfig, DEFAULT_MAX_USES_PER_DAY};
use crate::dose;
use crate::models::{
    CalculationInput, CalculationResult, DrugIdentity, PackageRecord, PackageSelection,
    QuantityNeed, StructuredSig,
};
use crate::providers::{
    CatalogLookup, DirectoryClient, DosingInterpreter, IdentityResolver, PackageInfoProvider,
    SigServiceClient,
};
use crate::resolve::IdentityNormalizer;
use crate::selection::select_packages;

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Orchestrates a full dispensing calculation.
///
/// Generic over the four collaborator seams so tests can swap any of them
/// for in-memory mocks. Holds the identity cache through its normalizer;
/// one calculator instance serves concurrent calculations.
pub struct DispenseCalculator<R, D, C, P> {
    normalizer: IdentityNormalizer<R>,
    interpreter: D,
    catalog: C,
    packages: P,
    config: EngineConfig,
}

impl<R, D, C, P> DispenseCalculator<R, D, C, P>
where
    R: IdentityResolver,
    D: DosingInterpreter,
    C: CatalogLookup,
    P: PackageInfoProvider,
{
    pub fn new(resolver: R, interpreter: D, catalog: C, packages: P, config: EngineConfig) -> Self {
        let cache = IdentityCache::new(config.identity_cache_ttl);
        let normalizer = IdentityNormalizer::new(resolver, cache);
        Self {
            normalizer,
            interpreter,
            catalog,
            packages,
            config,
        }
    }

    /// Run one calculation from raw input to package selection.
    ///
    /// Infallible by signature: every internal failure lands in the
    /// result's `errors` or `warnings`, and the result always carries
    /// whatever partial data was computed before a fatal step.
    pub async fn calculate(&self, input: CalculationInput) -> CalculationResult {
        let mut pending = PendingResult::new(input.clone());
        tracing::info!(
            calculation_id = %pending.calculation_id,
            days_supply = input.days_supply,
            "Calculation: starting"
        );

        // Step 1: Validate input
        if let Err(e) = input.validate() {
            tracing::warn!(calculation_id = %pending.calculation_id, error = %e, "Calculation rejected: invalid input");
            return pending.fail(e.to_string());
        }

        // Step 2: Resolve drug identity
        let identity = match self.normalizer.resolve(&input.drug_query).await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(calculation_id = %pending.calculation_id, error = %e, "Identity resolution failed");
                return pending.fail(format!("Could not resolve drug: {}", e));
            }
        };
        tracing::debug!(
            calculation_id = %pending.calculation_id,
            drug_id = %identity.id,
            name = %identity.canonical_name,
            "Resolved drug identity"
        );
        pending.identity = Some(identity.clone());

        // Step 3: Interpret dosing instructions
        let dosing = match self.interpreter.interpret(&input.sig_text).await {
            Ok(dosing) => dosing,
            Err(e) => {
                tracing::warn!(calculation_id = %pending.calculation_id, error = %e, "Dosing interpretation failed");
                return pending.fail(format!("Could not interpret dosing: {}", e));
            }
        };
        if dosing.is_ambiguous {
            pending.warnings.push(match &dosing.clarification {
                Some(clarification) => {
                    format!("Dosing instructions are ambiguous: {}", clarification)
                }
                None => "Dosing instructions are ambiguous.".to_string(),
            });
        } else if dosing.is_prn() {
            pending
                .warnings
                .push("As-needed dosing: an exact quantity cannot be computed.".to_string());
        }
        pending.dosing = Some(dosing.clone());

        // Step 4: Compute the quantity needed. Ambiguity outranks a taper
        // schedule; a schedule on an ambiguous sig never drives the arithmetic.
        let need = match dosing.taper_schedule() {
            Some(steps) if !dosing.is_ambiguous => {
                dose::compute_taper_quantity(steps, &dosing.dose_unit)
            }
            _ => dose::compute_quantity(&dosing, input.days_supply),
        };
        let need = match need {
            Ok(need) => need,
            Err(e) => {
                tracing::warn!(calculation_id = %pending.calculation_id, error = %e, "Quantity computation failed");
                return pending.fail(e.to_string());
            }
        };
        if dosing.taper_schedule().is_some() && need.days_supply != input.days_supply {
            pending.warnings.push(format!(
                "Taper schedule covers {} days but {} days supply was requested.",
                need.days_supply, input.days_supply
            ));
        }
        pending
            .warnings
            .extend(dose::assess_reasonableness(&need, &self.config.limits));
        tracing::debug!(
            calculation_id = %pending.calculation_id,
            total = need.total,
            unit = %need.unit,
            "Computed quantity"
        );
        pending.quantity = Some(need.clone());

        // Step 5: List the package codes on the market
        let codes = match self.catalog.list_package_codes(&identity.id).await {
            Ok(codes) => codes,
            Err(e) => {
                tracing::warn!(calculation_id = %pending.calculation_id, error = %e, "Package catalog unavailable, continuing without packages");
                pending
                    .warnings
                    .push(format!("Package catalog unavailable: {}", e));
                Vec::new()
            }
        };

        // Step 6: Fetch package records, batched
        let (records, unavailable) = self.fetch_package_records(&codes).await;
        if unavailable > 0 {
            pending.warnings.push(format!(
                "{} of {} package records could not be fetched.",
                unavailable,
                codes.len()
            ));
        }

        // Step 7: Report discontinued packages (selection drops them)
        let inactive = records.iter().filter(|r| !r.active).count();
        if inactive > 0 {
            pending.warnings.push(format!(
                "{} discontinued package(s) excluded from selection.",
                inactive
            ));
        }

        // Step 8: Select the package to dispense
        let outcome = select_packages(&records, &need, &self.config.selection);
        pending.primary = outcome.primary;
        pending.alternatives = outcome.alternatives;
        pending.warnings.extend(outcome.warnings);

        // Step 9: Assemble
        let result = pending.finish();
        tracing::info!(
            calculation_id = %result.calculation_id,
            success = result.success,
            warnings = result.warnings.len(),
            "Calculation: complete"
        );
        result
    }

    /// Upper-bound quantity estimate for an as-needed sig, using the
    /// configured ceiling on daily uses. Companion to `calculate` for
    /// operators who need a dispensable number despite PRN dosing.
    pub fn estimate_prn_quantity(
        &self,
        dosing: &StructuredSig,
        days_supply: u32,
    ) -> Result<QuantityNeed, dose::QuantityError> {
        dose::estimate_as_needed(dosing, days_supply, DEFAULT_MAX_USES_PER_DAY)
    }

    /// The identity cache behind this calculator's normalizer.
    pub fn identity_cache(&self) -> &IdentityCache {
        self.normalizer.cache()
    }

    /// Fetch records for the given codes in fixed-size concurrent batches,
    /// pausing between batches. A failed or missing record is skipped and
    /// counted, never fatal.
    async fn fetch_package_records(&self, codes: &[String]) -> (Vec<PackageRecord>, usize) {
        // chunks() panics on zero
        let batch_size = self.config.fetch.batch_size.max(1);
        let mut records = Vec::with_capacity(codes.len());
        let mut unavailable = 0usize;

        for (i, batch) in codes.chunks(batch_size).enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.fetch.batch_pause).await;
            }

            let results = join_all(
                batch
                    .iter()
                    .map(|code| self.packages.get_package_record(code)),
            )
            .await;

            for (code, result) in batch.iter().zip(results) {
                match result {
                    Ok(Some(record)) => records.push(record),
                    Ok(None) => {
                        tracing::debug!(code = %code, "Package code unknown to the catalog, skipping");
                        unavailable += 1;
                    }
                    Err(e) => {
                        tracing::warn!(code = %code, error = %e, "Package record fetch failed, skipping");
                        unavailable += 1;
                    }
                }
            }
        }

        (records, unavailable)
    }
}

// ---------------------------------------------------------------------------
// Result assembly
// ---------------------------------------------------------------------------

/// Accumulates pipeline state so every exit point, fatal or not, assembles
/// the same shape of result.
struct PendingResult {
    calculation_id: Uuid,
    input: CalculationInput,
    identity: Option<DrugIdentity>,
    dosing: Option<StructuredSig>,
    quantity: Option<QuantityNeed>,
    primary: Option<PackageSelection>,
    alternatives: Vec<PackageSelection>,
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl PendingResult {
    fn new(input: CalculationInput) -> Self {
        Self {
            calculation_id: Uuid::new_v4(),
            input,
            identity: None,
            dosing: None,
            quantity: None,
            primary: None,
            alternatives: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn fail(mut self, error: String) -> CalculationResult {
        self.errors.push(error);
        self.finish()
    }

    fn finish(self) -> CalculationResult {
        let success = self.errors.is_empty() && self.primary.is_some();
        CalculationResult {
            calculation_id: self.calculation_id,
            input: self.input,
            identity: self.identity,
            dosing: self.dosing,
            quantity: self.quantity,
            primary: self.primary,
            alternatives: self.alternatives,
            warnings: self.warnings,
            errors: self.errors,
            success,
            completed_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// `DispenseCalculator` wired with the production REST collaborators.
pub type RestDispenseCalculator =
    DispenseCalculator<DirectoryClient, SigServiceClient, DirectoryClient, DirectoryClient>;

/// Build a calculator with production implementations.
///
/// - Identity, catalog listing, package records: `DirectoryClient`
/// - Dosing interpretation: `SigServiceClient`
pub fn build_calculator(
    directory_url: &str,
    sig_service_url: &str,
    config: EngineConfig,
) -> RestDispenseCalculator {
    let timeout = config.fetch.request_timeout_secs;
    let directory = DirectoryClient::new(directory_url, timeout);
    let interpreter = SigServiceClient::new(sig_service_url, timeout);
    tracing::info!(
        directory = %directory_url,
        sig_service = %sig_service_url,
        "Dispense calculator using REST collaborators"
    );

    DispenseCalculator::new(directory.clone(), interpreter, directory.clone(), directory, config)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
