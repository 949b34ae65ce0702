//! Named configuration for the dispense pipeline.
//!
//! Every threshold the pipeline consults lives here as an explicit value:
//! selection scoring knobs, fetch batching/pacing, reasonableness limits,
//! and the identity-cache TTL. Nothing in the pipeline reads an inlined
//! magic number.

use std::time::Duration;

use serde::Serialize;

/// Application-level constants
pub const APP_NAME: &str = "Fillwise";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Conservative uses-per-day multiplier for opt-in PRN estimation.
pub const DEFAULT_MAX_USES_PER_DAY: f64 = 4.0;

/// Default tracing filter when RUST_LOG is not set.
pub fn default_log_filter() -> String {
    "fillwise=info".to_string()
}

// ═══════════════════════════════════════════════════════════
// Selection
// ═══════════════════════════════════════════════════════════

/// Options governing package scoring and selection.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionOptions {
    /// Warn when the primary selection overfills past this percentage.
    pub max_overfill_percent: f64,
    /// Apply the undersize penalty band, ranking every package that
    /// individually covers the need above any multi-package repeat.
    /// Disabled, scoring is pure waste minimization.
    pub prefer_single_package: bool,
    /// How many ranked alternatives accompany the primary selection.
    pub max_alternatives: usize,
    /// Score band added to candidates smaller than the needed quantity.
    pub undersize_penalty: f64,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self {
            max_overfill_percent: 20.0,
            prefer_single_package: true,
            max_alternatives: 3,
            undersize_penalty: 10_000.0,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Fetching
// ═══════════════════════════════════════════════════════════

/// Batching and pacing for package-record retrieval.
#[derive(Debug, Clone, Serialize)]
pub struct FetchOptions {
    /// Codes looked up concurrently per batch.
    pub batch_size: usize,
    /// Pause between consecutive batches (upstream rate-limit politeness).
    pub batch_pause: Duration,
    /// Per-request timeout for the REST adapter clients, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            batch_size: 5,
            batch_pause: Duration::from_millis(100),
            request_timeout_secs: 30,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Reasonableness
// ═══════════════════════════════════════════════════════════

/// Advisory thresholds for computed quantities. Exceeding them produces
/// warnings, never errors.
#[derive(Debug, Clone, Serialize)]
pub struct ReasonablenessLimits {
    /// Total quantities above this are flagged as unusually large.
    pub max_total_quantity: f64,
    /// Daily doses above this are flagged as unusually high.
    pub max_daily_dose: f64,
}

impl Default for ReasonablenessLimits {
    fn default() -> Self {
        Self {
            max_total_quantity: 1000.0,
            max_daily_dose: 100.0,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Engine
// ═══════════════════════════════════════════════════════════

/// Full pipeline configuration passed to `DispenseCalculator`.
#[derive(Debug, Clone, Serialize)]
pub struct EngineConfig {
    pub selection: SelectionOptions,
    pub fetch: FetchOptions,
    pub limits: ReasonablenessLimits,
    /// How long a resolved drug identity stays valid in the cache.
    pub identity_cache_ttl: Duration,
}

impl EngineConfig {
    /// Default identity-cache TTL: one hour.
    pub const DEFAULT_IDENTITY_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

    pub fn new() -> Self {
        Self {
            selection: SelectionOptions::default(),
            fetch: FetchOptions::default(),
            limits: ReasonablenessLimits::default(),
            identity_cache_ttl: Self::DEFAULT_IDENTITY_CACHE_TTL,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_defaults() {
        let opts = SelectionOptions::default();
        assert!((opts.max_overfill_percent - 20.0).abs() < f64::EPSILON);
        assert!(opts.prefer_single_package);
        assert_eq!(opts.max_alternatives, 3);
        assert!((opts.undersize_penalty - 10_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fetch_defaults() {
        let opts = FetchOptions::default();
        assert_eq!(opts.batch_size, 5);
        assert_eq!(opts.batch_pause, Duration::from_millis(100));
        assert_eq!(opts.request_timeout_secs, 30);
    }

    #[test]
    fn reasonableness_defaults() {
        let limits = ReasonablenessLimits::default();
        assert!((limits.max_total_quantity - 1000.0).abs() < f64::EPSILON);
        assert!((limits.max_daily_dose - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn engine_config_ttl_is_one_hour() {
        let config = EngineConfig::new();
        assert_eq!(config.identity_cache_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn engine_config_default_matches_new() {
        let config = EngineConfig::default();
        assert_eq!(config.fetch.batch_size, 5);
        assert_eq!(config.identity_cache_ttl, EngineConfig::DEFAULT_IDENTITY_CACHE_TTL);
    }

    #[test]
    fn app_name_is_fillwise() {
        assert_eq!(APP_NAME, "Fillwise");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.3.0");
    }

    #[test]
    fn config_serializes() {
        let json = serde_json::to_string(&EngineConfig::new()).unwrap();
        assert!(json.contains("\"batch_size\":5"));
        assert!(json.contains("\"max_alternatives\":3"));
    }
}
