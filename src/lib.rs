pub mod cache; // Identity resolution cache
pub mod calculator; // Pipeline orchestrator + factory
pub mod config;
pub mod dose; // Quantity calculation from structured dosing
pub mod models;
pub mod providers; // REST collaborators + in-memory mocks
pub mod resolve; // Query classification + identity normalization
pub mod selection; // Package selection optimizer
pub mod units; // Unit-of-measure compatibility

pub use calculator::{build_calculator, DispenseCalculator, RestDispenseCalculator};
pub use config::EngineConfig;
pub use models::{CalculationInput, CalculationResult};

use tracing_subscriber::EnvFilter;

/// Initialize tracing for binaries embedding the calculator.
///
/// Respects `RUST_LOG` when set; otherwise falls back to the crate default
/// filter. Call once at startup.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("Fillwise starting v{}", config::APP_VERSION);
}
