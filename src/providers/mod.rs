//! External service collaborators for the dispensing pipeline.
//!
//! Every stage that leaves the process goes through one of these traits:
//! identity resolution, SIG interpretation, and package catalog lookups.
//! REST clients implement them for production; tests swap in the in-memory
//! mocks exported alongside each client.

pub mod directory;
pub mod sig;

pub use directory::*;
pub use sig::*;

use std::future::Future;

use thiserror::Error;

use crate::models::{DrugIdentity, PackageRecord, StructuredSig};

// ═══════════════════════════════════════════════════════════
// Collaborator traits
// ═══════════════════════════════════════════════════════════

/// Resolves drug queries to a canonical identity.
pub trait IdentityResolver: Send + Sync {
    /// Look up a drug by name (brand or generic, as typed by the operator).
    fn resolve_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<DrugIdentity, ProviderError>> + Send;

    /// Look up a drug by normalized 10- or 11-digit product code.
    fn resolve_by_code(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<DrugIdentity, ProviderError>> + Send;
}

/// Turns free-text dosing instructions into a structured sig.
pub trait DosingInterpreter: Send + Sync {
    fn interpret(
        &self,
        sig_text: &str,
    ) -> impl Future<Output = Result<StructuredSig, ProviderError>> + Send;
}

/// Lists the package codes marketed for a resolved drug.
pub trait CatalogLookup: Send + Sync {
    fn list_package_codes(
        &self,
        drug_id: &str,
    ) -> impl Future<Output = Result<Vec<String>, ProviderError>> + Send;
}

/// Fetches the full record behind a single package code.
pub trait PackageInfoProvider: Send + Sync {
    /// `Ok(None)` means the code is simply unknown to the catalog; errors
    /// are reserved for the service itself misbehaving.
    fn get_package_record(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<Option<PackageRecord>, ProviderError>> + Send;
}

// ═══════════════════════════════════════════════════════════
// Error type
// ═══════════════════════════════════════════════════════════

/// Errors from external service calls.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Could not interpret the instructions: {0}")]
    Interpretation(String),

    #[error("Cannot reach {0}. Is the service running?")]
    Connection(String),

    #[error("Request timed out after {secs} seconds")]
    Timeout { secs: u64 },

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Service returned error status {status}: {body}")]
    Service { status: u16, body: String },

    #[error("Failed to parse service response: {0}")]
    ResponseParsing(String),
}
