//! Drug query normalization and identity resolution.
//!
//! Operators type whatever they have: a brand name, a generic name, or a
//! product code copied off a label with dashes and stray spaces. This module
//! classifies the raw query, cleans it up, and resolves it to a canonical
//! [`DrugIdentity`] through an [`IdentityResolver`], caching successful
//! resolutions so repeat lookups stay local.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::cache::IdentityCache;
use crate::models::{DrugIdentity, MAX_DRUG_QUERY_LEN, MIN_DRUG_QUERY_LEN};
use crate::providers::{IdentityResolver, ProviderError};

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static CODE_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s\-]+").unwrap());

// ═══════════════════════════════════════════════════════════
// Query classification
// ═══════════════════════════════════════════════════════════

/// What a raw drug query turned out to be after cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKind {
    /// Free-text name, trimmed with internal whitespace collapsed.
    Name(String),
    /// Product code, reduced to its bare 10 or 11 digits.
    Code(String),
}

/// Classify a raw drug query as a name or a product code.
///
/// A query whose characters are all digits once separators (whitespace and
/// dashes) are stripped is treated as a product code and must come out to
/// 10 or 11 digits. Any other digit count is rejected rather than silently
/// searched as a name. Everything else is a name query.
pub fn classify_query(raw: &str) -> Result<QueryKind, ResolveError> {
    let trimmed = raw.trim();
    if !(MIN_DRUG_QUERY_LEN..=MAX_DRUG_QUERY_LEN).contains(&trimmed.len()) {
        return Err(ResolveError::QueryLength { len: trimmed.len() });
    }

    let stripped = CODE_SEPARATORS.replace_all(trimmed, "");
    if !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit()) {
        return match stripped.len() {
            10 | 11 => Ok(QueryKind::Code(stripped.into_owned())),
            count => Err(ResolveError::InvalidCodeFormat {
                digits: stripped.into_owned(),
                count,
            }),
        };
    }

    Ok(QueryKind::Name(
        WHITESPACE_RUN.replace_all(trimmed, " ").into_owned(),
    ))
}

/// Cache key for a raw query: trimmed, lowercased, whitespace collapsed.
///
/// "Lipitor 10mg" and "  lipitor   10mg " resolve identically, so they
/// share a cache entry.
fn cache_key(raw: &str) -> String {
    WHITESPACE_RUN
        .replace_all(raw.trim(), " ")
        .to_lowercase()
}

// ═══════════════════════════════════════════════════════════
// IdentityNormalizer — classification + resolution + cache
// ═══════════════════════════════════════════════════════════

/// Resolves raw drug queries through a resolver, with a read-through cache.
///
/// Only successful resolutions are cached. A failed lookup always goes back
/// to the resolver on the next attempt.
pub struct IdentityNormalizer<R> {
    resolver: R,
    cache: IdentityCache,
}

impl<R: IdentityResolver> IdentityNormalizer<R> {
    /// Wrap a resolver with the cache that will back its lookups.
    pub fn new(resolver: R, cache: IdentityCache) -> Self {
        Self { resolver, cache }
    }

    /// Classify `raw_query` and resolve it to a canonical identity.
    pub async fn resolve(&self, raw_query: &str) -> Result<DrugIdentity, ResolveError> {
        let kind = classify_query(raw_query)?;
        let key = cache_key(raw_query);

        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(query = %key, "Identity cache hit");
            return Ok(hit);
        }
        tracing::debug!(query = %key, "Identity cache miss");

        let identity = match &kind {
            QueryKind::Name(name) => self.resolver.resolve_by_name(name).await?,
            QueryKind::Code(code) => self.resolver.resolve_by_code(code).await?,
        };

        self.cache.set(&key, identity.clone());
        Ok(identity)
    }

    /// The cache behind this normalizer (for introspection and clearing).
    pub fn cache(&self) -> &IdentityCache {
        &self.cache
    }
}

// ═══════════════════════════════════════════════════════════
// Error type
// ═══════════════════════════════════════════════════════════

/// Errors from query classification and identity resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("drug query must be between 2 and 200 characters, got {len}")]
    QueryLength { len: usize },

    #[error("'{digits}' looks like a product code but has {count} digits; codes have 10 or 11")]
    InvalidCodeFormat { digits: String, count: usize },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Resolver that counts calls so tests can observe cache behavior.
    struct CountingResolver {
        by_name: AtomicUsize,
        by_code: AtomicUsize,
    }

    impl CountingResolver {
        fn new() -> Self {
            Self {
                by_name: AtomicUsize::new(0),
                by_code: AtomicUsize::new(0),
            }
        }
    }

    impl IdentityResolver for CountingResolver {
        async fn resolve_by_name(&self, name: &str) -> Result<DrugIdentity, ProviderError> {
            self.by_name.fetch_add(1, Ordering::SeqCst);
            Ok(DrugIdentity::new("drug-001", name))
        }

        async fn resolve_by_code(&self, code: &str) -> Result<DrugIdentity, ProviderError> {
            self.by_code.fetch_add(1, Ordering::SeqCst);
            Ok(DrugIdentity::new(code, "Resolved By Code"))
        }
    }

    fn counting_normalizer(ttl: Duration) -> IdentityNormalizer<CountingResolver> {
        IdentityNormalizer::new(CountingResolver::new(), IdentityCache::new(ttl))
    }

    #[test]
    fn plain_names_classify_as_names() {
        assert_eq!(
            classify_query("Lipitor").unwrap(),
            QueryKind::Name("Lipitor".to_string())
        );
        assert_eq!(
            classify_query("amoxicillin 500mg").unwrap(),
            QueryKind::Name("amoxicillin 500mg".to_string())
        );
    }

    #[test]
    fn names_are_trimmed_and_collapsed() {
        assert_eq!(
            classify_query("  amoxicillin   500mg  ").unwrap(),
            QueryKind::Name("amoxicillin 500mg".to_string())
        );
    }

    #[test]
    fn dashed_codes_are_stripped_to_digits() {
        assert_eq!(
            classify_query("0071-0155-23").unwrap(),
            QueryKind::Code("0071015523".to_string())
        );
    }

    #[test]
    fn spaced_codes_are_stripped_to_digits() {
        assert_eq!(
            classify_query("00071 0155 23").unwrap(),
            QueryKind::Code("00071015523".to_string())
        );
    }

    #[test]
    fn ten_and_eleven_digit_codes_are_accepted() {
        assert!(matches!(
            classify_query("1234567890").unwrap(),
            QueryKind::Code(_)
        ));
        assert!(matches!(
            classify_query("12345678901").unwrap(),
            QueryKind::Code(_)
        ));
    }

    #[test]
    fn wrong_length_digit_strings_are_rejected() {
        assert!(matches!(
            classify_query("123456789"),
            Err(ResolveError::InvalidCodeFormat { count: 9, .. })
        ));
        assert!(matches!(
            classify_query("123456789012"),
            Err(ResolveError::InvalidCodeFormat { count: 12, .. })
        ));
    }

    #[test]
    fn alphanumerics_are_names_not_codes() {
        // "B12" has digits but is a name, not a malformed code.
        assert_eq!(
            classify_query("B12").unwrap(),
            QueryKind::Name("B12".to_string())
        );
    }

    #[test]
    fn query_length_is_bounded() {
        assert!(matches!(
            classify_query("x"),
            Err(ResolveError::QueryLength { len: 1 })
        ));
        assert!(matches!(
            classify_query("   "),
            Err(ResolveError::QueryLength { len: 0 })
        ));
        let long = "a".repeat(201);
        assert!(matches!(
            classify_query(&long),
            Err(ResolveError::QueryLength { len: 201 })
        ));
    }

    #[test]
    fn classification_is_deterministic() {
        for _ in 0..3 {
            assert_eq!(
                classify_query("0071-0155-23").unwrap(),
                QueryKind::Code("0071015523".to_string())
            );
        }
    }

    #[test]
    fn cache_keys_normalize_case_and_spacing() {
        assert_eq!(cache_key("  Lipitor   10 MG "), "lipitor 10 mg");
        assert_eq!(cache_key("lipitor 10 mg"), "lipitor 10 mg");
    }

    #[tokio::test]
    async fn second_resolution_hits_the_cache() {
        let normalizer = counting_normalizer(Duration::from_secs(60));

        let first = normalizer.resolve("Lipitor").await.unwrap();
        let second = normalizer.resolve("Lipitor").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(normalizer.resolver.by_name.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn equivalent_spellings_share_a_cache_entry() {
        let normalizer = counting_normalizer(Duration::from_secs(60));

        normalizer.resolve("Lipitor").await.unwrap();
        normalizer.resolve("  lipitor ").await.unwrap();

        assert_eq!(normalizer.resolver.by_name.load(Ordering::SeqCst), 1);
        assert_eq!(normalizer.cache().len(), 1);
    }

    #[tokio::test]
    async fn codes_route_to_code_resolution() {
        let normalizer = counting_normalizer(Duration::from_secs(60));

        let identity = normalizer.resolve("0071-0155-23").await.unwrap();

        assert_eq!(identity.id, "0071015523");
        assert_eq!(normalizer.resolver.by_code.load(Ordering::SeqCst), 1);
        assert_eq!(normalizer.resolver.by_name.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn expired_entries_go_back_to_the_resolver() {
        let normalizer = counting_normalizer(Duration::ZERO);

        normalizer.resolve("Lipitor").await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        normalizer.resolve("Lipitor").await.unwrap();

        assert_eq!(normalizer.resolver.by_name.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn malformed_queries_never_reach_the_resolver() {
        let normalizer = counting_normalizer(Duration::from_secs(60));

        assert!(normalizer.resolve("123456789").await.is_err());
        assert_eq!(normalizer.resolver.by_name.load(Ordering::SeqCst), 0);
        assert_eq!(normalizer.resolver.by_code.load(Ordering::SeqCst), 0);
    }
}
