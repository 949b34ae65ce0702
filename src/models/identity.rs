use serde::{Deserialize, Serialize};

/// A resolved drug identity from the directory service. Produced once per
/// calculation and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugIdentity {
    /// Canonical directory identifier for the drug product.
    pub id: String,
    pub canonical_name: String,
    /// Populated when the query matched through a synonym (brand name,
    /// common misspelling) rather than the canonical name.
    pub synonym: Option<String>,
}

impl DrugIdentity {
    pub fn new(id: &str, canonical_name: &str) -> Self {
        Self {
            id: id.to_string(),
            canonical_name: canonical_name.to_string(),
            synonym: None,
        }
    }

    pub fn with_synonym(mut self, synonym: &str) -> Self {
        self.synonym = Some(synonym.to_string());
        self
    }
}
