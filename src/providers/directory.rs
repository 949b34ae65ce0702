use std::collections::HashMap;

use serde::Deserialize;

use super::{CatalogLookup, IdentityResolver, PackageInfoProvider, ProviderError};
use crate::models::{DrugIdentity, PackageRecord};

/// REST client for the drug directory service.
///
/// One service covers three concerns: identity resolution by name or code,
/// the package codes marketed for a drug, and the record behind each code.
#[derive(Clone)]
pub struct DirectoryClient {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl DirectoryClient {
    /// Create a client pointing at a directory service instance.
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        }
    }

    fn send_error(&self, e: reqwest::Error) -> ProviderError {
        if e.is_connect() {
            ProviderError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            ProviderError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            ProviderError::Http(e.to_string())
        }
    }
}

/// Response body from GET /api/drugs and GET /api/drugs/ndc/{code}
#[derive(Deserialize)]
struct DrugResponse {
    id: String,
    name: String,
    #[serde(default)]
    synonym: Option<String>,
}

impl DrugResponse {
    fn into_identity(self) -> DrugIdentity {
        DrugIdentity {
            id: self.id,
            canonical_name: self.name,
            synonym: self.synonym,
        }
    }
}

/// Response body from GET /api/drugs/{id}/packages
#[derive(Deserialize)]
struct PackageCodesResponse {
    codes: Vec<String>,
}

impl IdentityResolver for DirectoryClient {
    async fn resolve_by_name(&self, name: &str) -> Result<DrugIdentity, ProviderError> {
        let url = format!("{}/api/drugs", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("name", name)])
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(name.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: DrugResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ResponseParsing(e.to_string()))?;

        Ok(parsed.into_identity())
    }

    async fn resolve_by_code(&self, code: &str) -> Result<DrugIdentity, ProviderError> {
        let url = format!("{}/api/drugs/ndc/{}", self.base_url, code);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(code.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: DrugResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ResponseParsing(e.to_string()))?;

        Ok(parsed.into_identity())
    }
}

impl CatalogLookup for DirectoryClient {
    async fn list_package_codes(&self, drug_id: &str) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/api/drugs/{}/packages", self.base_url, drug_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: PackageCodesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ResponseParsing(e.to_string()))?;

        Ok(parsed.codes)
    }
}

impl PackageInfoProvider for DirectoryClient {
    async fn get_package_record(&self, code: &str) -> Result<Option<PackageRecord>, ProviderError> {
        let url = format!("{}/api/packages/{}", self.base_url, code);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        // An unknown code is an answer, not a failure.
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: PackageRecord = response
            .json()
            .await
            .map_err(|e| ProviderError::ResponseParsing(e.to_string()))?;

        Ok(Some(parsed))
    }
}

/// Mock directory for testing — serves configured fixtures from memory.
#[derive(Clone)]
pub struct MockDirectory {
    identity: Option<DrugIdentity>,
    codes: Vec<String>,
    packages: HashMap<String, PackageRecord>,
}

impl MockDirectory {
    /// Empty directory: every resolution fails with `NotFound`.
    pub fn new() -> Self {
        Self {
            identity: None,
            codes: Vec::new(),
            packages: HashMap::new(),
        }
    }

    pub fn with_identity(mut self, identity: DrugIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_package(mut self, record: PackageRecord) -> Self {
        self.codes.push(record.code.clone());
        self.packages.insert(record.code.clone(), record);
        self
    }
}

impl Default for MockDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityResolver for MockDirectory {
    async fn resolve_by_name(&self, name: &str) -> Result<DrugIdentity, ProviderError> {
        self.identity
            .clone()
            .ok_or_else(|| ProviderError::NotFound(name.to_string()))
    }

    async fn resolve_by_code(&self, code: &str) -> Result<DrugIdentity, ProviderError> {
        self.identity
            .clone()
            .ok_or_else(|| ProviderError::NotFound(code.to_string()))
    }
}

impl CatalogLookup for MockDirectory {
    async fn list_package_codes(&self, _drug_id: &str) -> Result<Vec<String>, ProviderError> {
        Ok(self.codes.clone())
    }
}

impl PackageInfoProvider for MockDirectory {
    async fn get_package_record(&self, code: &str) -> Result<Option<PackageRecord>, ProviderError> {
        Ok(self.packages.get(code).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lipitor_record(code: &str, size: f64) -> PackageRecord {
        PackageRecord {
            code: code.to_string(),
            size,
            unit: "tablet".to_string(),
            product_name: "Lipitor 10mg".to_string(),
            manufacturer: "Pfizer".to_string(),
            active: true,
        }
    }

    #[test]
    fn directory_client_constructor() {
        let client = DirectoryClient::new("http://localhost:8080", 30);
        assert_eq!(client.base_url, "http://localhost:8080");
        assert_eq!(client.timeout_secs, 30);
    }

    #[test]
    fn directory_client_trims_trailing_slash() {
        let client = DirectoryClient::new("http://localhost:8080/", 30);
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn drug_response_maps_to_identity() {
        let json = r#"{"id": "drug-lipitor-10", "name": "Atorvastatin 10mg", "synonym": "Lipitor"}"#;
        let parsed: DrugResponse = serde_json::from_str(json).unwrap();
        let identity = parsed.into_identity();

        assert_eq!(identity.id, "drug-lipitor-10");
        assert_eq!(identity.canonical_name, "Atorvastatin 10mg");
        assert_eq!(identity.synonym.as_deref(), Some("Lipitor"));
    }

    #[test]
    fn drug_response_synonym_is_optional() {
        let json = r#"{"id": "drug-amoxicillin", "name": "Amoxicillin 500mg"}"#;
        let parsed: DrugResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.into_identity().synonym.is_none());
    }

    #[test]
    fn package_codes_response_shape() {
        let json = r#"{"codes": ["00071015523", "00071015534"]}"#;
        let parsed: PackageCodesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.codes.len(), 2);
    }

    #[tokio::test]
    async fn empty_mock_resolves_nothing() {
        let mock = MockDirectory::new();
        let err = mock.resolve_by_name("lipitor").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }

    #[tokio::test]
    async fn mock_serves_configured_identity() {
        let mock = MockDirectory::new()
            .with_identity(DrugIdentity::new("drug-001", "Atorvastatin 10mg"));

        let by_name = mock.resolve_by_name("lipitor").await.unwrap();
        assert_eq!(by_name.canonical_name, "Atorvastatin 10mg");

        let by_code = mock.resolve_by_code("0071015523").await.unwrap();
        assert_eq!(by_code.id, "drug-001");
    }

    #[tokio::test]
    async fn mock_serves_packages_by_code() {
        let mock = MockDirectory::new()
            .with_package(lipitor_record("00071015523", 90.0))
            .with_package(lipitor_record("00071015530", 30.0));

        let codes = mock.list_package_codes("drug-001").await.unwrap();
        assert_eq!(codes, vec!["00071015523", "00071015530"]);

        let record = mock.get_package_record("00071015530").await.unwrap().unwrap();
        assert!((record.size - 30.0).abs() < f64::EPSILON);

        let missing = mock.get_package_record("99999999999").await.unwrap();
        assert!(missing.is_none());
    }
}
