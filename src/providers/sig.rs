use serde::{Deserialize, Serialize};

use super::{DosingInterpreter, ProviderError};
use crate::models::{StructuredSig, TaperStep};

/// REST client for the SIG interpretation service.
///
/// The service runs the language model that turns prescriber shorthand
/// ("1 tab PO BID") into structured dosing. This client only does the wire
/// work; whether the interpretation is usable is judged downstream.
#[derive(Clone)]
pub struct SigServiceClient {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl SigServiceClient {
    /// Create a client pointing at a SIG service instance.
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
}

/// Request body for POST /api/interpret
#[derive(Serialize)]
struct InterpretRequest<'a> {
    sig: &'a str,
}

/// Response body from POST /api/interpret
#[derive(Deserialize)]
struct InterpretResponse {
    dose_amount: f64,
    dose_unit: String,
    times_per_day: f64,
    route: String,
    readable_instructions: String,
    #[serde(default)]
    is_ambiguous: bool,
    #[serde(default)]
    clarification: Option<String>,
    #[serde(default)]
    taper_steps: Option<Vec<WireTaperStep>>,
}

#[derive(Deserialize)]
struct WireTaperStep {
    amount: f64,
    days: u32,
}

impl InterpretResponse {
    fn into_sig(self) -> StructuredSig {
        StructuredSig {
            dose_amount: self.dose_amount,
            dose_unit: self.dose_unit,
            times_per_day: self.times_per_day,
            route: self.route,
            readable_instructions: self.readable_instructions,
            is_ambiguous: self.is_ambiguous,
            clarification: self.clarification,
            // An empty schedule on the wire means no taper at all.
            taper_steps: self
                .taper_steps
                .filter(|steps| !steps.is_empty())
                .map(|steps| {
                    steps
                        .into_iter()
                        .map(|s| TaperStep {
                            amount: s.amount,
                            days: s.days,
                        })
                        .collect()
                }),
        }
    }
}

impl DosingInterpreter for SigServiceClient {
    async fn interpret(&self, sig_text: &str) -> Result<StructuredSig, ProviderError> {
        let url = format!("{}/api/interpret", self.base_url);
        let body = InterpretRequest { sig: sig_text };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ProviderError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    ProviderError::Timeout {
                        secs: self.timeout_secs,
                    }
                } else {
                    ProviderError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        // 422 is the service saying the text itself defeated it.
        if status == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Interpretation(body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: InterpretResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ResponseParsing(e.to_string()))?;

        Ok(parsed.into_sig())
    }
}

/// Mock interpreter for testing — returns a configured sig for any text.
pub struct MockInterpreter {
    sig: StructuredSig,
}

impl MockInterpreter {
    /// A routine scheduled sig: `amount` per dose, `times_per_day` doses.
    pub fn scheduled(amount: f64, unit: &str, times_per_day: f64) -> Self {
        Self {
            sig: StructuredSig {
                dose_amount: amount,
                dose_unit: unit.to_string(),
                times_per_day,
                route: "oral".to_string(),
                readable_instructions: format!(
                    "Take {} {} {} times daily",
                    amount, unit, times_per_day
                ),
                is_ambiguous: false,
                clarification: None,
                taper_steps: None,
            },
        }
    }

    /// An as-needed sig (frequency zero).
    pub fn prn(amount: f64, unit: &str) -> Self {
        Self {
            sig: StructuredSig {
                dose_amount: amount,
                dose_unit: unit.to_string(),
                times_per_day: 0.0,
                route: "oral".to_string(),
                readable_instructions: format!("Take {} {} as needed", amount, unit),
                is_ambiguous: false,
                clarification: None,
                taper_steps: None,
            },
        }
    }

    /// A sig the interpreter could not pin down.
    pub fn ambiguous(clarification: &str) -> Self {
        Self {
            sig: StructuredSig {
                dose_amount: 0.0,
                dose_unit: "tablet".to_string(),
                times_per_day: 0.0,
                route: "oral".to_string(),
                readable_instructions: "Unclear instructions".to_string(),
                is_ambiguous: true,
                clarification: Some(clarification.to_string()),
                taper_steps: None,
            },
        }
    }

    /// A taper schedule in the given unit.
    pub fn taper(unit: &str, steps: Vec<TaperStep>) -> Self {
        Self {
            sig: StructuredSig {
                dose_amount: steps.first().map(|s| s.amount).unwrap_or(0.0),
                dose_unit: unit.to_string(),
                times_per_day: 1.0,
                route: "oral".to_string(),
                readable_instructions: "Taper per schedule".to_string(),
                is_ambiguous: false,
                clarification: None,
                taper_steps: Some(steps),
            },
        }
    }

    /// Mark the configured sig ambiguous, keeping its other fields.
    pub fn with_ambiguity(mut self, clarification: &str) -> Self {
        self.sig.is_ambiguous = true;
        self.sig.clarification = Some(clarification.to_string());
        self
    }
}

impl DosingInterpreter for MockInterpreter {
    async fn interpret(&self, _sig_text: &str) -> Result<StructuredSig, ProviderError> {
        Ok(self.sig.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sig_client_constructor() {
        let client = SigServiceClient::new("http://localhost:8081", 30);
        assert_eq!(client.base_url, "http://localhost:8081");
        assert_eq!(client.timeout_secs, 30);
    }

    #[test]
    fn sig_client_trims_trailing_slash() {
        let client = SigServiceClient::new("http://localhost:8081/", 30);
        assert_eq!(client.base_url, "http://localhost:8081");
    }

    #[test]
    fn interpret_response_maps_to_sig() {
        let json = r#"{
            "dose_amount": 1.0,
            "dose_unit": "tablet",
            "times_per_day": 2.0,
            "route": "oral",
            "readable_instructions": "Take 1 tablet by mouth twice daily"
        }"#;
        let sig = serde_json::from_str::<InterpretResponse>(json).unwrap().into_sig();

        assert!((sig.dose_amount - 1.0).abs() < f64::EPSILON);
        assert!((sig.times_per_day - 2.0).abs() < f64::EPSILON);
        assert!(!sig.is_ambiguous);
        assert!(sig.clarification.is_none());
        assert!(sig.taper_steps.is_none());
    }

    #[test]
    fn interpret_response_carries_taper() {
        let json = r#"{
            "dose_amount": 3.0,
            "dose_unit": "tablet",
            "times_per_day": 1.0,
            "route": "oral",
            "readable_instructions": "Taper down over 15 days",
            "taper_steps": [
                {"amount": 3.0, "days": 5},
                {"amount": 2.0, "days": 5},
                {"amount": 1.0, "days": 5}
            ]
        }"#;
        let sig = serde_json::from_str::<InterpretResponse>(json).unwrap().into_sig();

        let steps = sig.taper_schedule().unwrap();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[2].days, 5);
    }

    #[test]
    fn empty_wire_taper_means_no_taper() {
        let json = r#"{
            "dose_amount": 1.0,
            "dose_unit": "tablet",
            "times_per_day": 2.0,
            "route": "oral",
            "readable_instructions": "Take 1 tablet twice daily",
            "taper_steps": []
        }"#;
        let sig = serde_json::from_str::<InterpretResponse>(json).unwrap().into_sig();
        assert!(sig.taper_steps.is_none());
    }

    #[tokio::test]
    async fn mock_scheduled_sig() {
        let interpreter = MockInterpreter::scheduled(2.0, "tablet", 2.0);
        let sig = interpreter.interpret("2 tabs BID").await.unwrap();

        assert!((sig.dose_amount - 2.0).abs() < f64::EPSILON);
        assert!(!sig.is_prn());
    }

    #[tokio::test]
    async fn mock_prn_sig() {
        let interpreter = MockInterpreter::prn(1.0, "tablet");
        let sig = interpreter.interpret("1 tab PRN pain").await.unwrap();
        assert!(sig.is_prn());
    }

    #[tokio::test]
    async fn mock_ambiguous_sig_carries_clarification() {
        let interpreter = MockInterpreter::ambiguous("Dose amount missing from instructions");
        let sig = interpreter.interpret("take as directed").await.unwrap();

        assert!(sig.is_ambiguous);
        assert_eq!(
            sig.clarification.as_deref(),
            Some("Dose amount missing from instructions")
        );
    }

    #[tokio::test]
    async fn mock_taper_sig() {
        let steps = vec![
            TaperStep { amount: 2.0, days: 7 },
            TaperStep { amount: 1.0, days: 7 },
        ];
        let interpreter = MockInterpreter::taper("tablet", steps);
        let sig = interpreter.interpret("prednisone taper").await.unwrap();

        assert_eq!(sig.taper_schedule().unwrap().len(), 2);
        assert!(!sig.is_prn());
    }

    #[tokio::test]
    async fn mock_taper_sig_can_be_marked_ambiguous() {
        let steps = vec![TaperStep { amount: 2.0, days: 5 }];
        let interpreter =
            MockInterpreter::taper("tablet", steps).with_ambiguity("Confirm step durations");
        let sig = interpreter.interpret("unclear taper").await.unwrap();

        assert!(sig.is_ambiguous);
        assert_eq!(sig.clarification.as_deref(), Some("Confirm step durations"));
        assert!(sig.taper_schedule().is_some());
    }
}
