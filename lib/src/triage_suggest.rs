// lib/src/triage_suggest.rs
//
// Alert code suggestions for the triage form. A configured advisor service
// is asked over HTTP; otherwise a vital-signs heuristic answers locally.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use models::AlertCode;

use crate::config::TriageConfig;
use crate::errors::{Result, TriageError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriageRequest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub vital_signs: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageSuggestion {
    pub alert_code: AlertCode,
    pub rationale: String,
    pub source: String,
}

#[async_trait]
pub trait TriageSuggester: Send + Sync {
    async fn suggest(&self, request: &TriageRequest) -> Result<TriageSuggestion>;
}

/// Builds the advisor client when an endpoint is configured, the local
/// heuristic otherwise.
pub fn from_config(config: &TriageConfig) -> Result<Arc<dyn TriageSuggester>> {
    match &config.endpoint {
        Some(endpoint) => Ok(Arc::new(HttpTriageSuggester::new(
            endpoint.clone(),
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs),
        )?)),
        None => Ok(Arc::new(VitalSignsHeuristic)),
    }
}

pub struct HttpTriageSuggester {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct AdvisorResponse {
    alert_code: AlertCode,
    #[serde(default)]
    rationale: Option<String>,
}

impl HttpTriageSuggester {
    pub fn new(endpoint: String, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TriageError::ConfigurationError(format!("Cannot build triage advisor client: {}", e)))?;
        Ok(Self { client, endpoint, api_key })
    }
}

#[async_trait]
impl TriageSuggester for HttpTriageSuggester {
    async fn suggest(&self, request: &TriageRequest) -> Result<TriageSuggestion> {
        debug!("Asking triage advisor at {}", self.endpoint);
        let mut call = self.client.post(&self.endpoint).json(request);
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }
        let response = call.send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Triage advisor answered {}", status);
            return Err(TriageError::Upstream(format!("advisor responded with status {}", status)));
        }
        let body: AdvisorResponse = response.json().await?;
        Ok(TriageSuggestion {
            alert_code: body.alert_code,
            rationale: body.rationale.unwrap_or_default(),
            source: "remote".to_string(),
        })
    }
}

/// A threshold test and the code it implies, checked most urgent first.
type Rule = (fn(f64) -> bool, AlertCode);

const SPO2_RULES: [Rule; 3] = [
    (|v| v < 90.0, AlertCode::Rosso),
    (|v| v < 94.0, AlertCode::Arancio),
    (|v| v < 96.0, AlertCode::Giallo),
];
const RESPIRATORY_RULES: [Rule; 3] = [
    (|v| !(8.0..=30.0).contains(&v), AlertCode::Rosso),
    (|v| v > 24.0, AlertCode::Arancio),
    (|v| v > 20.0 || v < 10.0, AlertCode::Giallo),
];
const HEART_RATE_RULES: [Rule; 3] = [
    (|v| !(40.0..=150.0).contains(&v), AlertCode::Rosso),
    (|v| !(50.0..=120.0).contains(&v), AlertCode::Arancio),
    (|v| v > 100.0, AlertCode::Giallo),
];
const SYSTOLIC_RULES: [Rule; 3] = [
    (|v| v < 80.0, AlertCode::Rosso),
    (|v| !(90.0..=220.0).contains(&v), AlertCode::Arancio),
    (|v| v > 180.0 || v < 100.0, AlertCode::Giallo),
];
const GCS_RULES: [Rule; 3] = [
    (|v| v <= 8.0, AlertCode::Rosso),
    (|v| v <= 13.0, AlertCode::Arancio),
    (|v| v < 15.0, AlertCode::Giallo),
];
const TEMPERATURE_RULES: [Rule; 3] = [
    (|v| !(32.0..41.0).contains(&v), AlertCode::Rosso),
    (|v| !(35.0..40.0).contains(&v), AlertCode::Arancio),
    (|v| v >= 38.5, AlertCode::Giallo),
];

/// Threshold rules over the usual vital signs. The most urgent finding wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct VitalSignsHeuristic;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Vitals {
    spo2: Option<f64>,
    respiratory_rate: Option<f64>,
    heart_rate: Option<f64>,
    systolic: Option<f64>,
    gcs: Option<f64>,
    temperature: Option<f64>,
}

impl Vitals {
    fn read(value: Option<&Value>) -> Self {
        let Some(Value::Object(map)) = value else {
            return Vitals::default();
        };
        let number = |keys: &[&str]| {
            keys.iter().find_map(|key| match map.get(*key)? {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            })
        };
        let systolic = number(&["systolic", "systolic_bp", "pas"]).or_else(|| {
            map.get("blood_pressure")
                .and_then(Value::as_str)
                .and_then(|bp| bp.split('/').next())
                .and_then(|s| s.trim().parse::<f64>().ok())
        });
        Vitals {
            spo2: number(&["spo2", "saturation", "sat"]),
            respiratory_rate: number(&["respiratory_rate", "resp_rate", "rr"]),
            heart_rate: number(&["heart_rate", "hr", "pulse"]),
            systolic,
            gcs: number(&["gcs"]),
            temperature: number(&["temperature", "temp"]),
        }
    }

    fn is_empty(&self) -> bool {
        *self == Vitals::default()
    }
}

impl VitalSignsHeuristic {
    pub fn classify(&self, vital_signs: Option<&Value>) -> TriageSuggestion {
        let vitals = Vitals::read(vital_signs);
        if vitals.is_empty() {
            return TriageSuggestion {
                alert_code: AlertCode::Bianco,
                rationale: "No usable vital signs; clinical assessment required.".to_string(),
                source: "heuristic".to_string(),
            };
        }

        let mut findings: Vec<(AlertCode, String)> = Vec::new();
        let readings = [
            (vitals.spo2, "SpO2", &SPO2_RULES),
            (vitals.respiratory_rate, "respiratory rate", &RESPIRATORY_RULES),
            (vitals.heart_rate, "heart rate", &HEART_RATE_RULES),
            (vitals.systolic, "systolic pressure", &SYSTOLIC_RULES),
            (vitals.gcs, "GCS", &GCS_RULES),
            (vitals.temperature, "temperature", &TEMPERATURE_RULES),
        ];
        for (value, label, rules) in readings {
            let Some(v) = value else { continue };
            if let Some((_, code)) = rules.iter().find(|(rule, _)| rule(v)) {
                findings.push((*code, format!("{} {}", label, v)));
            }
        }

        let alert_code = findings.iter().map(|(code, _)| *code).max().unwrap_or(AlertCode::Verde);
        let rationale = if findings.is_empty() {
            "Vital signs within normal limits.".to_string()
        } else {
            findings
                .iter()
                .filter(|(code, _)| *code == alert_code)
                .map(|(_, finding)| finding.as_str())
                .collect::<Vec<_>>()
                .join("; ")
        };
        TriageSuggestion {
            alert_code,
            rationale,
            source: "heuristic".to_string(),
        }
    }
}

#[async_trait]
impl TriageSuggester for VitalSignsHeuristic {
    async fn suggest(&self, request: &TriageRequest) -> Result<TriageSuggestion> {
        Ok(self.classify(request.vital_signs.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classify(vitals: Value) -> TriageSuggestion {
        VitalSignsHeuristic.classify(Some(&vitals))
    }

    #[test]
    fn no_vitals_suggests_bianco() {
        let suggestion = VitalSignsHeuristic.classify(None);
        assert_eq!(suggestion.alert_code, AlertCode::Bianco);
        assert_eq!(suggestion.source, "heuristic");
        assert_eq!(classify(json!({"notes": "calm"})).alert_code, AlertCode::Bianco);
    }

    #[test]
    fn normal_vitals_suggest_verde() {
        let suggestion = classify(json!({"heart_rate": 78, "spo2": 98, "temperature": 36.8}));
        assert_eq!(suggestion.alert_code, AlertCode::Verde);
    }

    #[test]
    fn worst_finding_wins() {
        let suggestion = classify(json!({"heart_rate": 110, "spo2": 87}));
        assert_eq!(suggestion.alert_code, AlertCode::Rosso);
        assert_eq!(suggestion.rationale, "SpO2 87");
    }

    #[test]
    fn reads_string_values_and_blood_pressure() {
        assert_eq!(classify(json!({"blood_pressure": "75/40"})).alert_code, AlertCode::Rosso);
        assert_eq!(classify(json!({"gcs": "12"})).alert_code, AlertCode::Arancio);
        assert_eq!(classify(json!({"temperature": 38.9})).alert_code, AlertCode::Giallo);
    }

    #[tokio::test]
    async fn heuristic_is_the_default_suggester() {
        let suggester = from_config(&TriageConfig::default()).unwrap();
        let suggestion = suggester
            .suggest(&TriageRequest {
                description: Some("Chest pain".into()),
                vital_signs: Some(json!({"respiratory_rate": 34})),
            })
            .await
            .unwrap();
        assert_eq!(suggestion.alert_code, AlertCode::Rosso);
    }

    #[tokio::test]
    async fn unreachable_advisor_is_an_upstream_error() {
        let suggester = HttpTriageSuggester::new(
            "http://127.0.0.1:9/triage".to_string(),
            None,
            Duration::from_millis(500),
        )
        .unwrap();
        let result = suggester.suggest(&TriageRequest::default()).await;
        assert!(matches!(result, Err(TriageError::Upstream(_))));
    }
}
