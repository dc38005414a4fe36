//! Typed client for the prediction backend.
//!
//! Every call is bearer-token authenticated through the shared session
//! context. The backend reports some failures in-band as `{"error": ...}`
//! bodies with a 200 status, so responses go through an envelope before
//! they count as data.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use caseflow::attribution::{self, AttributionItem, RawAttribution};
use caseflow::events::ActionRecord;
use caseflow::roster::{PatientRecord, RosterPage, RosterQuery};
use caseflow::session::SessionContext;

/// Error taxonomy for backend calls. Every variant degrades to an
/// unavailable panel; none is fatal to the process.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, timeout, non-2xx status, or body decode failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with an in-band error object.
    #[error("backend reported: {0}")]
    Backend(String),

    /// No credentials in the session context.
    #[error("not logged in")]
    NotAuthenticated,

    /// The payload decoded but failed domain validation.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Vitals as label → value rows, ordered for stable display.
pub type Vitals = BTreeMap<String, serde_json::Value>;

/// Case-insensitive vitals search across labels and values. A blank
/// search returns everything; null values only match on their label.
pub fn filter_vitals(vitals: &Vitals, search: &str) -> Vitals {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return vitals.clone();
    }
    vitals
        .iter()
        .filter(|(label, value)| {
            label.to_lowercase().contains(&needle)
                || value_text(value).to_lowercase().contains(&needle)
        })
        .map(|(label, value)| (label.clone(), value.clone()))
        .collect()
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// HTTP client for the collaborator endpoints.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionContext,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        session: SessionContext,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    /// Unauthenticated reachability probe against the API root.
    pub async fn ping(&self) -> Result<(), ApiError> {
        self.http
            .get(format!("{}/", self.base_url))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Fetch one roster page for the given query.
    pub async fn roster_page(&self, query: &RosterQuery) -> Result<RosterPage, ApiError> {
        let url = format!("{}/patients", self.base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(self.token()?)
            .query(&query.params())
            .send()
            .await?;
        let envelope: Envelope<PatientsResponse> =
            response.error_for_status()?.json().await?;
        let body = envelope.into_result()?;
        Ok(RosterPage {
            patients: body.patients,
            total: Some(body.total),
        })
    }

    /// Vitals table for one patient.
    pub async fn vitals(&self, patient_id: &str) -> Result<Vitals, ApiError> {
        let url = format!("{}/vitals/{}", self.base_url, patient_id);
        let envelope: Envelope<VitalsResponse> = self.get_json(&url).await?;
        Ok(envelope.into_result()?.vitals)
    }

    /// Model probability for one patient.
    pub async fn prediction(&self, patient_id: &str) -> Result<f64, ApiError> {
        let url = format!("{}/predict/{}", self.base_url, patient_id);
        let envelope: Envelope<PredictResponse> = self.get_json(&url).await?;
        Ok(envelope.into_result()?.prediction_proba)
    }

    /// Attribution entries for one patient, decoded and validated.
    pub async fn attributions(&self, patient_id: &str) -> Result<Vec<AttributionItem>, ApiError> {
        let url = format!("{}/shap/{}", self.base_url, patient_id);
        let envelope: Envelope<ShapResponse> = self.get_json(&url).await?;
        let raw = envelope.into_result()?.shap_values;
        attribution::from_wire(raw).map_err(|e| ApiError::Malformed(e.to_string()))
    }

    /// Deliver one action record with the given token. The response body
    /// is ignored apart from a diagnostic on in-band errors.
    pub async fn log_action(&self, token: &str, record: &ActionRecord) -> Result<(), ApiError> {
        let url = format!("{}/log_action", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(record)
            .send()
            .await?
            .error_for_status()?;
        if let Ok(body) = response.json::<serde_json::Value>().await {
            if let Some(error) = body.get("error").and_then(|e| e.as_str()) {
                debug!(error, action = %record.action, "action log backend reported an error");
            }
        }
        Ok(())
    }

    fn token(&self) -> Result<String, ApiError> {
        self.session
            .credentials()
            .map(|c| c.token)
            .ok_or(ApiError::NotAuthenticated)
    }

    async fn get_json<T>(&self, url: &str) -> Result<T, ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .http
            .get(url)
            .bearer_auth(self.token()?)
            .send()
            .await?;
        Ok(response.error_for_status()?.json().await?)
    }
}

/// Either the expected body or the backend's in-band `{"error": ...}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Err { error: String },
    Ok(T),
}

impl<T> Envelope<T> {
    fn into_result(self) -> Result<T, ApiError> {
        match self {
            Envelope::Err { error } => Err(ApiError::Backend(error)),
            Envelope::Ok(body) => Ok(body),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PatientsResponse {
    patients: Vec<PatientRecord>,
    total: u64,
}

#[derive(Debug, Deserialize)]
struct VitalsResponse {
    vitals: Vitals,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    prediction_proba: f64,
}

#[derive(Debug, Deserialize)]
struct ShapResponse {
    shap_values: Vec<RawAttribution>,
}
