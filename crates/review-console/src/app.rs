//! Application driver — wires the workflow core to the backend client.
//!
//! Holds the roster cursor, the per-patient data panels, and the session
//! orchestrator. All user-facing actions funnel through here as discrete,
//! serialised calls; panel fetches run concurrently but apply their
//! results only while the selection ticket they carry is still current.

use std::sync::Arc;

use tracing::warn;

use caseflow::attribution::{rank, AttributionItem};
use caseflow::events::{AuditEvent, AuditSink};
use caseflow::risk::{risk_band, risk_percent, RiskBand};
use caseflow::roster::{merge_results, RosterFilter, RosterPage, RosterRow};
use caseflow::session::{FetchTicket, SessionContext, SessionError, SessionOrchestrator};
use caseflow::workflow::FinalDecision;

use crate::audit::HttpAuditSink;
use crate::client::{ApiClient, ApiError, Vitals};
use crate::config::ConsoleConfig;

/// Display state of one data panel.
#[derive(Debug, Clone, PartialEq)]
pub enum Panel<T> {
    /// Fetch in flight.
    Loading,
    /// Data ready for display.
    Ready(T),
    /// Fetch failed or the payload was malformed; rendered as an explicit
    /// "data unavailable" message.
    Unavailable,
}

impl<T> Panel<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Panel::Ready(_))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Panel::Unavailable)
    }
}

/// Panels for the currently selected patient.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientPanels {
    pub vitals: Panel<Vitals>,
    pub prediction: Panel<f64>,
    pub explanation: Panel<Vec<AttributionItem>>,
}

impl Default for PatientPanels {
    fn default() -> Self {
        Self {
            vitals: Panel::Loading,
            prediction: Panel::Loading,
            explanation: Panel::Loading,
        }
    }
}

/// The review console application state.
pub struct ReviewApp {
    config: ConsoleConfig,
    session: SessionContext,
    client: Arc<ApiClient>,
    sink: Arc<dyn AuditSink>,
    orchestrator: SessionOrchestrator,
    filter: RosterFilter,
    roster: RosterPage,
    panels: PatientPanels,
}

impl ReviewApp {
    pub fn new(config: ConsoleConfig) -> Result<Self, ApiError> {
        let session = SessionContext::new();
        let client = Arc::new(ApiClient::new(
            &config.api_base,
            config.request_timeout(),
            session.clone(),
        )?);
        let sink: Arc<dyn AuditSink> =
            Arc::new(HttpAuditSink::new(Arc::clone(&client), session.clone()));
        Ok(Self {
            filter: RosterFilter::new(config.page_size),
            orchestrator: SessionOrchestrator::new(Arc::clone(&sink)),
            roster: RosterPage::unavailable(),
            panels: PatientPanels::default(),
            config,
            session,
            client,
            sink,
        })
    }

    /// Check the supplied credentials and start the session.
    pub fn login(&mut self, username: &str, password: &str) -> bool {
        if self.config.check_credentials(username, password) {
            self.session.begin(username, &self.config.api_token);
            self.sink.dispatch(AuditEvent::LoginSucceeded {
                user: username.to_string(),
            });
            true
        } else {
            // Raised for completeness; with no session active the sink
            // suppresses it.
            self.sink.dispatch(AuditEvent::LoginFailed {
                user: username.to_string(),
            });
            false
        }
    }

    /// End the session. The logout event is raised before the credentials
    /// are dropped so it can still be delivered.
    pub fn logout(&mut self) {
        if let Some(credentials) = self.session.credentials() {
            self.sink.dispatch(AuditEvent::Logout {
                user: credentials.username,
            });
        }
        self.session.clear();
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_active()
    }

    /// Unauthenticated reachability probe against the backend.
    pub async fn ping(&self) -> Result<(), ApiError> {
        self.client.ping().await
    }

    /// Fetch the roster page for the current filter. A failed fetch leaves
    /// an explicit empty page with unknown total; no automatic retry.
    pub async fn refresh_roster(&mut self) {
        match self.client.roster_page(&self.filter.query()).await {
            Ok(page) => self.roster = page,
            Err(e) => {
                warn!("roster fetch failed: {e}");
                self.roster = RosterPage::unavailable();
            }
        }
    }

    /// Apply new search criteria (resets to the first page) and refetch.
    pub async fn search(
        &mut self,
        id_substring: Option<&str>,
        age_min: Option<u32>,
        age_max: Option<u32>,
    ) {
        self.filter.apply(id_substring, age_min, age_max);
        self.refresh_roster().await;
    }

    /// Move one page forward when the known total allows it; otherwise a
    /// local no-op with no network call.
    pub async fn next_page(&mut self) {
        if self.filter.next_page(self.roster.total) {
            self.refresh_roster().await;
        }
    }

    /// Move one page back unless already at the first page.
    pub async fn previous_page(&mut self) {
        if self.filter.previous_page() {
            self.refresh_roster().await;
        }
    }

    /// Roster rows annotated with each patient's review status.
    pub fn roster_rows(&self) -> Vec<RosterRow> {
        merge_results(&self.roster, &self.orchestrator.status_map())
    }

    /// Select a patient and load their panels.
    ///
    /// Each fetch carries the selection ticket; results arriving after a
    /// later selection are discarded, so the last-selected patient wins.
    pub async fn open_patient(&mut self, patient_id: &str) {
        self.orchestrator.select_patient(patient_id);
        self.panels = PatientPanels::default();
        if let Some(ticket) = self.orchestrator.fetch_ticket() {
            self.load_panels(&ticket).await;
        }
    }

    /// Return to the roster view.
    pub fn close_patient(&mut self) {
        self.orchestrator.clear_selection();
        self.panels = PatientPanels::default();
    }

    async fn load_panels(&mut self, ticket: &FetchTicket) {
        let id = ticket.patient_id();
        let (vitals, prediction, attributions) = tokio::join!(
            self.client.vitals(id),
            self.client.prediction(id),
            self.client.attributions(id),
        );

        if !self.orchestrator.admits(ticket) {
            // Selection moved on while the fetches were in flight.
            return;
        }

        self.panels.vitals = match vitals {
            Ok(vitals) => Panel::Ready(vitals),
            Err(e) => {
                warn!(patient = id, "vitals unavailable: {e}");
                Panel::Unavailable
            }
        };

        self.panels.prediction = match prediction {
            Ok(probability) => match self.orchestrator.apply_probability(ticket, Some(probability)) {
                Ok(true) => Panel::Ready(probability),
                Ok(false) => Panel::Loading,
                Err(e) => {
                    warn!(patient = id, "prediction rejected: {e}");
                    Panel::Unavailable
                }
            },
            Err(e) => {
                warn!(patient = id, "prediction unavailable: {e}");
                let _ = self.orchestrator.apply_probability(ticket, None);
                Panel::Unavailable
            }
        };

        let ranked = attributions
            .and_then(|items| rank(items).map_err(|e| ApiError::Malformed(e.to_string())));
        self.panels.explanation = match ranked {
            Ok(items) => Panel::Ready(items),
            Err(e) => {
                warn!(patient = id, "explanation unavailable: {e}");
                Panel::Unavailable
            }
        };
    }

    /// Displayed risk for the selected patient: whole percent plus the
    /// colour band, once a probability has been applied.
    pub fn predicted_risk(&self) -> Option<(u8, RiskBand)> {
        let probability = self.orchestrator.selected_state()?.probability?;
        Some((risk_percent(probability), risk_band(probability)))
    }

    /// Record the initial estimate (`None` for "unsure").
    pub fn record_estimate(&mut self, estimate: Option<f64>) -> Result<(), SessionError> {
        self.orchestrator.record_estimate(estimate)
    }

    pub fn request_advance(&mut self) -> Result<(), SessionError> {
        self.orchestrator.request_advance()
    }

    pub fn confirm_initial(&mut self) -> Result<(), SessionError> {
        self.orchestrator.confirm_initial()
    }

    pub fn cancel_confirmation(&mut self) -> Result<(), SessionError> {
        self.orchestrator.cancel_confirmation()
    }

    pub fn acknowledge_explanation(&mut self) -> Result<(), SessionError> {
        self.orchestrator.acknowledge_explanation()
    }

    pub fn submit_final(
        &mut self,
        decision: FinalDecision,
        reason: Option<String>,
    ) -> Result<(), SessionError> {
        self.orchestrator.submit_final(decision, reason)
    }

    pub fn orchestrator(&self) -> &SessionOrchestrator {
        &self.orchestrator
    }

    pub fn filter(&self) -> &RosterFilter {
        &self.filter
    }

    pub fn roster(&self) -> &RosterPage {
        &self.roster
    }

    pub fn panels(&self) -> &PatientPanels {
        &self.panels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ConsoleConfig {
        let mut config = ConsoleConfig::default();
        config.api_base = "http://127.0.0.1:1".to_string();
        config.request_timeout_secs = 1;
        config.api_token = "tok-test".to_string();
        config.users.insert("anna".into(), "pw1".into());
        config
    }

    #[test]
    fn test_panel_predicates() {
        assert!(Panel::Ready(1).is_ready());
        assert!(!Panel::<i32>::Loading.is_ready());
        assert!(Panel::<i32>::Unavailable.is_unavailable());
    }

    #[tokio::test]
    async fn test_login_lifecycle() {
        let mut app = ReviewApp::new(test_config()).unwrap();
        assert!(!app.is_logged_in());

        assert!(!app.login("anna", "wrong"));
        assert!(!app.is_logged_in());

        assert!(app.login("anna", "pw1"));
        assert!(app.is_logged_in());

        app.logout();
        assert!(!app.is_logged_in());
    }

    #[tokio::test]
    async fn test_fresh_app_has_unavailable_roster() {
        let app = ReviewApp::new(test_config()).unwrap();
        assert_eq!(app.roster().total, None);
        assert!(app.roster_rows().is_empty());
    }
}
