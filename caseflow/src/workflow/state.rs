//! Review state machine — steps, guarded transitions, and decision capture.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Step of a patient review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStep {
    /// Clinician studies the vitals and records an initial risk estimate.
    Assess,
    /// Estimate recorded, awaiting explicit confirmation.
    CommitPending,
    /// Model prediction and explanation are visible.
    Explanation,
    /// Final decision recorded — review is closed.
    Final,
}

impl ReviewStep {
    /// Numeric index of this step (0 through 3).
    pub fn index(self) -> u8 {
        match self {
            Self::Assess => 0,
            Self::CommitPending => 1,
            Self::Explanation => 2,
            Self::Final => 3,
        }
    }

    /// Whether this is the terminal step.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Final)
    }
}

impl Default for ReviewStep {
    fn default() -> Self {
        Self::Assess
    }
}

impl std::fmt::Display for ReviewStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Assess => write!(f, "assess"),
            Self::CommitPending => write!(f, "commit_pending"),
            Self::Explanation => write!(f, "explanation"),
            Self::Final => write!(f, "final"),
        }
    }
}

/// The clinician's terminal judgment relative to the model's prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalDecision {
    Disagree,
    Unsure,
    Agree,
}

impl FinalDecision {
    /// Label used in audit payloads and the read-only summary.
    pub fn label(self) -> &'static str {
        match self {
            Self::Disagree => "Disagree",
            Self::Unsure => "Unsure",
            Self::Agree => "Agree",
        }
    }
}

impl std::fmt::Display for FinalDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disagree => write!(f, "disagree"),
            Self::Unsure => write!(f, "unsure"),
            Self::Agree => write!(f, "agree"),
        }
    }
}

/// Error for rejected review actions.
///
/// All variants are recoverable: the state is left exactly as it was,
/// except that a failed advance raises the inline `decision_error` flag.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReviewError {
    /// An estimate outside 0..=100 (or non-finite) was offered.
    #[error("estimate {0} is outside the accepted range 0..=100")]
    EstimateOutOfRange(f64),

    /// Advance requested before any estimate was recorded.
    #[error("an initial estimate must be recorded before advancing")]
    EstimateRequired,

    /// A probability outside 0..=1 (or non-finite) was offered.
    #[error("probability {0} is outside the accepted range 0..=1")]
    ProbabilityOutOfRange(f64),

    /// The action does not apply to the current step.
    #[error("{action} is not valid at step {step}")]
    WrongStep {
        action: &'static str,
        step: ReviewStep,
    },

    /// The review already reached its final step; nothing mutates anymore.
    #[error("review is already complete")]
    ReviewComplete,
}

/// Per-patient review state.
///
/// Created lazily when a patient is first selected, lives for the session,
/// and is never persisted. The step only ever moves forward; once it
/// reaches [`ReviewStep::Final`] the decision fields are frozen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewState {
    /// Current review step.
    pub step: ReviewStep,
    /// Whether an estimate (or explicit "unsure") was recorded for the
    /// current gate. Re-armed to `false` once the estimate is confirmed.
    pub decision_made: bool,
    /// Transient validation flag, raised by a premature advance and
    /// cleared by any state-changing action.
    pub decision_error: bool,
    /// Recorded risk estimate in percent; `None` after recording means
    /// the clinician answered "unsure". Immutable once past `Assess`.
    pub initial_decision: Option<f64>,
    /// Model probability fetched for this patient. Independent of the
    /// step and refreshable at any time.
    pub probability: Option<f64>,
    /// Whether the explanation was acknowledged at least once.
    pub prediction_viewed: bool,
    /// The terminal judgment. Present exactly when `step` is `Final`.
    pub final_decision: Option<FinalDecision>,
    /// Optional free-text rationale recorded with the final decision.
    pub decision_reason: Option<String>,
}

impl ReviewState {
    /// Fresh state for a newly selected patient.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the review reached its terminal step.
    pub fn is_complete(&self) -> bool {
        self.step.is_terminal()
    }

    /// Record the initial risk estimate, or `None` for "unsure".
    ///
    /// Only valid at `Assess`; the estimate becomes immutable as soon as
    /// the review advances.
    pub fn record_estimate(&mut self, estimate: Option<f64>) -> Result<(), ReviewError> {
        self.guard_active()?;
        if self.step != ReviewStep::Assess {
            return Err(ReviewError::WrongStep {
                action: "record estimate",
                step: self.step,
            });
        }
        if let Some(value) = estimate {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(ReviewError::EstimateOutOfRange(value));
            }
        }
        self.initial_decision = estimate;
        self.decision_made = true;
        self.decision_error = false;
        Ok(())
    }

    /// Ask to move from `Assess` to `CommitPending`.
    ///
    /// Gated on a recorded estimate: without one the step stays put and
    /// the `decision_error` flag is raised for inline display.
    pub fn request_advance(&mut self) -> Result<(), ReviewError> {
        self.guard_active()?;
        if self.step != ReviewStep::Assess {
            return Err(ReviewError::WrongStep {
                action: "request advance",
                step: self.step,
            });
        }
        if !self.decision_made {
            self.decision_error = true;
            return Err(ReviewError::EstimateRequired);
        }
        self.step = ReviewStep::CommitPending;
        self.decision_error = false;
        Ok(())
    }

    /// Confirm the recorded estimate, moving to `Explanation`.
    ///
    /// `decision_made` is re-armed to `false` so later gates start clean.
    /// The caller is responsible for emitting the `initial_decision`
    /// audit event after a successful confirmation.
    pub fn confirm_initial(&mut self) -> Result<(), ReviewError> {
        self.guard_active()?;
        if self.step != ReviewStep::CommitPending {
            return Err(ReviewError::WrongStep {
                action: "confirm initial decision",
                step: self.step,
            });
        }
        self.step = ReviewStep::Explanation;
        self.decision_made = false;
        self.decision_error = false;
        Ok(())
    }

    /// Close the confirmation dialog without committing. No state change;
    /// the step stays at `CommitPending` because steps never move back.
    pub fn cancel_confirmation(&mut self) -> Result<(), ReviewError> {
        self.guard_active()?;
        if self.step != ReviewStep::CommitPending {
            return Err(ReviewError::WrongStep {
                action: "cancel confirmation",
                step: self.step,
            });
        }
        Ok(())
    }

    /// Acknowledge the explanation view. Stays at `Explanation`: only an
    /// explicit final decision closes a review.
    ///
    /// Returns `true` on the first acknowledgement so the caller can emit
    /// `view_ai_prediction` exactly once.
    pub fn acknowledge_explanation(&mut self) -> Result<bool, ReviewError> {
        self.guard_active()?;
        if self.step != ReviewStep::Explanation {
            return Err(ReviewError::WrongStep {
                action: "acknowledge explanation",
                step: self.step,
            });
        }
        let first = !self.prediction_viewed;
        self.prediction_viewed = true;
        Ok(first)
    }

    /// Record the final decision, moving to the terminal `Final` step.
    ///
    /// The caller emits the `decision_made` audit event on success.
    pub fn submit_final(
        &mut self,
        decision: FinalDecision,
        reason: Option<String>,
    ) -> Result<(), ReviewError> {
        self.guard_active()?;
        if self.step != ReviewStep::Explanation {
            return Err(ReviewError::WrongStep {
                action: "submit final decision",
                step: self.step,
            });
        }
        self.final_decision = Some(decision);
        self.decision_reason = reason;
        self.decision_error = false;
        self.step = ReviewStep::Final;
        Ok(())
    }

    /// Store a fetched prediction probability, or clear it when the fetch
    /// failed. Allowed at any step, including `Final`: this refreshes a
    /// display value, it is not a workflow transition.
    pub fn set_probability(&mut self, probability: Option<f64>) -> Result<(), ReviewError> {
        if let Some(value) = probability {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ReviewError::ProbabilityOutOfRange(value));
            }
        }
        self.probability = probability;
        Ok(())
    }

    fn guard_active(&self) -> Result<(), ReviewError> {
        if self.is_complete() {
            return Err(ReviewError::ReviewComplete);
        }
        Ok(())
    }
}
