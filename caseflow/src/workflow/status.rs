//! Patient status derivation — one pure mapping from review state.
//!
//! The roster needs to know how far each review got. Rather than letting
//! every caller re-derive it from step and decision fields, the rule lives
//! here once.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::state::{ReviewState, ReviewStep};

/// How far a patient's review has progressed. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientStatus {
    /// No review started.
    NotSeen,
    /// Review started but no final decision yet.
    InProgress,
    /// Final decision recorded.
    Seen,
}

impl std::fmt::Display for PatientStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotSeen => write!(f, "not_seen"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Seen => write!(f, "seen"),
        }
    }
}

/// Status of a single review. A present final decision means seen,
/// regardless of anything else.
pub fn status_of(state: &ReviewState) -> PatientStatus {
    if state.final_decision.is_some() {
        PatientStatus::Seen
    } else if state.step != ReviewStep::Assess {
        PatientStatus::InProgress
    } else {
        PatientStatus::NotSeen
    }
}

/// Status per known patient. Patients absent from the input simply have no
/// entry; roster merging treats them as not seen.
pub fn status_map(states: &HashMap<String, ReviewState>) -> HashMap<String, PatientStatus> {
    states
        .iter()
        .map(|(id, state)| (id.clone(), status_of(state)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::FinalDecision;

    #[test]
    fn test_fresh_state_is_not_seen() {
        assert_eq!(status_of(&ReviewState::new()), PatientStatus::NotSeen);
    }

    #[test]
    fn test_recorded_estimate_alone_is_still_not_seen() {
        let mut state = ReviewState::new();
        state.record_estimate(Some(30.0)).unwrap();
        assert_eq!(status_of(&state), PatientStatus::NotSeen);
    }

    #[test]
    fn test_advanced_review_is_in_progress() {
        let mut state = ReviewState::new();
        state.record_estimate(Some(30.0)).unwrap();
        state.request_advance().unwrap();
        assert_eq!(status_of(&state), PatientStatus::InProgress);
    }

    #[test]
    fn test_final_decision_means_seen() {
        let mut state = ReviewState::new();
        state.record_estimate(None).unwrap();
        state.request_advance().unwrap();
        state.confirm_initial().unwrap();
        state.submit_final(FinalDecision::Agree, None).unwrap();
        assert_eq!(status_of(&state), PatientStatus::Seen);
    }

    #[test]
    fn test_status_map() {
        let mut states = HashMap::new();
        states.insert("P1".to_string(), ReviewState::new());

        let mut in_progress = ReviewState::new();
        in_progress.record_estimate(Some(10.0)).unwrap();
        in_progress.request_advance().unwrap();
        states.insert("P2".to_string(), in_progress);

        let map = status_map(&states);
        assert_eq!(map.get("P1"), Some(&PatientStatus::NotSeen));
        assert_eq!(map.get("P2"), Some(&PatientStatus::InProgress));
        assert_eq!(map.get("P3"), None);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(PatientStatus::NotSeen.to_string(), "not_seen");
        assert_eq!(PatientStatus::InProgress.to_string(), "in_progress");
        assert_eq!(PatientStatus::Seen.to_string(), "seen");
    }
}
