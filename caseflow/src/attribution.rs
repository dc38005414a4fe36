//! Attribution ranking — turns per-feature contribution scores into the
//! ordered, labeled sequence behind the explanation chart.
//!
//! Ranking is pure data work: no filtering, no thresholds. Suppressing
//! near-zero labels is a presentation concern and stays out of here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw feature value attached to an attribution entry. The backend sends
/// whatever the source table held, so both text and numbers arrive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
}

impl std::fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(v) if v.fract() == 0.0 => write!(f, "{v:.0}"),
            Self::Number(v) => write!(f, "{v:.2}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Direction of a contribution relative to the predicted risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    IncreasesRisk,
    DecreasesRisk,
}

/// One feature's signed contribution to a patient's prediction.
///
/// Produced fresh for every fetch; never cached across patients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributionItem {
    pub feature: String,
    pub raw_value: FeatureValue,
    /// Signed contribution to the prediction.
    pub contribution: f64,
    /// Absolute contribution, always recomputed locally.
    pub magnitude: f64,
}

/// Error for malformed attribution payloads.
///
/// Callers fall back to an explicit "no explanation available" display;
/// partial output is never produced.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid attribution data: contribution for {feature:?} is not a finite number")]
pub struct InvalidAttributionData {
    pub feature: String,
}

impl AttributionItem {
    /// Build an item, rejecting non-finite contributions up front.
    pub fn new(
        feature: impl Into<String>,
        raw_value: FeatureValue,
        contribution: f64,
    ) -> Result<Self, InvalidAttributionData> {
        let feature = feature.into();
        if !contribution.is_finite() {
            return Err(InvalidAttributionData { feature });
        }
        Ok(Self {
            magnitude: contribution.abs(),
            feature,
            raw_value,
            contribution,
        })
    }

    /// Whether this feature pushed the prediction up or down.
    pub fn direction(&self) -> Direction {
        if self.contribution >= 0.0 {
            Direction::IncreasesRisk
        } else {
            Direction::DecreasesRisk
        }
    }

    /// "feature: value" meta label shown alongside the bar.
    pub fn label(&self) -> String {
        format!("{}: {}", self.feature, self.raw_value)
    }

    /// Two-decimal contribution with an explicit sign, e.g. `+0.50`.
    pub fn signed_label(&self) -> String {
        if self.contribution >= 0.0 {
            format!("+{:.2}", self.contribution)
        } else {
            format!("{:.2}", self.contribution)
        }
    }
}

/// Wire shape of one explanation entry as served by the backend. Any
/// transported `abs_val` is ignored; the magnitude is recomputed here.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAttribution {
    pub feature: String,
    pub feature_value: FeatureValue,
    pub shap_value: f64,
}

/// Decode wire entries into attribution items, validating each one.
pub fn from_wire(entries: Vec<RawAttribution>) -> Result<Vec<AttributionItem>, InvalidAttributionData> {
    entries
        .into_iter()
        .map(|entry| AttributionItem::new(entry.feature, entry.feature_value, entry.shap_value))
        .collect()
}

/// Order items by contribution magnitude, strongest first.
///
/// The sort is stable: equal magnitudes keep their input order, so chart
/// output is deterministic for identical payloads. Malformed input fails
/// as a whole; no partially ranked sequence escapes.
pub fn rank(items: Vec<AttributionItem>) -> Result<Vec<AttributionItem>, InvalidAttributionData> {
    if let Some(bad) = items
        .iter()
        .find(|item| !item.contribution.is_finite() || !item.magnitude.is_finite())
    {
        return Err(InvalidAttributionData {
            feature: bad.feature.clone(),
        });
    }
    let mut ranked = items;
    ranked.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(feature: &str, contribution: f64) -> AttributionItem {
        AttributionItem::new(feature, FeatureValue::Number(1.0), contribution).unwrap()
    }

    #[test]
    fn test_rank_orders_by_magnitude_descending() {
        let ranked = rank(vec![item("low", 0.1), item("high", -0.9), item("mid", 0.4)]).unwrap();
        let features: Vec<_> = ranked.iter().map(|i| i.feature.as_str()).collect();
        assert_eq!(features, ["high", "mid", "low"]);
    }

    #[test]
    fn test_rank_ties_keep_input_order() {
        // |−0.3| equals |0.3|, so A stays ahead of C.
        let ranked = rank(vec![item("A", -0.3), item("B", 0.5), item("C", 0.3)]).unwrap();
        let features: Vec<_> = ranked.iter().map(|i| i.feature.as_str()).collect();
        assert_eq!(features, ["B", "A", "C"]);
    }

    #[test]
    fn test_rank_is_a_permutation() {
        let input = vec![item("A", 0.2), item("B", -0.2), item("C", 0.7)];
        let ranked = rank(input.clone()).unwrap();
        assert_eq!(ranked.len(), input.len());
        for original in &input {
            assert!(ranked.contains(original));
        }
    }

    #[test]
    fn test_rank_does_not_filter_near_zero() {
        let ranked = rank(vec![item("tiny", 0.001), item("zero", 0.0)]).unwrap();
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn test_non_finite_contribution_is_rejected() {
        let err = AttributionItem::new("Temp", FeatureValue::Number(37.0), f64::NAN).unwrap_err();
        assert_eq!(err.feature, "Temp");

        let mut bad = item("Temp", 0.5);
        bad.contribution = f64::INFINITY;
        let err = rank(vec![item("ok", 0.1), bad]).unwrap_err();
        assert_eq!(err.feature, "Temp");
    }

    #[test]
    fn test_direction() {
        assert_eq!(item("a", 0.2).direction(), Direction::IncreasesRisk);
        assert_eq!(item("a", 0.0).direction(), Direction::IncreasesRisk);
        assert_eq!(item("a", -0.2).direction(), Direction::DecreasesRisk);
    }

    #[test]
    fn test_labels() {
        let numeric = AttributionItem::new("Age", FeatureValue::Number(63.0), 0.5).unwrap();
        assert_eq!(numeric.label(), "Age: 63");
        assert_eq!(numeric.signed_label(), "+0.50");

        let text =
            AttributionItem::new("Ward", FeatureValue::Text("oncology".into()), -0.25).unwrap();
        assert_eq!(text.label(), "Ward: oncology");
        assert_eq!(text.signed_label(), "-0.25");

        let fractional = AttributionItem::new("CRP", FeatureValue::Number(12.345), 0.1).unwrap();
        assert_eq!(fractional.label(), "CRP: 12.35");
    }

    #[test]
    fn test_from_wire_recomputes_magnitude() {
        let payload = r#"[
            {"feature": "Age", "feature_value": 63, "shap_value": -0.31, "abs_val": 99.0},
            {"feature": "Ward", "feature_value": "oncology", "shap_value": 0.12}
        ]"#;
        let entries: Vec<RawAttribution> = serde_json::from_str(payload).unwrap();
        let items = from_wire(entries).unwrap();
        assert_eq!(items[0].magnitude, 0.31);
        assert_eq!(items[1].raw_value, FeatureValue::Text("oncology".into()));
    }
}
