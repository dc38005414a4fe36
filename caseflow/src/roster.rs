//! Roster querying — filter composition, pagination bounds, and the merge
//! of fetched pages with known review statuses.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::workflow::PatientStatus;

/// Search criteria and page cursor for the patient roster.
///
/// The page size is fixed for the session; only the cursor and the
/// criteria move. Changing criteria always returns to the first page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterFilter {
    pub id_substring: Option<String>,
    pub age_min: Option<u32>,
    pub age_max: Option<u32>,
    pub page_index: usize,
    pub page_size: usize,
}

impl RosterFilter {
    /// Unfiltered roster at the first page.
    pub fn new(page_size: usize) -> Self {
        Self {
            id_substring: None,
            age_min: None,
            age_max: None,
            page_index: 0,
            page_size,
        }
    }

    /// Replace the search criteria and return to the first page. Blank or
    /// whitespace-only id input counts as absent.
    pub fn apply(&mut self, id_substring: Option<&str>, age_min: Option<u32>, age_max: Option<u32>) {
        self.id_substring = normalize(id_substring);
        self.age_min = age_min;
        self.age_max = age_max;
        self.page_index = 0;
    }

    /// Clear every criterion and return to the first page.
    pub fn reset(&mut self) {
        self.apply(None, None, None);
    }

    /// Whether a later page exists for the given roster size. An unknown
    /// total never permits advancing.
    pub fn has_next(&self, total: Option<u64>) -> bool {
        match total {
            Some(total) => (self.page_index as u64 + 1) * (self.page_size as u64) < total,
            None => false,
        }
    }

    /// Whether an earlier page exists.
    pub fn has_previous(&self) -> bool {
        self.page_index > 0
    }

    /// Advance one page if the bounds allow it. Out-of-bounds requests
    /// leave the cursor untouched and report `false`, so no fetch is made.
    pub fn next_page(&mut self, total: Option<u64>) -> bool {
        if self.has_next(total) {
            self.page_index += 1;
            true
        } else {
            false
        }
    }

    /// Step back one page if not already at the first.
    pub fn previous_page(&mut self) -> bool {
        if self.has_previous() {
            self.page_index -= 1;
            true
        } else {
            false
        }
    }

    /// Request parameters for the roster endpoint.
    pub fn query(&self) -> RosterQuery {
        RosterQuery {
            skip: self.page_index * self.page_size,
            limit: self.page_size,
            id_patient: self.id_substring.clone(),
            age_min: self.age_min,
            age_max: self.age_max,
        }
    }
}

fn normalize(input: Option<&str>) -> Option<String> {
    input
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Concrete request parameters for one roster fetch. Absent criteria are
/// omitted entirely — an empty `id_patient` would make the backend match
/// every id as a substring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterQuery {
    pub skip: usize,
    pub limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_patient: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_max: Option<u32>,
}

impl RosterQuery {
    /// Key/value pairs ready for URL encoding.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("skip", self.skip.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(id) = &self.id_patient {
            params.push(("id_patient", id.clone()));
        }
        if let Some(min) = self.age_min {
            params.push(("age_min", min.to_string()));
        }
        if let Some(max) = self.age_max {
            params.push(("age_max", max.to_string()));
        }
        params
    }
}

/// One roster row as served by the backend. Ages arrive as numbers,
/// numeric strings, or blank when unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id_patient: String,
    #[serde(default, deserialize_with = "de_age")]
    pub age: Option<f64>,
    #[serde(default)]
    pub prediction_proba: Option<f64>,
}

fn de_age<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// One fetched page of the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterPage {
    pub patients: Vec<PatientRecord>,
    /// Total matching patients; `None` when the fetch failed.
    pub total: Option<u64>,
}

impl RosterPage {
    /// Well-defined result for a failed fetch: no rows, total unknown.
    pub fn unavailable() -> Self {
        Self {
            patients: Vec::new(),
            total: None,
        }
    }

    /// Number of pages at the given page size, when the total is known.
    pub fn total_pages(&self, page_size: usize) -> Option<u64> {
        if page_size == 0 {
            return None;
        }
        self.total.map(|total| total.div_ceil(page_size as u64))
    }
}

/// A roster row annotated with its review status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterRow {
    pub record: PatientRecord,
    pub status: PatientStatus,
}

/// Annotate a fetched page with known review statuses. Rows without an
/// entry in the map are not seen. The input page is left untouched.
pub fn merge_results(
    page: &RosterPage,
    statuses: &HashMap<String, PatientStatus>,
) -> Vec<RosterRow> {
    page.patients
        .iter()
        .map(|record| RosterRow {
            status: statuses
                .get(&record.id_patient)
                .copied()
                .unwrap_or(PatientStatus::NotSeen),
            record: record.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(ids: &[&str], total: u64) -> RosterPage {
        RosterPage {
            patients: ids
                .iter()
                .map(|id| PatientRecord {
                    id_patient: id.to_string(),
                    age: Some(60.0),
                    prediction_proba: None,
                })
                .collect(),
            total: Some(total),
        }
    }

    #[test]
    fn test_query_emits_skip_and_limit() {
        let mut filter = RosterFilter::new(15);
        filter.apply(Some("P5"), Some(40), None);
        filter.page_index = 2;

        let query = filter.query();
        assert_eq!(query.skip, 30);
        assert_eq!(query.limit, 15);
        assert_eq!(query.id_patient.as_deref(), Some("P5"));
        assert_eq!(query.age_min, Some(40));
        assert_eq!(query.age_max, None);

        let params = query.params();
        assert_eq!(
            params,
            vec![
                ("skip", "30".to_string()),
                ("limit", "15".to_string()),
                ("id_patient", "P5".to_string()),
                ("age_min", "40".to_string()),
            ]
        );
    }

    #[test]
    fn test_absent_criteria_are_omitted() {
        let filter = RosterFilter::new(15);
        let params = filter.query().params();
        let keys: Vec<_> = params.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, ["skip", "limit"]);
    }

    #[test]
    fn test_blank_id_input_counts_as_absent() {
        let mut filter = RosterFilter::new(15);
        filter.apply(Some("   "), None, None);
        assert_eq!(filter.id_substring, None);

        filter.apply(Some("  P7 "), None, None);
        assert_eq!(filter.id_substring.as_deref(), Some("P7"));
    }

    #[test]
    fn test_apply_resets_page() {
        let mut filter = RosterFilter::new(15);
        filter.page_index = 4;
        filter.apply(Some("P1"), None, None);
        assert_eq!(filter.page_index, 0);

        filter.page_index = 2;
        filter.reset();
        assert_eq!(filter.page_index, 0);
        assert_eq!(filter.age_min, None);
    }

    #[test]
    fn test_next_page_bounds() {
        let mut filter = RosterFilter::new(15);
        // 31 patients → pages 0, 1, 2.
        assert!(filter.next_page(Some(31)));
        assert!(filter.next_page(Some(31)));
        assert_eq!(filter.page_index, 2);

        // (2+1)*15 >= 31: request is a no-op.
        assert!(!filter.next_page(Some(31)));
        assert_eq!(filter.page_index, 2);
    }

    #[test]
    fn test_next_page_with_unknown_total_is_rejected() {
        let mut filter = RosterFilter::new(15);
        assert!(!filter.next_page(None));
        assert_eq!(filter.page_index, 0);
    }

    #[test]
    fn test_previous_page_bounds() {
        let mut filter = RosterFilter::new(15);
        assert!(!filter.previous_page());
        filter.page_index = 1;
        assert!(filter.previous_page());
        assert_eq!(filter.page_index, 0);
    }

    #[test]
    fn test_exact_multiple_has_no_extra_page() {
        let filter = RosterFilter::new(15);
        assert!(filter.has_next(Some(16)));
        let mut at_last = RosterFilter::new(15);
        at_last.page_index = 0;
        assert!(!at_last.has_next(Some(15)));
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(page(&[], 31).total_pages(15), Some(3));
        assert_eq!(page(&[], 30).total_pages(15), Some(2));
        assert_eq!(RosterPage::unavailable().total_pages(15), None);
    }

    #[test]
    fn test_unavailable_page_is_empty_with_unknown_total() {
        let unavailable = RosterPage::unavailable();
        assert!(unavailable.patients.is_empty());
        assert_eq!(unavailable.total, None);
    }

    #[test]
    fn test_merge_defaults_to_not_seen() {
        let page = page(&["P1", "P2"], 2);
        let mut statuses = HashMap::new();
        statuses.insert("P1".to_string(), PatientStatus::Seen);

        let rows = merge_results(&page, &statuses);
        assert_eq!(rows[0].status, PatientStatus::Seen);
        assert_eq!(rows[1].status, PatientStatus::NotSeen);
    }

    #[test]
    fn test_merge_leaves_input_untouched() {
        let page = page(&["P1"], 1);
        let before = page.clone();
        let _ = merge_results(&page, &HashMap::new());
        assert_eq!(page, before);
    }

    #[test]
    fn test_patient_record_age_shapes() {
        let record: PatientRecord =
            serde_json::from_str(r#"{"id_patient": "12", "age": 63.4}"#).unwrap();
        assert_eq!(record.age, Some(63.4));

        let record: PatientRecord =
            serde_json::from_str(r#"{"id_patient": "12", "age": "71"}"#).unwrap();
        assert_eq!(record.age, Some(71.0));

        let record: PatientRecord =
            serde_json::from_str(r#"{"id_patient": "12", "age": ""}"#).unwrap();
        assert_eq!(record.age, None);

        let record: PatientRecord = serde_json::from_str(r#"{"id_patient": "12"}"#).unwrap();
        assert_eq!(record.age, None);
        assert_eq!(record.prediction_proba, None);
    }
}
