//! The sample-call catalog: precomputed earnings-call predictions with their
//! realised returns, filtered, sorted, and paginated in memory.

use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{DataError, Result};
use crate::paging::PageRequest;

/// One precomputed call record. Unrecognised fields pass through verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleCall {
    #[serde(deserialize_with = "string_or_number")]
    pub call_id: String,
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub pred_label: Option<String>,
    /// Realised return over the evaluation window. Signed.
    #[serde(default)]
    pub true_return: Option<f64>,
    #[serde(default)]
    pub is_correct: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

impl SampleCall {
    fn abs_return(&self) -> f64 {
        self.true_return.map(f64::abs).unwrap_or(0.0)
    }

    fn parsed_date(&self) -> Option<NaiveDate> {
        self.date.as_deref().and_then(parse_stored_date)
    }
}

/// Stored dates may be plain dates or carry a time component.
fn parse_stored_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Parse a `YYYY-MM-DD` query bound.
pub fn parse_date_bound(field: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
        DataError::Validation(format!("{field} must be a YYYY-MM-DD date, got {raw:?}: {e}"))
    })
}

/// Sort orders for [`CallCatalog::list`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    /// Newest first, comparing the raw date strings.
    #[default]
    Date,
    /// Largest absolute return first.
    AbsReturn,
    /// Incorrect predictions first, smaller absolute return first within each group.
    WrongFirst,
}

/// Optional, AND-combined call filters.
#[derive(Debug, Clone, Default)]
pub struct CallFilter {
    pub exchange: Option<String>,
    pub sector: Option<String>,
    pub pred_label: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub return_min: Option<f64>,
    pub return_max: Option<f64>,
}

impl CallFilter {
    fn matches(&self, call: &SampleCall) -> bool {
        eq_ci(&self.exchange, &call.exchange)
            && eq_ci(&self.sector, &call.sector)
            && eq_ci(&self.pred_label, &call.pred_label)
            && self.return_in_range(call.true_return)
            && self.date_in_range(call)
    }

    // Calls without a return are never excluded by the bounds.
    fn return_in_range(&self, value: Option<f64>) -> bool {
        let Some(v) = value else { return true };
        self.return_min.map_or(true, |min| v >= min) && self.return_max.map_or(true, |max| v <= max)
    }

    // Calls whose date does not parse are kept.
    fn date_in_range(&self, call: &SampleCall) -> bool {
        if self.start_date.is_none() && self.end_date.is_none() {
            return true;
        }
        let Some(date) = call.parsed_date() else { return true };
        self.start_date.map_or(true, |start| date >= start)
            && self.end_date.map_or(true, |end| date <= end)
    }
}

fn eq_ci(wanted: &Option<String>, actual: &Option<String>) -> bool {
    match wanted.as_deref().filter(|w| !w.is_empty()) {
        None => true,
        Some(w) => actual
            .as_deref()
            .is_some_and(|a| a.to_lowercase() == w.to_lowercase()),
    }
}

/// One page of sample calls.
#[derive(Debug, Clone, Serialize)]
pub struct CallPage {
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
    pub rows: Vec<SampleCall>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CallDocument {
    List(Vec<SampleCall>),
    Wrapped { calls: Vec<SampleCall> },
}

/// Read-only collection of sample calls, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct CallCatalog {
    calls: Vec<SampleCall>,
}

impl CallCatalog {
    pub fn new(calls: Vec<SampleCall>) -> Self {
        Self { calls }
    }

    /// Load the catalog from a JSON document. A missing file is an empty catalog.
    pub fn load(path: &Path) -> Result<Self> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "Sample call file not found, catalog is empty");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let catalog = Self::from_json(&json)?;
        tracing::info!(path = %path.display(), calls = catalog.len(), "Sample calls loaded");
        Ok(catalog)
    }

    /// Parse either a bare array of calls or `{"calls": [...]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: CallDocument =
            serde_json::from_str(json).map_err(|e| DataError::Catalog(e.to_string()))?;
        let calls = match doc {
            CallDocument::List(calls) => calls,
            CallDocument::Wrapped { calls } => calls,
        };
        Ok(Self { calls })
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Filter, sort, and paginate.
    pub fn list(&self, filter: &CallFilter, sort_by: SortBy, page: PageRequest) -> CallPage {
        let mut matched: Vec<(usize, &SampleCall)> = self
            .calls
            .iter()
            .enumerate()
            .filter(|(_, call)| filter.matches(call))
            .collect();

        // The source position is the final key, so ties keep first-seen order.
        matched.sort_by(|(ia, a), (ib, b)| compare(sort_by, a, b).then(ia.cmp(ib)));

        let total = matched.len();
        let rows = matched[page.window(total)]
            .iter()
            .map(|(_, call)| (*call).clone())
            .collect();

        CallPage {
            total,
            page: page.page(),
            page_size: page.page_size(),
            rows,
        }
    }

    /// Look up a single call by id.
    pub fn get(&self, call_id: &str) -> Result<&SampleCall> {
        self.calls
            .iter()
            .find(|call| call.call_id == call_id)
            .ok_or_else(|| DataError::CallNotFound {
                call_id: call_id.to_string(),
            })
    }
}

fn compare(sort_by: SortBy, a: &SampleCall, b: &SampleCall) -> Ordering {
    match sort_by {
        SortBy::Date => {
            let (da, db) = (a.date.as_deref().unwrap_or(""), b.date.as_deref().unwrap_or(""));
            db.cmp(da)
        }
        SortBy::AbsReturn => b.abs_return().total_cmp(&a.abs_return()),
        SortBy::WrongFirst => {
            let correct = |c: &SampleCall| u8::from(c.is_correct == Some(true));
            correct(a)
                .cmp(&correct(b))
                .then(a.abs_return().total_cmp(&b.abs_return()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CALLS: &str = r#"[
        {"call_id": "c1", "ticker": "AAPL", "exchange": "NASDAQ", "sector": "Tech",
         "date": "2023-01-01", "pred_label": "UP", "true_return": 3.0, "is_correct": true},
        {"call_id": "c2", "ticker": "XOM", "exchange": "NYSE", "sector": "Energy",
         "date": "2023-06-01", "pred_label": "DOWN", "true_return": -10.0, "is_correct": false},
        {"call_id": "c3", "ticker": "IBM", "exchange": "nyse", "sector": "Tech",
         "date": "not a date", "pred_label": "up", "true_return": null, "is_correct": null},
        {"call_id": 4, "ticker": "KO", "exchange": "NYSE", "sector": "Staples",
         "date": "2023-03-15T09:30:00Z", "pred_label": "UP", "true_return": 1.0,
         "is_correct": false, "transcript_len": 5120}
    ]"#;

    fn catalog() -> CallCatalog {
        CallCatalog::from_json(CALLS).unwrap()
    }

    fn all() -> PageRequest {
        PageRequest::new(1, 200, 200).unwrap()
    }

    fn ids(page: &CallPage) -> Vec<&str> {
        page.rows.iter().map(|c| c.call_id.as_str()).collect()
    }

    #[test]
    fn test_numeric_ids_and_extra_fields_are_kept() {
        let catalog = catalog();
        let call = catalog.get("4").unwrap();
        assert_eq!(call.ticker.as_deref(), Some("KO"));
        assert_eq!(call.extra["transcript_len"], 5120);

        let json = serde_json::to_value(call).unwrap();
        assert_eq!(json["transcript_len"], 5120);
        assert_eq!(json["call_id"], "4");
    }

    #[test]
    fn test_wrapped_document() {
        let catalog = CallCatalog::from_json(r#"{"calls": [{"call_id": "a"}]}"#).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("a").unwrap().date.is_none());
    }

    #[test]
    fn test_malformed_document_is_catalog_error() {
        assert!(matches!(
            CallCatalog::from_json(r#"{"rows": 3}"#),
            Err(DataError::Catalog(_))
        ));
    }

    #[test]
    fn test_missing_file_is_empty_catalog() {
        let catalog = CallCatalog::load(Path::new("/nonexistent/sample_calls.json")).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        assert!(matches!(
            catalog().get("nope"),
            Err(DataError::CallNotFound { .. })
        ));
    }

    #[test]
    fn test_sort_by_date_descending_on_raw_string() {
        let page = catalog().list(&CallFilter::default(), SortBy::Date, all());
        assert_eq!(ids(&page), vec!["c3", "c2", "4", "c1"]);

        let first = catalog().list(
            &CallFilter::default(),
            SortBy::Date,
            PageRequest::new(1, 1, 200).unwrap(),
        );
        assert_eq!(first.total, 4);
        assert_eq!(ids(&first), vec!["c3"]);
    }

    #[test]
    fn test_sort_by_abs_return() {
        let page = catalog().list(&CallFilter::default(), SortBy::AbsReturn, all());
        // |-10| > 3 > 1 > null (as zero)
        assert_eq!(ids(&page), vec!["c2", "c1", "4", "c3"]);
    }

    #[test]
    fn test_sort_wrong_first() {
        let page = catalog().list(&CallFilter::default(), SortBy::WrongFirst, all());
        // Incorrect or unknown first, smallest absolute return first within each group.
        assert_eq!(ids(&page), vec!["c3", "4", "c2", "c1"]);
    }

    #[test]
    fn test_ties_keep_document_order() {
        let catalog = CallCatalog::from_json(
            r#"[{"call_id": "a", "date": "2023-01-01"},
                {"call_id": "b", "date": "2023-01-01"},
                {"call_id": "c", "date": "2023-01-01"}]"#,
        )
        .unwrap();
        for sort in [SortBy::Date, SortBy::AbsReturn, SortBy::WrongFirst] {
            let page = catalog.list(&CallFilter::default(), sort, all());
            assert_eq!(ids(&page), vec!["a", "b", "c"]);
        }
    }

    #[test]
    fn test_exact_case_insensitive_filters() {
        let filter = CallFilter {
            exchange: Some("NYSE".into()),
            pred_label: Some("up".into()),
            ..Default::default()
        };
        let page = catalog().list(&filter, SortBy::Date, all());
        assert_eq!(ids(&page), vec!["c3", "4"]);

        let filter = CallFilter {
            exchange: Some("NYS".into()),
            ..Default::default()
        };
        assert_eq!(catalog().list(&filter, SortBy::Date, all()).total, 0);
    }

    #[test]
    fn test_return_bounds_keep_null_returns() {
        let filter = CallFilter {
            return_min: Some(0.0),
            return_max: Some(3.0),
            ..Default::default()
        };
        let page = catalog().list(&filter, SortBy::Date, all());
        assert_eq!(ids(&page), vec!["c3", "4", "c1"]);
    }

    #[test]
    fn test_date_range_is_inclusive_and_keeps_unparsable() {
        let filter = CallFilter {
            start_date: Some(parse_date_bound("start_date", "2023-01-01").unwrap()),
            end_date: Some(parse_date_bound("end_date", "2023-03-15").unwrap()),
            ..Default::default()
        };
        let page = catalog().list(&filter, SortBy::Date, all());
        assert_eq!(ids(&page), vec!["c3", "4", "c1"]);
    }

    #[test]
    fn test_malformed_date_bound_is_validation_error() {
        assert!(matches!(
            parse_date_bound("start_date", "01/02/2023"),
            Err(DataError::Validation(_))
        ));
    }

    #[test]
    fn test_page_metadata_is_echoed() {
        let page = catalog().list(
            &CallFilter::default(),
            SortBy::Date,
            PageRequest::new(3, 2, 200).unwrap(),
        );
        assert_eq!(page.page, 3);
        assert_eq!(page.page_size, 2);
        assert_eq!(page.total, 4);
        assert!(page.rows.is_empty());
    }

    #[test]
    fn test_sort_by_parses_snake_case() {
        let sort: SortBy = serde_json::from_str(r#""wrong_first""#).unwrap();
        assert_eq!(sort, SortBy::WrongFirst);
        let sort: SortBy = serde_json::from_str(r#""abs_return""#).unwrap();
        assert_eq!(sort, SortBy::AbsReturn);
        assert!(serde_json::from_str::<SortBy>(r#""random""#).is_err());
    }
}
