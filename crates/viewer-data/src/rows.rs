//! Row filtering, search, pagination, and facet values over a [`Table`].

use std::collections::BTreeSet;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::paging::PageRequest;
use crate::table::{Cell, Table};

const TICKER_COLUMN: &str = "ticker";
const QUARTER_COLUMNS: [&str; 2] = ["quarter", "q"];

/// Optional row filters. Empty strings count as absent.
#[derive(Debug, Clone, Default)]
pub struct RowFilter {
    /// Case-insensitive substring match on the `ticker` column.
    pub ticker: Option<String>,
    /// Exact match on the `quarter` column (or `q`).
    pub quarter: Option<String>,
    /// Case-insensitive substring match on any column.
    pub search: Option<String>,
}

/// One row rendered as a JSON object in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record(Vec<(String, Cell)>);

impl Record {
    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.0.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (column, cell) in &self.0 {
            map.serialize_entry(column, cell)?;
        }
        map.end()
    }
}

/// One page of filtered rows.
#[derive(Debug, Clone, Serialize)]
pub struct RowPage {
    /// Filtered row count before slicing.
    pub total: usize,
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

/// Distinct filter values for the front-end dropdowns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Facets {
    pub tickers: Vec<String>,
    pub quarters: Vec<String>,
}

/// The quarter column: `quarter` if present, else `q`.
fn quarter_column(table: &Table) -> Option<usize> {
    QUARTER_COLUMNS
        .iter()
        .find_map(|name| table.column_index(name))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn contains_ci(cell: &Cell, needle_lower: &str) -> bool {
    cell.as_text()
        .is_some_and(|text| text.to_lowercase().contains(needle_lower))
}

/// Filter `table` and return the requested page.
///
/// Filters narrow in order ticker, quarter, search. A ticker filter on a
/// table without a `ticker` column is a no-op, as is a quarter filter
/// without a quarter column.
pub fn query(table: &Table, filter: &RowFilter, page: PageRequest) -> RowPage {
    let ticker = non_empty(&filter.ticker)
        .zip(table.column_index(TICKER_COLUMN))
        .map(|(value, idx)| (value.to_lowercase(), idx));
    let quarter = non_empty(&filter.quarter).zip(quarter_column(table));
    let search = non_empty(&filter.search).map(str::to_lowercase);

    let matched: Vec<&Vec<Cell>> = table
        .rows()
        .iter()
        .filter(|row| match &ticker {
            Some((needle, idx)) => contains_ci(&row[*idx], needle),
            None => true,
        })
        .filter(|row| match quarter {
            Some((value, idx)) => row[idx].as_text().is_some_and(|text| text == value),
            None => true,
        })
        .filter(|row| match &search {
            Some(needle) => row.iter().any(|cell| contains_ci(cell, needle)),
            None => true,
        })
        .collect();

    let total = matched.len();
    let rows = matched[page.window(total)]
        .iter()
        .map(|row| {
            Record(
                table
                    .columns()
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect(),
            )
        })
        .collect();

    RowPage {
        total,
        columns: table.columns().to_vec(),
        rows,
    }
}

/// Sorted distinct ticker and quarter values.
pub fn options(table: &Table) -> Facets {
    Facets {
        tickers: table
            .column_index(TICKER_COLUMN)
            .map(|idx| distinct(table, idx))
            .unwrap_or_default(),
        quarters: quarter_column(table)
            .map(|idx| distinct(table, idx))
            .unwrap_or_default(),
    }
}

fn distinct(table: &Table, idx: usize) -> Vec<String> {
    table
        .rows()
        .iter()
        .filter_map(|row| row[idx].as_text().map(|t| t.into_owned()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_reader("ticker,quarter,eps\nAAPL,Q1,1.5\naapl,Q2,2.0\nMSFT,Q1,0.9\n".as_bytes())
            .unwrap()
    }

    fn all() -> PageRequest {
        PageRequest::new(1, 500, 500).unwrap()
    }

    fn tickers(page: &RowPage) -> Vec<String> {
        page.rows
            .iter()
            .map(|r| r.get("ticker").and_then(|c| c.as_text()).unwrap().into_owned())
            .collect()
    }

    #[test]
    fn test_ticker_filter_is_case_insensitive_substring() {
        let table = sample();
        let filter = RowFilter {
            ticker: Some("aapl".into()),
            ..Default::default()
        };
        let page = query(&table, &filter, all());
        assert_eq!(page.total, 2);
        assert_eq!(tickers(&page), vec!["AAPL", "aapl"]);

        let filter = RowFilter {
            ticker: Some("SF".into()),
            ..Default::default()
        };
        assert_eq!(tickers(&query(&table, &filter, all())), vec!["MSFT"]);
    }

    #[test]
    fn test_quarter_filter_is_exact() {
        let table = sample();
        let filter = RowFilter {
            quarter: Some("Q1".into()),
            ..Default::default()
        };
        assert_eq!(query(&table, &filter, all()).total, 2);

        let filter = RowFilter {
            quarter: Some("Q".into()),
            ..Default::default()
        };
        assert_eq!(query(&table, &filter, all()).total, 0);

        let filter = RowFilter {
            quarter: Some("q1".into()),
            ..Default::default()
        };
        assert_eq!(query(&table, &filter, all()).total, 0);
    }

    #[test]
    fn test_quarter_falls_back_to_q_column() {
        let table = Table::from_reader("ticker,q\nA,1\nB,2\nC,1\n".as_bytes()).unwrap();
        let filter = RowFilter {
            quarter: Some("1".into()),
            ..Default::default()
        };
        assert_eq!(tickers(&query(&table, &filter, all())), vec!["A", "C"]);
        assert_eq!(options(&table).quarters, vec!["1", "2"]);
    }

    #[test]
    fn test_filters_on_missing_columns_are_noops() {
        let table = Table::from_reader("name,score\nx,1\ny,2\n".as_bytes()).unwrap();
        let filter = RowFilter {
            ticker: Some("zzz".into()),
            quarter: Some("Q9".into()),
            ..Default::default()
        };
        assert_eq!(query(&table, &filter, all()).total, 2);
    }

    #[test]
    fn test_search_matches_any_column() {
        let table = sample();
        let filter = RowFilter {
            search: Some("0.9".into()),
            ..Default::default()
        };
        assert_eq!(tickers(&query(&table, &filter, all())), vec!["MSFT"]);

        let filter = RowFilter {
            search: Some("q2".into()),
            ..Default::default()
        };
        assert_eq!(tickers(&query(&table, &filter, all())), vec!["aapl"]);
    }

    #[test]
    fn test_filters_combine_with_and() {
        let table = sample();
        let filter = RowFilter {
            ticker: Some("aapl".into()),
            quarter: Some("Q1".into()),
            search: Some("1.5".into()),
        };
        assert_eq!(tickers(&query(&table, &filter, all())), vec!["AAPL"]);
    }

    #[test]
    fn test_empty_filter_values_are_ignored() {
        let table = sample();
        let filter = RowFilter {
            ticker: Some(String::new()),
            quarter: Some(String::new()),
            search: Some(String::new()),
        };
        assert_eq!(query(&table, &filter, all()).total, 3);
    }

    #[test]
    fn test_total_counts_before_slicing() {
        let table = sample();
        let page = query(&table, &RowFilter::default(), PageRequest::new(2, 2, 500).unwrap());
        assert_eq!(page.total, 3);
        assert_eq!(tickers(&page), vec!["MSFT"]);

        let past_end = query(&table, &RowFilter::default(), PageRequest::new(9, 2, 500).unwrap());
        assert_eq!(past_end.total, 3);
        assert!(past_end.rows.is_empty());
        assert_eq!(past_end.columns, vec!["ticker", "quarter", "eps"]);
    }

    #[test]
    fn test_records_serialize_in_column_order_with_sanitized_values() {
        let table = Table::from_reader("z,a,m\nx,inf,\n".as_bytes()).unwrap();
        let page = query(&table, &RowFilter::default(), all());
        let json = serde_json::to_string(&page.rows).unwrap();
        assert_eq!(json, r#"[{"z":"x","a":null,"m":null}]"#);
    }

    #[test]
    fn test_null_cells_never_match() {
        let table = Table::from_reader("ticker,note\n,hello\nABC,\n".as_bytes()).unwrap();
        let filter = RowFilter {
            search: Some("nan".into()),
            ..Default::default()
        };
        assert_eq!(query(&table, &filter, all()).total, 0);
    }

    #[test]
    fn test_options_are_sorted_and_distinct() {
        let table = Table::from_reader(
            "ticker,quarter\nMSFT,Q2\nAAPL,Q1\nMSFT,Q1\n,Q3\n".as_bytes(),
        )
        .unwrap();
        assert_eq!(
            options(&table),
            Facets {
                tickers: vec!["AAPL".into(), "MSFT".into()],
                quarters: vec!["Q1".into(), "Q2".into(), "Q3".into()],
            }
        );
    }

    #[test]
    fn test_options_without_columns_are_empty() {
        let table = Table::from_reader("name\nx\n".as_bytes()).unwrap();
        assert_eq!(options(&table), Facets::default());
    }
}
