//! In-memory table snapshots parsed from delimited text.
//!
//! Every column is typed by inference over its non-missing values, so a cell
//! is one of [`Cell`]'s variants rather than an untyped string.

use std::borrow::Cow;
use std::collections::HashSet;
use std::io;

use serde::{Serialize, Serializer};

/// Tokens read as a missing value regardless of column type.
const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-NaN", "-nan", "<NA>", "N/A", "NA", "NULL", "NaN", "None",
    "n/a", "nan", "null",
];

/// A single dynamically-typed table value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Cell {
    /// The string form filters compare against. `None` for missing values.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Cell::Null => None,
            Cell::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
            Cell::Int(i) => Some(Cow::Owned(i.to_string())),
            Cell::Float(f) => Some(Cow::Owned(float_text(*f))),
            Cell::String(s) => Some(Cow::Borrowed(s.as_str())),
        }
    }
}

fn float_text(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f == f64::INFINITY {
        "inf".to_string()
    } else if f == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        // Debug keeps the fractional part: 2.0 renders as "2.0", not "2".
        format!("{f:?}")
    }
}

/// Non-finite floats serialize as `null` so the output stays strict JSON.
impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Null => serializer.serialize_none(),
            Cell::Bool(b) => serializer.serialize_bool(*b),
            Cell::Int(i) => serializer.serialize_i64(*i),
            Cell::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Cell::Float(_) => serializer.serialize_none(),
            Cell::String(s) => serializer.serialize_str(s),
        }
    }
}

/// Inferred storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Bool,
    Text,
}

fn infer_kind<'a>(values: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut kind: Option<ColumnKind> = None;

    for value in values.filter(|v| !is_missing(v)).map(str::trim) {
        let next = match kind {
            None | Some(ColumnKind::Int) if value.parse::<i64>().is_ok() => ColumnKind::Int,
            None | Some(ColumnKind::Int) | Some(ColumnKind::Float)
                if value.parse::<f64>().is_ok() =>
            {
                ColumnKind::Float
            }
            None | Some(ColumnKind::Bool) if parse_bool(value).is_some() => ColumnKind::Bool,
            _ => return ColumnKind::Text,
        };
        kind = Some(next);
    }

    kind.unwrap_or(ColumnKind::Text)
}

fn is_missing(value: &str) -> bool {
    MISSING_TOKENS.contains(&value)
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn to_cell(value: &str, kind: ColumnKind) -> Cell {
    if is_missing(value) {
        return Cell::Null;
    }
    match kind {
        ColumnKind::Int => value.trim().parse().map(Cell::Int).unwrap_or(Cell::Null),
        ColumnKind::Float => value.trim().parse().map(Cell::Float).unwrap_or(Cell::Null),
        ColumnKind::Bool => parse_bool(value.trim()).map(Cell::Bool).unwrap_or(Cell::Null),
        ColumnKind::Text => Cell::String(value.to_string()),
    }
}

/// An immutable table: ordered column names and rows aligned to them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Parse comma-delimited text with a header row.
    ///
    /// Rows shorter than the header are padded with nulls. Rows longer than
    /// the header and invalid UTF-8 are errors.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, csv::Error> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let columns = dedupe_headers(rdr.headers()?.iter());

        let mut raw: Vec<csv::StringRecord> = Vec::new();
        for record in rdr.records() {
            let record = record?;
            if record.len() > columns.len() {
                return Err(too_many_fields(&record, columns.len()));
            }
            raw.push(record);
        }

        let kinds: Vec<ColumnKind> = (0..columns.len())
            .map(|i| infer_kind(raw.iter().map(|r| r.get(i).unwrap_or(""))))
            .collect();

        let rows = raw
            .iter()
            .map(|record| {
                kinds
                    .iter()
                    .enumerate()
                    .map(|(i, kind)| to_cell(record.get(i).unwrap_or(""), *kind))
                    .collect()
            })
            .collect();

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the column named `name`, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

fn too_many_fields(record: &csv::StringRecord, width: usize) -> csv::Error {
    let line = record.position().map_or(0, |p| p.line());
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("line {line}: expected {width} fields, saw {}", record.len()),
    )
    .into()
}

/// Repeated header names get a `.N` suffix so column names stay unique.
fn dedupe_headers<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for header in headers {
        let mut name = header.to_string();
        let mut n = 1;
        while !seen.insert(name.clone()) {
            name = format!("{header}.{n}");
            n += 1;
        }
        columns.push(name);
    }
    columns
}
