//! Report queries, paging, and CSV export.
//!
//! Report rows are free-form (each report has its own columns), so they are kept as
//! JSON objects in backend column order.

use serde_json::{Map, Value};
use std::ops::Range;
use thiserror::Error;

use crate::time::{parse_date, DateError};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Columns never shown or exported.
const HIDDEN_COLUMNS: [&str; 2] = ["actions", "sr_no"];

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{0} report takes a {1}")]
    WrongPeriod(&'static str, &'static str),
    #[error("month must be 1-12, got {0}")]
    BadMonth(u32),
    #[error("start date {0} is after end date {1}")]
    InvertedRange(String, String),
    #[error(transparent)]
    Date(#[from] DateError),
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv export produced invalid utf-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("csv buffer: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Activity,
    Compliance,
    CustomerBehaviour,
    Travel,
}

impl ReportKind {
    pub const ALL: [ReportKind; 4] = [
        ReportKind::Activity,
        ReportKind::Compliance,
        ReportKind::CustomerBehaviour,
        ReportKind::Travel,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            ReportKind::Activity => "activity",
            ReportKind::Compliance => "compliance",
            ReportKind::CustomerBehaviour => "customer-behaviour",
            ReportKind::Travel => "travel",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReportKind::Activity => "Activity Report",
            ReportKind::Compliance => "Compliance Report",
            ReportKind::CustomerBehaviour => "Customer Behaviour Report",
            ReportKind::Travel => "Travel KM Report",
        }
    }

    /// Activity takes a date range; the monthly reports take month + year.
    pub fn uses_date_range(self) -> bool {
        matches!(self, ReportKind::Activity)
    }

    pub fn default_csv_name(self) -> String {
        format!("{}-report.csv", self.slug())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportPeriod {
    Range { start: String, end: String },
    Month { month: u32, year: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportQuery {
    pub kind: ReportKind,
    pub period: ReportPeriod,
    /// `None` asks for every MR (admin only; the backend scopes MRs itself).
    pub mr_id: Option<String>,
}

impl ReportQuery {
    pub fn new(kind: ReportKind, period: ReportPeriod, mr_id: Option<String>) -> Result<Self, ReportError> {
        match (&period, kind.uses_date_range()) {
            (ReportPeriod::Range { start, end }, true) => {
                if parse_date(start)? > parse_date(end)? {
                    return Err(ReportError::InvertedRange(start.clone(), end.clone()));
                }
            }
            (ReportPeriod::Month { month, .. }, false) => {
                if !(1..=12).contains(month) {
                    return Err(ReportError::BadMonth(*month));
                }
            }
            (_, true) => return Err(ReportError::WrongPeriod(kind.label(), "date range")),
            (_, false) => return Err(ReportError::WrongPeriod(kind.label(), "month and year")),
        }
        Ok(Self { kind, period, mr_id })
    }

    pub fn path(&self) -> String {
        format!("/reports/{}", self.kind.slug())
    }

    /// Query string pairs. `mr_id` is always present, empty meaning "all".
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("mr_id", self.mr_id.clone().unwrap_or_default())];
        match &self.period {
            ReportPeriod::Range { start, end } => {
                pairs.push(("start_date", start.clone()));
                pairs.push(("end_date", end.clone()));
            }
            ReportPeriod::Month { month, year } => {
                pairs.push(("month", month.to_string()));
                pairs.push(("year", year.to_string()));
            }
        }
        pairs
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportTable {
    pub rows: Vec<Map<String, Value>>,
    /// Activity report headline totals.
    pub total_activities: Option<u64>,
    pub completed_activities: Option<u64>,
}

/// Row range shown on 1-based `page`: `(page-1)*size .. page*size`, clamped.
pub fn page_bounds(page: usize, page_size: usize, len: usize) -> Range<usize> {
    let page = page.max(1);
    let start = (page - 1).saturating_mul(page_size).min(len);
    let end = start.saturating_add(page_size).min(len);
    start..end
}

pub fn page_count(page_size: usize, len: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}

fn cell_text(v: Option<&Value>) -> String {
    match v {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

impl ReportTable {
    /// Accepts either `{"data": [...], ...totals}` or a bare array of rows.
    pub fn from_response(body: Value) -> Self {
        let (rows, totals) = match body {
            Value::Array(rows) => (rows, None),
            Value::Object(mut obj) => {
                let rows = match obj.remove("data") {
                    Some(Value::Array(rows)) => rows,
                    _ => Vec::new(),
                };
                (rows, Some(obj))
            }
            _ => (Vec::new(), None),
        };

        let rows = rows
            .into_iter()
            .filter_map(|r| match r {
                Value::Object(m) => Some(m),
                _ => None,
            })
            .collect();

        let total = |key: &str| totals.as_ref().and_then(|t| t.get(key)).and_then(Value::as_u64);
        Self {
            rows,
            total_activities: total("total_activities"),
            completed_activities: total("completed_activities"),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Visible columns, taken from the first row.
    pub fn columns(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|r| {
                r.keys()
                    .filter(|k| !HIDDEN_COLUMNS.contains(&k.to_ascii_lowercase().as_str()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn page(&self, page: usize, page_size: usize) -> &[Map<String, Value>] {
        &self.rows[page_bounds(page, page_size, self.rows.len())]
    }

    pub fn page_count(&self, page_size: usize) -> usize {
        page_count(page_size, self.rows.len())
    }

    /// Text cells for one row in [`columns`](Self::columns) order.
    pub fn cells(&self, row: &Map<String, Value>, columns: &[String]) -> Vec<String> {
        columns.iter().map(|c| cell_text(row.get(c))).collect()
    }

    /// Every row (not just one page), every field quoted.
    pub fn to_csv(&self) -> Result<String, ReportError> {
        let columns = self.columns();
        let mut w = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .from_writer(Vec::new());
        if columns.is_empty() {
            return Ok(String::new());
        }
        w.write_record(&columns)?;
        for row in &self.rows {
            w.write_record(self.cells(row, &columns))?;
        }
        let bytes = w
            .into_inner()
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        Ok(String::from_utf8(bytes)?)
    }
}
