mod expr;
mod uri_pattern;

pub use expr::{parse_expressions, split_clauses};
pub use uri_pattern::UriPattern;

use crate::error::ConfigError;
use crate::log::LogRecord;
use chrono::{DateTime, FixedOffset};

/// Comparison operator of a filter clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    pub fn holds<T: PartialOrd>(self, lhs: T, rhs: T) -> bool {
        match self {
            CompareOp::Eq => lhs == rhs,
            CompareOp::Ne => lhs != rhs,
            CompareOp::Gt => lhs > rhs,
            CompareOp::Ge => lhs >= rhs,
            CompareOp::Lt => lhs < rhs,
            CompareOp::Le => lhs <= rhs,
        }
    }
}

/// A single test over a record
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Status matches any of the listed codes/ranges
    Status(Vec<StatusFilter>),
    StatusCompare(CompareOp, u16),
    /// Method equals any of the listed methods (stored uppercase)
    Methods(Vec<String>),
    Uri(UriPattern),
    ResponseTime(CompareOp, f64),
    BodyBytes(CompareOp, u64),
    /// Records without a timestamp never satisfy a time predicate
    Time(CompareOp, DateTime<FixedOffset>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn negate(self) -> Self {
        match self {
            Predicate::Not(inner) => *inner,
            other => Predicate::Not(Box::new(other)),
        }
    }

    pub fn accept(&self, record: &LogRecord) -> bool {
        match self {
            Predicate::Status(filters) => filters.iter().any(|f| f.matches(record.status)),
            Predicate::StatusCompare(op, code) => op.holds(record.status, *code),
            Predicate::Methods(methods) => methods
                .iter()
                .any(|m| record.method.eq_ignore_ascii_case(m)),
            Predicate::Uri(pattern) => pattern.matches(&record.uri),
            Predicate::ResponseTime(op, secs) => op.holds(record.response_time, *secs),
            Predicate::BodyBytes(op, bytes) => op.holds(record.body_bytes, *bytes),
            Predicate::Time(op, bound) => record
                .timestamp
                .is_some_and(|ts| op.holds(ts, *bound)),
            Predicate::Not(inner) => !inner.accept(record),
        }
    }
}

/// Filter criteria for log records
///
/// All predicates are combined with AND logic - a record must satisfy
/// ALL of them to be aggregated. No predicates means every record passes.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    predicates: Vec<Predicate>,
}

impl FilterCriteria {
    /// Create a new FilterCriteria with default (no filtering)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Add a status filter; the record passes if any pattern matches
    pub fn with_status<S: AsRef<str>>(
        self,
        patterns: &[S],
    ) -> std::result::Result<Self, ConfigError> {
        let filters = patterns
            .iter()
            .map(|p| StatusFilter::parse(p.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(self.push(Predicate::Status(filters)))
    }

    /// Add a method filter (case-insensitive); the record passes if any matches
    pub fn with_methods<S: AsRef<str>>(self, methods: &[S]) -> Self {
        let methods = methods
            .iter()
            .map(|m| m.as_ref().to_uppercase())
            .collect();
        self.push(Predicate::Methods(methods))
    }

    pub fn with_uri(self, pattern: UriPattern) -> Self {
        self.push(Predicate::Uri(pattern))
    }

    /// Keep records with `from <= timestamp < to`; either bound may be open
    pub fn with_time_range(
        mut self,
        from: Option<DateTime<FixedOffset>>,
        to: Option<DateTime<FixedOffset>>,
    ) -> Self {
        if let Some(from) = from {
            self = self.push(Predicate::Time(CompareOp::Ge, from));
        }
        if let Some(to) = to {
            self = self.push(Predicate::Time(CompareOp::Lt, to));
        }
        self
    }

    /// Check if a record satisfies every predicate
    pub fn accept(&self, record: &LogRecord) -> bool {
        self.predicates.iter().all(|p| p.accept(record))
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

/// Status filter for HTTP status codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusFilter {
    /// Exact status code (e.g., 404)
    Exact(u16),
    /// Status code range (e.g., 200-299 for "2xx")
    Range(u16, u16),
}

impl StatusFilter {
    /// Parse a status filter pattern
    ///
    /// Supports:
    /// - Exact: "404", "200"
    /// - Range shorthand: "2xx", "4xx", "5xx"
    /// - Explicit range: "200-299", "500-599"
    pub fn parse(pattern: &str) -> std::result::Result<Self, ConfigError> {
        let pattern = pattern.trim();
        let invalid = || ConfigError::InvalidFilter(format!("invalid status pattern '{}'", pattern));

        // Handle "2xx", "4xx", etc.
        if pattern.len() == 3 && pattern.to_ascii_lowercase().ends_with("xx") {
            let digit = pattern
                .chars()
                .next()
                .and_then(|c| c.to_digit(10))
                .ok_or_else(invalid)?;
            let start = digit as u16 * 100;
            return Ok(StatusFilter::Range(start, start + 99));
        }

        // Handle explicit range "200-299"
        if let Some((start_str, end_str)) = pattern.split_once('-') {
            let start = start_str.trim().parse::<u16>().map_err(|_| invalid())?;
            let end = end_str.trim().parse::<u16>().map_err(|_| invalid())?;
            return Ok(StatusFilter::Range(start, end));
        }

        pattern
            .parse::<u16>()
            .map(StatusFilter::Exact)
            .map_err(|_| invalid())
    }

    /// Check if a status code matches this filter
    pub fn matches(&self, status: u16) -> bool {
        match self {
            StatusFilter::Exact(code) => status == *code,
            StatusFilter::Range(start, end) => status >= *start && status <= *end,
        }
    }
}
