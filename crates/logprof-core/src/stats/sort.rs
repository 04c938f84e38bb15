use super::ReportRow;
use crate::error::ConfigError;
use std::cmp::Ordering;
use std::fmt;

/// Column a report is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Count,
    Uri,
    Method,
    Sum,
    Avg,
    Min,
    Max,
    Stddev,
    Percentile(u8),
    SumBody,
    AvgBody,
    MinBody,
    MaxBody,
}

impl SortKey {
    /// Parse a sort key name. Percentile keys (`p90`) are only valid when
    /// that rank is among the requested percentiles.
    pub fn parse(name: &str, percentiles: &[u8]) -> std::result::Result<Self, ConfigError> {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
        let key = match normalized.as_str() {
            "count" => SortKey::Count,
            "uri" => SortKey::Uri,
            "method" => SortKey::Method,
            "sum" | "total" => SortKey::Sum,
            "avg" | "mean" => SortKey::Avg,
            "min" => SortKey::Min,
            "max" => SortKey::Max,
            "stddev" => SortKey::Stddev,
            "sum-body" | "total-body" => SortKey::SumBody,
            "avg-body" | "mean-body" => SortKey::AvgBody,
            "min-body" => SortKey::MinBody,
            "max-body" => SortKey::MaxBody,
            other => {
                let rank = other
                    .strip_prefix('p')
                    .filter(|r| !r.is_empty() && r.bytes().all(|b| b.is_ascii_digit()))
                    .filter(|r| r.len() == 1 || !r.starts_with('0'))
                    .and_then(|r| r.parse::<u8>().ok())
                    .filter(|r| percentiles.contains(r))
                    .ok_or_else(|| ConfigError::InvalidSortKey(name.to_string()))?;
                SortKey::Percentile(rank)
            }
        };
        Ok(key)
    }

    fn compare(self, a: &ReportRow, b: &ReportRow) -> Ordering {
        match self {
            SortKey::Count => a.count.cmp(&b.count),
            SortKey::Uri => a.uri.cmp(&b.uri),
            SortKey::Method => a.method.cmp(&b.method),
            SortKey::Sum => a.sum.total_cmp(&b.sum),
            SortKey::Avg => a.avg.total_cmp(&b.avg),
            SortKey::Min => a.min.total_cmp(&b.min),
            SortKey::Max => a.max.total_cmp(&b.max),
            SortKey::Stddev => a.stddev.total_cmp(&b.stddev),
            SortKey::Percentile(rank) => {
                let lhs = a.percentiles.get(rank).unwrap_or(0.0);
                let rhs = b.percentiles.get(rank).unwrap_or(0.0);
                lhs.total_cmp(&rhs)
            }
            SortKey::SumBody => a.sum_body.cmp(&b.sum_body),
            SortKey::AvgBody => a.avg_body.total_cmp(&b.avg_body),
            SortKey::MinBody => a.min_body.cmp(&b.min_body),
            SortKey::MaxBody => a.max_body.cmp(&b.max_body),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Count => f.write_str("count"),
            SortKey::Uri => f.write_str("uri"),
            SortKey::Method => f.write_str("method"),
            SortKey::Sum => f.write_str("sum"),
            SortKey::Avg => f.write_str("avg"),
            SortKey::Min => f.write_str("min"),
            SortKey::Max => f.write_str("max"),
            SortKey::Stddev => f.write_str("stddev"),
            SortKey::Percentile(rank) => write!(f, "p{}", rank),
            SortKey::SumBody => f.write_str("sum-body"),
            SortKey::AvgBody => f.write_str("avg-body"),
            SortKey::MinBody => f.write_str("min-body"),
            SortKey::MaxBody => f.write_str("max-body"),
        }
    }
}

/// Stable sort: rows with equal keys keep their incoming (first-seen)
/// order in both directions.
pub fn sort_rows(rows: &mut [ReportRow], key: SortKey, reverse: bool) {
    rows.sort_by(|a, b| {
        let ordering = key.compare(a, b);
        if reverse { ordering.reverse() } else { ordering }
    });
}
