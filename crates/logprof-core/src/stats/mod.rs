mod accumulator;
mod aggregator;
mod percentile;
mod sort;

pub use accumulator::{StatAccumulator, Summary};
pub use aggregator::StatsAggregator;
pub use percentile::{PercentileSet, nearest_rank, nearest_rank_index};
pub use sort::{SortKey, sort_rows};

use serde::Serialize;
use std::fmt;

/// Key of one aggregated endpoint: the normalized URI, plus the method
/// when grouping by method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EndpointKey {
    pub uri: String,
    pub method: Option<String>,
}

impl EndpointKey {
    pub fn new(uri: impl Into<String>, method: Option<String>) -> Self {
        Self {
            uri: uri.into(),
            method,
        }
    }
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.method {
            Some(method) => write!(f, "{} {}", method, self.uri),
            None => f.write_str(&self.uri),
        }
    }
}

/// Finalized, sortable statistics for one endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub uri: String,
    pub method: Option<String>,
    pub count: u64,
    /// Requests per status class, 1xx through 5xx
    pub status_classes: [u64; 5],
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub avg: f64,
    pub stddev: f64,
    pub percentiles: PercentileSet,
    pub min_body: u64,
    pub max_body: u64,
    pub sum_body: u64,
    pub avg_body: f64,
}

impl ReportRow {
    pub fn from_summary(key: &EndpointKey, summary: Summary) -> Self {
        Self {
            uri: key.uri.clone(),
            method: key.method.clone(),
            count: summary.count,
            status_classes: summary.status_classes,
            min: summary.min,
            max: summary.max,
            sum: summary.sum,
            avg: summary.avg,
            stddev: summary.stddev,
            percentiles: summary.percentiles,
            min_body: summary.min_body,
            max_body: summary.max_body,
            sum_body: summary.sum_body,
            avg_body: summary.avg_body,
        }
    }
}
