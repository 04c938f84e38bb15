use crate::error::ConfigError;
use crate::log::{LabelSchema, ParserKind};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_LIMIT: usize = 5000;
pub const DEFAULT_PAGINATION_LIMIT: usize = 100;
pub const DEFAULT_PERCENTILES: [i64; 3] = [90, 95, 99];

/// Everything one profiling run needs. Immutable once the run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Log file to read; `-` or none means stdin
    pub file: Option<PathBuf>,
    pub parser: ParserKind,
    pub sort: String,
    pub reverse: bool,
    pub query_string: bool,
    pub qs_ignore_values: bool,
    pub decode_uri: bool,
    pub format: String,
    /// Maximum number of distinct endpoints before the run is aborted
    pub limit: usize,
    pub location: String,
    /// Column selection: `all` or a comma-separated list
    pub columns: String,
    /// Report destination; none means stdout
    pub destination: Option<PathBuf>,
    pub no_headers: bool,
    pub show_footers: bool,
    pub matching_groups: Vec<String>,
    pub filters: Option<String>,
    pub percentiles: Vec<i64>,
    /// Maximum rows rendered; 0 renders every row
    pub pagination_limit: usize,
    pub group_by_method: bool,
    /// Abort on the first malformed line instead of skipping it
    pub strict: bool,
    pub labels: LabelSchema,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            file: None,
            parser: ParserKind::default(),
            sort: "count".to_string(),
            reverse: false,
            query_string: false,
            qs_ignore_values: false,
            decode_uri: false,
            format: "table".to_string(),
            limit: DEFAULT_LIMIT,
            location: "Local".to_string(),
            columns: "all".to_string(),
            destination: None,
            no_headers: false,
            show_footers: false,
            matching_groups: Vec::new(),
            filters: None,
            percentiles: DEFAULT_PERCENTILES.to_vec(),
            pagination_limit: DEFAULT_PAGINATION_LIMIT,
            group_by_method: true,
            strict: false,
            labels: LabelSchema::default(),
        }
    }
}

impl RunConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load a YAML config file; missing keys take their defaults
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        tracing::debug!("Reading config file from: {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|source| Error::SourceUnavailable {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Requested percentile ranks, validated and deduplicated in order
    pub fn percentile_ranks(&self) -> std::result::Result<Vec<u8>, ConfigError> {
        let mut ranks = Vec::with_capacity(self.percentiles.len());
        for &p in &self.percentiles {
            let rank = u8::try_from(p)
                .ok()
                .filter(|r| *r <= 100)
                .ok_or_else(|| ConfigError::InvalidPercentile(p.to_string()))?;
            if !ranks.contains(&rank) {
                ranks.push(rank);
            }
        }
        Ok(ranks)
    }
}

/// Split a comma-separated option into trimmed, non-empty items.
///
/// Matching groups are split this way too, so a regex that needs a comma
/// (`\d{1,3}`) must be given through a config file list instead.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Parse a comma-separated percentile list such as `50,90,99`
pub fn parse_percentiles(value: &str) -> std::result::Result<Vec<i64>, ConfigError> {
    split_list(value)
        .into_iter()
        .map(|item| {
            item.parse::<i64>()
                .map_err(|_| ConfigError::InvalidPercentile(item.clone()))
        })
        .collect()
}
