use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use url::form_urlencoded;

/// One parsed access log line.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub uri: String,
    pub method: String,
    pub status: u16,
    /// Response time in seconds
    pub response_time: f64,
    pub body_bytes: u64,
    pub timestamp: Option<DateTime<FixedOffset>>,
}

/// A line that does not conform to the label schema. Callers skip it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    pub reason: String,
}

impl MalformedLine {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for MalformedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Names of the fields in a log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelSchema {
    pub uri: String,
    pub method: String,
    pub time: String,
    /// Upstream (application) response time; preferred when present
    pub apptime: String,
    /// Total request time; used when `apptime` is missing
    pub reqtime: String,
    pub size: String,
    pub status: String,
}

impl Default for LabelSchema {
    fn default() -> Self {
        Self {
            uri: "uri".to_string(),
            method: "method".to_string(),
            time: "time".to_string(),
            apptime: "apptime".to_string(),
            reqtime: "reqtime".to_string(),
            size: "size".to_string(),
            status: "status".to_string(),
        }
    }
}

/// How query strings are treated before a URI reaches the matcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryStringMode {
    #[default]
    Strip,
    Keep,
    /// Keep the keys (sorted, deduplicated) and replace every value with `xxx`
    IgnoreValues,
}

impl QueryStringMode {
    pub fn from_flags(query_string: bool, ignore_values: bool) -> Self {
        match (query_string, ignore_values) {
            (false, _) => QueryStringMode::Strip,
            (true, false) => QueryStringMode::Keep,
            (true, true) => QueryStringMode::IgnoreValues,
        }
    }

    pub fn apply(&self, raw: &str) -> String {
        let Some((path, query)) = raw.split_once('?') else {
            return raw.to_string();
        };

        match self {
            QueryStringMode::Strip => path.to_string(),
            QueryStringMode::Keep => raw.to_string(),
            QueryStringMode::IgnoreValues => {
                let mut keys: Vec<String> = form_urlencoded::parse(query.as_bytes())
                    .map(|(key, _)| key.into_owned())
                    .collect();
                keys.sort();
                keys.dedup();

                if keys.is_empty() {
                    return path.to_string();
                }

                let query = form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(keys.iter().map(|key| (key.as_str(), "xxx")))
                    .finish();
                format!("{}?{}", path, query)
            }
        }
    }
}

/// Parse a log timestamp.
///
/// Accepts RFC 3339, the common log format (`10/Oct/2000:13:55:36 -0700`,
/// optionally bracketed) and epoch seconds.
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim().trim_start_matches('[').trim_end_matches(']');

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%d/%b/%Y:%H:%M:%S %z") {
        return Some(dt);
    }

    let secs = value.parse::<f64>().ok().filter(|s| s.is_finite())?;
    let nanos = (secs.fract() * 1_000_000_000.0).round() as u32;
    DateTime::<Utc>::from_timestamp(secs.trunc() as i64, nanos).map(|dt| dt.fixed_offset())
}

/// Build a record from a label lookup shared by every parser.
pub(crate) fn assemble<'a, F>(
    labels: &LabelSchema,
    query: QueryStringMode,
    field: F,
) -> std::result::Result<LogRecord, MalformedLine>
where
    F: Fn(&str) -> Option<Cow<'a, str>>,
{
    let uri = field(labels.uri.as_str())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| MalformedLine::new(format!("missing '{}' field", labels.uri)))?;

    let method = field(labels.method.as_str())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| MalformedLine::new(format!("missing '{}' field", labels.method)))?;

    let status_raw = field(labels.status.as_str())
        .ok_or_else(|| MalformedLine::new(format!("missing '{}' field", labels.status)))?;
    let status = status_raw.trim().parse::<u16>().map_err(|_| {
        MalformedLine::new(format!("invalid status '{}'", status_raw))
    })?;

    let (time_label, time_raw) = match field(labels.apptime.as_str()) {
        Some(v) if v != "-" && !v.is_empty() => (&labels.apptime, v),
        _ => {
            let v = field(labels.reqtime.as_str()).ok_or_else(|| {
                MalformedLine::new(format!(
                    "missing '{}' or '{}' field",
                    labels.apptime, labels.reqtime
                ))
            })?;
            (&labels.reqtime, v)
        }
    };
    let response_time = time_raw
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|t| t.is_finite() && *t >= 0.0)
        .ok_or_else(|| MalformedLine::new(format!("invalid {} '{}'", time_label, time_raw)))?;

    let body_bytes = match field(labels.size.as_str()) {
        None => 0,
        Some(v) if v == "-" || v.is_empty() => 0,
        Some(v) => v
            .trim()
            .parse::<u64>()
            .map_err(|_| MalformedLine::new(format!("invalid size '{}'", v)))?,
    };

    let timestamp = field(labels.time.as_str()).and_then(|v| parse_timestamp(&v));

    Ok(LogRecord {
        uri: query.apply(&uri),
        method: method.into_owned(),
        status,
        response_time,
        body_bytes,
        timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_query_string_modes() {
        let raw = "/search?q=rust&page=2&q=go";
        assert_eq!(QueryStringMode::Strip.apply(raw), "/search");
        assert_eq!(QueryStringMode::Keep.apply(raw), raw);
        assert_eq!(
            QueryStringMode::IgnoreValues.apply(raw),
            "/search?page=xxx&q=xxx"
        );
        assert_eq!(QueryStringMode::IgnoreValues.apply("/plain"), "/plain");
    }

    #[test]
    fn test_query_string_mode_from_flags() {
        assert_eq!(QueryStringMode::from_flags(false, true), QueryStringMode::Strip);
        assert_eq!(QueryStringMode::from_flags(true, false), QueryStringMode::Keep);
        assert_eq!(
            QueryStringMode::from_flags(true, true),
            QueryStringMode::IgnoreValues
        );
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let rfc = parse_timestamp("2024-03-01T12:30:00+09:00").unwrap();
        assert_eq!(rfc.hour(), 12);

        let clf = parse_timestamp("[10/Oct/2000:13:55:36 -0700]").unwrap();
        assert_eq!(clf.minute(), 55);

        let epoch = parse_timestamp("1700000000.5").unwrap();
        assert_eq!(epoch.timestamp(), 1_700_000_000);

        assert!(parse_timestamp("yesterday").is_none());
    }
}
