//! Filter expressions: comma-separated `<field> <op> <value>` clauses.
//!
//! ```text
//! status == 2xx, method == GET|POST, uri =~ "^/api/", restime >= 0.5
//! ```

use super::{CompareOp, FilterCriteria, Predicate, StatusFilter, UriPattern};
use crate::error::ConfigError;
use crate::location::Location;
use regex::Regex;
use std::sync::LazyLock;

static CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z_]+)\s*(==|!=|>=|<=|=~|!~|>|<|\scontains\s)\s*(.*?)\s*$")
        .expect("clause pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Compare(CompareOp),
    Matches,
    NotMatches,
    Contains,
}

impl Operator {
    fn parse(op: &str) -> Option<Self> {
        Some(match op.trim() {
            "==" => Operator::Compare(CompareOp::Eq),
            "!=" => Operator::Compare(CompareOp::Ne),
            ">" => Operator::Compare(CompareOp::Gt),
            ">=" => Operator::Compare(CompareOp::Ge),
            "<" => Operator::Compare(CompareOp::Lt),
            "<=" => Operator::Compare(CompareOp::Le),
            "=~" => Operator::Matches,
            "!~" => Operator::NotMatches,
            "contains" => Operator::Contains,
            _ => return None,
        })
    }
}

/// Split on commas that are not inside double quotes
pub fn split_clauses(input: &str) -> Vec<String> {
    let mut clauses = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in input.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                current.push(c);
            }
            ',' if !quoted => clauses.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    clauses.push(current);

    clauses
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

/// Parse a filter expression string into criteria
pub fn parse_expressions(
    input: &str,
    location: &Location,
) -> std::result::Result<FilterCriteria, ConfigError> {
    let mut criteria = FilterCriteria::new();
    for clause in split_clauses(input) {
        let predicate = parse_clause(&clause, location)?;
        tracing::debug!("Filter clause '{}' -> {:?}", clause, predicate);
        criteria = criteria.push(predicate);
    }
    Ok(criteria)
}

fn parse_clause(
    clause: &str,
    location: &Location,
) -> std::result::Result<Predicate, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidFilter(format!("'{}': {}", clause, reason));

    let caps = CLAUSE
        .captures(clause)
        .ok_or_else(|| invalid("expected <field> <operator> <value>"))?;
    let field = caps[1].to_ascii_lowercase();
    let op = Operator::parse(&caps[2]).ok_or_else(|| invalid("unknown operator"))?;
    let value = unquote(&caps[3]);
    if value.is_empty() {
        return Err(invalid("missing value"));
    }

    match (field.as_str(), op) {
        ("status", Operator::Compare(cmp @ (CompareOp::Eq | CompareOp::Ne))) => {
            let filters = value
                .split('|')
                .map(StatusFilter::parse)
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(negate_if(Predicate::Status(filters), cmp == CompareOp::Ne))
        }
        ("status", Operator::Compare(cmp)) => {
            let code = value
                .parse::<u16>()
                .map_err(|_| invalid("status must be an integer"))?;
            Ok(Predicate::StatusCompare(cmp, code))
        }
        ("method", Operator::Compare(cmp @ (CompareOp::Eq | CompareOp::Ne))) => {
            let methods = value.split('|').map(|m| m.trim().to_uppercase()).collect();
            Ok(negate_if(Predicate::Methods(methods), cmp == CompareOp::Ne))
        }
        ("uri", Operator::Compare(cmp @ (CompareOp::Eq | CompareOp::Ne))) => {
            let pattern = UriPattern::parse(value)?;
            Ok(negate_if(Predicate::Uri(pattern), cmp == CompareOp::Ne))
        }
        ("uri", Operator::Matches) => Ok(Predicate::Uri(UriPattern::regex(value)?)),
        ("uri", Operator::NotMatches) => Ok(Predicate::Uri(UriPattern::regex(value)?).negate()),
        ("uri", Operator::Contains) => Ok(Predicate::Uri(UriPattern::Contains(value.to_string()))),
        ("restime" | "response_time" | "reqtime" | "apptime", Operator::Compare(cmp)) => {
            let secs = value
                .parse::<f64>()
                .ok()
                .filter(|s| s.is_finite())
                .ok_or_else(|| invalid("response time must be a number of seconds"))?;
            Ok(Predicate::ResponseTime(cmp, secs))
        }
        ("size" | "body" | "body_bytes", Operator::Compare(cmp)) => {
            let bytes = value
                .parse::<u64>()
                .map_err(|_| invalid("size must be a non-negative integer"))?;
            Ok(Predicate::BodyBytes(cmp, bytes))
        }
        ("time", Operator::Compare(cmp)) => {
            let bound = location
                .parse_instant(value)
                .ok_or_else(|| invalid("unrecognized timestamp"))?;
            Ok(Predicate::Time(cmp, bound))
        }
        ("status" | "method" | "uri" | "restime" | "response_time" | "reqtime" | "apptime"
        | "size" | "body" | "body_bytes" | "time", _) => {
            Err(invalid("operator not supported for this field"))
        }
        _ => Err(invalid("unknown field")),
    }
}

fn negate_if(predicate: Predicate, negate: bool) -> Predicate {
    if negate { predicate.negate() } else { predicate }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::{LogRecord, parse_timestamp};

    fn record(uri: &str, method: &str, status: u16, response_time: f64) -> LogRecord {
        LogRecord {
            uri: uri.to_string(),
            method: method.to_string(),
            status,
            response_time,
            body_bytes: 2048,
            timestamp: parse_timestamp("2024-03-01T12:00:00+00:00"),
        }
    }

    fn parse(input: &str) -> FilterCriteria {
        parse_expressions(input, &Location::Utc).unwrap()
    }

    #[test]
    fn test_split_respects_quotes() {
        let clauses = split_clauses(r#"status == 200, uri =~ "^/a/\d{1,3}$" ,, method == GET"#);
        assert_eq!(
            clauses,
            vec![
                "status == 200".to_string(),
                r#"uri =~ "^/a/\d{1,3}$""#.to_string(),
                "method == GET".to_string(),
            ]
        );
    }

    #[test]
    fn test_empty_expression_accepts_all() {
        let criteria = parse("  ");
        assert!(criteria.is_empty());
    }

    #[test]
    fn test_status_clauses() {
        let criteria = parse("status == 200");
        assert!(criteria.accept(&record("/", "GET", 200, 0.1)));
        assert!(!criteria.accept(&record("/", "GET", 500, 0.1)));

        let criteria = parse("status != 4xx|5xx");
        assert!(criteria.accept(&record("/", "GET", 302, 0.1)));
        assert!(!criteria.accept(&record("/", "GET", 404, 0.1)));

        let criteria = parse("status >= 500");
        assert!(criteria.accept(&record("/", "GET", 503, 0.1)));
        assert!(!criteria.accept(&record("/", "GET", 499, 0.1)));
    }

    #[test]
    fn test_method_and_uri_clauses() {
        let criteria = parse(r#"method == get|post, uri =~ "^/api/", uri != /api/health"#);
        assert!(criteria.accept(&record("/api/users", "GET", 200, 0.1)));
        assert!(criteria.accept(&record("/api/users", "POST", 200, 0.1)));
        assert!(!criteria.accept(&record("/api/users", "DELETE", 200, 0.1)));
        assert!(!criteria.accept(&record("/api/health", "GET", 200, 0.1)));
        assert!(!criteria.accept(&record("/web/users", "GET", 200, 0.1)));

        let criteria = parse("uri contains login");
        assert!(criteria.accept(&record("/auth/login", "POST", 200, 0.1)));
        assert!(!criteria.accept(&record("/auth/logout", "POST", 200, 0.1)));
    }

    #[test]
    fn test_numeric_and_time_clauses() {
        let criteria = parse("restime > 0.5, size <= 4096");
        assert!(criteria.accept(&record("/", "GET", 200, 0.75)));
        assert!(!criteria.accept(&record("/", "GET", 200, 0.25)));

        let criteria = parse("time >= 2024-03-01T11:00:00, time < 2024-03-01T13:00:00");
        assert!(criteria.accept(&record("/", "GET", 200, 0.1)));

        let criteria = parse("time > 2024-03-02");
        assert!(!criteria.accept(&record("/", "GET", 200, 0.1)));
    }

    #[test]
    fn test_invalid_clauses() {
        for input in [
            "status",
            "status == ",
            "status =~ 200",
            "method > GET",
            "host == example.com",
            "restime > slow",
            "time > someday",
            "uri =~ (",
        ] {
            let err = parse_expressions(input, &Location::Utc).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidFilter(_)),
                "{} should be rejected",
                input
            );
        }
    }
}
