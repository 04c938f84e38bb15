use crate::error::ConfigError;
use crate::stats::ReportRow;
use percent_encoding::percent_decode_str;
use serde_json::Value;

/// One output column. Columns are always emitted in declaration order:
/// count, 1xx..5xx, method, uri, min, max, sum, avg, p<N>..., stddev,
/// min_body, max_body, sum_body, avg_body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Count,
    /// Status class 1 through 5
    Status(u8),
    Method,
    Uri,
    Min,
    Max,
    Sum,
    Avg,
    Percentile(u8),
    Stddev,
    MinBody,
    MaxBody,
    SumBody,
    AvgBody,
}

/// Selectable column names, in output order. `p` stands for every
/// requested percentile.
const COLUMN_NAMES: [&str; 18] = [
    "count", "1xx", "2xx", "3xx", "4xx", "5xx", "method", "uri", "min", "max", "sum", "avg", "p",
    "stddev", "min_body", "max_body", "sum_body", "avg_body",
];

/// Resolve a column selection (`all`, or a comma-separated list of names)
pub fn parse_columns(
    selection: &str,
    percentiles: &[u8],
) -> std::result::Result<Vec<Column>, ConfigError> {
    let selection = selection.trim();
    let wanted: Vec<String> = if selection.is_empty() || selection.eq_ignore_ascii_case("all") {
        COLUMN_NAMES.iter().map(|n| n.to_string()).collect()
    } else {
        selection
            .split(',')
            .map(|n| n.trim().to_ascii_lowercase().replace('-', "_"))
            .filter(|n| !n.is_empty())
            .collect()
    };

    if wanted.is_empty() {
        return Err(ConfigError::InvalidColumn(selection.to_string()));
    }
    if let Some(unknown) = wanted.iter().find(|n| !COLUMN_NAMES.contains(&n.as_str())) {
        return Err(ConfigError::InvalidColumn(unknown.clone()));
    }

    let mut columns = Vec::new();
    for name in COLUMN_NAMES {
        if !wanted.iter().any(|w| w == name) {
            continue;
        }
        match name {
            "count" => columns.push(Column::Count),
            "1xx" => columns.push(Column::Status(1)),
            "2xx" => columns.push(Column::Status(2)),
            "3xx" => columns.push(Column::Status(3)),
            "4xx" => columns.push(Column::Status(4)),
            "5xx" => columns.push(Column::Status(5)),
            "method" => columns.push(Column::Method),
            "uri" => columns.push(Column::Uri),
            "min" => columns.push(Column::Min),
            "max" => columns.push(Column::Max),
            "sum" => columns.push(Column::Sum),
            "avg" => columns.push(Column::Avg),
            "p" => columns.extend(percentiles.iter().map(|&r| Column::Percentile(r))),
            "stddev" => columns.push(Column::Stddev),
            "min_body" => columns.push(Column::MinBody),
            "max_body" => columns.push(Column::MaxBody),
            "sum_body" => columns.push(Column::SumBody),
            _ => columns.push(Column::AvgBody),
        }
    }
    Ok(columns)
}

/// A rendered value before format-specific encoding
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Int(u64),
    Float(f64),
    Text(String),
    Blank,
}

impl Cell {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Cell::Int(_) | Cell::Float(_))
    }

    /// Text form: floats with three decimals
    pub fn text(&self) -> String {
        match self {
            Cell::Int(n) => n.to_string(),
            Cell::Float(f) => format!("{:.3}", f),
            Cell::Text(s) => s.clone(),
            Cell::Blank => String::new(),
        }
    }

    pub fn json(&self) -> Value {
        match self {
            Cell::Int(n) => Value::from(*n),
            Cell::Float(f) => Value::from(*f),
            Cell::Text(s) => Value::from(s.as_str()),
            Cell::Blank => Value::Null,
        }
    }
}

impl Column {
    /// Header used by the table and markdown formats
    pub fn title(&self) -> String {
        match self {
            Column::Count => "COUNT".to_string(),
            Column::Status(class) => format!("{}XX", class),
            Column::Method => "METHOD".to_string(),
            Column::Uri => "URI".to_string(),
            Column::Min => "MIN".to_string(),
            Column::Max => "MAX".to_string(),
            Column::Sum => "SUM".to_string(),
            Column::Avg => "AVG".to_string(),
            Column::Percentile(rank) => format!("P{}", rank),
            Column::Stddev => "STDDEV".to_string(),
            Column::MinBody => "MIN(BODY)".to_string(),
            Column::MaxBody => "MAX(BODY)".to_string(),
            Column::SumBody => "SUM(BODY)".to_string(),
            Column::AvgBody => "AVG(BODY)".to_string(),
        }
    }

    /// Field name used by the CSV, TSV and JSON formats
    pub fn key(&self) -> String {
        match self {
            Column::Status(class) => format!("{}xx", class),
            Column::Percentile(rank) => format!("p{}", rank),
            Column::MinBody => "min_body".to_string(),
            Column::MaxBody => "max_body".to_string(),
            Column::SumBody => "sum_body".to_string(),
            Column::AvgBody => "avg_body".to_string(),
            other => other.title().to_ascii_lowercase(),
        }
    }

    pub fn cell(&self, row: &ReportRow, decode_uri: bool) -> Cell {
        match self {
            Column::Count => Cell::Int(row.count),
            Column::Status(class) => Cell::Int(row.status_classes[(*class - 1) as usize]),
            Column::Method => row
                .method
                .as_ref()
                .map(|m| Cell::Text(m.clone()))
                .unwrap_or(Cell::Blank),
            Column::Uri if decode_uri => {
                Cell::Text(percent_decode_str(&row.uri).decode_utf8_lossy().into_owned())
            }
            Column::Uri => Cell::Text(row.uri.clone()),
            Column::Min => Cell::Float(row.min),
            Column::Max => Cell::Float(row.max),
            Column::Sum => Cell::Float(row.sum),
            Column::Avg => Cell::Float(row.avg),
            Column::Percentile(rank) => row
                .percentiles
                .get(*rank)
                .map(Cell::Float)
                .unwrap_or(Cell::Blank),
            Column::Stddev => Cell::Float(row.stddev),
            Column::MinBody => Cell::Int(row.min_body),
            Column::MaxBody => Cell::Int(row.max_body),
            Column::SumBody => Cell::Int(row.sum_body),
            Column::AvgBody => Cell::Float(row.avg_body),
        }
    }

    /// Totals over every row: counts and sums add up, extremes are the
    /// extremes of all rows, averages are weighted by count.
    pub fn footer_cell(&self, rows: &[ReportRow]) -> Cell {
        let count: u64 = rows.iter().map(|r| r.count).sum();
        if rows.is_empty() && !matches!(self, Column::Count | Column::Status(_)) {
            return Cell::Blank;
        }

        match self {
            Column::Count => Cell::Int(count),
            Column::Status(class) => Cell::Int(
                rows.iter()
                    .map(|r| r.status_classes[(*class - 1) as usize])
                    .sum(),
            ),
            Column::Uri => Cell::Text("TOTAL".to_string()),
            Column::Min => Cell::Float(rows.iter().map(|r| r.min).fold(f64::INFINITY, f64::min)),
            Column::Max => Cell::Float(
                rows.iter()
                    .map(|r| r.max)
                    .fold(f64::NEG_INFINITY, f64::max),
            ),
            Column::Sum => Cell::Float(rows.iter().map(|r| r.sum).sum()),
            Column::Avg => {
                let sum: f64 = rows.iter().map(|r| r.sum).sum();
                Cell::Float(if count > 0 { sum / count as f64 } else { 0.0 })
            }
            Column::MinBody => Cell::Int(rows.iter().map(|r| r.min_body).min().unwrap_or(0)),
            Column::MaxBody => Cell::Int(rows.iter().map(|r| r.max_body).max().unwrap_or(0)),
            Column::SumBody => Cell::Int(total_body(rows)),
            Column::AvgBody => {
                let sum = total_body(rows);
                Cell::Float(if count > 0 { sum as f64 / count as f64 } else { 0.0 })
            }
            Column::Method | Column::Percentile(_) | Column::Stddev => Cell::Blank,
        }
    }
}

fn total_body(rows: &[ReportRow]) -> u64 {
    rows.iter().fold(0, |total, r| total.saturating_add(r.sum_body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_columns_in_fixed_order() {
        let columns = parse_columns("all", &[50, 99]).unwrap();
        let keys: Vec<String> = columns.iter().map(|c| c.key()).collect();
        assert_eq!(
            keys,
            vec![
                "count", "1xx", "2xx", "3xx", "4xx", "5xx", "method", "uri", "min", "max", "sum",
                "avg", "p50", "p99", "stddev", "min_body", "max_body", "sum_body", "avg_body",
            ]
        );
    }

    #[test]
    fn test_selection_is_reordered() {
        let columns = parse_columns("uri, count,p, max-body", &[90]).unwrap();
        assert_eq!(
            columns,
            vec![
                Column::Count,
                Column::Uri,
                Column::Percentile(90),
                Column::MaxBody
            ]
        );
    }

    #[test]
    fn test_unknown_column() {
        let err = parse_columns("count,latency", &[]).unwrap_err();
        assert_eq!(err, ConfigError::InvalidColumn("latency".to_string()));
    }

    #[test]
    fn test_selection_without_names_is_rejected() {
        for selection in [",", " , ", ",,"] {
            let err = parse_columns(selection, &[90]).unwrap_err();
            assert_eq!(err, ConfigError::InvalidColumn(selection.trim().to_string()));
        }
        assert!(!parse_columns("", &[90]).unwrap().is_empty());
    }

    #[test]
    fn test_titles() {
        assert_eq!(Column::Status(4).title(), "4XX");
        assert_eq!(Column::Percentile(95).title(), "P95");
        assert_eq!(Column::AvgBody.title(), "AVG(BODY)");
        assert_eq!(Column::Stddev.key(), "stddev");
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(Cell::Float(0.08).text(), "0.080");
        assert_eq!(Cell::Int(512).text(), "512");
        assert_eq!(Cell::Blank.text(), "");
        assert!(Cell::Int(1).is_numeric());
        assert!(!Cell::Text("x".to_string()).is_numeric());
    }
}
