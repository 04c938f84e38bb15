use super::Parser;
use super::record::{LabelSchema, LogRecord, MalformedLine, QueryStringMode, assemble};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Parser for JSON lines: one object per line, keys named by the label schema.
#[derive(Debug, Clone, Default)]
pub struct JsonParser {
    labels: LabelSchema,
    query: QueryStringMode,
}

impl JsonParser {
    pub fn new(labels: LabelSchema, query: QueryStringMode) -> Self {
        Self { labels, query }
    }
}

impl Parser for JsonParser {
    fn parse_line(&self, line: &str) -> std::result::Result<LogRecord, MalformedLine> {
        let object: Map<String, Value> = serde_json::from_str(line)
            .map_err(|e| MalformedLine::new(format!("invalid JSON object: {}", e)))?;

        assemble(&self.labels, self.query, |label| {
            object.get(label).and_then(value_text)
        })
    }
}

fn value_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        other => Some(Cow::Owned(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_line() {
        let parser = JsonParser::default();
        let line = r#"{"uri":"/api/user/1?x=1","method":"GET","status":200,"reqtime":0.042,"size":"1024","time":"2024-03-01T12:00:00Z"}"#;
        let record = parser.parse_line(line).unwrap();

        assert_eq!(record.uri, "/api/user/1");
        assert_eq!(record.status, 200);
        assert_eq!(record.response_time, 0.042);
        assert_eq!(record.body_bytes, 1024);
        assert!(record.timestamp.is_some());
    }

    #[test]
    fn test_null_size_defaults_to_zero() {
        let parser = JsonParser::default();
        let line = r#"{"uri":"/","method":"HEAD","status":"204","apptime":"0.001","size":null}"#;
        let record = parser.parse_line(line).unwrap();
        assert_eq!(record.status, 204);
        assert_eq!(record.body_bytes, 0);
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let parser = JsonParser::default();
        assert!(parser.parse_line("{not json").is_err());
        assert!(parser.parse_line("[1, 2, 3]").is_err());
        assert!(
            parser
                .parse_line(r#"{"uri":"/","method":"GET","status":true,"reqtime":0.1}"#)
                .is_err()
        );
    }
}
