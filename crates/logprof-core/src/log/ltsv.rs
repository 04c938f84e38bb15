use super::Parser;
use super::record::{LabelSchema, LogRecord, MalformedLine, QueryStringMode, assemble};
use std::borrow::Cow;
use std::collections::HashMap;

/// Parser for Labeled Tab-separated Values (`label:value<TAB>label:value`).
///
/// A line with no TAB at all is split on ASCII whitespace instead, which
/// accepts the space-separated variant some loggers emit. Values that
/// contain spaces (such as common-log-format timestamps) need real TABs.
#[derive(Debug, Clone, Default)]
pub struct LtsvParser {
    labels: LabelSchema,
    query: QueryStringMode,
}

impl LtsvParser {
    pub fn new(labels: LabelSchema, query: QueryStringMode) -> Self {
        Self { labels, query }
    }
}

impl Parser for LtsvParser {
    fn parse_line(&self, line: &str) -> std::result::Result<LogRecord, MalformedLine> {
        let fields = split_fields(line);
        if fields.is_empty() {
            return Err(MalformedLine::new("no label:value fields"));
        }

        assemble(&self.labels, self.query, |label| {
            fields.get(label).map(|value| Cow::Borrowed(*value))
        })
    }
}

fn split_fields(line: &str) -> HashMap<&str, &str> {
    let parts: Vec<&str> = if line.contains('\t') {
        line.split('\t').collect()
    } else {
        line.split_ascii_whitespace().collect()
    };

    parts
        .into_iter()
        .filter_map(|part| part.split_once(':'))
        .collect()
}
