mod json;
mod ltsv;
mod reader;
mod record;

pub use json::JsonParser;
pub use ltsv::LtsvParser;
pub use reader::{LineOutcome, LogReader};
pub use record::{LabelSchema, LogRecord, MalformedLine, QueryStringMode, parse_timestamp};

use serde::{Deserialize, Serialize};

/// Converts one raw log line into a structured record.
///
/// Implementations are stateless per line: the same input always yields the
/// same outcome, and a rejected line never affects the next one.
pub trait Parser {
    fn parse_line(&self, line: &str) -> std::result::Result<LogRecord, MalformedLine>;
}

impl<P: Parser + ?Sized> Parser for Box<P> {
    fn parse_line(&self, line: &str) -> std::result::Result<LogRecord, MalformedLine> {
        (**self).parse_line(line)
    }
}

/// Supported line formats. The format is always chosen explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    #[default]
    Ltsv,
    Json,
}

impl ParserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParserKind::Ltsv => "ltsv",
            ParserKind::Json => "json",
        }
    }

    /// Build a boxed parser for this format
    pub fn build(self, labels: LabelSchema, query: QueryStringMode) -> Box<dyn Parser> {
        match self {
            ParserKind::Ltsv => Box::new(LtsvParser::new(labels, query)),
            ParserKind::Json => Box::new(JsonParser::new(labels, query)),
        }
    }
}
