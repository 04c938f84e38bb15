use super::Parser;
use super::record::{LogRecord, MalformedLine};
use crate::{Error, Result};
use std::io::BufRead;

/// Result of consuming one non-blank line from the source.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Record(LogRecord),
    Malformed { line: usize, error: MalformedLine },
}

/// Streams records out of a line-oriented source.
pub struct LogReader<R, P> {
    source: R,
    parser: P,
    name: String,
    buf: Vec<u8>,
    line_number: usize,
}

impl<R: BufRead, P: Parser> LogReader<R, P> {
    pub fn new(source: R, parser: P) -> Self {
        Self {
            source,
            parser,
            name: "<input>".to_string(),
            buf: Vec::new(),
            line_number: 0,
        }
    }

    /// Name reported when the source fails mid-read
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Number of lines consumed so far (blank lines included)
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Read the next non-blank line.
    ///
    /// Returns `Ok(None)` at end of input. Read failures are fatal and
    /// surface as [`Error::SourceUnavailable`]; invalid UTF-8 is replaced
    /// rather than failing the read.
    pub fn next_outcome(&mut self) -> Result<Option<LineOutcome>> {
        loop {
            self.buf.clear();
            let read = self
                .source
                .read_until(b'\n', &mut self.buf)
                .map_err(|source| Error::SourceUnavailable {
                    path: self.name.clone(),
                    source,
                })?;
            if read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let text = String::from_utf8_lossy(&self.buf);
            let line = text.trim_end_matches(['\r', '\n']);
            if line.trim().is_empty() {
                continue;
            }

            let outcome = match self.parser.parse_line(line) {
                Ok(record) => LineOutcome::Record(record),
                Err(error) => LineOutcome::Malformed {
                    line: self.line_number,
                    error,
                },
            };
            return Ok(Some(outcome));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::LtsvParser;
    use std::io::Cursor;

    #[test]
    fn test_reader_yields_records_and_malformed_lines() {
        let input = "uri:/a\tmethod:GET\tstatus:200\treqtime:0.1\n\
                     \n\
                     garbage\n\
                     uri:/b\tmethod:GET\tstatus:200\treqtime:0.2\r\n";
        let mut reader = LogReader::new(Cursor::new(input), LtsvParser::default());

        match reader.next_outcome().unwrap() {
            Some(LineOutcome::Record(r)) => assert_eq!(r.uri, "/a"),
            other => panic!("unexpected outcome: {:?}", other),
        }
        match reader.next_outcome().unwrap() {
            Some(LineOutcome::Malformed { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected outcome: {:?}", other),
        }
        match reader.next_outcome().unwrap() {
            Some(LineOutcome::Record(r)) => assert_eq!(r.response_time, 0.2),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(reader.next_outcome().unwrap().is_none());
        assert_eq!(reader.line_number(), 4);
    }

    #[test]
    fn test_reader_empty_input() {
        let mut reader = LogReader::new(Cursor::new(""), LtsvParser::default());
        assert!(reader.next_outcome().unwrap().is_none());
    }
}
