mod column;
mod table;

pub use column::{Cell, Column, parse_columns};

use crate::Result;
use crate::error::ConfigError;
use crate::stats::ReportRow;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

/// Output format of the report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Table,
    Markdown,
    Tsv,
    Csv,
    Json,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Table => "table",
            Format::Markdown => "markdown",
            Format::Tsv => "tsv",
            Format::Csv => "csv",
            Format::Json => "json",
        }
    }
}

impl FromStr for Format {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(Format::Table),
            "markdown" | "md" => Ok(Format::Markdown),
            "tsv" => Ok(Format::Tsv),
            "csv" => Ok(Format::Csv),
            "json" => Ok(Format::Json),
            _ => Err(ConfigError::InvalidFormat(s.to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintOptions {
    pub no_headers: bool,
    pub show_footers: bool,
    pub decode_uri: bool,
    /// Maximum rows emitted; 0 means no limit. Only truncates output.
    pub pagination_limit: usize,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            no_headers: false,
            show_footers: false,
            decode_uri: false,
            pagination_limit: 100,
        }
    }
}

/// Renders finalized rows in one format
#[derive(Debug, Clone)]
pub struct Printer {
    format: Format,
    columns: Vec<Column>,
    options: PrintOptions,
}

impl Printer {
    pub fn new(format: Format, columns: Vec<Column>, options: PrintOptions) -> Self {
        Self {
            format,
            columns,
            options,
        }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Write the report. `rows` must already be sorted; the footer covers
    /// every row even when pagination hides some of them.
    pub fn print<W: Write>(&self, rows: &[ReportRow], mut out: W) -> Result<()> {
        let shown = match self.options.pagination_limit {
            0 => rows,
            limit => &rows[..rows.len().min(limit)],
        };
        tracing::debug!(
            "Rendering {} of {} rows as {}",
            shown.len(),
            rows.len(),
            self.format
        );

        let header = (!self.options.no_headers).then(|| self.header(self.format));
        let body: Vec<Vec<Cell>> = shown
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .map(|c| c.cell(row, self.options.decode_uri))
                    .collect()
            })
            .collect();
        let footer = self.options.show_footers.then(|| {
            self.columns
                .iter()
                .map(|c| c.footer_cell(rows))
                .collect::<Vec<_>>()
        });

        match self.format {
            Format::Table => {
                table::write_plain(&mut out, header.as_deref(), &body, footer.as_deref())?
            }
            Format::Markdown => {
                table::write_markdown(&mut out, header.as_deref(), &body, footer.as_deref())?
            }
            Format::Tsv => self.write_delimited(&mut out, b'\t', header, &body, footer)?,
            Format::Csv => self.write_delimited(&mut out, b',', header, &body, footer)?,
            Format::Json => self.write_json(&mut out, &body)?,
        }

        out.flush()?;
        Ok(())
    }

    fn header(&self, format: Format) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| match format {
                Format::Table | Format::Markdown => c.title(),
                _ => c.key(),
            })
            .collect()
    }

    fn write_delimited<W: Write>(
        &self,
        out: W,
        delimiter: u8,
        header: Option<Vec<String>>,
        body: &[Vec<Cell>],
        footer: Option<Vec<Cell>>,
    ) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(out);

        if let Some(header) = header {
            writer.write_record(&header)?;
        }
        for cells in body.iter().chain(footer.as_ref()) {
            writer.write_record(cells.iter().map(Cell::text))?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_json<W: Write>(&self, mut out: W, body: &[Vec<Cell>]) -> Result<()> {
        let objects: Vec<serde_json::Map<String, serde_json::Value>> = body
            .iter()
            .map(|cells| {
                self.columns
                    .iter()
                    .zip(cells)
                    .map(|(column, cell)| (column.key(), cell.json()))
                    .collect()
            })
            .collect();

        serde_json::to_writer_pretty(&mut out, &objects)?;
        out.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{PercentileSet, ReportRow};

    fn estate_row() -> ReportRow {
        ReportRow {
            uri: r"/api/estate/\d+".to_string(),
            method: Some("GET".to_string()),
            count: 2,
            status_classes: [0, 2, 0, 0, 0],
            min: 0.080,
            max: 0.120,
            sum: 0.200,
            avg: 0.100,
            stddev: 0.020,
            percentiles: PercentileSet::compute(&[0.080, 0.120], &[50]),
            min_body: 256,
            max_body: 512,
            sum_body: 768,
            avg_body: 384.0,
        }
    }

    fn render(printer: &Printer, rows: &[ReportRow]) -> String {
        let mut buf = Vec::new();
        printer.print(rows, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("CSV".parse::<Format>().unwrap(), Format::Csv);
        assert_eq!("md".parse::<Format>().unwrap(), Format::Markdown);
        assert_eq!(
            "xml".parse::<Format>().unwrap_err(),
            ConfigError::InvalidFormat("xml".to_string())
        );
    }

    #[test]
    fn test_csv_with_header() {
        let columns = parse_columns("all", &[50]).unwrap();
        let printer = Printer::new(Format::Csv, columns, PrintOptions::default());
        let output = render(&printer, &[estate_row()]);

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "count,1xx,2xx,3xx,4xx,5xx,method,uri,min,max,sum,avg,p50,stddev,min_body,max_body,sum_body,avg_body"
        );
        assert_eq!(
            lines[1],
            r"2,0,2,0,0,0,GET,/api/estate/\d+,0.080,0.120,0.200,0.100,0.080,0.020,256,512,768,384.000"
        );
    }

    #[test]
    fn test_tsv_without_header_with_footer() {
        let columns = parse_columns("count,uri,max", &[]).unwrap();
        let options = PrintOptions {
            no_headers: true,
            show_footers: true,
            ..PrintOptions::default()
        };
        let printer = Printer::new(Format::Tsv, columns, options);
        let output = render(&printer, &[estate_row(), estate_row()]);

        assert_eq!(
            output,
            "2\t/api/estate/\\d+\t0.120\n2\t/api/estate/\\d+\t0.120\n4\tTOTAL\t0.120\n"
        );
    }

    #[test]
    fn test_footer_body_total_saturates() {
        let mut huge = estate_row();
        huge.sum_body = u64::MAX;
        let columns = parse_columns("count,sum_body", &[]).unwrap();
        let options = PrintOptions {
            no_headers: true,
            show_footers: true,
            ..PrintOptions::default()
        };
        let printer = Printer::new(Format::Csv, columns, options);
        let output = render(&printer, &[huge, estate_row()]);

        assert_eq!(output.lines().last(), Some("4,18446744073709551615"));
    }

    #[test]
    fn test_pagination_only_truncates_output() {
        let columns = parse_columns("count", &[]).unwrap();
        let options = PrintOptions {
            pagination_limit: 1,
            show_footers: true,
            ..PrintOptions::default()
        };
        let printer = Printer::new(Format::Csv, columns, options);
        let output = render(&printer, &[estate_row(), estate_row(), estate_row()]);
        assert_eq!(output, "count\n2\n6\n");
    }

    #[test]
    fn test_json_output() {
        let columns = parse_columns("count,method,uri,p", &[50]).unwrap();
        let printer = Printer::new(Format::Json, columns, PrintOptions::default());
        let output = render(&printer, &[estate_row()]);

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[0]["count"], 2);
        assert_eq!(parsed[0]["method"], "GET");
        assert_eq!(parsed[0]["uri"], r"/api/estate/\d+");
        assert_eq!(parsed[0]["p50"], 0.08);
    }

    #[test]
    fn test_decode_uri() {
        let mut row = estate_row();
        row.uri = "/search/caf%C3%A9".to_string();
        let columns = parse_columns("uri", &[]).unwrap();
        let options = PrintOptions {
            decode_uri: true,
            no_headers: true,
            ..PrintOptions::default()
        };
        let printer = Printer::new(Format::Csv, columns, options);
        assert_eq!(render(&printer, &[row]), "/search/café\n");
    }
}
