use crate::config::RunConfig;
use crate::error::ConfigError;
use crate::filter::{FilterCriteria, parse_expressions};
use crate::location::Location;
use crate::log::{LineOutcome, LogReader, Parser, QueryStringMode};
use crate::matcher::UriMatcher;
use crate::report::{Format, PrintOptions, Printer, parse_columns};
use crate::stats::{EndpointKey, ReportRow, SortKey, StatsAggregator, sort_rows};
use crate::{Error, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Counters describing one pass over the input
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Lines consumed, blank lines included
    pub lines: usize,
    /// Records folded into the statistics
    pub aggregated: u64,
    pub malformed: usize,
    pub filtered_out: usize,
    pub endpoints: usize,
}

/// A validated run: every option is checked and compiled up front, so no
/// input is read for a configuration that cannot produce a report.
#[derive(Debug)]
pub struct Profiler {
    config: RunConfig,
    query: QueryStringMode,
    matcher: UriMatcher,
    filters: FilterCriteria,
    percentiles: Vec<u8>,
    sort_key: SortKey,
    printer: Printer,
}

impl Profiler {
    pub fn new(config: RunConfig) -> Result<Self> {
        tracing::debug!("Validating run configuration");

        let percentiles = config.percentile_ranks()?;
        let sort_key = SortKey::parse(&config.sort, &percentiles)?;
        let format: Format = config.format.parse()?;
        let columns = parse_columns(&config.columns, &percentiles)?;
        if config.limit == 0 {
            return Err(ConfigError::InvalidLimit.into());
        }
        let location: Location = config.location.parse()?;
        let filters = match &config.filters {
            Some(expressions) => parse_expressions(expressions, &location)?,
            None => FilterCriteria::new(),
        };
        let matcher = UriMatcher::new(&config.matching_groups)?;

        let printer = Printer::new(
            format,
            columns,
            PrintOptions {
                no_headers: config.no_headers,
                show_footers: config.show_footers,
                decode_uri: config.decode_uri,
                pagination_limit: config.pagination_limit,
            },
        );

        tracing::debug!(
            "Sorting by {} ({}), {} matching groups, {} filters",
            sort_key,
            if config.reverse { "descending" } else { "ascending" },
            matcher.len(),
            filters.predicates().len()
        );

        Ok(Self {
            query: QueryStringMode::from_flags(config.query_string, config.qs_ignore_values),
            config,
            matcher,
            filters,
            percentiles,
            sort_key,
            printer,
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn percentiles(&self) -> &[u8] {
        &self.percentiles
    }

    pub fn parser(&self) -> Box<dyn Parser> {
        self.config
            .parser
            .build(self.config.labels.clone(), self.query)
    }

    /// Stream every line of `source` into a fresh aggregator.
    ///
    /// Malformed lines are skipped (or abort the run in strict mode).
    /// Exceeding the endpoint limit aborts with [`Error::TooManyEndpoints`]
    /// and the partial aggregation is dropped.
    pub fn aggregate<R: BufRead>(&self, source: R) -> Result<(StatsAggregator, RunSummary)> {
        let name = self
            .config
            .file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<stdin>".to_string());
        let mut reader = LogReader::new(source, self.parser()).with_name(name);
        let mut aggregator = StatsAggregator::new();
        let mut summary = RunSummary::default();

        while let Some(outcome) = reader.next_outcome()? {
            let record = match outcome {
                LineOutcome::Record(record) => record,
                LineOutcome::Malformed { line, error } => {
                    if self.config.strict {
                        return Err(Error::MalformedLine {
                            line,
                            reason: error.reason,
                        });
                    }
                    tracing::debug!("Skipping malformed line {}: {}", line, error);
                    summary.malformed += 1;
                    continue;
                }
            };

            if !self.filters.accept(&record) {
                tracing::trace!("Filtered out {} {}", record.method, record.uri);
                summary.filtered_out += 1;
                continue;
            }

            let uri = self.matcher.classify(&record.uri).to_string();
            let method = self.config.group_by_method.then(|| record.method.clone());
            aggregator.update(EndpointKey::new(uri, method), &record);
            summary.aggregated += 1;

            if aggregator.count_distinct_endpoints() > self.config.limit {
                return Err(Error::TooManyEndpoints {
                    limit: self.config.limit,
                });
            }
        }

        summary.lines = reader.line_number();
        summary.endpoints = aggregator.count_distinct_endpoints();

        if summary.malformed > 0 {
            tracing::warn!("Skipped {} malformed lines", summary.malformed);
        }
        tracing::info!(
            "Aggregated {} requests into {} endpoints ({} filtered out)",
            summary.aggregated,
            summary.endpoints,
            summary.filtered_out
        );

        Ok((aggregator, summary))
    }

    /// Finalize and order the rows for rendering
    pub fn report(&self, aggregator: &StatsAggregator) -> Vec<ReportRow> {
        let mut rows = aggregator.finalize(&self.percentiles);
        sort_rows(&mut rows, self.sort_key, self.config.reverse);
        rows
    }

    pub fn render<W: Write>(&self, rows: &[ReportRow], out: W) -> Result<()> {
        self.printer.print(rows, out)
    }

    /// Aggregate, sort and render into `out`
    pub fn run<R: BufRead, W: Write>(&self, source: R, out: W) -> Result<RunSummary> {
        let (aggregator, summary) = self.aggregate(source)?;
        let rows = self.report(&aggregator);
        let name = destination_name(self.config.destination.as_deref());
        self.render(&rows, out).map_err(|e| e.at_destination(&name))?;
        Ok(summary)
    }

    /// Like [`Profiler::run`], but the destination is only opened once
    /// aggregation has succeeded, so a failed run leaves no report behind.
    pub fn run_to<R: BufRead>(&self, source: R, destination: Option<&Path>) -> Result<RunSummary> {
        let (aggregator, summary) = self.aggregate(source)?;
        let rows = self.report(&aggregator);
        let out = open_destination(destination)?;
        let name = destination_name(destination);
        self.render(&rows, out).map_err(|e| e.at_destination(&name))?;
        Ok(summary)
    }

    /// Run against the configured file and destination
    pub fn run_configured(&self) -> Result<RunSummary> {
        let source = open_source(self.config.file.as_deref())?;
        self.run_to(source, self.config.destination.as_deref())
    }
}

/// Open the log source; none or `-` reads stdin
pub fn open_source(path: Option<&Path>) -> Result<Box<dyn BufRead>> {
    match path {
        None => Ok(Box::new(io::stdin().lock())),
        Some(p) if p.as_os_str() == "-" => Ok(Box::new(io::stdin().lock())),
        Some(p) => {
            tracing::debug!("Reading access log from: {}", p.display());
            let file = File::open(p).map_err(|source| Error::SourceUnavailable {
                path: p.display().to_string(),
                source,
            })?;
            Ok(Box::new(BufReader::new(file)))
        }
    }
}

fn destination_name(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "<stdout>".to_string())
}

/// Open the report destination; none means stdout
pub fn open_destination(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        None => Ok(Box::new(io::stdout().lock())),
        Some(p) => {
            tracing::debug!("Writing report to: {}", p.display());
            let file = File::create(p).map_err(|source| Error::SourceUnavailable {
                path: p.display().to_string(),
                source,
            })?;
            Ok(Box::new(BufWriter::new(file)))
        }
    }
}
