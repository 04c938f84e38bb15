use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use logprof_core::config::{parse_percentiles, split_list};
use logprof_core::log::ParserKind;
use logprof_core::profiler::open_source;
use logprof_core::{Profiler, RunConfig, RunSummary};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

/// Options shared by every log format
#[derive(Args, Debug, Clone, Default)]
pub struct ProfileArgs {
    /// Access log to read (stdin when omitted or "-")
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// YAML config file; flags given on the command line take precedence
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Sort key: count, uri, method, min, max, sum, avg, stddev, p<N>,
    /// min-body, max-body, sum-body, avg-body
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort in descending order
    #[arg(short, long, overrides_with = "no_reverse")]
    pub reverse: bool,

    /// Sort in ascending order, overriding the config file
    #[arg(long, overrides_with = "reverse")]
    pub no_reverse: bool,

    /// Keep query strings as part of the URI
    #[arg(short, long, overrides_with = "no_query_string")]
    pub query_string: bool,

    /// Strip query strings, overriding the config file
    #[arg(long, overrides_with = "query_string")]
    pub no_query_string: bool,

    /// Keep query string keys but replace their values with "xxx"
    #[arg(long, overrides_with = "no_qs_ignore_values")]
    pub qs_ignore_values: bool,

    /// Keep query string values, overriding the config file
    #[arg(long, overrides_with = "qs_ignore_values")]
    pub no_qs_ignore_values: bool,

    /// Percent-decode URIs in the report
    #[arg(long, overrides_with = "no_decode_uri")]
    pub decode_uri: bool,

    /// Show URIs exactly as logged, overriding the config file
    #[arg(long, overrides_with = "decode_uri")]
    pub no_decode_uri: bool,

    /// Report format (table, markdown, tsv, csv, json)
    #[arg(long)]
    pub format: Option<String>,

    /// Abort when more distinct endpoints than this are seen
    #[arg(long)]
    pub limit: Option<usize>,

    /// Time zone for naive timestamps in filters (Local, UTC, +09:00)
    #[arg(long)]
    pub location: Option<String>,

    /// Columns to show: "all" or a comma-separated list
    #[arg(short = 'o', long)]
    pub columns: Option<String>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub dest: Option<PathBuf>,

    /// Omit the header row
    #[arg(long, overrides_with = "headers")]
    pub noheaders: bool,

    /// Print the header row, overriding the config file
    #[arg(long, overrides_with = "noheaders")]
    pub headers: bool,

    /// Append a totals row
    #[arg(long, overrides_with = "hide_footers")]
    pub show_footers: bool,

    /// Omit the totals row, overriding the config file
    #[arg(long, overrides_with = "show_footers")]
    pub hide_footers: bool,

    /// Comma-separated regular expressions that collapse URIs into endpoints
    #[arg(short, long)]
    pub matching_groups: Option<String>,

    /// Comma-separated filter clauses, e.g. "status == 2xx, method == GET"
    #[arg(short, long)]
    pub filters: Option<String>,

    /// Comma-separated percentile ranks, e.g. 50,90,99
    #[arg(long)]
    pub percentiles: Option<String>,

    /// Maximum number of rows to print (0 prints all)
    #[arg(long)]
    pub page: Option<usize>,

    /// Group by URI only instead of method and URI
    #[arg(long, overrides_with = "method_grouping")]
    pub no_method_grouping: bool,

    /// Group by method and URI, overriding the config file
    #[arg(long, overrides_with = "no_method_grouping")]
    pub method_grouping: bool,

    /// Fail on the first malformed line
    #[arg(long, overrides_with = "no_strict")]
    pub strict: bool,

    /// Skip malformed lines, overriding the config file
    #[arg(long, overrides_with = "strict")]
    pub no_strict: bool,

    /// Show a progress bar while reading FILE
    #[arg(long)]
    pub progress: bool,

    /// Label of the URI field
    #[arg(long, value_name = "LABEL")]
    pub uri_label: Option<String>,
    /// Label of the method field
    #[arg(long, value_name = "LABEL")]
    pub method_label: Option<String>,
    /// Label of the timestamp field
    #[arg(long, value_name = "LABEL")]
    pub time_label: Option<String>,
    /// Label of the upstream response time field
    #[arg(long, value_name = "LABEL")]
    pub apptime_label: Option<String>,
    /// Label of the request time field
    #[arg(long, value_name = "LABEL")]
    pub reqtime_label: Option<String>,
    /// Label of the body size field
    #[arg(long, value_name = "LABEL")]
    pub size_label: Option<String>,
    /// Label of the status field
    #[arg(long, value_name = "LABEL")]
    pub status_label: Option<String>,
}

/// Assemble the run configuration: config file (or defaults) first, then
/// every flag that was given explicitly.
pub fn build_config(args: &ProfileArgs, parser: ParserKind) -> Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => RunConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RunConfig::default(),
    };
    config.parser = parser;

    if let Some(file) = &args.file {
        config.file = Some(file.clone());
    }
    if let Some(sort) = &args.sort {
        config.sort = sort.clone();
    }
    if let Some(format) = &args.format {
        config.format = format.clone();
    }
    if let Some(limit) = args.limit {
        config.limit = limit;
    }
    if let Some(location) = &args.location {
        config.location = location.clone();
    }
    if let Some(columns) = &args.columns {
        config.columns = columns.clone();
    }
    if let Some(dest) = &args.dest {
        config.destination = Some(dest.clone());
    }
    if let Some(groups) = &args.matching_groups {
        config.matching_groups = split_list(groups);
    }
    if let Some(filters) = &args.filters {
        config.filters = Some(filters.clone());
    }
    if let Some(percentiles) = &args.percentiles {
        config.percentiles = parse_percentiles(percentiles)?;
    }
    if let Some(page) = args.page {
        config.pagination_limit = page;
    }

    toggle(&mut config.reverse, args.reverse, args.no_reverse);
    toggle(&mut config.query_string, args.query_string, args.no_query_string);
    toggle(&mut config.qs_ignore_values, args.qs_ignore_values, args.no_qs_ignore_values);
    toggle(&mut config.decode_uri, args.decode_uri, args.no_decode_uri);
    toggle(&mut config.no_headers, args.noheaders, args.headers);
    toggle(&mut config.show_footers, args.show_footers, args.hide_footers);
    toggle(&mut config.strict, args.strict, args.no_strict);
    toggle(&mut config.group_by_method, args.method_grouping, args.no_method_grouping);

    let labels = &mut config.labels;
    for (flag, label) in [
        (&args.uri_label, &mut labels.uri),
        (&args.method_label, &mut labels.method),
        (&args.time_label, &mut labels.time),
        (&args.apptime_label, &mut labels.apptime),
        (&args.reqtime_label, &mut labels.reqtime),
        (&args.size_label, &mut labels.size),
        (&args.status_label, &mut labels.status),
    ] {
        if let Some(value) = flag {
            *label = value.clone();
        }
    }

    Ok(config)
}

/// Apply a `--flag` / `--no-flag` pair; neither leaves the config value alone
fn toggle(value: &mut bool, on: bool, off: bool) {
    if on {
        *value = true;
    } else if off {
        *value = false;
    }
}

/// Profile an access log and write the report
pub fn execute(args: &ProfileArgs, parser: ParserKind) -> Result<RunSummary> {
    let config = build_config(args, parser)?;

    // Validation happens here, before the log is opened
    let profiler = Profiler::new(config)?;
    let config = profiler.config();

    tracing::debug!(
        "Profiling {} log from {}",
        parser.as_str(),
        config
            .file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "stdin".to_string())
    );

    let progress_file = config
        .file
        .as_ref()
        .filter(|p| args.progress && p.as_os_str() != "-");

    let summary = match progress_file {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Source unavailable: {}", path.display()))?;
            let len = file.metadata().map(|m| m.len()).unwrap_or(0);

            let bar = ProgressBar::new(len);
            bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
                )?
                .progress_chars("=> "),
            );

            let source: Box<dyn BufRead> = Box::new(BufReader::new(bar.wrap_read(file)));
            let result = profiler.run_to(source, config.destination.as_deref());
            bar.finish_and_clear();
            result?
        }
        None => {
            let source = open_source(config.file.as_deref())?;
            profiler.run_to(source, config.destination.as_deref())?
        }
    };

    if args.progress {
        use console::style;
        eprintln!(
            "{} {} lines, {} requests, {} endpoints ({} malformed, {} filtered out)",
            style("Done:").bold().green(),
            summary.lines,
            summary.aggregated,
            summary.endpoints,
            summary.malformed,
            summary.filtered_out
        );
    }

    Ok(summary)
}
