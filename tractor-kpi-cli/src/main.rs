mod reports;
mod sources;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use colored::Colorize;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Stdout, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use sources::{DirectorySource, stamp_directory};
use tractor_kpi::{AnalysisConfig, KpiPipeline, KpiReport, RoundBasis};

#[derive(Debug, Parser)]
#[command(name = "tractor-kpi", version)]
#[command(about = "Aggregate Tractor AI simulation logs into per-version KPI reports")]
struct Args {
    /// Directory containing the simulation log files
    #[arg(long)]
    logs_dir: PathBuf,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["console", "markdown", "json", "csv"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// JSON file with analysis settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stamp sequence numbers into each log file in place before analysis
    #[arg(long)]
    stamp: bool,

    /// Divide position points by counted round events instead of the estimate
    #[arg(long)]
    exact_rounds: bool,

    /// Maximum logged messages per data-quality warning kind
    #[arg(long)]
    warn_limit: Option<usize>,

    /// Include data-quality details in console and markdown reports
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let start_time = Instant::now();

    let config = load_config(&args)?;
    let source = DirectorySource::new(&args.logs_dir, &config.log_extension);

    if args.stamp {
        let stamped = stamp_directory(&source)?;
        info!("stamped {stamped} log files in {}", args.logs_dir.display());
    }

    let pipeline = KpiPipeline::new(config).context("invalid analysis configuration")?;
    let report = pipeline
        .run(&source)
        .with_context(|| format!("failed to analyze logs in {}", args.logs_dir.display()))?;

    write_report(&args, &report)?;
    info!("finished in {:?}", start_time.elapsed());
    Ok(())
}

fn load_config(args: &Args) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => AnalysisConfig::default(),
    };
    if args.exact_rounds {
        config.round_basis = RoundBasis::Exact;
    }
    if let Some(limit) = args.warn_limit {
        config.warn_limit = limit;
    }
    Ok(config)
}

fn read_config(path: &Path) -> Result<AnalysisConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    AnalysisConfig::from_json(&text)
        .with_context(|| format!("failed to load config {}", path.display()))
}

fn write_report(args: &Args, report: &KpiReport) -> Result<()> {
    let mut sink = ReportSink::open(args.output.as_deref())?;

    match args.report.as_str() {
        "json" => reports::generate_json_report(&mut sink, report)?,
        "markdown" => {
            reports::generate_markdown_report(&mut sink, report, Utc::now(), args.verbose)?;
        }
        "csv" => reports::generate_csv_report(&mut sink, report)?,
        _ => reports::generate_console_report(&mut sink, report, args.verbose)?,
    }

    sink.finish()
}

/// Destination of the rendered report: stdout, or a file named by `--output`.
enum ReportSink {
    Stdout(BufWriter<Stdout>),
    File {
        path: PathBuf,
        writer: BufWriter<File>,
    },
}

impl ReportSink {
    fn open(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::Stdout(BufWriter::new(stdout())));
        };
        let file =
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        Ok(Self::File {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    fn inner(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(writer) => writer,
            Self::File { writer, .. } => writer,
        }
    }

    /// Flush everything and tell the user where a file report landed.
    fn finish(mut self) -> Result<()> {
        self.inner().flush().context("failed to flush report")?;
        if let Self::File { path, .. } = &self {
            eprintln!("{} {}", "📄 Report written to".green(), path.display());
        }
        Ok(())
    }
}

impl Write for ReportSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner().flush()
    }
}
