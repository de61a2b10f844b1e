use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use claim_report::pdf::fonts;
use claim_report::{
    CaseRecord, HttpImageFetcher, ImageCache, Notification, OutputFormat, ReportConfig,
    ReportGenerator, ReportKind, ReportRequest,
};

/// Generates investigation reports for claim case records.
///
/// PDF output needs the Liberation Sans or DejaVu Sans font family. It is
/// looked up in `CLAIM_REPORT_FONTS_DIR`, the configured `fonts_dir`,
/// `assets/fonts` and the usual system font directories.
#[derive(Parser)]
#[command(author, version, about = "Insurance claim investigation report generator")]
struct Cli {
    /// TOML configuration file. Environment variables override its values.
    #[arg(long, global = true, env = "CLAIM_REPORT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a case record to PDF and/or DOCX.
    Generate(GenerateArgs),

    /// Report whether the PDF font family can be found.
    #[command(name = "check-fonts", aliases = ["fonts"])]
    CheckFonts,
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// Case record as JSON.
    #[arg(long = "case")]
    case: PathBuf,

    #[arg(long, value_enum, default_value_t = KindArg::Od)]
    kind: KindArg,

    #[arg(long, value_enum, default_value_t = FormatArg::Both)]
    format: FormatArg,

    /// Directory the reports are written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Report date as DD-MM-YYYY. Defaults to today.
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,

    /// JSON file used to keep materialized images between runs.
    #[arg(long, env = "CLAIM_REPORT_IMAGE_CACHE")]
    image_cache: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    /// Motor own-damage claim.
    Od,
    /// General investigation.
    Investigation,
}

impl From<KindArg> for ReportKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Od => ReportKind::OdCase,
            KindArg::Investigation => ReportKind::Investigation,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Pdf,
    Docx,
    Both,
}

impl FormatArg {
    fn formats(self) -> &'static [OutputFormat] {
        match self {
            Self::Pdf => &[OutputFormat::Pdf],
            Self::Docx => &[OutputFormat::Docx],
            Self::Both => &[OutputFormat::Pdf, OutputFormat::Docx],
        }
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%d-%m-%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .map_err(|err| format!("expected DD-MM-YYYY: {err}"))
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match load_config(cli.config.as_deref()) {
        Ok(config) => match cli.command {
            Commands::Generate(args) => generate(config, args).await,
            Commands::CheckFonts => check_fonts(&config),
        },
        Err(err) => Err(err),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<ReportConfig, Box<dyn Error>> {
    let config = match path {
        Some(path) => ReportConfig::from_toml_file(path)?,
        None => ReportConfig::default(),
    };
    Ok(config.with_env_overrides()?)
}

fn check_fonts(config: &ReportConfig) -> Result<(), Box<dyn Error>> {
    if !fonts::default_fonts_available(config.fonts_dir.as_deref()) {
        let names: Vec<_> = fonts::FONT_SETS.iter().map(|set| set.name).collect();
        return Err(format!(
            "none of the font families [{}] found; set {}",
            names.join(", "),
            claim_report::config::FONTS_DIR_ENV
        )
        .into());
    }
    fonts::font_family(config.fonts_dir.as_deref())?;
    println!("Report fonts found");
    Ok(())
}

async fn generate(config: ReportConfig, args: GenerateArgs) -> Result<(), Box<dyn Error>> {
    // An unreadable case file still goes through the generator so the
    // failure is reported like any other.
    let record = match std::fs::read_to_string(&args.case)
        .map_err(claim_report::ReportError::from)
        .and_then(|json| CaseRecord::from_json_str(&json))
    {
        Ok(record) => Some(record),
        Err(err) => {
            error!("Cannot load case {}: {}", args.case.display(), err);
            None
        }
    };

    let mut cache = match &args.image_cache {
        Some(path) if path.exists() => ImageCache::load(path)?,
        _ => ImageCache::new(),
    };

    let fetcher = Arc::new(HttpImageFetcher::new(config.images.fetch_timeout())?);
    let (generator, mut notifications) = ReportGenerator::new(fetcher, config);
    let reporter = tokio::spawn(async move {
        while let Some(notification) = notifications.recv().await {
            match notification {
                Notification::Failed { .. } => warn!("{notification}"),
                _ => info!("{notification}"),
            }
        }
    });

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling report generation");
                cancel.cancel();
            }
        }
    });

    std::fs::create_dir_all(&args.out_dir)?;
    let report_date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let mut outcome = Ok(());
    for &format in args.format.formats() {
        let request = ReportRequest {
            kind: args.kind.into(),
            format,
            report_date,
        };
        match generator
            .generate(record.as_ref(), request, &mut cache, &cancel)
            .await
        {
            Ok(report) => {
                let path = report.write_to(&args.out_dir)?;
                println!("{}", path.display());
            }
            Err(err) => {
                outcome = Err(err.into());
                break;
            }
        }
    }

    if let Some(path) = &args.image_cache {
        cache.save(path)?;
    }

    drop(generator);
    if reporter.await.is_err() {
        warn!("Notification reporter stopped unexpectedly");
    }
    outcome
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
