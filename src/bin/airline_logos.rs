use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use airline_logos::acquire::AcquireOptions;
use airline_logos::app::App;
use airline_logos::catalog::JsonCatalog;
use airline_logos::config::{ConfigLoader, DEFAULT_CATALOG_FILE, ResolvedConfig, delay_duration};
use airline_logos::domain::Fr24Method;
use airline_logos::error::LogoError;
use airline_logos::http::{HttpLogoClient, HttpResponse, LogoClient, TransportError};
use airline_logos::output::{JsonOutput, OutputMode, TextOutput};
use airline_logos::progress::{LogReporter, ProgressReporter, TerminalFooter};
use airline_logos::sources::SourceKind;
use airline_logos::store::Store;

#[derive(Parser)]
#[command(name = "airline-logos")]
#[command(about = "Harvest airline logos from public CDNs and reconcile them with a logo repository")]
#[command(version)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Download logos for every airline in the catalog")]
    Fetch(FetchArgs),
    #[command(about = "Copy new and changed logos into a logo repository")]
    Sync(SyncArgs),
    #[command(about = "Compare the local logo folders against a logo repository")]
    Audit(AuditArgs),
}

#[derive(Args)]
struct FetchArgs {
    /// Enable every source without prompting.
    #[arg(short = 'A', long)]
    all: bool,

    #[arg(short = 't', long)]
    threads: Option<usize>,

    /// Seconds to pause after each airline.
    #[arg(short = 'd', long)]
    delay: Option<f64>,

    /// Skip logos that already exist on disk.
    #[arg(short = 's', long)]
    skip: bool,

    #[arg(long, value_enum)]
    fr24_method: Option<Fr24Method>,

    /// Airline listing; repeat to merge several.
    #[arg(long = "catalog")]
    catalogs: Vec<String>,

    #[arg(long)]
    output: Option<String>,

    #[arg(long)]
    config: Option<String>,
}

#[derive(Args)]
struct SyncArgs {
    target: String,

    #[arg(long)]
    dry_run: bool,

    #[arg(long)]
    source: Option<String>,
}

#[derive(Args)]
struct AuditArgs {
    #[arg(default_value = "../airline-logos")]
    repo: String,

    #[arg(long = "catalog")]
    catalogs: Vec<String>,

    #[arg(long)]
    source: Option<String>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<LogoError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

/// A missing logo source root is reported but is not a failure: there is
/// simply nothing to reconcile or audit.
fn map_exit_code(error: &LogoError) -> u8 {
    match error {
        LogoError::SourceMissing(_) => 0,
        LogoError::CatalogRead(_)
        | LogoError::EmptyCatalog
        | LogoError::ConfigRead(_)
        | LogoError::TargetMissing(_) => 2,
        LogoError::HttpSetup(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    match cli.command {
        Commands::Fetch(args) => run_fetch(args, output_mode),
        Commands::Sync(args) => run_sync(args, output_mode),
        Commands::Audit(args) => run_audit(args, output_mode),
    }
}

fn run_fetch(args: FetchArgs, output_mode: OutputMode) -> miette::Result<()> {
    let mut resolved = ConfigLoader::resolve(args.config.as_deref())?;
    apply_overrides(&mut resolved, &args)?;

    let catalog = JsonCatalog::new(resolved.catalogs.clone()).load()?;
    if matches!(output_mode, OutputMode::Interactive) {
        TextOutput::print_catalog_stats(&catalog.stats);
    }

    let enabled = select_sources(&args, &resolved, output_mode).into_diagnostic()?;
    let client = HttpLogoClient::new()?;
    let app = App::new(Store::new(resolved.output_dir.clone()), client);
    let registry = app.build_registry(&enabled, resolved.fr24_method, &resolved.radarbox_placeholder);

    let options = AcquireOptions {
        workers: resolved.workers,
        delay: delay_duration(resolved.delay_secs)?,
        skip_existing: resolved.skip_existing,
    };
    let reporter: Arc<dyn ProgressReporter> = match output_mode {
        OutputMode::Interactive => Arc::new(TerminalFooter),
        OutputMode::NonInteractive => Arc::new(LogReporter),
    };

    let result = app.fetch(catalog.airlines, registry, options, reporter)?;
    match output_mode {
        OutputMode::Interactive => TextOutput::print_fetch(&result),
        OutputMode::NonInteractive => JsonOutput::print_fetch(&result).into_diagnostic()?,
    }
    Ok(())
}

fn apply_overrides(resolved: &mut ResolvedConfig, args: &FetchArgs) -> Result<(), LogoError> {
    if let Some(threads) = args.threads {
        if threads == 0 {
            return Err(LogoError::InvalidConfig(
                "--threads must be at least 1".to_string(),
            ));
        }
        resolved.workers = threads;
    }
    if let Some(delay) = args.delay {
        delay_duration(delay)?;
        resolved.delay_secs = delay;
    }
    if args.skip {
        resolved.skip_existing = true;
    }
    if let Some(method) = args.fr24_method {
        resolved.fr24_method = method;
    }
    if !args.catalogs.is_empty() {
        resolved.catalogs = args.catalogs.iter().map(PathBuf::from).collect();
    }
    if let Some(output) = &args.output {
        resolved.output_dir = Utf8PathBuf::from(output);
    }
    if args.all {
        resolved.sources = Some(SourceKind::ALL.to_vec());
    }
    Ok(())
}

fn select_sources(
    args: &FetchArgs,
    resolved: &ResolvedConfig,
    output_mode: OutputMode,
) -> io::Result<Vec<SourceKind>> {
    if let Some(sources) = &resolved.sources {
        return Ok(sources.clone());
    }
    if args.all || matches!(output_mode, OutputMode::NonInteractive) {
        return Ok(SourceKind::ALL.to_vec());
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut enabled = Vec::new();
    for kind in SourceKind::ALL {
        if prompt_yes_no(&mut input, &format!("Would you like {}: Y/N ", kind.display_name()))? {
            enabled.push(kind);
        }
    }
    Ok(enabled)
}

fn prompt_yes_no(input: &mut impl BufRead, question: &str) -> io::Result<bool> {
    let mut stdout = io::stdout();
    loop {
        write!(stdout, "{question}")?;
        stdout.flush()?;
        let mut answer = String::new();
        if input.read_line(&mut answer)? == 0 {
            return Ok(false);
        }
        match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => continue,
        }
    }
}

fn run_sync(args: SyncArgs, output_mode: OutputMode) -> miette::Result<()> {
    let app = App::new(local_store(args.source)?, NopClient);
    let report = app.sync(&Utf8PathBuf::from(args.target), args.dry_run)?;
    match output_mode {
        OutputMode::Interactive => TextOutput::print_sync(&report),
        OutputMode::NonInteractive => JsonOutput::print_sync(&report).into_diagnostic()?,
    }
    Ok(())
}

fn run_audit(args: AuditArgs, output_mode: OutputMode) -> miette::Result<()> {
    let catalogs = if args.catalogs.is_empty() {
        vec![PathBuf::from(DEFAULT_CATALOG_FILE)]
    } else {
        args.catalogs.iter().map(PathBuf::from).collect()
    };
    let catalog = JsonCatalog::new(catalogs).load()?;

    let app = App::new(local_store(args.source)?, NopClient);
    let report = app.audit(&Utf8PathBuf::from(args.repo), &catalog.airlines)?;
    match output_mode {
        OutputMode::Interactive => TextOutput::print_audit(&report),
        OutputMode::NonInteractive => JsonOutput::print_audit(&report).into_diagnostic()?,
    }
    Ok(())
}

fn local_store(source: Option<String>) -> Result<Store, LogoError> {
    match source {
        Some(source) => Ok(Store::new(source)),
        None => Store::current_dir(),
    }
}

/// Stand-in for commands that never touch the network.
#[derive(Clone, Copy)]
struct NopClient;

impl LogoClient for NopClient {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        Err(TransportError(format!("network disabled for this command: {url}")))
    }
}
