use clap::{ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser};
use renditions::config::{self, RenditionConfig};
use renditions::imaging::RustBackend;
use renditions::process::{self, Job, ProcessError, RunSummary};
use renditions::{output, plan};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit status for usage errors and fatal load failures.
const EXIT_FATAL: u8 = 255;

fn version_string() -> &'static str {
    let hash = env!("RENDITIONS_GIT_HASH");
    if hash.is_empty() {
        env!("CARGO_PKG_VERSION")
    } else {
        // Leaked once at startup
        Box::leak(format!("{} ({hash})", env!("CARGO_PKG_VERSION")).into_boxed_str())
    }
}

#[derive(Parser)]
#[command(name = "renditions")]
#[command(about = "Generate cropped and resized renditions of an image")]
#[command(long_about = "\
Generate cropped and resized renditions of an image

Each -o writes one rendition using the most recent -f spec:

  renditions <source> -f <spec> -o <output> [-f <spec> -o <output>]...

Spec layout:

  <crop_w>x<crop_h>+<crop_x>+<crop_y>+<w>x<h>+<method>+<blur>+<quality>+<progressive>

  crop       crop box and origin; a zero width or height means no crop
  w x h      target size, both positive
  method     0 thumbnail, 1 scale, 2 sample, 3-17 filtered (see --list-methods)
  blur       blur factor for filtered methods, normally 1
  quality    0-100
  progressive 1 for progressive (line-interlaced) output, else 0

Examples:

  progressive, quality 80, blur 0.5, 300x200 thumbnail:
    -f 2592x1728+0+311+300x200+0+0.5+80+1
  baseline, quality 70, blur 1.0, 300x200 thumbnail:
    -f 2592x1728+0+311+300x200+0+1+70+0")]
#[command(version = version_string())]
struct Cli {
    /// Source image
    #[arg(required_unless_present_any = ["list_methods", "gen_config"])]
    source: Option<PathBuf>,

    /// Rendition spec used by the following -o
    #[arg(short = 'f', value_name = "SPEC", action = ArgAction::Append)]
    specs: Vec<String>,

    /// Write a rendition using the most recent -f
    #[arg(short = 'o', value_name = "OUTPUT", action = ArgAction::Append)]
    outputs: Vec<PathBuf>,

    /// TOML file with defaults for planned renditions
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// JSON crop manifest; plans one extra rendition per cropped entry
    #[arg(long, value_name = "FILE", requires = "out_dir")]
    renditions: Option<PathBuf>,

    /// Directory for renditions planned from --renditions
    #[arg(long, value_name = "DIR", requires = "renditions")]
    out_dir: Option<PathBuf>,

    /// Print the resize method codes and exit
    #[arg(long)]
    list_methods: bool,

    /// Print a stock config file with all options documented and exit
    #[arg(long)]
    gen_config: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Values of a repeated flag paired with their command-line positions.
fn indexed<T: Clone + Send + Sync + 'static>(matches: &ArgMatches, id: &str) -> Vec<(usize, T)> {
    match (matches.indices_of(id), matches.get_many::<T>(id)) {
        (Some(indices), Some(values)) => indices.zip(values.cloned()).collect(),
        _ => Vec::new(),
    }
}

fn parse_cli() -> Result<(Cli, Vec<Job>), clap::Error> {
    let matches = Cli::command().try_get_matches()?;
    let cli = Cli::from_arg_matches(&matches)?;
    let jobs = process::jobs_from_flags(
        &indexed::<String>(&matches, "specs"),
        &indexed::<PathBuf>(&matches, "outputs"),
    );
    Ok((cli, jobs))
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let (cli, jobs) = match parse_cli() {
        Ok(parsed) => parsed,
        Err(e) => {
            if e.use_stderr() {
                let _ = e.print();
                return ExitCode::from(EXIT_FATAL);
            }
            // --help / --version
            e.exit();
        }
    };
    init_tracing(cli.verbose);

    if cli.list_methods {
        output::print_method_table();
        return ExitCode::SUCCESS;
    }
    if cli.gen_config {
        print!("{}", config::stock_config_toml());
        return ExitCode::SUCCESS;
    }
    let Some(source) = cli.source.as_deref() else {
        eprintln!("Need input image path");
        let _ = Cli::command().print_help();
        return ExitCode::from(EXIT_FATAL);
    };

    match execute(&cli, source, jobs) {
        Ok(summary) => {
            output::print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

/// Load config and planned jobs, then render everything against `source`.
fn execute(cli: &Cli, source: &Path, mut jobs: Vec<Job>) -> Result<RunSummary, ProcessError> {
    let config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => RenditionConfig::default(),
    };

    if let (Some(manifest), Some(out_dir)) = (&cli.renditions, &cli.out_dir) {
        jobs.extend(plan::load_plan(manifest, &config, source, out_dir)?);
    }

    let backend = RustBackend::new();
    process::run(&backend, source, &jobs, output::print_process_event)
}
