use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use gitversion::cli::{self, RunArgs};
use gitversion::ui::{self, OutputFormat};

#[derive(clap::Parser)]
#[command(
    name = "gitversion",
    version,
    about = "Calculate semantic versions from git history"
)]
struct Args {
    #[arg(long, default_value = ".", help = "Directory inside the repository to version")]
    target_path: PathBuf,

    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(short, long, help = "Calculate for this branch instead of HEAD")]
    branch: Option<String>,

    #[arg(long, help = "Calculate at this commit (full or abbreviated sha)")]
    commit: Option<String>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json, help = "Output format")]
    output: OutputFormat,

    #[arg(long, value_name = "NAME", help = "Print a single variable")]
    show_variable: Option<String>,

    #[arg(long, help = "Print the effective configuration and exit")]
    show_config: bool,

    #[arg(short, long, action = clap::ArgAction::Count, help = "Increase log verbosity")]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()
        .ok();
}

fn run(args: Args) -> Result<()> {
    let run_args = RunArgs {
        repo_path: args.target_path,
        config_path: args.config,
        branch: args.branch,
        commit: args.commit,
    };

    if args.show_config {
        let config = cli::effective_config(&run_args)?;
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let variables = cli::calculate_variables(&run_args)?;
    let output = match &args.show_variable {
        Some(name) => ui::render_variable(&variables, name)?,
        None => ui::render(&variables, args.output)?,
    };
    print!("{}", output);
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::display_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
