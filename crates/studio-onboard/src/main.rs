mod commands;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use studio_onboard_config::Overrides;
use studio_onboard_core::OnboardError;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "studio-onboard")]
#[command(
    about = "Set up an AI Studio service account and write its API key to .env",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    provision: ProvisionArgs,

    /// Show more diagnostics on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Find or create the service account, grant the role and write a new API key (default)
    Provision(ProvisionArgs),
    /// Show the folder id and API key stored in the env file
    Show {
        /// Env file to read (default: output_path from settings, `.env`)
        #[arg(short, long, env = "STUDIO_ONBOARD_OUTPUT")]
        output: Option<PathBuf>,
        /// Print the API key instead of a placeholder
        #[arg(long)]
        reveal: bool,
        /// Settings file
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Show version information
    Version,
}

#[derive(Args, Debug, Default, Clone)]
struct ProvisionArgs {
    /// Service account name (default: ai-studio-sa)
    #[arg(long, env = "STUDIO_ONBOARD_SERVICE_ACCOUNT")]
    service_account_name: Option<String>,

    /// Role granted on the folder (default: ai.editor)
    #[arg(long, env = "STUDIO_ONBOARD_ROLE")]
    role: Option<String>,

    /// Env file to write (default: .env)
    #[arg(short, long, env = "STUDIO_ONBOARD_OUTPUT")]
    output: Option<PathBuf>,

    /// yc binary name or path (default: yc)
    #[arg(long = "yc", env = "STUDIO_ONBOARD_YC")]
    yc: Option<String>,

    /// yc profile (default: the active profile)
    #[arg(long, env = "STUDIO_ONBOARD_PROFILE")]
    profile: Option<String>,

    /// Timeout in seconds for each yc call (default: 30)
    #[arg(long, env = "STUDIO_ONBOARD_TIMEOUT")]
    timeout: Option<u64>,

    /// Settings file (default: ./studio-onboard.yaml or ~/.config/studio-onboard/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl ProvisionArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            service_account_name: self.service_account_name.clone(),
            role: self.role.clone(),
            output_path: self.output.clone(),
            yc_program: self.yc.clone(),
            profile: self.profile.clone(),
            timeout_secs: self.timeout,
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // stdout carries the step output, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        None => commands::provision::handle(&cli.provision).await,
        Some(Commands::Provision(args)) => commands::provision::handle(&args).await,
        Some(Commands::Show {
            output,
            reveal,
            config,
        }) => commands::show::handle(output, reveal, config.as_deref()),
        Some(Commands::Version) => {
            println!("studio-onboard {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("{} {}", "Error:".red().bold(), e);
            let code = e
                .downcast_ref::<OnboardError>()
                .map(OnboardError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}
