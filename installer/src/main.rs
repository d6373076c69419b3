use clap::{Parser, Subcommand};
use std::process::ExitCode;

use install_wizard::config::Settings;

#[derive(Parser)]
#[command(name = "install-wizard")]
#[command(about = "Multi-step installation wizard (terminal or web)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Render a single frame of step N into an in-memory terminal and exit
    #[arg(
        long,
        value_name = "N",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "1"
    )]
    tui_smoke: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the installation interactively in this terminal (default)
    Cli,

    /// Serve the installation wizard over HTTP
    Web {
        /// Address to bind, overriding the configuration
        #[arg(long)]
        bind: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.print_config {
        return match settings.to_toml() {
            Ok(rendered) => {
                print!("{}", rendered);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{:#}", e);
                ExitCode::FAILURE
            }
        };
    }

    if let Some(step) = cli.tui_smoke {
        return install_wizard::run_tui_smoke(&settings, step);
    }

    match cli.command.unwrap_or(Commands::Cli) {
        Commands::Cli => install_wizard::run_cli(&settings),
        Commands::Web { bind } => {
            if let Some(bind) = bind {
                settings.web.bind = bind;
            }
            install_wizard::run_web(&settings)
        }
    }
}
