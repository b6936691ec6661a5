pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use commands::catalog::CatalogArgs;

#[derive(Debug, Parser)]
#[command(
    name = "goldleaf",
    about = "Goldleaf operator CLI",
    long_about = "Inspect configuration, check catalog readiness, and preview enriched catalog pricing offline.",
    after_help = "Examples:\n  goldleaf doctor --json\n  goldleaf config\n  goldleaf catalog --gold-price 70 --min-price 150"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, catalog contents, and gold price credential readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Print the enriched, filtered catalog without calling the price provider")]
    Catalog(CatalogArgs),
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Catalog(args) => commands::catalog::run(&args),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
