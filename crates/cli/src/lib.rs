pub mod commands;
pub mod logging;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use vitrine_core::config::{AppConfig, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "vitrine",
    about = "Vitrine recommendation operator CLI",
    long_about = "Prepare the catalog database, load demo data, inspect configuration, and request personalized recommendations.",
    after_help = "Examples:\n  vitrine migrate\n  vitrine seed\n  vitrine recommend --user 5e3d0000-0000-4000-8000-000100000000 --limit 5\n  vitrine config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo catalog, shoppers, and purchase history")]
    Seed,
    #[command(about = "Rank products for one user and print them as JSON")]
    Recommend {
        #[arg(long, help = "User id (UUID)")]
        user: String,
        #[arg(
            long,
            allow_negative_numbers = true,
            help = "Maximum number of products (defaults to recommendation.default_limit)"
        )]
        limit: Option<i64>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // Commands report configuration problems themselves; logging just stays off.
    if let Ok(config) = AppConfig::load(LoadOptions::default()) {
        if let Err(error) = logging::init_logging(&config.logging) {
            eprintln!("{error:#}");
        }
    }

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Recommend { user, limit } => commands::recommend::run(&user, limit),
        Command::Config => commands::config::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn recommend_accepts_negative_limit_for_engine_validation() {
        let cli = Cli::try_parse_from([
            "vitrine",
            "recommend",
            "--user",
            "5e3d0000-0000-4000-8000-000100000000",
            "--limit",
            "-1",
        ])
        .expect("parse");

        assert!(matches!(cli.command, Command::Recommend { limit: Some(-1), .. }));
    }

    #[test]
    fn recommend_requires_user() {
        assert!(Cli::try_parse_from(["vitrine", "recommend"]).is_err());
    }
}
