//! Smartplate CLI entry point

use std::process::ExitCode;

use clap::Parser;

use smartplate::cli::Commands;
use smartplate::commands::{init_logging, run_check, run_db, run_serve};
use smartplate::{Cli, SmartplateConfig};

fn main() -> ExitCode {
    match run() {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

fn run() -> smartplate::Result<String> {
    let cli = Cli::parse();
    let config = SmartplateConfig::load(cli.config.as_deref())?;
    init_logging(&config, cli.verbose);

    match &cli.command {
        Commands::Serve(args) => run_serve(args, config),
        Commands::Check(args) => run_check(args, config),
        Commands::Db(args) => run_db(args, config),
    }
}
