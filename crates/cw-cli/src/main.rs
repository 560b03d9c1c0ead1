//! cowrie-db - schema migrations for Cowrie honeypot databases

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod context;

use cli::{Cli, Commands, ProceduresCommands};
use commands::common::ExitCode;
use commands::{check, info, migrate, procedures, rollback};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let result = match &cli.command {
        Commands::Migrate(args) => migrate::execute(args, &cli.global),
        Commands::Check(args) => check::execute(args, &cli.global),
        Commands::Info(args) => info::execute(args, &cli.global),
        Commands::Rollback(args) => rollback::execute(args, &cli.global),
        Commands::Procedures(args) => match &args.command {
            ProceduresCommands::Install(args) => procedures::install(args, &cli.global),
            ProceduresCommands::Stats(args) => procedures::stats(args, &cli.global),
            ProceduresCommands::Process(args) => procedures::process(args, &cli.global),
            ProceduresCommands::Cleanup(args) => procedures::cleanup(args, &cli.global),
        },
    };

    if let Err(err) = result {
        if let Some(code) = err.downcast_ref::<ExitCode>() {
            std::process::exit(code.0);
        }
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins; otherwise `--verbose` selects debug and the default is
/// warnings only, keeping stdout for command output.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
