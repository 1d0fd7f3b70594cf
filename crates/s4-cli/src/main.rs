//! s4 CLI
//!
//! Resolves seL4 build configurations and drives checkout, configuration
//! and builds inside the toolchain container.

mod cli;
mod commands;
mod error;

use clap::error::ErrorKind;
use clap::{ArgMatches, CommandFactory, FromArgMatches};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::Environment;
use error::{Result, exit_code};

fn main() {
    let matches = match Cli::command().try_get_matches() {
        Ok(matches) => matches,
        Err(e) => usage_error(e),
    };
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(e) => usage_error(e),
    };

    init_tracing(cli.verbose);

    if let Err(e) = run(cli, &matches) {
        e.report();
        std::process::exit(e.exit_code());
    }
}

/// Print a clap error and exit, keeping help and version on status 0
///
/// A rejected `--platform` or `--set` value is a selection error; any other
/// usage mistake is a general failure.
fn usage_error(e: clap::Error) -> ! {
    if !e.use_stderr() {
        e.exit();
    }
    let code = match e.kind() {
        ErrorKind::ValueValidation => exit_code::SELECTION,
        _ => exit_code::GENERAL,
    };
    let _ = e.print();
    std::process::exit(code);
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .try_init();
    tracing::debug!("Verbose mode enabled");
}

fn run(cli: Cli, matches: &ArgMatches) -> Result<()> {
    let env = Environment::discover(cli.catalogues, cli.no_user_config)?;

    match &cli.command {
        Commands::Resolve {
            selection,
            format,
            assigned_only,
        } => commands::run_resolve(
            &env,
            selection,
            matches.subcommand_matches("resolve"),
            *format,
            *assigned_only,
        ),
        Commands::Catalogue { action } => commands::run_catalogue(&env, action),
        Commands::Flags { project } => commands::run_flags(&env, project.as_deref()),
        Commands::Init {
            project,
            dir,
            dry_run,
        } => commands::run_init(&env, project, dir.as_deref(), *dry_run),
        Commands::Configure {
            build_dir,
            selection,
            assigned_only,
            dry_run,
        } => commands::run_configure(
            &env,
            build_dir,
            selection,
            matches.subcommand_matches("configure"),
            *assigned_only,
            *dry_run,
        ),
        Commands::Build {
            build_dir,
            targets,
            dry_run,
        } => commands::run_build(&env, build_dir.as_deref(), targets, *dry_run),
        Commands::Run {
            build_dir,
            system,
            dry_run,
        } => commands::run_hardware(&env, build_dir.as_deref(), system.as_deref(), *dry_run),
        Commands::UpdateImage { dry_run } => commands::run_update_image(&env, *dry_run),
    }
}
