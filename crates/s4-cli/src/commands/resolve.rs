//! Resolve command implementation

use clap::ArgMatches;

use s4_core::{EmitPolicy, Rendering, configure};

use super::{Environment, new_selection, print_warnings};
use crate::cli::SelectionArgs;
use crate::error::Result;

/// Run the resolve command
pub fn run_resolve(
    env: &Environment,
    args: &SelectionArgs,
    matches: Option<&ArgMatches>,
    format: Rendering,
    assigned_only: bool,
) -> Result<()> {
    let catalogue = env.catalogue()?;
    let project = env.workspace().map(|w| w.project());
    let selection = new_selection(args, args.ordered_settings(matches), project)?;

    let policy = if assigned_only {
        EmitPolicy::AssignedOnly
    } else {
        EmitPolicy::AllMapped
    };
    let config = configure(&catalogue, &selection, policy)?;
    print_warnings(&config.warnings);

    let output = config
        .variables
        .render(format)
        .map_err(s4_core::Error::from)?;
    if output.ends_with('\n') {
        print!("{}", output);
    } else {
        println!("{}", output);
    }
    tracing::debug!(fingerprint = %config.fingerprint(), "Resolved");
    Ok(())
}
