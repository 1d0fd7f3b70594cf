//! Catalogue inspection commands

use colored::Colorize;
use serde::Serialize;

use s4_catalogue::{Catalogue, WarnLevel};
use s4_core::SelectionError;

use super::Environment;
use crate::cli::{CatalogueAction, KindArg};
use crate::error::{CliError, Result};

/// Run a catalogue subcommand
pub fn run_catalogue(env: &Environment, action: &CatalogueAction) -> Result<()> {
    match action {
        CatalogueAction::Sources => {
            let root = env.workspace().map(|w| w.root());
            for source in env.loader(root).sources() {
                println!("{}", source);
            }
            Ok(())
        }
        CatalogueAction::List { kind } => {
            let catalogue = env.catalogue()?;
            match kind {
                Some(kind) => list(&catalogue, *kind),
                None => {
                    for kind in [
                        KindArg::Flags,
                        KindArg::Architectures,
                        KindArg::Platforms,
                        KindArg::Projects,
                    ] {
                        println!("{}", heading(kind).bold());
                        list(&catalogue, kind);
                        println!();
                    }
                }
            }
            Ok(())
        }
        CatalogueAction::Show { kind, name } => show(&env.catalogue()?, *kind, name),
        CatalogueAction::Lint => {
            let catalogue = env.catalogue()?;
            let warnings = catalogue.warnings();
            if warnings.is_empty() {
                println!("{} No catalogue warnings", "✓".green());
                return Ok(());
            }
            for warning in warnings {
                let level = match warning.level {
                    WarnLevel::Warning => warning.level.to_string().yellow(),
                    WarnLevel::Info => warning.level.to_string().blue(),
                };
                match &warning.entity {
                    Some(entity) => println!("{} [{}] {}", level, entity.cyan(), warning.message),
                    None => println!("{} {}", level, warning.message),
                }
            }
            Ok(())
        }
    }
}

fn heading(kind: KindArg) -> &'static str {
    match kind {
        KindArg::Flags => "Flags",
        KindArg::Architectures => "Architectures",
        KindArg::Platforms => "Platforms",
        KindArg::Projects => "Projects",
    }
}

fn list(catalogue: &Catalogue, kind: KindArg) {
    match kind {
        KindArg::Flags => {
            for flag in catalogue.flags() {
                println!(
                    "  {:<32} {:<8} {}",
                    flag.name.cyan(),
                    flag.flag_type,
                    flag.variable.as_deref().unwrap_or("-").dimmed()
                );
            }
        }
        KindArg::Architectures => {
            for arch in catalogue.architectures() {
                let mut line = format!("  {}", arch.name.cyan());
                if let Some(family) = &arch.family {
                    line.push_str(&format!(" ({})", family));
                }
                if !arch.aliases.is_empty() {
                    line.push_str(&format!(" aka {}", arch.aliases.join(", ")));
                }
                println!("{}", line);
            }
        }
        KindArg::Platforms => {
            for platform in catalogue.platforms() {
                println!(
                    "  {:<24} [{}]",
                    platform.name.cyan(),
                    platform.architectures.join(", ")
                );
                for variation in &platform.variations {
                    println!("    {}:{}", platform.name, variation.name);
                }
            }
        }
        KindArg::Projects => {
            for project in catalogue.projects() {
                let repository = project
                    .repository
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "-".into());
                println!("  {:<24} {}", project.name.cyan(), repository.dimmed());
            }
        }
    }
}

fn show(catalogue: &Catalogue, kind: KindArg, name: &str) -> Result<()> {
    match kind {
        KindArg::Flags => print_json(catalogue.flag(name).ok_or_else(|| {
            CliError::from(SelectionError::UnknownFlag { flag: name.into() })
        })?),
        KindArg::Architectures => print_json(catalogue.architecture(name).ok_or_else(|| {
            CliError::from(SelectionError::UnknownArchitecture {
                architecture: name.into(),
            })
        })?),
        KindArg::Platforms => print_json(catalogue.platform(name).ok_or_else(|| {
            CliError::from(SelectionError::UnknownPlatform {
                platform: name.into(),
            })
        })?),
        KindArg::Projects => print_json(catalogue.project(name).ok_or_else(|| {
            CliError::from(SelectionError::UnknownProject {
                project: name.into(),
            })
        })?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(s4_core::Error::from)?;
    println!("{}", json);
    Ok(())
}

/// List the flags a project accepts on the command line with their defaults
pub fn run_flags(env: &Environment, project: Option<&str>) -> Result<()> {
    let catalogue = env.catalogue()?;
    let name = project
        .or_else(|| env.workspace().map(|w| w.project()))
        .ok_or(CliError::MissingOption {
            option: "project",
            purpose: "choose whose flags to list",
        })?;
    let project = catalogue
        .project(name)
        .ok_or_else(|| SelectionError::UnknownProject {
            project: name.into(),
        })?;

    println!("Flags for project {}:", project.name.bold());
    if project.command_line.is_empty() {
        println!("  (none)");
    }
    for name in &project.command_line {
        let Some(flag) = catalogue.flag(name) else {
            println!("  {:<32} {}", name.cyan(), "undeclared".yellow());
            continue;
        };
        let default = project
            .overlay
            .get(name)
            .cloned()
            .unwrap_or_else(|| flag.implicit_default());
        println!(
            "  {:<32} {:<8} default {:<10} {}",
            flag.name.cyan(),
            flag.flag_type,
            default.to_string(),
            flag.description.dimmed()
        );
    }
    Ok(())
}
