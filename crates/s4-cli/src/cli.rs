//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{ArgMatches, Args, Parser, Subcommand, ValueEnum};

use s4_core::{CommandLineSetting, PlatformChoice, Rendering, SelectionError, UnknownRendering};

/// s4 - configure and build seL4 projects
#[derive(Parser, Debug)]
#[command(name = "s4")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Extra catalogue document, applied after all others (repeatable)
    #[arg(long = "catalogue", value_name = "PATH", global = true, env = "S4_CATALOGUE")]
    pub catalogues: Vec<PathBuf>,

    /// Skip catalogue overlays in the home and config directories
    #[arg(long, global = true)]
    pub no_user_config: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Resolve a configuration and print its build variables
    ///
    /// Nothing is written and no external tool runs.
    ///
    /// Examples:
    ///   s4 resolve -p sel4test --platform tx2 --arch aarch64
    ///   s4 resolve -p sel4test --platform imx8:imx8mm-evk --arch aarch64 --enable release
    ///   s4 resolve -p sel4bench --platform pc99 --arch x86_64 --set num-nodes=4 --format json
    Resolve {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Output format
        #[arg(short, long, default_value = "cmake", value_parser = parse_rendering)]
        format: Rendering,

        /// Only emit flags that some layer assigned
        #[arg(long)]
        assigned_only: bool,
    },

    /// Inspect the merged catalogue
    Catalogue {
        #[command(subcommand)]
        action: CatalogueAction,
    },

    /// List the flags a project lets you set
    Flags {
        /// Project name (defaults to the current workspace's project)
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Create a workspace and check out a project
    Init {
        /// Project to check out
        project: String,

        /// Workspace directory (defaults to the project name)
        dir: Option<PathBuf>,

        /// Print the commands instead of running them
        #[arg(long)]
        dry_run: bool,
    },

    /// Resolve, record and generate a build directory
    ///
    /// An existing build directory keeps its recorded selection unless
    /// options here replace parts of it.
    Configure {
        /// Build directory
        build_dir: PathBuf,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Only emit flags that some layer assigned
        #[arg(long)]
        assigned_only: bool,

        /// Print the commands instead of running them
        #[arg(long)]
        dry_run: bool,
    },

    /// Build a configured build directory
    Build {
        /// Build directory (defaults to the one containing the current directory)
        build_dir: Option<PathBuf>,

        /// Target passed to ninja (repeatable)
        #[arg(short, long = "target", value_name = "TARGET")]
        targets: Vec<String>,

        /// Print the command instead of running it
        #[arg(long)]
        dry_run: bool,
    },

    /// Boot a built project on lab hardware through the machine queue
    ///
    /// Without --system every machine-queue system matching the recorded
    /// platform is tried in turn until one prints the exit phrase.
    Run {
        /// Build directory (defaults to the one containing the current directory)
        build_dir: Option<PathBuf>,

        /// Machine-queue system or pool to run on
        #[arg(short = 'S', long)]
        system: Option<String>,

        /// Print the commands instead of running them
        #[arg(long)]
        dry_run: bool,
    },

    /// Pull the latest toolchain image
    UpdateImage {
        /// Print the command instead of running it
        #[arg(long)]
        dry_run: bool,
    },
}

/// Catalogue inspection commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CatalogueAction {
    /// List entities, optionally of one kind
    List {
        kind: Option<KindArg>,
    },

    /// Show one entity as JSON
    Show {
        kind: KindArg,
        name: String,
    },

    /// Report catalogue data-quality warnings
    Lint,

    /// List the documents the catalogue is built from
    Sources,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    #[value(alias = "flag")]
    Flags,
    #[value(alias = "architecture", alias = "arch")]
    Architectures,
    #[value(alias = "platform")]
    Platforms,
    #[value(alias = "project")]
    Projects,
}

/// Project, platform, architecture and flag settings
#[derive(Args, Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionArgs {
    /// Project name
    #[arg(short, long)]
    pub project: Option<String>,

    /// Platform, optionally with a variation: PLATFORM[:VARIATION]
    #[arg(long, value_parser = parse_platform)]
    pub platform: Option<PlatformChoice>,

    /// Architecture name or alias
    #[arg(short, long = "arch")]
    pub architecture: Option<String>,

    /// Set a boolean flag to true (repeatable)
    #[arg(short, long, value_name = "FLAG")]
    pub enable: Vec<String>,

    /// Set a boolean flag to false (repeatable)
    #[arg(short, long, value_name = "FLAG")]
    pub disable: Vec<String>,

    /// Set a flag to a value (repeatable)
    #[arg(short, long, value_name = "FLAG=VALUE", value_parser = parse_setting)]
    pub set: Vec<CommandLineSetting>,
}

impl SelectionArgs {
    /// All settings in the order they were given
    ///
    /// `matches` are the subcommand's matches; clap keeps the position of
    /// every occurrence, which is what orders `--enable`, `--disable` and
    /// `--set` relative to each other.
    pub fn ordered_settings(&self, matches: Option<&ArgMatches>) -> Vec<CommandLineSetting> {
        let enable = self.enable.iter().cloned().map(CommandLineSetting::enable);
        let disable = self.disable.iter().cloned().map(CommandLineSetting::disable);

        let Some(matches) = matches else {
            return enable.chain(disable).chain(self.set.iter().cloned()).collect();
        };

        let indices = |id: &str| -> Vec<usize> {
            matches
                .indices_of(id)
                .map(|i| i.collect())
                .unwrap_or_default()
        };
        let mut positioned: Vec<(usize, CommandLineSetting)> = indices("enable")
            .into_iter()
            .zip(enable)
            .chain(indices("disable").into_iter().zip(disable))
            .chain(indices("set").into_iter().zip(self.set.iter().cloned()))
            .collect();
        positioned.sort_by_key(|(index, _)| *index);
        positioned.into_iter().map(|(_, setting)| setting).collect()
    }
}

fn parse_platform(s: &str) -> Result<PlatformChoice, SelectionError> {
    s.parse()
}

fn parse_setting(s: &str) -> Result<CommandLineSetting, SelectionError> {
    CommandLineSetting::parse_assignment(s)
}

fn parse_rendering(s: &str) -> Result<Rendering, UnknownRendering> {
    s.parse()
}
