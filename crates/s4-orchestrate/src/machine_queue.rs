//! Running boot images on lab hardware with the machine queue (`mq.sh`)
//!
//! `mq.sh system-tsv` lists the systems with a heading row; the
//! `sel4_plat` column names the platform a system boots, written
//! `platform[:variation]`. `mq.sh pool-tsv` lists one pool per line: its
//! name followed by its member systems. A pool whose members all match a
//! platform is tried before the individual systems.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use s4_core::PlatformChoice;

use crate::error::Result;
use crate::runner::Invocation;
use crate::tools::Toolbox;

/// A system the machine queue can boot images on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareSystem {
    pub name: String,
    pub target: PlatformChoice,
}

/// `mq.sh system-tsv`
pub fn systems_query(toolbox: &Toolbox) -> Result<Invocation> {
    Ok(toolbox.machine_queue()?.arg("system-tsv"))
}

/// `mq.sh pool-tsv`
pub fn pools_query(toolbox: &Toolbox) -> Result<Invocation> {
    Ok(toolbox.machine_queue()?.arg("pool-tsv"))
}

/// Systems listed in `system-tsv` output, sorted by name
///
/// Rows without a name or platform are skipped.
pub fn parse_systems(tsv: &str) -> Vec<HardwareSystem> {
    let mut lines = tsv.lines();
    let Some(headings) = lines.next() else {
        return Vec::new();
    };
    let headings: Vec<&str> = headings.split('\t').map(str::trim).collect();

    let mut systems: Vec<HardwareSystem> = lines
        .filter_map(|line| {
            let fields: BTreeMap<&str, &str> = headings
                .iter()
                .copied()
                .zip(line.split('\t').map(str::trim))
                .collect();
            let name = fields.get("name").filter(|n| !n.is_empty())?;
            let target = fields.get("sel4_plat")?.parse().ok()?;
            Some(HardwareSystem {
                name: name.to_string(),
                target,
            })
        })
        .collect();
    systems.sort_by(|a, b| a.name.cmp(&b.name));
    systems
}

/// Pools listed in `pool-tsv` output, with their member systems
pub fn parse_pools(tsv: &str) -> BTreeMap<String, BTreeSet<String>> {
    tsv.lines()
        .filter_map(|line| {
            let mut fields = line.trim().split('\t').map(str::trim);
            let name = fields.next().filter(|n| !n.is_empty())?;
            Some((name.to_string(), fields.map(str::to_string).collect()))
        })
        .collect()
}

/// Systems able to boot `target`, in the order to try them
///
/// Without a variation every variation of the platform matches. Pools made
/// up only of matching systems come first.
pub fn matching_systems(
    systems: &[HardwareSystem],
    pools: &BTreeMap<String, BTreeSet<String>>,
    target: &PlatformChoice,
) -> Vec<String> {
    let matched: BTreeSet<String> = systems
        .iter()
        .filter(|system| {
            system.target.platform == target.platform
                && (target.variation.is_none() || target.variation == system.target.variation)
        })
        .map(|system| system.name.clone())
        .collect();

    let pools = pools
        .iter()
        .filter(|(_, members)| !members.is_empty() && members.is_subset(&matched))
        .map(|(name, _)| name.clone());
    pools.chain(matched.iter().cloned()).collect()
}

/// `mq.sh run` for one system, run in the build directory
///
/// `images` are relative to `build_root`; the run succeeds once the
/// console prints `exit_phrase`.
pub fn run(
    toolbox: &Toolbox,
    system: &str,
    exit_phrase: &str,
    images: &[PathBuf],
    build_root: &Path,
) -> Result<Invocation> {
    let mut invocation = toolbox
        .machine_queue()?
        .arg("run")
        .arg("-c")
        .arg(exit_phrase)
        .arg("-s")
        .arg(system);
    for image in images {
        invocation = invocation.arg("-f").arg(image.display().to_string());
    }
    Ok(invocation.current_dir(build_root))
}
