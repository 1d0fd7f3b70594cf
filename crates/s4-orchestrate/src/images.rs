//! Boot images produced by a build
//!
//! The build leaves its images in `<build>/images`, named after the
//! architecture and kernel platform: `kernel-<tag>` and
//! `<root-server>-image-<tag>`. The tag uses the seL4 architecture on x86
//! (`x86_64-pc99`) and the architecture family everywhere else
//! (`arm-tx2`).

use std::fs;
use std::path::{Path, PathBuf};

use s4_catalogue::Value;
use s4_core::ResolvedConfiguration;

use crate::error::{Error, Result};

pub const IMAGES_DIR: &str = "images";

/// Image file names for one resolved configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootImages {
    tag: String,
    /// x86 boots the kernel image separately from the root server
    separate_kernel: bool,
}

impl BootImages {
    pub fn new(config: &ResolvedConfiguration) -> Self {
        let text = |flag: &str| match config.table.get(flag) {
            Some(Value::Text(text)) if !text.is_empty() => Some(text.clone()),
            _ => None,
        };
        let architecture =
            text("architecture").unwrap_or_else(|| config.selection.architecture.clone());
        let family = text("architecture-family");
        let platform =
            text("kernel-platform").unwrap_or_else(|| config.selection.platform.platform.clone());

        let separate_kernel = family.as_deref() == Some("x86");
        let prefix = match family {
            Some(family) if !separate_kernel => family,
            _ => architecture,
        };
        Self {
            tag: format!("{}-{}", prefix, platform),
            separate_kernel,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Image paths relative to `build_root`, in the order they are loaded
    ///
    /// Every image must exist. Without a declared root server, the one
    /// image in `images/` matching the tag is used.
    pub fn files(&self, build_root: &Path, root_server: Option<&str>) -> Result<Vec<PathBuf>> {
        let root_server = match root_server {
            Some(name) => name.to_string(),
            None => self.inferred_root_server(build_root)?,
        };

        let mut files = Vec::new();
        if self.separate_kernel {
            files.push(self.existing(build_root, format!("kernel-{}", self.tag))?);
        }
        files.push(self.existing(build_root, format!("{}{}", root_server, self.suffix()))?);
        Ok(files)
    }

    fn suffix(&self) -> String {
        format!("-image-{}", self.tag)
    }

    fn existing(&self, build_root: &Path, name: String) -> Result<PathBuf> {
        let relative = Path::new(IMAGES_DIR).join(name);
        if build_root.join(&relative).is_file() {
            Ok(relative)
        } else {
            Err(Error::ImageMissing {
                path: build_root.join(relative),
            })
        }
    }

    /// Root server named by the first matching image, by file name
    pub fn inferred_root_server(&self, build_root: &Path) -> Result<String> {
        let dir = build_root.join(IMAGES_DIR);
        let suffix = self.suffix();
        let not_found = || Error::NoRootServerImage {
            dir: dir.clone(),
            suffix: suffix.clone(),
        };
        if !dir.is_dir() {
            return Err(not_found());
        }

        let mut names: Vec<String> = fs::read_dir(&dir)
            .map_err(|e| Error::io(&dir, e))?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        names.sort();

        names
            .iter()
            .find_map(|name| name.strip_suffix(&suffix).filter(|s| !s.is_empty()))
            .map(str::to_string)
            .ok_or_else(not_found)
    }
}
