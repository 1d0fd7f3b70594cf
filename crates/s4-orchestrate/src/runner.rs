//! Running external programs
//!
//! Everything s4 hands to an external tool is first built as a plain
//! [`Invocation`]. A [`CommandRunner`] then decides what happens to it:
//! [`ProcessRunner`] spawns it, [`RecordingRunner`] only remembers it, which
//! is how `--dry-run` and the tests see the plan.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// A program with arguments and an optional working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Short program name used in messages
    pub fn name(&self) -> String {
        self.program
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        command
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(cwd) = &self.cwd {
            write!(f, "(cd {} && ", quote(&cwd.display().to_string()))?;
        }
        write!(f, "{}", quote(&self.program.display().to_string()))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        if self.cwd.is_some() {
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// Single-quote an argument for display when a shell would split it
fn quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,@+%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Executes invocations
pub trait CommandRunner {
    /// Run with inherited stdio and fail on a non-zero exit
    fn run(&self, invocation: &Invocation) -> Result<()>;

    /// Run and return standard output
    fn capture(&self, invocation: &Invocation) -> Result<String>;
}

/// Spawns real processes
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        tracing::info!(command = %invocation, "Running");
        let status = invocation
            .command()
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| Error::Spawn {
                program: invocation.name(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::ToolFailed {
                program: invocation.name(),
                code: status.code(),
            })
        }
    }

    fn capture(&self, invocation: &Invocation) -> Result<String> {
        tracing::debug!(command = %invocation, "Capturing output");
        let output = invocation
            .command()
            .stdin(Stdio::null())
            .output()
            .map_err(|source| Error::Spawn {
                program: invocation.name(),
                source,
            })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(Error::ToolFailed {
                program: invocation.name(),
                code: output.status.code(),
            })
        }
    }
}

/// Records invocations instead of running them
///
/// `capture` answers with queued responses in order, then with an empty string.
/// `run` succeeds unless failures were queued with [`fail_runs`](Self::fail_runs).
#[derive(Debug, Default)]
pub struct RecordingRunner {
    recorded: RefCell<Vec<Invocation>>,
    responses: RefCell<VecDeque<String>>,
    failures: RefCell<usize>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the output of the next `capture`
    pub fn respond(self, output: impl Into<String>) -> Self {
        self.responses.borrow_mut().push_back(output.into());
        self
    }

    /// Make the next `count` runs report exit status 1
    pub fn fail_runs(self, count: usize) -> Self {
        *self.failures.borrow_mut() += count;
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.recorded.borrow().clone()
    }

    /// Whether any recorded invocation ran `program`
    pub fn ran(&self, program: &str) -> bool {
        self.recorded
            .borrow()
            .iter()
            .any(|i| i.name() == program || i.program == Path::new(program))
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        self.recorded.borrow_mut().push(invocation.clone());
        let mut failures = self.failures.borrow_mut();
        if *failures > 0 {
            *failures -= 1;
            return Err(Error::ToolFailed {
                program: invocation.name(),
                code: Some(1),
            });
        }
        Ok(())
    }

    fn capture(&self, invocation: &Invocation) -> Result<String> {
        self.recorded.borrow_mut().push(invocation.clone());
        Ok(self.responses.borrow_mut().pop_front().unwrap_or_default())
    }
}
