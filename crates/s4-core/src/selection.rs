//! What a user asked to build
//!
//! A [`Selection`] names a project, a platform (optionally narrowed to a
//! variation) and an architecture, plus the ordered command-line settings.
//! It is plain data: nothing is checked against a catalogue until
//! [`resolve`](crate::resolve) runs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SelectionError;

/// Platform chosen on the command line, written `platform[:variation]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlatformChoice {
    pub platform: String,
    pub variation: Option<String>,
}

impl PlatformChoice {
    pub fn platform(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            variation: None,
        }
    }

    pub fn variation(platform: impl Into<String>, variation: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            variation: Some(variation.into()),
        }
    }
}

impl FromStr for PlatformChoice {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason| SelectionError::Malformed {
            what: "platform choice",
            input: s.to_string(),
            reason,
        };
        match s.split(':').collect::<Vec<_>>().as_slice() {
            [platform] if !platform.is_empty() => Ok(Self::platform(*platform)),
            [platform, variation] if !platform.is_empty() && !variation.is_empty() => {
                Ok(Self::variation(*platform, *variation))
            }
            [_] | [_, _] => Err(malformed("empty platform or variation name")),
            _ => Err(malformed("expected 'platform' or 'platform:variation'")),
        }
    }
}

impl TryFrom<String> for PlatformChoice {
    type Error = SelectionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PlatformChoice> for String {
    fn from(choice: PlatformChoice) -> Self {
        choice.to_string()
    }
}

impl fmt::Display for PlatformChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.variation {
            Some(variation) => write!(f, "{}:{}", self.platform, variation),
            None => write!(f, "{}", self.platform),
        }
    }
}

/// One explicit user setting for a command-line-eligible flag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum CommandLineSetting {
    /// Boolean flag to `true`
    Enable { flag: String },
    /// Boolean flag to `false`
    Disable { flag: String },
    /// Any flag to a literal parsed against its type
    Set { flag: String, value: String },
}

impl CommandLineSetting {
    pub fn enable(flag: impl Into<String>) -> Self {
        Self::Enable { flag: flag.into() }
    }

    pub fn disable(flag: impl Into<String>) -> Self {
        Self::Disable { flag: flag.into() }
    }

    pub fn set(flag: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Set {
            flag: flag.into(),
            value: value.into(),
        }
    }

    pub fn flag(&self) -> &str {
        match self {
            Self::Enable { flag } | Self::Disable { flag } | Self::Set { flag, .. } => flag,
        }
    }

    /// Parse the `flag=value` form used by `--set`
    pub fn parse_assignment(s: &str) -> Result<Self, SelectionError> {
        match s.split_once('=') {
            Some((flag, value)) if !flag.trim().is_empty() => Ok(Self::set(flag.trim(), value)),
            _ => Err(SelectionError::Malformed {
                what: "setting",
                input: s.to_string(),
                reason: "expected 'flag=value'",
            }),
        }
    }
}

impl fmt::Display for CommandLineSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enable { flag } => write!(f, "--enable {}", flag),
            Self::Disable { flag } => write!(f, "--disable {}", flag),
            Self::Set { flag, value } => write!(f, "--set {}={}", flag, value),
        }
    }
}

/// Everything needed to resolve one build configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Selection {
    pub project: String,
    pub platform: PlatformChoice,
    pub architecture: String,
    /// Applied in order; a later setting for the same flag wins
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub settings: Vec<CommandLineSetting>,
}

impl Selection {
    pub fn new(
        project: impl Into<String>,
        platform: PlatformChoice,
        architecture: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            platform,
            architecture: architecture.into(),
            settings: Vec::new(),
        }
    }

    pub fn with_setting(mut self, setting: CommandLineSetting) -> Self {
        self.settings.push(setting);
        self
    }

    pub fn enable(self, flag: impl Into<String>) -> Self {
        self.with_setting(CommandLineSetting::enable(flag))
    }

    pub fn disable(self, flag: impl Into<String>) -> Self {
        self.with_setting(CommandLineSetting::disable(flag))
    }

    pub fn set(self, flag: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_setting(CommandLineSetting::set(flag, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("tx2", PlatformChoice::platform("tx2"))]
    #[case("imx8:imx8mm-evk", PlatformChoice::variation("imx8", "imx8mm-evk"))]
    fn test_platform_choice_parse(#[case] input: &str, #[case] expected: PlatformChoice) {
        let parsed: PlatformChoice = input.parse().unwrap();
        assert_eq!(parsed, expected);
        assert_eq!(parsed.to_string(), input);
    }

    #[rstest]
    #[case("")]
    #[case("imx8:")]
    #[case(":v")]
    #[case("a:b:c")]
    fn test_platform_choice_malformed(#[case] input: &str) {
        assert!(matches!(
            input.parse::<PlatformChoice>(),
            Err(SelectionError::Malformed { .. })
        ));
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            CommandLineSetting::parse_assignment("num-nodes=4").unwrap(),
            CommandLineSetting::set("num-nodes", "4")
        );
        // Only the first `=` separates
        assert_eq!(
            CommandLineSetting::parse_assignment("extra=a=b").unwrap(),
            CommandLineSetting::set("extra", "a=b")
        );
        assert!(CommandLineSetting::parse_assignment("novalue").is_err());
        assert!(CommandLineSetting::parse_assignment("=x").is_err());
    }

    #[test]
    fn test_selection_toml_form() {
        let selection = Selection::new("sel4test", PlatformChoice::variation("imx8", "imx8mm-evk"), "aarch64")
            .enable("release")
            .set("num-nodes", "4");
        let text = toml::to_string(&selection).unwrap();
        assert!(text.contains("platform = \"imx8:imx8mm-evk\""));
        let back: Selection = toml::from_str(&text).unwrap();
        assert_eq!(back, selection);
    }
}
