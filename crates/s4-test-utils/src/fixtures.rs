//! Catalogue documents used across test suites.

/// A small catalogue exercising every layer.
///
/// - platform `p` supports `a64` and provides `has-feature-x`
/// - platform `p2` supports `a64` only and lacks it
/// - platform `board` has a variation `v` pinning `arm-platform`
/// - project `q` lets users set `feature-x-opt`, `release` and `board-name`
pub const SCENARIO: &str = r#"
[flag.platform]
type = "string"
variable = "PLATFORM"

[flag.architecture]
type = "string"
variable = "ARCH"

[flag.feature-x-opt]
description = "Optional feature X"
variable = "FEATURE_X_OPT"
requires = [{ has-feature-x = true }]

[flag.either]
description = "Needs one of two capabilities"
variable = "EITHER"
requires = [{ has-a = true }, { has-b = true }]

[flag.release]
variable = "RELEASE"

[flag.arm-platform]
type = "string"
variable = "ARM_PLATFORM"

[flag.board-name]
type = "string"
variable = "BOARD_NAME"

[flag.cross-compiler-prefix]
type = "string"
variable = "CROSS_COMPILER_PREFIX"

[architecture.a64]
family = "arm"
aliases = ["arm64"]
cross-compiler-prefix = "aarch64-linux-gnu-"

[architecture.a32]
family = "arm"

[platform.p]
architectures = ["a64"]
has-feature-x = true
has-a = true
board-name = "from-platform"

[platform.p2]
architectures = ["a64"]
has-b = true

[platform.board]
architectures = ["a64", "a32"]

[platform.board.variation.v]
arm-platform = "v-board"

[platform.board.variation.v32]
architecture = "a32"

[platform.board.variation.renamed]
platform = "elsewhere"

[project.q]
repository = "example/q-manifest"
root-server = "q-driver"
command-line = ["feature-x-opt", "either", "release", "board-name"]
release = true
board-name = "from-project"
cross-compiler-prefix = "project-prefix-"

[project.locked]
command-line = []
"#;

/// A user overlay replacing `p2` so it provides `has-feature-x`.
pub const P2_WITH_FEATURE_X: &str = r#"
[platform.p2]
architectures = ["a64"]
has-feature-x = true
"#;

/// Minimal `easy-settings.cmake` content.
pub const EASY_SETTINGS: &str = r#"
set(PLATFORM "p" CACHE STRING "Platform to build")
set(RELEASE OFF CACHE BOOL "Performance optimised build")
set(LibExtraThing OFF CACHE BOOL "Extra thing")
include(settings.cmake)
"#;
