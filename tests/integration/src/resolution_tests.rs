//! Cross-crate resolution tests against the built-in catalogue
//!
//! Each module covers one property of the load → resolve → validate → emit
//! pipeline, using the catalogue that ships with s4 plus small overlays.

use s4_catalogue::{Catalogue, CatalogueLoader, Document, Value, load};
use s4_core::{
    EmitPolicy, Error, PlatformChoice, ResolvedConfiguration, Selection, SelectionError,
    configure,
};
use s4_test_utils::fixtures;

fn builtin() -> Catalogue {
    CatalogueLoader::new().with_builtin().load().unwrap()
}

fn with_overlay(overlay: &str) -> Catalogue {
    CatalogueLoader::new()
        .with_builtin()
        .inline("overlay", overlay)
        .load()
        .unwrap()
}

fn scenario() -> Catalogue {
    load(vec![Document::from_toml_str("scenario", fixtures::SCENARIO).unwrap()]).unwrap()
}

fn resolve(catalogue: &Catalogue, selection: &Selection) -> ResolvedConfiguration {
    configure(catalogue, selection, EmitPolicy::AllMapped).unwrap()
}

fn violations(catalogue: &Catalogue, selection: &Selection) -> Vec<String> {
    match configure(catalogue, selection, EmitPolicy::AllMapped) {
        Err(Error::Requirements(violations)) => violations.into_iter().map(|v| v.flag).collect(),
        other => panic!("expected requirement violations, got {:?}", other),
    }
}

fn selection_error(catalogue: &Catalogue, selection: &Selection) -> SelectionError {
    match configure(catalogue, selection, EmitPolicy::AllMapped) {
        Err(Error::Selection(e)) => e,
        other => panic!("expected a selection error, got {:?}", other),
    }
}

mod determinism {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn repeated_resolution_is_byte_identical() {
        let selection = Selection::new("sel4test", PlatformChoice::platform("pc99"), "x86_64")
            .enable("smp")
            .set("num-nodes", "4")
            .enable("release");

        let first = resolve(&builtin(), &selection);
        let second = resolve(&builtin(), &selection);

        assert_eq!(first.variables.definitions(), second.variables.definitions());
        assert_eq!(first.variables.cache_script(), second.variables.cache_script());
        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn emission_follows_declaration_order() {
        let catalogue = builtin();
        let config = resolve(
            &catalogue,
            &Selection::new("sel4test", PlatformChoice::platform("tx2"), "aarch64"),
        );

        let declared: Vec<&str> = catalogue
            .flags()
            .iter()
            .filter_map(|f| f.variable.as_deref())
            .collect();
        let emitted: Vec<&str> = config.variables.iter().map(|v| v.variable.as_str()).collect();
        assert_eq!(emitted, declared);
    }

    #[test]
    fn different_settings_change_the_fingerprint() {
        let base = Selection::new("sel4test", PlatformChoice::platform("pc99"), "x86_64");
        let plain = resolve(&builtin(), &base);
        let release = resolve(&builtin(), &base.clone().enable("release"));
        assert_ne!(plain.fingerprint(), release.fingerprint());
    }
}

mod precedence {
    use super::*;
    use pretty_assertions::assert_eq;

    const PC99_WITHOUT_RELEASE: &str = r#"
[[platform]]
name = "pc99"
architectures = ["x86_64", "ia32"]
has-simulator = true
has-smp = true
release = false
"#;

    #[test]
    fn platform_beats_project_default() {
        let catalogue = with_overlay(PC99_WITHOUT_RELEASE);
        let config = resolve(
            &catalogue,
            &Selection::new("sel4bench", PlatformChoice::platform("pc99"), "x86_64"),
        );
        assert_eq!(config.variables.get("RELEASE"), Some(&Value::Boolean(false)));
        assert!(config.warnings.iter().any(|w| w.flag == "release"));
    }

    #[test]
    fn project_default_fills_gaps() {
        let config = resolve(
            &builtin(),
            &Selection::new("sel4bench", PlatformChoice::platform("pc99"), "x86_64"),
        );
        assert_eq!(config.variables.get("RELEASE"), Some(&Value::Boolean(true)));
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn command_line_beats_everything() {
        let catalogue = with_overlay(PC99_WITHOUT_RELEASE);
        let config = resolve(
            &catalogue,
            &Selection::new("sel4bench", PlatformChoice::platform("pc99"), "x86_64")
                .enable("release"),
        );
        assert_eq!(config.variables.get("RELEASE"), Some(&Value::Boolean(true)));

        let camkes = resolve(
            &builtin(),
            &Selection::new("camkes", PlatformChoice::platform("pc99"), "x86_64")
                .set("camkes-app", "hello"),
        );
        assert_eq!(camkes.variables.get("CAMKES_APP"), Some(&Value::from("hello")));
    }

    #[test]
    fn variation_overrides_platform() {
        let config = resolve(
            &builtin(),
            &Selection::new(
                "sel4test",
                PlatformChoice::variation("qemu-arm-virt", "cortex-a57"),
                "aarch64",
            ),
        );
        assert_eq!(config.variables.get("ARM_CPU"), Some(&Value::from("cortex-a57")));
        assert_eq!(config.variables.get("PLATFORM"), Some(&Value::from("cortex-a57")));
        assert_eq!(
            config.variables.get("KernelPlatform"),
            Some(&Value::from("qemu-arm-virt"))
        );
    }

    #[test]
    fn later_document_replaces_entity_whole() {
        // The replacement drops has-smp, so smp is no longer supported on tx2
        let catalogue = with_overlay(
            r#"
[platform.tx2]
architectures = ["aarch64"]
has-mcs = true
"#,
        );
        let selection =
            Selection::new("sel4test", PlatformChoice::platform("tx2"), "aarch64").enable("smp");
        assert_eq!(violations(&catalogue, &selection), vec!["smp"]);
    }
}

mod requirements {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn either_requirement_set_suffices() {
        // hypervisor: arm with has-hypervisor, or x86 with has-vtx
        let arm = Selection::new("sel4test", PlatformChoice::platform("tx2"), "aarch64")
            .enable("hypervisor");
        let x86 = Selection::new("sel4test", PlatformChoice::platform("pc99"), "x86_64")
            .enable("hypervisor");
        assert!(configure(&builtin(), &arm, EmitPolicy::AllMapped).is_ok());
        assert!(configure(&builtin(), &x86, EmitPolicy::AllMapped).is_ok());

        let neither = Selection::new("sel4test", PlatformChoice::platform("odroidc2"), "aarch64")
            .enable("hypervisor");
        assert_eq!(violations(&builtin(), &neither), vec!["hypervisor"]);
    }

    #[test]
    fn all_violations_in_declaration_order() {
        let selection = Selection::new("sel4test", PlatformChoice::platform("odroidc2"), "aarch64")
            .enable("hypervisor")
            .enable("smp")
            .enable("simulation");
        assert_eq!(
            violations(&builtin(), &selection),
            vec!["simulation", "smp", "hypervisor"]
        );
    }

    #[test]
    fn requirement_on_another_enabled_flag() {
        let without_smp = Selection::new("sel4test", PlatformChoice::platform("pc99"), "x86_64")
            .set("num-nodes", "4");
        assert_eq!(violations(&builtin(), &without_smp), vec!["num-nodes"]);

        let with_smp = without_smp.enable("smp");
        let config = resolve(&builtin(), &with_smp);
        assert_eq!(config.variables.get("KernelMaxNumNodes"), Some(&Value::from("4")));
    }

    #[test]
    fn disabling_a_gated_flag_is_always_valid() {
        let selection = Selection::new("sel4test", PlatformChoice::platform("odroidc2"), "aarch64")
            .disable("simulation")
            .disable("smp");
        assert!(configure(&builtin(), &selection, EmitPolicy::AllMapped).is_ok());
    }
}

mod eligibility {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::enable(Selection::new("sel4test", PlatformChoice::platform("pc99"), "x86_64").enable("camkes-app"))]
    #[case::disable(Selection::new("sel4test", PlatformChoice::platform("pc99"), "x86_64").disable("arm"))]
    #[case::set(Selection::new("sel4test", PlatformChoice::platform("pc99"), "x86_64").set("camkes-app", "adder"))]
    #[case::derived(Selection::new("sel4test", PlatformChoice::platform("pc99"), "x86_64").set("platform", "tx2"))]
    fn ineligible_flags_are_rejected(#[case] selection: Selection) {
        assert!(matches!(
            selection_error(&builtin(), &selection),
            SelectionError::IneligibleCommandLineFlag { .. }
        ));
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let selection = Selection::new("sel4test", PlatformChoice::platform("pc99"), "x86_64")
            .enable("warp-drive");
        assert_eq!(
            selection_error(&builtin(), &selection),
            SelectionError::UnknownFlag {
                flag: "warp-drive".into()
            }
        );
    }

    #[test]
    fn string_flag_cannot_be_enabled() {
        let selection = Selection::new("sel4test", PlatformChoice::platform("pc99"), "x86_64")
            .enable("num-nodes");
        assert!(matches!(
            selection_error(&builtin(), &selection),
            SelectionError::CommandLineTypeMismatch { .. }
        ));
    }
}

mod compatibility {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("tx2", None, "riscv64")]
    #[case("spike", None, "aarch64")]
    #[case("qemu-arm-virt", Some("cortex-a15"), "aarch64")]
    fn unsupported_architecture_is_rejected(
        #[case] platform: &str,
        #[case] variation: Option<&str>,
        #[case] architecture: &str,
    ) {
        let choice = match variation {
            Some(v) => PlatformChoice::variation(platform, v),
            None => PlatformChoice::platform(platform),
        };
        let selection = Selection::new("sel4test", choice, architecture);
        assert!(matches!(
            selection_error(&builtin(), &selection),
            SelectionError::UnsupportedArchitectureForPlatform { .. }
        ));
    }

    #[test]
    fn pinned_variation_architecture_is_enforced() {
        let selection = Selection::new(
            "sel4test",
            PlatformChoice::variation("imx8", "imx8mq-evk"),
            "aarch32",
        );
        assert!(matches!(
            selection_error(&builtin(), &selection),
            SelectionError::VariationArchitectureMismatch { .. }
        ));
    }

    #[test]
    fn architecture_alias_is_accepted() {
        let config = resolve(
            &builtin(),
            &Selection::new("sel4test", PlatformChoice::platform("qemu-arm-virt"), "arm_hyp"),
        );
        assert_eq!(
            config.variables.get("KernelSel4Arch"),
            Some(&Value::from("aarch32"))
        );
    }
}

mod scenarios {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn feature_supported_by_platform() {
        let config = resolve(
            &scenario(),
            &Selection::new("q", PlatformChoice::platform("p"), "a64").enable("feature-x-opt"),
        );
        assert_eq!(config.variables.get("FEATURE_X_OPT"), Some(&Value::Boolean(true)));
    }

    #[test]
    fn feature_missing_on_platform() {
        let selection =
            Selection::new("q", PlatformChoice::platform("p2"), "a64").enable("feature-x-opt");
        assert_eq!(violations(&scenario(), &selection), vec!["feature-x-opt"]);
    }

    #[test]
    fn user_overlay_adds_the_feature() {
        let catalogue = load(vec![
            Document::from_toml_str("scenario", fixtures::SCENARIO).unwrap(),
            Document::from_toml_str("user", fixtures::P2_WITH_FEATURE_X).unwrap(),
        ])
        .unwrap();
        let selection =
            Selection::new("q", PlatformChoice::platform("p2"), "a64").enable("feature-x-opt");
        assert!(configure(&catalogue, &selection, EmitPolicy::AllMapped).is_ok());
    }

    #[test]
    fn variation_supplies_arm_platform() {
        let config = resolve(
            &scenario(),
            &Selection::new("q", PlatformChoice::variation("board", "v"), "a64"),
        );
        assert_eq!(
            config.variables.get("ARM_PLATFORM"),
            Some(&Value::from("v-board"))
        );

        let plain = resolve(
            &scenario(),
            &Selection::new("q", PlatformChoice::platform("board"), "a64"),
        );
        assert_eq!(plain.variables.get("ARM_PLATFORM"), Some(&Value::from("")));
    }

    #[test]
    fn assigned_only_drops_unassigned_variables() {
        let selection = Selection::new("q", PlatformChoice::platform("board"), "a64");
        let config = configure(&scenario(), &selection, EmitPolicy::AssignedOnly).unwrap();
        assert_eq!(config.variables.get("ARM_PLATFORM"), None);
        assert_eq!(config.variables.get("RELEASE"), Some(&Value::Boolean(true)));
    }
}
