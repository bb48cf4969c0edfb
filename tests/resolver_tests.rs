//! Tests for dependency resolution against a package directory
//!
//! These tests verify the resolver's behavior for:
//! - Transitive resolution and deduplication
//! - Cycles, including cycles back to the root package
//! - Platform-scoped dependency groups
//! - Missing dependencies and depth limits


use relpack::{
    resolve_dependencies, Error, Package, PackageStore, ResolverConfig, SelectionPolicy,
    TargetPlatform,
};
use test_utils::{MockPackage, TestFeed};

fn net45() -> TargetPlatform {
    "net45".parse().unwrap()
}

fn store_for(feed: &TestFeed) -> PackageStore {
    PackageStore::new(
        Some(feed.packages_dir.clone()),
        None,
        SelectionPolicy::FirstMatch,
    )
}

fn resolve_ids(feed: &TestFeed, app: &MockPackage) -> Result<Vec<String>, Error> {
    let input = feed.add_input(app);
    let package = Package::open(&input)?;
    let resolved = resolve_dependencies(
        &package,
        &net45(),
        &store_for(feed),
        &ResolverConfig::default(),
    )?;
    Ok(resolved.iter().map(|p| p.full_name()).collect())
}

// ============================================================================
// Graph Shape Tests
// ============================================================================

mod graph_shapes {
    use super::*;

    #[test]
    fn test_no_dependencies_resolves_to_empty_set() {
        let feed = TestFeed::new();
        let app = MockPackage::new("App", "1.0.0").with_lib("net45", "App.dll");

        assert!(resolve_ids(&feed, &app).unwrap().is_empty());
    }

    #[test]
    fn test_transitive_dependencies_in_discovery_order() {
        let feed = TestFeed::new();
        feed.add_package(&MockPackage::new("Lib", "1.0.0").with_dependency("Util", "1.0"));
        feed.add_package(&MockPackage::new("Util", "1.2.0"));
        feed.add_package(&MockPackage::new("Other", "1.0.0"));

        let app = MockPackage::new("App", "1.0.0")
            .with_lib("net45", "App.dll")
            .with_dependency("Lib", "[1.0,2.0)")
            .with_dependency("Other", "");

        assert_eq!(
            resolve_ids(&feed, &app).unwrap(),
            vec!["Lib 1.0.0", "Util 1.2.0", "Other 1.0.0"]
        );
    }

    #[test]
    fn test_diamond_is_deduplicated() {
        let feed = TestFeed::new();
        feed.add_package(&MockPackage::new("Left", "1.0.0").with_dependency("Base", "1.0"));
        feed.add_package(&MockPackage::new("Right", "1.0.0").with_dependency("Base", "1.0"));
        feed.add_package(&MockPackage::new("Base", "1.0.0"));

        let app = MockPackage::new("App", "1.0.0")
            .with_lib("net45", "App.dll")
            .with_dependency("Left", "1.0")
            .with_dependency("Right", "1.0");

        let ids = resolve_ids(&feed, &app).unwrap();
        assert_eq!(ids, vec!["Left 1.0.0", "Base 1.0.0", "Right 1.0.0"]);
    }

    #[test]
    fn test_cycle_terminates() {
        let feed = TestFeed::new();
        feed.add_package(&MockPackage::new("Ping", "1.0.0").with_dependency("Pong", "1.0"));
        feed.add_package(&MockPackage::new("Pong", "1.0.0").with_dependency("Ping", "1.0"));

        let app = MockPackage::new("App", "1.0.0")
            .with_lib("net45", "App.dll")
            .with_dependency("Ping", "1.0");

        assert_eq!(resolve_ids(&feed, &app).unwrap(), vec!["Ping 1.0.0", "Pong 1.0.0"]);
    }

    #[test]
    fn test_cycle_back_to_root_excludes_root() {
        let feed = TestFeed::new();
        let app = MockPackage::new("App", "1.0.0")
            .with_lib("net45", "App.dll")
            .with_dependency("Lib", "1.0");
        feed.add_package(&app);
        feed.add_package(&MockPackage::new("Lib", "1.0.0").with_dependency("App", "1.0"));

        assert_eq!(resolve_ids(&feed, &app).unwrap(), vec!["Lib 1.0.0"]);
    }

    #[test]
    fn test_lookup_ignores_id_case() {
        let feed = TestFeed::new();
        feed.add_package(&MockPackage::new("Newtonsoft.Json", "6.0.0"));

        let app = MockPackage::new("App", "1.0.0")
            .with_lib("net45", "App.dll")
            .with_dependency("newtonsoft.json", "6.0");

        assert_eq!(resolve_ids(&feed, &app).unwrap(), vec!["Newtonsoft.Json 6.0.0"]);
    }
}

// ============================================================================
// Platform Scoping Tests
// ============================================================================

mod platform_scoping {
    use super::*;

    #[test]
    fn test_groups_for_other_platforms_are_skipped() {
        let feed = TestFeed::new();
        feed.add_package(&MockPackage::new("Desktop", "1.0.0"));
        feed.add_package(&MockPackage::new("Phone", "1.0.0"));

        let app = MockPackage::new("App", "1.0.0")
            .with_lib("net45", "App.dll")
            .with_group_dependency("net45", "Desktop", "1.0")
            .with_group_dependency("wp8", "Phone", "1.0");

        assert_eq!(resolve_ids(&feed, &app).unwrap(), vec!["Desktop 1.0.0"]);
    }

    #[test]
    fn test_missing_dependency_of_other_platform_is_not_an_error() {
        let feed = TestFeed::new();
        let app = MockPackage::new("App", "1.0.0")
            .with_lib("net45", "App.dll")
            .with_group_dependency("sl5", "NotInStore", "1.0");

        assert!(resolve_ids(&feed, &app).unwrap().is_empty());
    }

    #[test]
    fn test_full_framework_name_matches_folder_name() {
        let feed = TestFeed::new();
        feed.add_package(&MockPackage::new("Desktop", "1.0.0"));

        let app = MockPackage::new("App", "1.0.0")
            .with_lib("net45", "App.dll")
            .with_group_dependency(".NETFramework,Version=v4.5", "Desktop", "1.0");

        assert_eq!(resolve_ids(&feed, &app).unwrap(), vec!["Desktop 1.0.0"]);
    }

    #[test]
    fn test_nuget_pack_framework_spelling_matches_folder_name() {
        let feed = TestFeed::new();
        feed.add_package(&MockPackage::new("Desktop", "1.0.0"));

        let app = MockPackage::new("App", "1.0.0")
            .with_lib("net45", "App.dll")
            .with_group_dependency(".NETFramework4.5", "Desktop", "1.0");

        assert_eq!(resolve_ids(&feed, &app).unwrap(), vec!["Desktop 1.0.0"]);
    }

    #[test]
    fn test_unknown_group_framework_does_not_hide_package() {
        let feed = TestFeed::new();
        feed.add_package(
            &MockPackage::new("Lib", "1.0.0")
                .with_lib("net45", "Lib.dll")
                .with_group_dependency("wpa81", "Phone", "1.0"),
        );

        let app = MockPackage::new("App", "1.0.0")
            .with_lib("net45", "App.dll")
            .with_dependency("Lib", "1.0");

        assert_eq!(resolve_ids(&feed, &app).unwrap(), vec!["Lib 1.0.0"]);
    }
}

// ============================================================================
// Error Tests
// ============================================================================

mod errors {
    use super::*;

    #[test]
    fn test_missing_dependency_names_id_and_root() {
        let feed = TestFeed::new();
        let app = MockPackage::new("App", "1.0.0")
            .with_lib("net45", "App.dll")
            .with_dependency("Missing", "[2.0]");

        let err = resolve_ids(&feed, &app).unwrap_err();
        match &err {
            Error::DependencyNotFound {
                id, search_roots, ..
            } => {
                assert_eq!(id, "Missing");
                assert_eq!(search_roots, &vec![feed.packages_dir.display().to_string()]);
            }
            other => panic!("Expected DependencyNotFound, got {:?}", other),
        }

        let message = err.to_string();
        assert!(message.contains("Couldn't find file for package in"));
        assert!(message.contains("Missing"));
    }

    #[test]
    fn test_version_outside_range_is_missing() {
        let feed = TestFeed::new();
        feed.add_package(&MockPackage::new("Lib", "2.0.0"));

        let app = MockPackage::new("App", "1.0.0")
            .with_lib("net45", "App.dll")
            .with_dependency("Lib", "[1.0,2.0)");

        assert!(matches!(
            resolve_ids(&feed, &app),
            Err(Error::DependencyNotFound { .. })
        ));
    }

    #[test]
    fn test_missing_transitive_dependency_fails() {
        let feed = TestFeed::new();
        feed.add_package(&MockPackage::new("Lib", "1.0.0").with_dependency("Gone", "1.0"));

        let app = MockPackage::new("App", "1.0.0")
            .with_lib("net45", "App.dll")
            .with_dependency("Lib", "1.0");

        match resolve_ids(&feed, &app) {
            Err(Error::DependencyNotFound { id, .. }) => assert_eq!(id, "Gone"),
            other => panic!("Expected DependencyNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_depth_limit() {
        let feed = TestFeed::new();
        feed.add_package(&MockPackage::new("Level1", "1.0.0").with_dependency("Level2", "1.0"));
        feed.add_package(&MockPackage::new("Level2", "1.0.0"));

        let app = MockPackage::new("App", "1.0.0")
            .with_lib("net45", "App.dll")
            .with_dependency("Level1", "1.0");
        let package = Package::open(feed.add_input(&app)).unwrap();
        let store = store_for(&feed);

        let shallow = ResolverConfig { max_depth: 1 };
        assert!(matches!(
            resolve_dependencies(&package, &net45(), &store, &shallow),
            Err(Error::DependencyDepthExceeded { max_depth: 1, .. })
        ));

        // Two levels below the root
        let deep_enough = ResolverConfig { max_depth: 2 };
        let resolved = resolve_dependencies(&package, &net45(), &store, &deep_enough).unwrap();
        assert_eq!(resolved.len(), 2);
    }
}
