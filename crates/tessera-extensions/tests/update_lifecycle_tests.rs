//! Catalog metadata and update lifecycle integration tests
//!
//! Tests the server-metadata cache, update detection, update staging and
//! the swap sweep, and the refresh-due bookkeeping.

mod common;

use common::*;

#[cfg(test)]
mod update_lifecycle {
    use super::*;
    use std::collections::BTreeMap;
    use tessera_core::keys::*;
    use tessera_core::{Error, ExtensionMetadata};
    use tessera_extensions::registry::SERVER_METADATA_CACHE_FILE;
    use tessera_extensions::MetadataSource;

    fn server_catalog(name: &str, revision: &str) -> BTreeMap<String, ExtensionMetadata> {
        BTreeMap::from([(name.to_string(), sample_metadata(name, revision))])
    }

    #[test]
    fn test_apply_server_metadata_persists_cache_and_stamp() {
        let env = TestEnv::new();
        let mut registry = make_registry(&env);
        let observer = RecordingObserver::new();
        registry.subscribe(Box::new(observer.clone()));

        registry
            .apply_server_metadata(
                server_catalog("Sample", "2"),
                Some("https://extensions.example.org"),
            )
            .unwrap();

        assert!(env.install_dir().join(SERVER_METADATA_CACHE_FILE).exists());
        assert!(registry
            .settings()
            .get_string(SETTINGS_METADATA_UPDATE_TIME)
            .unwrap()
            .is_some());
        assert_eq!(
            registry
                .settings()
                .get_string(SETTINGS_METADATA_SERVER_URL)
                .unwrap()
                .as_deref(),
            Some("https://extensions.example.org")
        );
        assert_eq!(observer.events(), vec!["metadata-updated"]);

        // A fresh registry picks the cache up from disk
        let mut reopened = make_registry(&env);
        reopened.load_cached_server_metadata().unwrap();
        assert_eq!(
            reopened.extension_metadata("Sample", MetadataSource::Server)["revision"],
            "2"
        );
    }

    #[test]
    fn test_check_for_updates_announces_once() {
        let env = TestEnv::new();
        let mut registry = make_registry(&env);
        let observer = RecordingObserver::new();
        registry.subscribe(Box::new(observer.clone()));
        let archive = env.build_archive("Sample", "1");
        registry
            .install_extension("Sample", sample_metadata("Sample", "1"), &archive)
            .unwrap();
        registry
            .apply_server_metadata(server_catalog("Sample", "2"), None)
            .unwrap();

        let updates = registry.check_for_updates();
        assert_eq!(updates, vec!["Sample".to_string()]);
        assert!(registry.is_update_available("Sample"));
        assert_eq!(observer.count_of("update-available:"), 1);
        assert!(observer
            .events()
            .contains(&"update-available:Sample:1->2".to_string()));

        // Re-checking the same revision does not re-announce
        let updates = registry.check_for_updates();
        assert_eq!(updates, vec!["Sample".to_string()]);
        assert_eq!(observer.count_of("update-available:"), 1);
    }

    #[test]
    fn test_matching_revision_is_not_an_update() {
        let env = TestEnv::new();
        let mut registry = make_registry(&env);
        let archive = env.build_archive("Sample", "2");
        registry
            .install_extension("Sample", sample_metadata("Sample", "2"), &archive)
            .unwrap();
        registry
            .apply_server_metadata(server_catalog("Sample", "2"), None)
            .unwrap();

        assert!(registry.check_for_updates().is_empty());
        assert!(!registry.is_update_available("Sample"));
    }

    #[test]
    fn test_schedule_and_cancel_update_staging() {
        let env = TestEnv::new();
        let mut registry = make_registry(&env);
        let observer = RecordingObserver::new();
        registry.subscribe(Box::new(observer.clone()));
        let archive_v1 = env.build_archive("Sample", "1");
        registry
            .install_extension("Sample", sample_metadata("Sample", "1"), &archive_v1)
            .unwrap();

        let archive_v2 = env.build_archive("Sample", "2");
        registry
            .schedule_extension_for_update("Sample", &archive_v2)
            .unwrap();

        let staging = env.install_dir().join(".updates");
        assert!(staging.join("Sample-2.tar.gz").exists());
        assert!(staging.join("Sample.s4ext").exists());
        assert!(registry.is_extension_scheduled_for_update("Sample").unwrap());

        registry
            .cancel_extension_scheduled_for_update("Sample")
            .unwrap();
        assert_absent(&staging.join("Sample-2.tar.gz"));
        assert_absent(&staging.join("Sample.s4ext"));
        assert!(!registry.is_extension_scheduled_for_update("Sample").unwrap());

        let err = registry
            .cancel_extension_scheduled_for_update("Sample")
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::NotScheduledForUpdate { .. })
        ));
        assert_eq!(
            observer.events(),
            vec![
                "installed:Sample",
                "scheduled-update:Sample",
                "cancelled-update:Sample"
            ]
        );
    }

    #[test]
    fn test_update_sweep_swaps_in_the_staged_revision() {
        let env = TestEnv::new();
        let mut registry = make_registry(&env);
        let observer = RecordingObserver::new();
        registry.subscribe(Box::new(observer.clone()));
        let archive_v1 = env.build_archive("Sample", "1");
        registry
            .install_extension("Sample", sample_metadata("Sample", "1"), &archive_v1)
            .unwrap();
        registry
            .apply_server_metadata(server_catalog("Sample", "2"), None)
            .unwrap();
        registry.check_for_updates();

        let archive_v2 = env.build_archive("Sample", "2");
        registry
            .schedule_extension_for_update("Sample", &archive_v2)
            .unwrap();
        let outcome = registry.update_scheduled_extensions().unwrap();

        assert!(outcome.is_success());
        assert_eq!(outcome.completed, vec!["Sample".to_string()]);
        assert!(registry.is_extension_installed("Sample"));
        assert!(!registry.is_update_available("Sample"));
        assert!(!registry.is_extension_scheduled_for_update("Sample").unwrap());

        let descriptor = std::fs::read_to_string(env.descriptor_path("Sample")).unwrap();
        assert!(descriptor.contains("revision 2"));
        assert!(descriptor.contains("archivename Sample-2.tar.gz"));
        assert_eq!(observer.count_of("updated:"), 1);
        // The swap announces an update, not an install/uninstall pair
        assert_eq!(observer.count_of("installed:"), 1);
        assert_eq!(observer.count_of("uninstalled:"), 0);
    }

    #[test]
    fn test_update_sweep_reports_loaded_extension_failure() {
        let env = TestEnv::new();
        let mut registry = make_registry(&env);
        let archive_v1 = env.build_archive("Sample", "1");
        registry
            .install_extension("Sample", sample_metadata("Sample", "1"), &archive_v1)
            .unwrap();
        let archive_v2 = env.build_archive("Sample", "2");
        registry
            .schedule_extension_for_update("Sample", &archive_v2)
            .unwrap();
        registry.mark_extensions_loaded(&["Sample".to_string()]);

        let outcome = registry.update_scheduled_extensions().unwrap();
        assert!(outcome.completed.is_empty());
        assert_eq!(outcome.failed.len(), 1);
        // Still installed at the old revision and still scheduled
        let descriptor = std::fs::read_to_string(env.descriptor_path("Sample")).unwrap();
        assert!(descriptor.contains("revision 1"));
        assert!(registry.is_extension_scheduled_for_update("Sample").unwrap());
    }

    #[test]
    fn test_schedule_update_for_unknown_extension_refused() {
        let env = TestEnv::new();
        let mut registry = make_registry(&env);
        let archive = env.build_archive("Ghost", "2");
        let err = registry
            .schedule_extension_for_update("Ghost", &archive)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::NotInstalled { .. })
        ));
    }

    #[test]
    fn test_metadata_refresh_due_bookkeeping() {
        let env = TestEnv::new();
        let mut registry = make_registry(&env);
        // Never refreshed: due
        assert!(registry.is_metadata_refresh_due().unwrap());

        registry
            .apply_server_metadata(BTreeMap::new(), None)
            .unwrap();
        assert!(!registry.is_metadata_refresh_due().unwrap());

        // Auto-update turned off: never due
        registry
            .settings_mut()
            .set_string(SETTINGS_AUTO_UPDATE_CHECK, "false")
            .unwrap();
        assert!(!registry.is_metadata_refresh_due().unwrap());
    }

    #[test]
    fn test_dependencies_resolved_against_catalog() {
        let env = TestEnv::new();
        let mut registry = make_registry(&env);
        let archive = env.build_archive("Root", "1");
        let mut root_metadata = sample_metadata("Root", "1");
        root_metadata.insert(KEY_DEPENDS.to_string(), "Helper Missing".to_string());
        registry
            .install_extension("Root", root_metadata, &archive)
            .unwrap();
        registry
            .apply_server_metadata(server_catalog("Helper", "3"), None)
            .unwrap();

        let (resolvable, unresolved) =
            registry.dependencies_to_install(&["Root".to_string()]);
        assert_eq!(resolvable, vec!["Helper".to_string()]);
        assert_eq!(unresolved, vec!["Missing".to_string()]);
    }
}
