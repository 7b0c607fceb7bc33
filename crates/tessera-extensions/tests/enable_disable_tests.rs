//! Enable/disable lifecycle integration tests
//!
//! Tests search-path bookkeeping on enable transitions, refusal conditions,
//! notification-on-change-only, and persistence of the disabled state
//! across model rebuilds.

mod common;

use common::*;

#[cfg(test)]
mod enable_disable {
    use super::*;
    use tessera_core::Error;

    fn install(env: &TestEnv, registry: &mut tessera_extensions::ExtensionRegistry, name: &str) {
        let archive = env.build_archive(name, "1");
        registry
            .install_extension(name, sample_metadata(name, "1"), &archive)
            .unwrap();
    }

    #[test]
    fn test_disable_removes_paths_enable_restores_them() {
        let env = TestEnv::new();
        let mut registry = make_registry(&env);
        install(&env, &mut registry, "Alpha");
        install(&env, &mut registry, "Bravo");
        install(&env, &mut registry, "Charlie");

        assert_eq!(
            module_paths(&registry),
            vec![
                env.module_path("Alpha"),
                env.module_path("Bravo"),
                env.module_path("Charlie"),
            ]
        );

        registry.set_extension_enabled("Bravo", false).unwrap();
        assert_eq!(
            module_paths(&registry),
            vec![env.module_path("Alpha"), env.module_path("Charlie")]
        );
        assert!(!registry.is_extension_enabled("Bravo"));
        assert_eq!(
            registry.enabled_extensions(),
            vec!["Alpha".to_string(), "Charlie".to_string()]
        );

        registry.set_extension_enabled("Bravo", true).unwrap();
        let mut paths = module_paths(&registry);
        paths.sort();
        let mut expected = vec![
            env.module_path("Alpha"),
            env.module_path("Bravo"),
            env.module_path("Charlie"),
        ];
        expected.sort();
        assert_eq!(paths, expected);
    }

    #[test]
    fn test_disabled_state_survives_model_rebuild() {
        let env = TestEnv::new();
        let mut registry = make_registry(&env);
        install(&env, &mut registry, "Alpha");
        install(&env, &mut registry, "Bravo");
        registry.set_extension_enabled("Bravo", false).unwrap();

        let descriptor = std::fs::read_to_string(env.descriptor_path("Bravo")).unwrap();
        assert!(descriptor.contains("enabled false"));

        registry.update_model().unwrap();
        assert!(registry.is_extension_enabled("Alpha"));
        assert!(!registry.is_extension_enabled("Bravo"));
        assert!(registry.is_extension_installed("Bravo"));
    }

    #[test]
    fn test_enable_incompatible_extension_refused() {
        let env = TestEnv::new();
        let mut registry = make_registry(&env);
        let observer = RecordingObserver::new();
        registry.subscribe(Box::new(observer.clone()));
        let archive = env.build_archive("Old", "1");
        registry
            .install_extension(
                "Old",
                metadata(&[
                    ("slicer_revision", "11111"),
                    ("os", "linux"),
                    ("arch", "amd64"),
                ]),
                &archive,
            )
            .unwrap();
        registry.set_extension_enabled("Old", false).unwrap();

        let err = registry.set_extension_enabled("Old", true).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::Incompatible { .. })
        ));
        assert!(!registry.is_extension_enabled("Old"));
        // Only the disable transition was announced
        assert_eq!(observer.count_of("enabled-changed:"), 1);
    }

    #[test]
    fn test_enable_while_scheduled_for_uninstall_refused() {
        let env = TestEnv::new();
        let mut registry = make_registry(&env);
        install(&env, &mut registry, "Sample");
        registry.set_extension_enabled("Sample", false).unwrap();
        registry.schedule_extension_for_uninstall("Sample").unwrap();

        let err = registry.set_extension_enabled("Sample", true).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::ScheduledForUninstall { .. })
        ));
    }

    #[test]
    fn test_disable_while_scheduled_for_uninstall_refused() {
        let env = TestEnv::new();
        let mut registry = make_registry(&env);
        let observer = RecordingObserver::new();
        registry.subscribe(Box::new(observer.clone()));
        install(&env, &mut registry, "Sample");
        registry.schedule_extension_for_uninstall("Sample").unwrap();

        let err = registry.set_extension_enabled("Sample", false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::ScheduledForUninstall { .. })
        ));
        assert_eq!(observer.count_of("enabled-changed:"), 0);

        // The descriptor still says enabled; only the schedule blocks it
        let descriptor = std::fs::read_to_string(env.descriptor_path("Sample")).unwrap();
        assert!(descriptor.contains("enabled true"));
    }

    #[test]
    fn test_redundant_enable_emits_no_notification() {
        let env = TestEnv::new();
        let mut registry = make_registry(&env);
        let observer = RecordingObserver::new();
        registry.subscribe(Box::new(observer.clone()));
        install(&env, &mut registry, "Sample");

        registry.set_extension_enabled("Sample", true).unwrap();
        assert_eq!(observer.count_of("enabled-changed:"), 0);

        registry.set_extension_enabled("Sample", false).unwrap();
        registry.set_extension_enabled("Sample", false).unwrap();
        assert_eq!(
            observer.events(),
            vec!["installed:Sample", "enabled-changed:Sample:false"]
        );
    }

    #[test]
    fn test_enable_with_unwritable_settings_refused() {
        let env = TestEnv::new();
        let (mut registry, writable) = make_toggleable_registry(&env);
        install(&env, &mut registry, "Sample");
        registry.set_extension_enabled("Sample", false).unwrap();

        writable.store(false, std::sync::atomic::Ordering::SeqCst);
        let err = registry.set_extension_enabled("Sample", true).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::SettingsNotWritable)
        ));
        assert!(!registry.is_extension_enabled("Sample"));
    }

    #[test]
    fn test_enable_unknown_extension_refused() {
        let env = TestEnv::new();
        let mut registry = make_registry(&env);
        let err = registry.set_extension_enabled("Ghost", true).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::NotInstalled { .. })
        ));
    }
}
