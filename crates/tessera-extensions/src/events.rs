//! Registry lifecycle notifications
//!
//! The registry does not know about user interfaces. Anything that wants to
//! react to lifecycle changes implements [`RegistryObserver`] and subscribes;
//! the registry calls observers synchronously, on the calling thread, in the
//! order they were subscribed. Every method has a no-op default so observers
//! implement only what they care about.

/// Callbacks for extension lifecycle events.
#[allow(unused_variables)]
pub trait RegistryObserver {
    /// The in-memory table was rebuilt from disk.
    fn on_model_updated(&self) {}

    fn on_extension_installed(&self, name: &str) {}

    fn on_extension_uninstalled(&self, name: &str) {}

    /// `enabled` is the new state; only actual transitions are reported.
    fn on_enabled_changed(&self, name: &str, enabled: bool) {}

    fn on_scheduled_for_uninstall(&self, name: &str) {}

    fn on_uninstall_schedule_cancelled(&self, name: &str) {}

    fn on_bookmarked_changed(&self, name: &str, bookmarked: bool) {}

    /// Fresh catalog metadata was applied to the registry.
    fn on_metadata_updated(&self) {}

    /// A newer revision of an installed extension exists on the server.
    fn on_update_available(&self, name: &str, installed_revision: &str, server_revision: &str) {}

    fn on_scheduled_for_update(&self, name: &str) {}

    fn on_update_schedule_cancelled(&self, name: &str) {}

    /// An installed extension was replaced by its staged update.
    fn on_extension_updated(&self, name: &str) {}

    /// The application requirements triple changed.
    fn on_requirements_changed(&self) {}
}

impl<T: RegistryObserver + ?Sized> RegistryObserver for Box<T> {
    fn on_model_updated(&self) {
        (**self).on_model_updated()
    }

    fn on_extension_installed(&self, name: &str) {
        (**self).on_extension_installed(name)
    }

    fn on_extension_uninstalled(&self, name: &str) {
        (**self).on_extension_uninstalled(name)
    }

    fn on_enabled_changed(&self, name: &str, enabled: bool) {
        (**self).on_enabled_changed(name, enabled)
    }

    fn on_scheduled_for_uninstall(&self, name: &str) {
        (**self).on_scheduled_for_uninstall(name)
    }

    fn on_uninstall_schedule_cancelled(&self, name: &str) {
        (**self).on_uninstall_schedule_cancelled(name)
    }

    fn on_bookmarked_changed(&self, name: &str, bookmarked: bool) {
        (**self).on_bookmarked_changed(name, bookmarked)
    }

    fn on_metadata_updated(&self) {
        (**self).on_metadata_updated()
    }

    fn on_update_available(&self, name: &str, installed_revision: &str, server_revision: &str) {
        (**self).on_update_available(name, installed_revision, server_revision)
    }

    fn on_scheduled_for_update(&self, name: &str) {
        (**self).on_scheduled_for_update(name)
    }

    fn on_update_schedule_cancelled(&self, name: &str) {
        (**self).on_update_schedule_cancelled(name)
    }

    fn on_extension_updated(&self, name: &str) {
        (**self).on_extension_updated(name)
    }

    fn on_requirements_changed(&self) {
        (**self).on_requirements_changed()
    }
}

/// Observer that forwards lifecycle events to the log.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl RegistryObserver for TracingObserver {
    fn on_model_updated(&self) {
        tracing::debug!("Extension model updated");
    }

    fn on_extension_installed(&self, name: &str) {
        tracing::info!("Extension '{}' installed", name);
    }

    fn on_extension_uninstalled(&self, name: &str) {
        tracing::info!("Extension '{}' uninstalled", name);
    }

    fn on_enabled_changed(&self, name: &str, enabled: bool) {
        tracing::info!(
            "Extension '{}' {}",
            name,
            if enabled { "enabled" } else { "disabled" }
        );
    }

    fn on_scheduled_for_uninstall(&self, name: &str) {
        tracing::info!("Extension '{}' scheduled for removal", name);
    }

    fn on_uninstall_schedule_cancelled(&self, name: &str) {
        tracing::info!("Removal of extension '{}' cancelled", name);
    }

    fn on_bookmarked_changed(&self, name: &str, bookmarked: bool) {
        tracing::debug!("Extension '{}' bookmarked: {}", name, bookmarked);
    }

    fn on_metadata_updated(&self) {
        tracing::debug!("Extension metadata refreshed from server");
    }

    fn on_update_available(&self, name: &str, installed_revision: &str, server_revision: &str) {
        tracing::info!(
            "Update available for '{}': {} -> {}",
            name,
            installed_revision,
            server_revision
        );
    }

    fn on_scheduled_for_update(&self, name: &str) {
        tracing::info!("Extension '{}' scheduled for update", name);
    }

    fn on_update_schedule_cancelled(&self, name: &str) {
        tracing::info!("Update of extension '{}' cancelled", name);
    }

    fn on_extension_updated(&self, name: &str) {
        tracing::info!("Extension '{}' updated", name);
    }

    fn on_requirements_changed(&self) {
        tracing::debug!("Application requirements changed");
    }
}
