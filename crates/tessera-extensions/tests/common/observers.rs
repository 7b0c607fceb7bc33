//! Recording observer for notification assertions

use std::sync::{Arc, Mutex};

use tessera_extensions::RegistryObserver;

/// Observer that records every notification as a formatted string, so tests
/// can assert on both content and order.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count_of(&self, prefix: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl RegistryObserver for RecordingObserver {
    fn on_model_updated(&self) {
        self.record("model-updated".to_string());
    }

    fn on_extension_installed(&self, name: &str) {
        self.record(format!("installed:{name}"));
    }

    fn on_extension_uninstalled(&self, name: &str) {
        self.record(format!("uninstalled:{name}"));
    }

    fn on_enabled_changed(&self, name: &str, enabled: bool) {
        self.record(format!("enabled-changed:{name}:{enabled}"));
    }

    fn on_scheduled_for_uninstall(&self, name: &str) {
        self.record(format!("scheduled-uninstall:{name}"));
    }

    fn on_uninstall_schedule_cancelled(&self, name: &str) {
        self.record(format!("cancelled-uninstall:{name}"));
    }

    fn on_bookmarked_changed(&self, name: &str, bookmarked: bool) {
        self.record(format!("bookmarked:{name}:{bookmarked}"));
    }

    fn on_metadata_updated(&self) {
        self.record("metadata-updated".to_string());
    }

    fn on_update_available(&self, name: &str, installed_revision: &str, server_revision: &str) {
        self.record(format!(
            "update-available:{name}:{installed_revision}->{server_revision}"
        ));
    }

    fn on_scheduled_for_update(&self, name: &str) {
        self.record(format!("scheduled-update:{name}"));
    }

    fn on_update_schedule_cancelled(&self, name: &str) {
        self.record(format!("cancelled-update:{name}"));
    }

    fn on_extension_updated(&self, name: &str) {
        self.record(format!("updated:{name}"));
    }

    fn on_requirements_changed(&self) {
        self.record("requirements-changed".to_string());
    }
}
