//! Remote extensions catalog
//!
//! Extension metadata lives on a catalog server; the wire format is the
//! server's, not ours, so responses are flattened into string maps and the
//! field names are translated into the descriptor vocabulary before anything
//! else sees them.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use tessera_core::keys::KEY_NAME;
use tessera_core::{ExtensionMetadata, Requirements};

/// Catalog server API flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerApi {
    /// Girder-based catalog, API v1
    #[default]
    GirderV1,
}

impl ServerApi {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GirderV1 => "Girder_v1",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Girder_v1" => Some(Self::GirderV1),
            _ => None,
        }
    }
}

impl fmt::Display for ServerApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping from server response fields to descriptor keys.
pub fn server_to_description_key(api: ServerApi) -> BTreeMap<&'static str, &'static str> {
    match api {
        ServerApi::GirderV1 => BTreeMap::from([
            ("_id", "extension_id"),
            ("meta.baseName", KEY_NAME),
            ("meta.category", "category"),
            ("meta.contributors", "contributors"),
            ("meta.dependency", "depends"),
            ("meta.description", "description"),
            ("meta.homepage", "homepage"),
            ("meta.icon_url", "iconurl"),
            ("meta.os", "os"),
            ("meta.arch", "arch"),
            ("meta.repository_type", "scm"),
            ("meta.repository_url", "scmurl"),
            ("meta.revision", "revision"),
            ("meta.app_revision", "slicer_revision"),
            ("meta.screenshots", "screenshots"),
            ("updated", "updated"),
        ]),
    }
}

/// Server response fields that carry no descriptor information.
pub fn server_keys_to_ignore(api: ServerApi) -> Vec<&'static str> {
    match api {
        ServerApi::GirderV1 => vec![
            "baseParentId",
            "baseParentType",
            "created",
            "creatorId",
            "description",
            "folderId",
            "lowerName",
            "meta.app_id",
            "name",
            "size",
        ],
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_to_string)
            .collect::<Vec<_>>()
            .join(" "),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Flatten a JSON object into a string map, joining nested object keys with
/// `.` (`meta.revision`) and array elements with spaces.
pub fn flatten_response_item(item: &Value) -> BTreeMap<String, String> {
    let mut flat = BTreeMap::new();
    if let Value::Object(map) = item {
        for (key, value) in map {
            match value {
                Value::Object(nested) => {
                    for (nested_key, nested_value) in nested {
                        flat.insert(
                            format!("{key}.{nested_key}"),
                            value_to_string(nested_value),
                        );
                    }
                }
                other => {
                    flat.insert(key.clone(), value_to_string(other));
                }
            }
        }
    }
    flat
}

/// Translate server field names into descriptor keys, dropping the fields
/// the catalog sends that we have no use for.
pub fn convert_server_metadata(
    api: ServerApi,
    flat: &BTreeMap<String, String>,
) -> ExtensionMetadata {
    let table = server_to_description_key(api);
    let ignored = server_keys_to_ignore(api);
    let mut metadata = ExtensionMetadata::new();
    for (key, value) in flat {
        if ignored.contains(&key.as_str()) {
            continue;
        }
        let key = table.get(key.as_str()).copied().unwrap_or(key.as_str());
        metadata.insert(key.to_string(), value.clone());
    }
    metadata
}

/// Keep only the descriptor-vocabulary keys a conversion can produce.
pub fn filter_server_metadata(api: ServerApi, metadata: &ExtensionMetadata) -> ExtensionMetadata {
    let allowed: Vec<&str> = server_to_description_key(api).into_values().collect();
    metadata
        .iter()
        .filter(|(key, _)| allowed.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Async client for the extensions catalog server.
pub struct CatalogClient {
    base_url: Url,
    api: ServerApi,
    client: reqwest::Client,
}

impl CatalogClient {
    pub fn new(server_url: &str, api: ServerApi) -> Result<Self> {
        let base_url = Url::parse(server_url)
            .map_err(|e| anyhow!("Invalid extensions server URL '{server_url}': {e}"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            base_url,
            api,
            client,
        })
    }

    pub fn server_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch the metadata of every extension published for the given
    /// application and requirements triple, translated into descriptor
    /// vocabulary and keyed by extension name.
    pub async fn fetch_extensions(
        &self,
        app_id: &str,
        requirements: &Requirements,
    ) -> Result<BTreeMap<String, ExtensionMetadata>> {
        let url = self
            .base_url
            .join(&format!("api/v1/app/{app_id}/extension"))?;
        debug!("Fetching extension metadata from {}", url);

        let response = self
            .client
            .get(url.clone())
            .query(&[
                ("app_revision", requirements.revision.as_str()),
                ("os", requirements.os.as_str()),
                ("arch", requirements.arch.as_str()),
                ("limit", "-1"),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "Extensions server returned HTTP {} for {}",
                response.status(),
                url
            ));
        }
        let body: Value = response.json().await?;

        // The endpoint returns either a bare array or a paginated envelope
        let items = match &body {
            Value::Array(items) => items.as_slice(),
            Value::Object(map) => map
                .get("data")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
            _ => &[],
        };

        let mut extensions = BTreeMap::new();
        for item in items {
            let flat = flatten_response_item(item);
            let converted = convert_server_metadata(self.api, &flat);
            let metadata = filter_server_metadata(self.api, &converted);
            match metadata.get(KEY_NAME) {
                Some(name) if !name.is_empty() => {
                    extensions.insert(name.clone(), metadata);
                }
                _ => warn!("Skipping catalog entry without a base name"),
            }
        }
        debug!("Catalog returned {} extensions", extensions.len());
        Ok(extensions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_nests_meta_and_joins_arrays() {
        let item = json!({
            "_id": "abc123",
            "updated": "2025-11-02T10:00:00Z",
            "meta": {
                "baseName": "Sample",
                "revision": "42",
                "screenshots": ["https://a.png", "https://b.png"]
            }
        });
        let flat = flatten_response_item(&item);
        assert_eq!(flat["_id"], "abc123");
        assert_eq!(flat["meta.baseName"], "Sample");
        assert_eq!(flat["meta.revision"], "42");
        assert_eq!(flat["meta.screenshots"], "https://a.png https://b.png");
    }

    #[test]
    fn test_convert_renames_and_drops_ignored_fields() {
        let flat = BTreeMap::from([
            ("_id".to_string(), "abc123".to_string()),
            ("meta.baseName".to_string(), "Sample".to_string()),
            ("meta.app_revision".to_string(), "33599".to_string()),
            ("lowerName".to_string(), "sample".to_string()),
            ("size".to_string(), "12345".to_string()),
        ]);
        let metadata = convert_server_metadata(ServerApi::GirderV1, &flat);
        assert_eq!(metadata["extension_id"], "abc123");
        assert_eq!(metadata["extensionname"], "Sample");
        assert_eq!(metadata["slicer_revision"], "33599");
        assert!(!metadata.contains_key("lowerName"));
        assert!(!metadata.contains_key("size"));
    }

    #[test]
    fn test_filter_keeps_descriptor_vocabulary_only() {
        let metadata = ExtensionMetadata::from([
            ("extensionname".to_string(), "Sample".to_string()),
            ("revision".to_string(), "42".to_string()),
            ("folderId".to_string(), "xyz".to_string()),
        ]);
        let filtered = filter_server_metadata(ServerApi::GirderV1, &metadata);
        assert!(filtered.contains_key("extensionname"));
        assert!(filtered.contains_key("revision"));
        assert!(!filtered.contains_key("folderId"));
    }

    #[test]
    fn test_server_api_round_trip() {
        assert_eq!(ServerApi::parse("Girder_v1"), Some(ServerApi::GirderV1));
        assert_eq!(ServerApi::parse("Midas_v1"), None);
        assert_eq!(ServerApi::GirderV1.as_str(), "Girder_v1");
    }

    #[test]
    fn test_invalid_server_url_rejected() {
        assert!(CatalogClient::new("not a url", ServerApi::GirderV1).is_err());
    }
}
