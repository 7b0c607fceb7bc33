//! Metadata builders for tests

use tessera_core::ExtensionMetadata;

/// Application triple used throughout the tests.
pub fn test_requirements() -> tessera_core::Requirements {
    tessera_core::Requirements::new("33599", "linux", "amd64")
}

/// Build a metadata map from pairs.
pub fn metadata(pairs: &[(&str, &str)]) -> ExtensionMetadata {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Typical catalog-style metadata for an extension.
pub fn sample_metadata(name: &str, revision: &str) -> ExtensionMetadata {
    metadata(&[
        ("scm", "git"),
        ("scmurl", &format!("https://github.com/example/{name}")),
        ("revision", revision),
        ("slicer_revision", "33599"),
        ("os", "linux"),
        ("arch", "amd64"),
        ("category", "Imaging"),
        ("description", &format!("{name} test extension")),
    ])
}
