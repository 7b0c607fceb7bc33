//! Shared data types for the extension registry

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Extension metadata: a key-sorted map of descriptor fields.
///
/// Ordering matters for the descriptor writer, which emits fields in key
/// order so that description files diff cleanly between releases.
pub type ExtensionMetadata = BTreeMap<String, String>;

/// The application triple an extension must match to be compatible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirements {
    /// Application revision (build number, not the marketing version)
    pub revision: String,
    /// Operating system name ("linux", "macosx", "win")
    pub os: String,
    /// Processor architecture ("amd64", "arm64", ...)
    pub arch: String,
}

impl Requirements {
    pub fn new(
        revision: impl Into<String>,
        os: impl Into<String>,
        arch: impl Into<String>,
    ) -> Self {
        Self {
            revision: revision.into(),
            os: os.into(),
            arch: arch.into(),
        }
    }
}

/// Truthiness of descriptor string fields such as `enabled` and `installed`.
///
/// A value is false only when it is empty, `"0"`, or `"false"` in any casing.
/// Every other string, including `"yes"` or garbage, reads as true. This
/// matches how description files written by earlier releases are interpreted.
pub fn string_to_bool(value: &str) -> bool {
    !(value.is_empty() || value == "0" || value.eq_ignore_ascii_case("false"))
}

/// Render a flag the way the descriptor writer spells booleans.
pub fn bool_to_string(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_to_bool_falsy_values() {
        assert!(!string_to_bool(""));
        assert!(!string_to_bool("0"));
        assert!(!string_to_bool("false"));
        assert!(!string_to_bool("False"));
        assert!(!string_to_bool("FALSE"));
    }

    #[test]
    fn test_string_to_bool_truthy_values() {
        assert!(string_to_bool("true"));
        assert!(string_to_bool("1"));
        assert!(string_to_bool("yes"));
        assert!(string_to_bool("no"));
        assert!(string_to_bool("00"));
    }

    #[test]
    fn test_requirements_equality() {
        let a = Requirements::new("33599", "linux", "amd64");
        let b = Requirements::new("33599", "linux", "amd64");
        assert_eq!(a, b);
        assert_ne!(a, Requirements::new("33600", "linux", "amd64"));
    }
}
