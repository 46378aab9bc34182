//! Path sensitivity for file snapshot comparison.

use serde::{Deserialize, Serialize};

/// Which part of a file's path is significant when comparing snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathSensitivity {
    /// The full path identifies a file.
    #[default]
    Absolute,
    /// Only the file name identifies a file; moving it between directories
    /// is not a change.
    NameOnly,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_absolute() {
        assert_eq!(PathSensitivity::default(), PathSensitivity::Absolute);
    }

    #[test]
    fn serde_kebab_case() {
        let json = serde_json::to_string(&PathSensitivity::NameOnly).unwrap();
        assert_eq!(json, "\"name-only\"");
        let back: PathSensitivity = serde_json::from_str("\"absolute\"").unwrap();
        assert_eq!(back, PathSensitivity::Absolute);
    }
}
