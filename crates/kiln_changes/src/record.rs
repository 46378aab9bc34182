//! Execution records: the recorded state of one task run.

use std::collections::BTreeMap;

use kiln_common::{ContentHash, ContentHasher};
use serde::{Deserialize, Serialize};

use crate::snapshot::{FileCollectionSnapshot, ValueSnapshot};

/// Identifies the code behind a task or one of its actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplementationSnapshot {
    /// Fully qualified type name.
    pub type_name: String,
    /// Hash of the code that implements the type, or `None` if it was loaded
    /// from somewhere that cannot be hashed.
    pub implementation_hash: Option<ContentHash>,
}

impl ImplementationSnapshot {
    /// An implementation with a known hash.
    pub fn new(type_name: impl Into<String>, implementation_hash: ContentHash) -> Self {
        Self {
            type_name: type_name.into(),
            implementation_hash: Some(implementation_hash),
        }
    }

    /// An implementation whose code could not be hashed.
    pub fn unknown(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            implementation_hash: None,
        }
    }

    /// Returns `true` if the implementation hash is unknown.
    pub fn is_unknown(&self) -> bool {
        self.implementation_hash.is_none()
    }
}

/// The implementation and action identity of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskIdentity {
    /// The task's own implementation.
    pub task_type: ImplementationSnapshot,
    /// The task's actions, in execution order.
    #[serde(default)]
    pub actions: Vec<ImplementationSnapshot>,
}

impl TaskIdentity {
    /// Creates an identity with no actions.
    pub fn new(task_type: ImplementationSnapshot) -> Self {
        Self {
            task_type,
            actions: Vec::new(),
        }
    }

    /// Builder-style action registration.
    pub fn with_action(mut self, action: ImplementationSnapshot) -> Self {
        self.actions.push(action);
        self
    }

    /// Combined hash of the implementation and every action.
    ///
    /// Unknown implementations hash to a marker, so two identities that are
    /// both unknown hash equal; use the per-component comparison to detect
    /// that case.
    pub fn hash(&self) -> ContentHash {
        let mut hasher = ContentHasher::new();
        for implementation in std::iter::once(&self.task_type).chain(&self.actions) {
            hasher.put_str(&implementation.type_name);
            match &implementation.implementation_hash {
                Some(hash) => hasher.put_hash(hash),
                None => hasher.put_str("<unknown>"),
            };
        }
        hasher.finish()
    }
}

/// The captured value of one declared input property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySnapshot {
    /// Property name.
    pub name: String,
    /// Captured value.
    pub value: ValueSnapshot,
}

/// One task's recorded state.
///
/// Input properties keep their declaration order; file properties are keyed by
/// property name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Implementation and action identity.
    pub identity: TaskIdentity,
    /// Whether the run completed successfully.
    #[serde(default = "default_successful")]
    pub successful: bool,
    /// Input property values in declaration order.
    #[serde(default)]
    pub input_properties: Vec<PropertySnapshot>,
    /// Input file snapshots per input property.
    #[serde(default)]
    pub input_files: BTreeMap<String, FileCollectionSnapshot>,
    /// Output file snapshots per output property.
    #[serde(default)]
    pub output_files: BTreeMap<String, FileCollectionSnapshot>,
    /// Inputs observed during the run rather than declared up front.
    #[serde(default)]
    pub discovered_inputs: FileCollectionSnapshot,
}

fn default_successful() -> bool {
    true
}

impl ExecutionRecord {
    /// Creates a successful record with no inputs or outputs.
    pub fn new(identity: TaskIdentity) -> Self {
        Self {
            identity,
            successful: true,
            input_properties: Vec::new(),
            input_files: BTreeMap::new(),
            output_files: BTreeMap::new(),
            discovered_inputs: FileCollectionSnapshot::new(),
        }
    }

    /// Builder-style success flag.
    pub fn with_successful(mut self, successful: bool) -> Self {
        self.successful = successful;
        self
    }

    /// Declares an input property. Later declarations of the same name
    /// replace the value in place.
    pub fn with_property(mut self, name: impl Into<String>, value: ValueSnapshot) -> Self {
        let name = name.into();
        match self.input_properties.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.value = value,
            None => self.input_properties.push(PropertySnapshot { name, value }),
        }
        self
    }

    /// Builder-style input file property.
    pub fn with_input_files(
        mut self,
        property: impl Into<String>,
        files: FileCollectionSnapshot,
    ) -> Self {
        self.input_files.insert(property.into(), files);
        self
    }

    /// Builder-style output file property.
    pub fn with_output_files(
        mut self,
        property: impl Into<String>,
        files: FileCollectionSnapshot,
    ) -> Self {
        self.output_files.insert(property.into(), files);
        self
    }

    /// Builder-style discovered inputs.
    pub fn with_discovered_inputs(mut self, files: FileCollectionSnapshot) -> Self {
        self.discovered_inputs = files;
        self
    }

    /// Looks up an input property value by name.
    pub fn input_property(&self, name: &str) -> Option<&ValueSnapshot> {
        self.input_properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::FileSnapshot;

    fn identity() -> TaskIdentity {
        TaskIdentity::new(ImplementationSnapshot::new(
            "org.example.Compile",
            ContentHash::from_bytes(b"v1"),
        ))
    }

    #[test]
    fn identity_hash_covers_actions() {
        let plain = identity();
        let with_action = identity().with_action(ImplementationSnapshot::new(
            "org.example.Action",
            ContentHash::from_bytes(b"a1"),
        ));
        assert_ne!(plain.hash(), with_action.hash());
        assert_eq!(plain.hash(), identity().hash());
    }

    #[test]
    fn identity_hash_distinguishes_unknown() {
        let known = identity();
        let unknown = TaskIdentity::new(ImplementationSnapshot::unknown("org.example.Compile"));
        assert!(unknown.task_type.is_unknown());
        assert_ne!(known.hash(), unknown.hash());
    }

    #[test]
    fn properties_keep_declaration_order() {
        let record = ExecutionRecord::new(identity())
            .with_property("zeta", ValueSnapshot::of_bytes(b"1"))
            .with_property("alpha", ValueSnapshot::of_bytes(b"2"))
            .with_property("zeta", ValueSnapshot::of_bytes(b"3"));
        let names: Vec<_> = record.input_properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(
            record.input_property("zeta"),
            Some(&ValueSnapshot::of_bytes(b"3"))
        );
        assert!(record.input_property("missing").is_none());
    }

    #[test]
    fn json_roundtrip_and_defaults() {
        let record = ExecutionRecord::new(identity())
            .with_property("level", ValueSnapshot::of_bytes(b"O2"))
            .with_input_files(
                "sources",
                FileCollectionSnapshot::new().with("src/main.c", FileSnapshot::file(b"int main")),
            )
            .with_output_files(
                "binary",
                FileCollectionSnapshot::new().with("out/main", FileSnapshot::file(b"ELF")),
            );
        let json = serde_json::to_string_pretty(&record).unwrap();
        let back: ExecutionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);

        let minimal = r#"{"identity": {"task_type": {"type_name": "T", "implementation_hash": null}}}"#;
        let parsed: ExecutionRecord = serde_json::from_str(minimal).unwrap();
        assert!(parsed.successful);
        assert!(parsed.input_properties.is_empty());
        assert!(parsed.discovered_inputs.is_empty());
    }
}
