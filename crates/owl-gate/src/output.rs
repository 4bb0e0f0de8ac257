// output.rs — What crosses the output boundary.

use owl_policy::OutputKind;
use serde::{Deserialize, Serialize};

/// A candidate (or delivered) output.
///
/// `kind` decides whether gating applies. `meta` is carried through
/// untouched and is never consulted for governance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputPacket {
    pub kind: OutputKind,
    pub content: String,
    #[serde(default)]
    pub meta: serde_json::Map<String, serde_json::Value>,
}

impl OutputPacket {
    pub fn new(kind: OutputKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            meta: serde_json::Map::new(),
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }
}
