//! Default merge capability.

use persist_core::{Document, Merge};
use serde_json::Value;

/// Recursive mapping merge where `right` wins.
///
/// Nested mappings present on both sides are merged key by key; any other
/// value from `right` (sequences included) replaces the `left` one.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeepMerge;

impl Merge for DeepMerge {
    fn merge(&self, mut left: Document, right: Document) -> Document {
        for (key, value) in right {
            let merged = match (left.remove(&key), value) {
                (Some(Value::Object(base)), Value::Object(over)) => {
                    Value::Object(self.merge(base, over))
                }
                (_, value) => value,
            };
            left.insert(key, merged);
        }
        left
    }
}
