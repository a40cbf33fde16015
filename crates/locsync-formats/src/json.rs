use indexmap::IndexMap;
use serde_json::Value;

use locsync_core::ContentNode;

use crate::{FormatAdapter, FormatError};

/// JSON locale bundles. Object key order is preserved (serde_json's
/// `preserve_order` feature); output is two-space pretty-printed with a
/// trailing newline, so tool-written files round-trip byte-identically.
pub struct JsonAdapter;

impl FormatAdapter for JsonAdapter {
    fn tag(&self) -> &'static str {
        "json"
    }

    fn extension(&self) -> &'static str {
        "json"
    }

    fn parse(&self, bytes: &[u8]) -> Result<ContentNode, FormatError> {
        let value: Value = serde_json::from_slice(bytes).map_err(|e| FormatError::Parse {
            format: "json",
            message: e.to_string(),
        })?;
        Ok(from_value(value))
    }

    fn serialize(&self, tree: &ContentNode) -> Result<Vec<u8>, FormatError> {
        let value = to_value(tree);
        let mut out = serde_json::to_vec_pretty(&value).map_err(|e| FormatError::Serialize {
            format: "json",
            message: e.to_string(),
        })?;
        out.push(b'\n');
        Ok(out)
    }
}

fn from_value(value: Value) -> ContentNode {
    match value {
        Value::String(s) => ContentNode::Text(s),
        Value::Object(map) => {
            let mut branch = IndexMap::with_capacity(map.len());
            for (k, v) in map {
                branch.insert(k, from_value(v));
            }
            ContentNode::Branch(branch)
        }
        other => ContentNode::Passthrough(other),
    }
}

fn to_value(node: &ContentNode) -> Value {
    match node {
        ContentNode::Text(s) => Value::String(s.clone()),
        ContentNode::Branch(map) => {
            let mut obj = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                obj.insert(k.clone(), to_value(v));
            }
            Value::Object(obj)
        }
        ContentNode::Passthrough(v) => v.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_declared_key_order() {
        let tree = JsonAdapter
            .parse(br#"{"zebra":"z","apple":"a","mid":{"b":"1","a":"2"}}"#)
            .unwrap();
        let keys: Vec<&String> = tree.as_branch().unwrap().keys().collect();
        assert_eq!(keys, ["zebra", "apple", "mid"]);
    }

    #[test]
    fn non_string_values_pass_through() {
        let bytes = br#"{"count":3,"flag":true,"tags":["a","b"],"none":null}"#;
        let tree = JsonAdapter.parse(bytes).unwrap();
        let branch = tree.as_branch().unwrap();
        assert!(matches!(branch["count"], ContentNode::Passthrough(_)));
        assert!(matches!(branch["tags"], ContentNode::Passthrough(_)));
        // And they survive serialization untouched.
        let out = JsonAdapter.serialize(&tree).unwrap();
        let reparsed = JsonAdapter.parse(&out).unwrap();
        assert_eq!(tree, reparsed);
    }

    #[test]
    fn tool_written_files_round_trip_byte_identically() {
        let tree = JsonAdapter
            .parse(br#"{"greeting":"Hello {name}","nested":{"bye":"Bye"}}"#)
            .unwrap();
        let first = JsonAdapter.serialize(&tree).unwrap();
        let second = JsonAdapter
            .serialize(&JsonAdapter.parse(&first).unwrap())
            .unwrap();
        assert_eq!(first, second);
    }
}
