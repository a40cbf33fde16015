use indexmap::IndexMap;
use serde_yaml::Value;

use locsync_core::ContentNode;

use crate::{FormatAdapter, FormatError};

/// YAML locale bundles. serde_yaml mappings keep insertion order; non-string
/// scalars and sequences become passthrough nodes carried as JSON values so
/// the tree model stays format-agnostic.
pub struct YamlAdapter;

impl FormatAdapter for YamlAdapter {
    fn tag(&self) -> &'static str {
        "yaml"
    }

    fn extension(&self) -> &'static str {
        "yml"
    }

    fn parse(&self, bytes: &[u8]) -> Result<ContentNode, FormatError> {
        let value: Value = serde_yaml::from_slice(bytes).map_err(|e| FormatError::Parse {
            format: "yaml",
            message: e.to_string(),
        })?;
        from_value(value)
    }

    fn serialize(&self, tree: &ContentNode) -> Result<Vec<u8>, FormatError> {
        let value = to_value(tree)?;
        let out = serde_yaml::to_string(&value).map_err(|e| FormatError::Serialize {
            format: "yaml",
            message: e.to_string(),
        })?;
        Ok(out.into_bytes())
    }
}

fn from_value(value: Value) -> Result<ContentNode, FormatError> {
    match value {
        Value::String(s) => Ok(ContentNode::Text(s)),
        Value::Mapping(map) => {
            let mut branch = IndexMap::with_capacity(map.len());
            for (k, v) in map {
                let Value::String(key) = k else {
                    return Err(FormatError::NonStringKey { format: "yaml" });
                };
                branch.insert(key, from_value(v)?);
            }
            Ok(ContentNode::Branch(branch))
        }
        other => {
            let json = serde_json::to_value(&other).map_err(|e| FormatError::Parse {
                format: "yaml",
                message: e.to_string(),
            })?;
            Ok(ContentNode::Passthrough(json))
        }
    }
}

fn to_value(node: &ContentNode) -> Result<Value, FormatError> {
    match node {
        ContentNode::Text(s) => Ok(Value::String(s.clone())),
        ContentNode::Branch(map) => {
            let mut out = serde_yaml::Mapping::with_capacity(map.len());
            for (k, v) in map {
                out.insert(Value::String(k.clone()), to_value(v)?);
            }
            Ok(Value::Mapping(out))
        }
        ContentNode::Passthrough(json) => {
            serde_yaml::to_value(json).map_err(|e| FormatError::Serialize {
                format: "yaml",
                message: e.to_string(),
            })
        }
    }
}
