use indexmap::IndexMap;
use serde_json::Value;

use crate::KeyPath;

/// Format-agnostic content tree for one locale file.
///
/// Branch entries keep insertion order; the order is semantically
/// significant and must survive re-serialization. Non-string scalars and
/// arrays are `Passthrough` nodes: they produce no translation units but
/// round-trip verbatim through the merger.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentNode {
    Text(String),
    Branch(IndexMap<String, ContentNode>),
    Passthrough(Value),
}

impl ContentNode {
    pub fn empty_branch() -> Self {
        ContentNode::Branch(IndexMap::new())
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ContentNode::Text(_))
    }

    pub fn as_branch(&self) -> Option<&IndexMap<String, ContentNode>> {
        match self {
            ContentNode::Branch(map) => Some(map),
            _ => None,
        }
    }

    /// Node at `path`, if any.
    pub fn get(&self, path: &KeyPath) -> Option<&ContentNode> {
        let mut node = self;
        for seg in path.segments() {
            node = node.as_branch()?.get(seg)?;
        }
        Some(node)
    }

    /// Insert or overwrite the text leaf at `path`, creating intermediate
    /// branches as needed. A non-branch node standing in the way is replaced
    /// by a branch (its old value is discarded). Appended keys land at the
    /// end of their branch, so callers control sibling order by insertion
    /// order.
    pub fn set_text(&mut self, path: &KeyPath, text: impl Into<String>) {
        let segments = path.segments();
        debug_assert!(!segments.is_empty(), "cannot set text at tree root");
        let mut node = self;
        for seg in &segments[..segments.len() - 1] {
            if !matches!(node, ContentNode::Branch(_)) {
                *node = ContentNode::empty_branch();
            }
            let ContentNode::Branch(map) = node else {
                unreachable!()
            };
            node = map
                .entry(seg.clone())
                .or_insert_with(ContentNode::empty_branch);
        }
        if !matches!(node, ContentNode::Branch(_)) {
            *node = ContentNode::empty_branch();
        }
        let ContentNode::Branch(map) = node else {
            unreachable!()
        };
        let last = &segments[segments.len() - 1];
        map.insert(last.clone(), ContentNode::Text(text.into()));
    }

    /// Remove the node at `path` and prune branches left empty by the
    /// removal. Returns true when something was removed.
    pub fn remove(&mut self, path: &KeyPath) -> bool {
        fn walk(node: &mut ContentNode, segments: &[String]) -> bool {
            let ContentNode::Branch(map) = node else {
                return false;
            };
            match segments {
                [] => false,
                [last] => map.shift_remove(last).is_some(),
                [head, rest @ ..] => {
                    let Some(child) = map.get_mut(head) else {
                        return false;
                    };
                    let removed = walk(child, rest);
                    if removed {
                        if let ContentNode::Branch(inner) = child {
                            if inner.is_empty() {
                                map.shift_remove(head);
                            }
                        }
                    }
                    removed
                }
            }
        }
        walk(self, path.segments())
    }
}
