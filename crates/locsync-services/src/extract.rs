//! Flattening a content tree into translation units: depth-first, in
//! declared key order, skipping passthrough leaves and empty branches.

use locsync_core::{ContentNode, KeyPath, TranslationUnit};

/// Lazy unit iterator over an immutable tree; restartable by calling
/// [`units`] again.
pub fn units(tree: &ContentNode) -> Units<'_> {
    let stack = match tree {
        ContentNode::Branch(map) => vec![(KeyPath::root(), map.iter())],
        // A bare scalar at the root has no addressable key path.
        _ => Vec::new(),
    };
    Units { stack }
}

/// Eager form of [`units`].
pub fn extract_units(tree: &ContentNode) -> Vec<TranslationUnit> {
    units(tree).collect()
}

pub struct Units<'a> {
    stack: Vec<(KeyPath, indexmap::map::Iter<'a, String, ContentNode>)>,
}

impl Iterator for Units<'_> {
    type Item = TranslationUnit;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (prefix, next) = match self.stack.last_mut() {
                None => return None,
                Some((prefix, iter)) => (prefix.clone(), iter.next()),
            };
            match next {
                None => {
                    self.stack.pop();
                }
                Some((key, node)) => match node {
                    ContentNode::Text(text) => {
                        return Some(TranslationUnit::new(prefix.push(key), text.clone()));
                    }
                    ContentNode::Branch(map) => {
                        self.stack.push((prefix.push(key), map.iter()));
                    }
                    ContentNode::Passthrough(_) => {}
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> ContentNode {
        let mut t = ContentNode::empty_branch();
        t.set_text(&KeyPath(vec!["title".into()]), "App");
        t.set_text(&KeyPath(vec!["menu".into(), "open".into()]), "Open {file}");
        t.set_text(&KeyPath(vec!["menu".into(), "close".into()]), "Close");
        t
    }

    #[test]
    fn traversal_is_depth_first_in_declared_order() {
        let keys: Vec<String> = units(&tree()).map(|u| u.key_path.to_string()).collect();
        assert_eq!(keys, ["title", "menu.open", "menu.close"]);
    }

    #[test]
    fn iterator_is_restartable() {
        let t = tree();
        assert_eq!(units(&t).count(), 3);
        assert_eq!(units(&t).count(), 3);
    }

    #[test]
    fn passthrough_and_empty_branches_yield_no_units() {
        let mut t = tree();
        if let ContentNode::Branch(map) = &mut t {
            map.insert(
                "count".into(),
                ContentNode::Passthrough(serde_json::json!(42)),
            );
            map.insert("empty".into(), ContentNode::empty_branch());
        }
        assert_eq!(units(&t).count(), 3);
    }

    #[test]
    fn units_carry_placeholders_and_fingerprints() {
        let all = extract_units(&tree());
        let open = all
            .iter()
            .find(|u| u.key_path.to_string() == "menu.open")
            .unwrap();
        assert!(open.placeholders.contains("{file}"));
        assert!(!open.fingerprint.is_empty());
    }
}
