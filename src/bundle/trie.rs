// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::bundle::BundleError;
use crate::value::Value;

use std::collections::BTreeMap;

/// Tree of manifest root path segments under a synthetic `data` node.
/// A leaf marks the end of a declared root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TrieNode {
    is_leaf: bool,
    children: BTreeMap<String, TrieNode>,
}

impl TrieNode {
    fn new() -> Self {
        Self {
            is_leaf: false,
            children: BTreeMap::new(),
        }
    }

    pub(crate) fn from_roots<S: AsRef<str>>(roots: &[S]) -> Result<Self, BundleError> {
        let mut trie = TrieNode::new();
        for root in roots {
            trie.insert(root.as_ref())?;
        }
        Ok(trie)
    }

    // Roots may not be prefixes of one another, and may not repeat.
    fn insert(&mut self, root: &str) -> Result<(), BundleError> {
        let mut node = self;
        for segment in root.split('/').filter(|s| !s.is_empty()) {
            if node.is_leaf {
                return Err(BundleError::OverlappingRoots(root.to_string()));
            }
            node = node
                .children
                .entry(segment.to_string())
                .or_insert_with(TrieNode::new);
        }

        if node.is_leaf || !node.children.is_empty() {
            return Err(BundleError::OverlappingRoots(root.to_string()));
        }
        node.is_leaf = true;
        Ok(())
    }

    /// Every key path in `data` must reach a leaf before it runs out of trie.
    pub(crate) fn contains(&self, data: &Value) -> bool {
        if self.is_leaf {
            return true;
        }

        match data {
            Value::Object(fields) => fields.iter().all(|(k, v)| match k {
                Value::String(k) => match self.children.get(k.as_ref()) {
                    Some(child) => child.contains(v),
                    None => false,
                },
                _ => false,
            }),
            _ => false,
        }
    }

    pub(crate) fn covers(&self, path: &[&str]) -> bool {
        let mut node = self;
        for segment in path {
            if node.is_leaf {
                return true;
            }
            match node.children.get(*segment) {
                Some(child) => node = child,
                None => return false,
            }
        }
        true
    }
}
