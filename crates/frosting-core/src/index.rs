//! Scene index: the authoritative element-to-node mapping.
//!
//! Exactly one stage node exists per live element id, and this mapping is the
//! only place that ownership is recorded. An entry is created when the
//! reconciler first processes an id and destroyed when the id disappears from
//! the declarative list.

use crate::element::ElementId;
use crate::scene::NodeId;
use std::collections::HashMap;

/// Mapping from element id to its live scene node.
#[derive(Debug, Clone, Default)]
pub struct SceneIndex {
    map: HashMap<ElementId, NodeId>,
}

impl SceneIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the node owned by an element id.
    pub fn insert(&mut self, element: ElementId, node: NodeId) {
        self.map.insert(element, node);
    }

    /// Look up the node for an element id.
    pub fn get(&self, element: &ElementId) -> Option<NodeId> {
        self.map.get(element).copied()
    }

    pub fn contains(&self, element: &ElementId) -> bool {
        self.map.contains_key(element)
    }

    /// Drop the entry for an element id, returning the node it owned.
    pub fn remove(&mut self, element: &ElementId) -> Option<NodeId> {
        self.map.remove(element)
    }

    /// All indexed element ids.
    pub fn element_ids(&self) -> impl Iterator<Item = &ElementId> {
        self.map.keys()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_insert_and_lookup() {
        let mut index = SceneIndex::new();
        let element = ElementId::new("a");
        let node = Uuid::new_v4();

        index.insert(element.clone(), node);
        assert_eq!(index.get(&element), Some(node));
        assert!(index.contains(&element));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_remove_returns_node() {
        let mut index = SceneIndex::new();
        let element = ElementId::new("a");
        let node = Uuid::new_v4();

        index.insert(element.clone(), node);
        assert_eq!(index.remove(&element), Some(node));
        assert!(index.is_empty());
        assert_eq!(index.remove(&element), None);
    }
}
