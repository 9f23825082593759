use crate::ir::{InstanceArena, NodeId};

/// Render identity of a node. Child presence, clone tag and expansion state
/// are folded in on purpose: a node whose detail level changed is a
/// different rendering of the same entity and must re-enter rather than
/// patch in place.
pub fn node_key(arena: &InstanceArena, id: NodeId) -> String {
    let node = &arena[id];
    let mut key = node.name.clone();
    key.push_str(if node.has_children() {
        "_children"
    } else {
        "_nochildren"
    });
    if let Some(tag) = &node.clone_tag {
        key.push_str(tag);
    }
    key.push_str(if node.expanded { "_open" } else { "_shut" });
    key
}

/// Render identity of a parent→child link.
pub fn link_key(arena: &InstanceArena, source: NodeId, target: NodeId) -> String {
    format!(
        "{}{}_{}{}",
        arena[source].name,
        arena[source].clone_tag.as_deref().unwrap_or(""),
        arena[target].name,
        arena[target].clone_tag.as_deref().unwrap_or(""),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::InstanceNode;

    #[test]
    fn expansion_changes_the_node_key() {
        let mut arena = InstanceArena::new();
        let id = arena.alloc(InstanceNode::new("urn:a", "a"));
        let shut = node_key(&arena, id);
        arena[id].expanded = true;
        let open = node_key(&arena, id);
        assert_ne!(shut, open);
    }

    #[test]
    fn clones_have_distinct_keys() {
        let mut arena = InstanceArena::new();
        let id = arena.alloc(InstanceNode::new("urn:a", "a"));
        let copy = arena.clone_record(id, "_1".to_string());
        assert_ne!(node_key(&arena, id), node_key(&arena, copy));
    }

    #[test]
    fn collapse_keeps_the_children_marker() {
        let mut arena = InstanceArena::new();
        let id = arena.alloc(InstanceNode::new("urn:a", "a"));
        let child = arena.alloc(InstanceNode::new("urn:b", "b"));
        arena[id].children.push(child);
        let open = node_key(&arena, id);
        let stash = std::mem::take(&mut arena[id].children);
        arena[id].collapsed_children = stash;
        assert_eq!(open, node_key(&arena, id));
    }

    #[test]
    fn link_key_includes_both_endpoints() {
        let mut arena = InstanceArena::new();
        let a = arena.alloc(InstanceNode::new("urn:a", "a"));
        let b = arena.alloc(InstanceNode::new("urn:b", "b"));
        let c = arena.clone_record(b, "_1".to_string());
        assert_ne!(link_key(&arena, a, b), link_key(&arena, a, c));
    }
}
