//! Tidy-tree positioning (Buchheim, Jünger, Leipert 2002) over the visible
//! instance tree. The breadth distance between adjacent nodes comes from a
//! caller-supplied separation function, so node extents measured from
//! rendered content flow straight into the walk.

use crate::ir::{InstanceArena, NodeId};

#[derive(Debug)]
pub(crate) struct TidySlot {
    pub node: NodeId,
    pub depth: usize,
    /// Final breadth coordinate after the second walk.
    pub x: f32,
    parent: Option<usize>,
    children: Vec<usize>,
    number: usize,
    prelim: f32,
    modifier: f32,
    shift: f32,
    change: f32,
    thread: Option<usize>,
    ancestor: usize,
}

/// Separation between two breadth-adjacent nodes; the flag tells whether
/// they share a parent.
pub(crate) trait SeparationFn: Fn(NodeId, NodeId, bool) -> f32 {}
impl<F: Fn(NodeId, NodeId, bool) -> f32> SeparationFn for F {}

pub(crate) fn run<F: SeparationFn>(
    arena: &InstanceArena,
    root: NodeId,
    separation: F,
) -> Vec<TidySlot> {
    let mut slots = build_slots(arena, root);
    if slots.is_empty() {
        return slots;
    }
    first_walk(&mut slots, 0, &separation);
    second_walk(&mut slots, 0, 0.0);
    slots
}

fn build_slots(arena: &InstanceArena, root: NodeId) -> Vec<TidySlot> {
    let mut slots: Vec<TidySlot> = Vec::new();
    let mut stack: Vec<(NodeId, Option<usize>, usize, usize)> = vec![(root, None, 0, 0)];
    while let Some((node, parent, depth, number)) = stack.pop() {
        let slot = slots.len();
        slots.push(TidySlot {
            node,
            depth,
            x: 0.0,
            parent,
            children: Vec::new(),
            number,
            prelim: 0.0,
            modifier: 0.0,
            shift: 0.0,
            change: 0.0,
            thread: None,
            ancestor: slot,
        });
        if let Some(p) = parent {
            slots[p].children.push(slot);
        }
        // Reverse push keeps siblings in tree order once popped.
        for (i, &child) in arena[node].children.iter().enumerate().rev() {
            stack.push((child, Some(slot), depth + 1, i));
        }
    }
    slots
}

fn left_sibling(slots: &[TidySlot], v: usize) -> Option<usize> {
    let parent = slots[v].parent?;
    let pos = slots[parent].children.iter().position(|&c| c == v)?;
    if pos > 0 {
        Some(slots[parent].children[pos - 1])
    } else {
        None
    }
}

fn leftmost_sibling(slots: &[TidySlot], v: usize) -> usize {
    slots[v]
        .parent
        .and_then(|p| slots[p].children.first().copied())
        .unwrap_or(v)
}

fn next_left(slots: &[TidySlot], v: usize) -> Option<usize> {
    slots[v].children.first().copied().or(slots[v].thread)
}

fn next_right(slots: &[TidySlot], v: usize) -> Option<usize> {
    slots[v].children.last().copied().or(slots[v].thread)
}

fn same_parent(slots: &[TidySlot], a: usize, b: usize) -> bool {
    match (slots[a].parent, slots[b].parent) {
        (Some(pa), Some(pb)) => pa == pb,
        _ => false,
    }
}

fn distance<F: SeparationFn>(slots: &[TidySlot], separation: &F, a: usize, b: usize) -> f32 {
    separation(slots[a].node, slots[b].node, same_parent(slots, a, b))
}

fn first_walk<F: SeparationFn>(slots: &mut Vec<TidySlot>, v: usize, separation: &F) {
    if slots[v].children.is_empty() {
        if let Some(w) = left_sibling(slots, v) {
            slots[v].prelim = slots[w].prelim + distance(slots, separation, w, v);
        }
        return;
    }

    let children = slots[v].children.clone();
    let mut default_ancestor = children[0];
    for &w in &children {
        first_walk(slots, w, separation);
        default_ancestor = apportion(slots, w, default_ancestor, separation);
    }
    execute_shifts(slots, v);

    let midpoint = (slots[children[0]].prelim + slots[children[children.len() - 1]].prelim) / 2.0;
    if let Some(w) = left_sibling(slots, v) {
        slots[v].prelim = slots[w].prelim + distance(slots, separation, w, v);
        slots[v].modifier = slots[v].prelim - midpoint;
    } else {
        slots[v].prelim = midpoint;
    }
}

fn apportion<F: SeparationFn>(
    slots: &mut Vec<TidySlot>,
    v: usize,
    mut default_ancestor: usize,
    separation: &F,
) -> usize {
    let Some(w) = left_sibling(slots, v) else {
        return default_ancestor;
    };

    let mut vip = v;
    let mut vop = v;
    let mut vim = w;
    let mut vom = leftmost_sibling(slots, vip);
    let mut sip = slots[vip].modifier;
    let mut sop = slots[vop].modifier;
    let mut sim = slots[vim].modifier;
    let mut som = slots[vom].modifier;

    while let (Some(nr), Some(nl)) = (next_right(slots, vim), next_left(slots, vip)) {
        vim = nr;
        vip = nl;
        vom = next_left(slots, vom).unwrap_or(vom);
        vop = next_right(slots, vop).unwrap_or(vop);
        slots[vop].ancestor = v;
        let shift = (slots[vim].prelim + sim) - (slots[vip].prelim + sip)
            + distance(slots, separation, vim, vip);
        if shift > 0.0 {
            let from = matched_ancestor(slots, vim, v, default_ancestor);
            move_subtree(slots, from, v, shift);
            sip += shift;
            sop += shift;
        }
        sim += slots[vim].modifier;
        sip += slots[vip].modifier;
        som += slots[vom].modifier;
        sop += slots[vop].modifier;
    }

    if next_right(slots, vim).is_some() && next_right(slots, vop).is_none() {
        slots[vop].thread = next_right(slots, vim);
        slots[vop].modifier += sim - sop;
    }
    if next_left(slots, vip).is_some() && next_left(slots, vom).is_none() {
        slots[vom].thread = next_left(slots, vip);
        slots[vom].modifier += sip - som;
        default_ancestor = v;
    }
    default_ancestor
}

fn matched_ancestor(slots: &[TidySlot], vim: usize, v: usize, default_ancestor: usize) -> usize {
    let candidate = slots[vim].ancestor;
    if same_parent(slots, candidate, v) {
        candidate
    } else {
        default_ancestor
    }
}

fn move_subtree(slots: &mut [TidySlot], wm: usize, wp: usize, shift: f32) {
    let subtrees = slots[wp].number.saturating_sub(slots[wm].number) as f32;
    if subtrees > 0.0 {
        slots[wp].change -= shift / subtrees;
        slots[wm].change += shift / subtrees;
    }
    slots[wp].shift += shift;
    slots[wp].prelim += shift;
    slots[wp].modifier += shift;
}

fn execute_shifts(slots: &mut [TidySlot], v: usize) {
    let mut shift = 0.0;
    let mut change = 0.0;
    let children = slots[v].children.clone();
    for &w in children.iter().rev() {
        slots[w].prelim += shift;
        slots[w].modifier += shift;
        change += slots[w].change;
        shift += slots[w].shift + change;
    }
}

fn second_walk(slots: &mut [TidySlot], v: usize, modifier: f32) {
    slots[v].x = slots[v].prelim + modifier;
    let children = slots[v].children.clone();
    let next = modifier + slots[v].modifier;
    for w in children {
        second_walk(slots, w, next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::InstanceNode;
    use std::collections::HashMap;

    fn tree(shape: &[(&str, &[&str])]) -> (InstanceArena, NodeId) {
        let mut arena = InstanceArena::new();
        let mut ids: HashMap<String, NodeId> = HashMap::new();
        for (name, _) in shape {
            let id = arena.alloc(InstanceNode::new(format!("urn:{name}"), *name));
            ids.insert((*name).to_string(), id);
        }
        for (name, children) in shape {
            for child in *children {
                let c = ids[*child];
                let p = ids[*name];
                arena[p].children.push(c);
                arena[c].parent = Some(p);
            }
        }
        (arena, ids[shape[0].0])
    }

    fn constant_sep(_: NodeId, _: NodeId, _: bool) -> f32 {
        10.0
    }

    #[test]
    fn single_node_sits_at_origin() {
        let (arena, root) = tree(&[("r", &[])]);
        let slots = run(&arena, root, constant_sep);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].x, 0.0);
        assert_eq!(slots[0].depth, 0);
    }

    #[test]
    fn parent_is_centered_over_children() {
        let (arena, root) = tree(&[("r", &["a", "b"]), ("a", &[]), ("b", &[])]);
        let slots = run(&arena, root, constant_sep);
        let by_node: HashMap<NodeId, f32> = slots.iter().map(|s| (s.node, s.x)).collect();
        let r = by_node[&root];
        let a = by_node[&arena[root].children[0]];
        let b = by_node[&arena[root].children[1]];
        assert!((r - (a + b) / 2.0).abs() < 1e-4);
        assert!((b - a - 10.0).abs() < 1e-4);
    }

    #[test]
    fn adjacent_nodes_respect_separation() {
        let (arena, root) = tree(&[
            ("r", &["a", "b", "c"]),
            ("a", &["a1", "a2"]),
            ("b", &["b1"]),
            ("c", &[]),
            ("a1", &[]),
            ("a2", &[]),
            ("b1", &[]),
        ]);
        let slots = run(&arena, root, |_, _, same| if same { 8.0 } else { 20.0 });
        let mut per_depth: HashMap<usize, Vec<f32>> = HashMap::new();
        for slot in &slots {
            per_depth.entry(slot.depth).or_default().push(slot.x);
        }
        for xs in per_depth.values_mut() {
            xs.sort_by(|a, b| a.partial_cmp(b).expect("finite"));
            for pair in xs.windows(2) {
                assert!(
                    pair[1] - pair[0] >= 8.0 - 1e-3,
                    "nodes closer than the minimum gap: {pair:?}"
                );
            }
        }
    }

    #[test]
    fn variable_extents_push_siblings_apart() {
        let (arena, root) = tree(&[("r", &["a", "b"]), ("a", &[]), ("b", &[])]);
        let mut extents: HashMap<NodeId, f32> = HashMap::new();
        extents.insert(arena[root].children[0], 100.0);
        extents.insert(arena[root].children[1], 20.0);
        let slots = run(&arena, root, |a, b, _| {
            extents.get(&a).copied().unwrap_or(10.0) / 2.0
                + extents.get(&b).copied().unwrap_or(10.0) / 2.0
                + 5.0
        });
        let a = slots.iter().find(|s| s.node == arena[root].children[0]).expect("a");
        let b = slots.iter().find(|s| s.node == arena[root].children[1]).expect("b");
        assert!((b.x - a.x - 65.0).abs() < 1e-3);
    }
}
