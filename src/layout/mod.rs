mod tidy;

use std::collections::HashMap;

use crate::config::ViewConfig;
use crate::ir::{InstanceArena, NodeId};
use crate::measure::BlockMeasurer;

/// Position of one visible node: `depth` grows rightward by a fixed amount
/// per level, `breadth` is whatever the tidy walk assigned given the
/// measured-height separation.
#[derive(Debug, Clone)]
pub struct PlacedNode {
    pub node: NodeId,
    pub depth: f32,
    pub breadth: f32,
    pub height: f32,
    pub level: usize,
}

/// A parent→child connector with the four control points of its cubic
/// spline, routed through the vertical midpoint between the levels.
#[derive(Debug, Clone)]
pub struct PlacedLink {
    pub source: NodeId,
    pub target: NodeId,
    /// (depth, breadth) control points.
    pub points: [(f32, f32); 4],
}

#[derive(Debug, Clone, Default)]
pub struct TreeLayout {
    pub nodes: Vec<PlacedNode>,
    pub links: Vec<PlacedLink>,
}

/// Lay out the visible tree. Heights are measured once per node and
/// memoized onto the record, then drive the separation of the tidy walk:
/// `half_height(a) + half_height(b)` plus a gap that depends on whether the
/// two nodes share a parent.
pub fn compute_tree_layout(
    arena: &mut InstanceArena,
    root: NodeId,
    measurer: &BlockMeasurer<'_>,
    config: &ViewConfig,
) -> TreeLayout {
    let visible = arena.visible(root);

    let mut heights: HashMap<NodeId, f32> = HashMap::with_capacity(visible.len());
    for &id in &visible {
        let height = match arena[id].rendered_height {
            Some(h) => h,
            None => {
                let h = measurer.node_height(&arena[id]);
                arena[id].rendered_height = Some(h);
                h
            }
        };
        heights.insert(id, height);
    }

    let same_gap = config.same_parent_gap;
    let diff_gap = config.diff_parent_gap;
    let slots = tidy::run(arena, root, |a, b, same_parent| {
        let ha = heights.get(&a).copied().unwrap_or(0.0);
        let hb = heights.get(&b).copied().unwrap_or(0.0);
        ha / 2.0 + hb / 2.0 + if same_parent { same_gap } else { diff_gap }
    });

    let mut position: HashMap<NodeId, (f32, f32)> = HashMap::with_capacity(slots.len());
    let mut nodes = Vec::with_capacity(slots.len());
    for slot in &slots {
        let depth = slot.depth as f32 * config.node_width;
        position.insert(slot.node, (depth, slot.x));
        nodes.push(PlacedNode {
            node: slot.node,
            depth,
            breadth: slot.x,
            height: heights.get(&slot.node).copied().unwrap_or(0.0),
            level: slot.depth,
        });
    }

    let mut links = Vec::new();
    for placed in &nodes {
        for &child in &arena[placed.node].children {
            let (sd, sb) = position[&placed.node];
            let (td, tb) = position[&child];
            links.push(PlacedLink {
                source: placed.node,
                target: child,
                points: link_points(sd, sb, td, tb, arena[child].is_group, config),
            });
        }
    }

    TreeLayout { nodes, links }
}

/// Control polygon of the connector: leaves the source block past its right
/// button, runs through the horizontal midpoint between the two levels, and
/// lands left of the target (group nodes have no left button, so their
/// landing point sits one button further in).
fn link_points(
    source_depth: f32,
    source_breadth: f32,
    target_depth: f32,
    target_breadth: f32,
    target_is_group: bool,
    config: &ViewConfig,
) -> [(f32, f32); 4] {
    let start = source_depth + config.node_width / 2.0 - config.button_width;
    let landing = if target_is_group {
        config.button_width * 2.0
    } else {
        config.button_width
    };
    let end = target_depth - config.node_width / 2.0 + landing;
    let mid = (source_depth + target_depth) / 2.0;
    [
        (start, source_breadth),
        (mid, source_breadth),
        (mid, target_breadth),
        (end, target_breadth),
    ]
}
