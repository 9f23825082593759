use serde::{Deserialize, Serialize};

/// Geometry and timing of the tree view. Defaults are the calibrated values
/// of the original explorer widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub width: f32,
    pub height: f32,
    /// Horizontal spacing per tree level; also the width budget a node block
    /// plus its buttons must fit into.
    pub node_width: f32,
    /// Width reserved out of `node_width` for gutters; the text block itself
    /// is `node_width - node_gutter` wide.
    pub node_gutter: f32,
    pub button_width: f32,
    /// Breadth-axis gap between siblings of the same parent.
    pub same_parent_gap: f32,
    /// Breadth-axis gap between adjacent nodes of different parents.
    pub diff_parent_gap: f32,
    pub anim_duration_ms: u64,
    /// Upper bound on characters per wrapped text line.
    pub wrap_chars: usize,
    pub block_margin_x: f32,
    pub block_margin_y: f32,
    /// Top inset of the breadcrumb panel.
    pub history_top: f32,
    /// Vertical gap between breadcrumb entries.
    pub history_gap: f32,
}

impl ViewConfig {
    /// Width of a node's text block.
    pub fn block_width(&self) -> f32 {
        self.node_width - self.node_gutter
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 600.0,
            node_width: 300.0,
            node_gutter: 80.0,
            button_width: 20.0,
            same_parent_gap: 10.0,
            diff_parent_gap: 40.0,
            anim_duration_ms: 500,
            wrap_chars: 35,
            block_margin_x: 5.0,
            block_margin_y: 5.0,
            history_top: 70.0,
            history_gap: 10.0,
        }
    }
}
