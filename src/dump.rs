use serde::Serialize;

use crate::diff::Phase;
use crate::view::TreeView;

/// Serializable snapshot of the animated scene, for debugging and for
/// asserting on frames in tests.
#[derive(Debug, Serialize)]
pub struct FrameDump {
    pub node_count: usize,
    pub nodes: Vec<NodeDump>,
    pub links: Vec<LinkDump>,
    pub breadcrumbs: Vec<BreadcrumbDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub key: String,
    pub iri: String,
    pub x: f32,
    pub y: f32,
    pub opacity: f32,
    pub phase: String,
    pub expanded: bool,
    pub is_group: bool,
}

#[derive(Debug, Serialize)]
pub struct LinkDump {
    pub key: String,
    pub points: Vec<[f32; 2]>,
    pub opacity: f32,
    pub phase: String,
}

#[derive(Debug, Serialize)]
pub struct BreadcrumbDump {
    pub iri: String,
    pub y: f32,
    pub opacity: f32,
}

fn phase_name(phase: Phase) -> String {
    match phase {
        Phase::Entering => "entering",
        Phase::Updating => "updating",
        Phase::Exiting => "exiting",
    }
    .to_string()
}

impl FrameDump {
    pub fn from_view(view: &TreeView) -> Self {
        let nodes = view
            .nodes()
            .items()
            .iter()
            .map(|item| NodeDump {
                key: item.key.clone(),
                iri: item.data.iri.clone(),
                x: item.state.x,
                y: item.state.y,
                opacity: item.state.opacity,
                phase: phase_name(item.phase),
                expanded: item.data.expanded,
                is_group: item.data.is_group,
            })
            .collect::<Vec<_>>();
        let links = view
            .links()
            .items()
            .iter()
            .map(|item| LinkDump {
                key: item.key.clone(),
                points: item
                    .state
                    .points
                    .iter()
                    .map(|&(x, y)| [x, y])
                    .collect(),
                opacity: item.state.opacity,
                phase: phase_name(item.phase),
            })
            .collect();
        let breadcrumbs = view
            .breadcrumbs()
            .items()
            .iter()
            .map(|item| BreadcrumbDump {
                iri: item.data.iri.clone(),
                y: item.state.y,
                opacity: item.state.opacity,
            })
            .collect();
        Self {
            node_count: nodes.len(),
            nodes,
            links,
            breadcrumbs,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
