use log::{debug, warn};
use std::collections::HashMap;
use thiserror::Error;

use crate::config::ViewConfig;
use crate::diff::{Animate, KeyedScene, SceneTarget, lerp_f32};
use crate::history::{History, HistoryEntry};
use crate::ir::{InstanceArena, InstanceSet, NodeId};
use crate::keys::{link_key, node_key};
use crate::layout::compute_tree_layout;
use crate::measure::{BlockMeasurer, MeasuredBlock};
use crate::schema::{OntologySchema, is_anonymous};
use crate::theme::Theme;
use crate::tree::{BuildMode, TreeBuilder, UsedIds};

#[derive(Debug, Error)]
pub enum ViewError {
    /// The external executor reported a failure; the last rendered tree
    /// stays on screen.
    #[error("query failed: {0}")]
    QueryFailed(String),
    /// The normalized result carries no record flagged as the focal
    /// instance.
    #[error("no record flagged as focal for {0} in the result set")]
    MissingFocal(String),
}

/// Builds the opaque query text for a focal instance. The view passes the
/// string through to the host untouched.
pub trait QueryBuilder {
    fn instance_query(&self, iri: &str) -> String;
}

impl<F: Fn(&str) -> String> QueryBuilder for F {
    fn instance_query(&self, iri: &str) -> String {
        self(iri)
    }
}

/// For hosts that map the focal iri to a query themselves.
pub struct IdentityQueries;

impl QueryBuilder for IdentityQueries {
    fn instance_query(&self, iri: &str) -> String {
        iri.to_string()
    }
}

/// A request the host must execute and answer through [`TreeView::deliver`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub generation: u64,
    pub focal_iri: String,
    pub query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliverOutcome {
    Rendered,
    /// The response belonged to a superseded request and was dropped.
    Stale,
    /// The response could not be applied; the previous tree is untouched.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingMode {
    Navigate,
    Drill(NodeId),
}

#[derive(Debug, Clone)]
struct PendingQuery {
    generation: u64,
    mode: PendingMode,
    iri: String,
}

/// Animated state of a node card.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSprite {
    pub x: f32,
    pub y: f32,
    pub opacity: f32,
}

impl Animate for NodeSprite {
    fn lerp(from: &Self, to: &Self, t: f32) -> Self {
        Self {
            x: lerp_f32(from.x, to.x, t),
            y: lerp_f32(from.y, to.y, t),
            opacity: lerp_f32(from.opacity, to.opacity, t),
        }
    }
}

/// Animated state of a connector spline.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkSprite {
    pub points: [(f32, f32); 4],
    pub opacity: f32,
}

impl Animate for LinkSprite {
    fn lerp(from: &Self, to: &Self, t: f32) -> Self {
        let mut points = [(0.0, 0.0); 4];
        for (i, point) in points.iter_mut().enumerate() {
            point.0 = lerp_f32(from.points[i].0, to.points[i].0, t);
            point.1 = lerp_f32(from.points[i].1, to.points[i].1, t);
        }
        Self {
            points,
            opacity: lerp_f32(from.opacity, to.opacity, t),
        }
    }
}

/// Animated state of a breadcrumb row.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelSprite {
    pub x: f32,
    pub y: f32,
    pub opacity: f32,
}

impl Animate for PanelSprite {
    fn lerp(from: &Self, to: &Self, t: f32) -> Self {
        Self {
            x: lerp_f32(from.x, to.x, t),
            y: lerp_f32(from.y, to.y, t),
            opacity: lerp_f32(from.opacity, to.opacity, t),
        }
    }
}

/// Everything a host needs to draw a node card and route interactions back.
#[derive(Debug, Clone)]
pub struct NodeVisual {
    pub node: NodeId,
    pub iri: String,
    pub parent_key: Option<String>,
    pub blocks: Vec<MeasuredBlock>,
    pub height: f32,
    pub head_color: String,
    pub is_group: bool,
    pub has_children: bool,
    pub expanded: bool,
    /// Whether the node can be navigated to (not a synthetic group, not a
    /// blank node).
    pub navigable: bool,
}

#[derive(Debug, Clone)]
pub struct LinkVisual {
    pub color: String,
}

#[derive(Debug, Clone)]
pub struct PanelVisual {
    pub iri: String,
    pub lines: Vec<String>,
    pub color: String,
    pub height: f32,
}

/// The interactive tree view: owns the exploration tree, the breadcrumb
/// history and the three keyed scenes, and re-renders itself on every
/// mutation. One logical thread of control; the host feeds it input events,
/// query responses and clock ticks.
pub struct TreeView {
    config: ViewConfig,
    theme: Theme,
    schema: OntologySchema,
    queries: Box<dyn QueryBuilder>,
    arena: InstanceArena,
    root: Option<NodeId>,
    used: UsedIds,
    history: History,
    nodes_scene: KeyedScene<NodeSprite, NodeVisual>,
    links_scene: KeyedScene<LinkSprite, LinkVisual>,
    history_scene: KeyedScene<PanelSprite, PanelVisual>,
    generation: u64,
    pending: Option<PendingQuery>,
    failed: Option<(PendingMode, String)>,
    last_error: Option<ViewError>,
    pass: u64,
    clock_ms: u64,
}

impl TreeView {
    pub fn new(
        config: ViewConfig,
        theme: Theme,
        schema: OntologySchema,
        queries: Box<dyn QueryBuilder>,
    ) -> Self {
        Self {
            config,
            theme,
            schema,
            queries,
            arena: InstanceArena::new(),
            root: None,
            used: UsedIds::new(),
            history: History::new(),
            nodes_scene: KeyedScene::new(),
            links_scene: KeyedScene::new(),
            history_scene: KeyedScene::new(),
            generation: 0,
            pending: None,
            failed: None,
            last_error: None,
            pass: 0,
            clock_ms: 0,
        }
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn schema(&self) -> &OntologySchema {
        &self.schema
    }

    pub fn arena(&self) -> &InstanceArena {
        &self.arena
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn nodes(&self) -> &KeyedScene<NodeSprite, NodeVisual> {
        &self.nodes_scene
    }

    pub fn links(&self) -> &KeyedScene<LinkSprite, LinkVisual> {
        &self.links_scene
    }

    pub fn breadcrumbs(&self) -> &KeyedScene<PanelSprite, PanelVisual> {
        &self.history_scene
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_error(&self) -> Option<&ViewError> {
        self.last_error.as_ref()
    }

    /// Re-root the view on another instance. The current root (if any) moves
    /// into the breadcrumbs; the returned request must be executed by the
    /// host and answered through [`deliver`](Self::deliver).
    pub fn navigate(&mut self, iri: &str) -> QueryRequest {
        self.remember_current_root();
        self.issue(PendingMode::Navigate, iri)
    }

    /// Expand the exploration tree in place below a leaf instance. Returns
    /// `None` for synthetic groups, non-leaves and blank nodes.
    pub fn drill(&mut self, node: NodeId) -> Option<QueryRequest> {
        let record = &self.arena[node];
        if record.is_group || record.has_children() || is_anonymous(&record.iri) {
            return None;
        }
        let iri = record.iri.clone();
        Some(self.issue(PendingMode::Drill(node), &iri))
    }

    /// Jump back to a breadcrumb entry.
    pub fn history_jump(&mut self, iri: &str) -> Option<QueryRequest> {
        if !self.history.contains(iri) {
            return None;
        }
        self.remember_current_root();
        Some(self.issue(PendingMode::Navigate, iri))
    }

    /// Re-issue the last failed request under a fresh generation.
    pub fn retry(&mut self) -> Option<QueryRequest> {
        let (mode, iri) = self.failed.take()?;
        Some(self.issue(mode, &iri))
    }

    fn issue(&mut self, mode: PendingMode, iri: &str) -> QueryRequest {
        self.generation += 1;
        self.pending = Some(PendingQuery {
            generation: self.generation,
            mode,
            iri: iri.to_string(),
        });
        QueryRequest {
            generation: self.generation,
            focal_iri: iri.to_string(),
            query: self.queries.instance_query(iri),
        }
    }

    fn remember_current_root(&mut self) {
        let Some(root) = self.root else {
            return;
        };
        let measurer = BlockMeasurer::new(&self.theme, &self.config);
        let node = &self.arena[root];
        let summary = measurer.summary(&node.name, &node.head_color);
        self.history.push(HistoryEntry {
            iri: node.iri.clone(),
            name: node.name.clone(),
            head_color: node.head_color.clone(),
            rendered_height: summary.height,
        });
    }

    /// Apply a completed query. Responses for any generation other than the
    /// latest issued one are dropped — a slow response can never overwrite a
    /// faster newer one. A failure leaves the last rendered tree untouched
    /// and arms [`retry`](Self::retry).
    pub fn deliver(
        &mut self,
        generation: u64,
        result: Result<InstanceSet, String>,
    ) -> DeliverOutcome {
        let pending = match self.pending.take_if(|p| p.generation == generation) {
            Some(pending) => pending,
            None => {
                warn!(
                    "dropping stale response for generation {generation} (latest request is {:?})",
                    self.pending.as_ref().map(|p| p.generation)
                );
                return DeliverOutcome::Stale;
            }
        };

        let set = match result {
            Ok(set) => set,
            Err(message) => {
                warn!("query for {} failed: {message}", pending.iri);
                self.last_error = Some(ViewError::QueryFailed(message));
                self.failed = Some((pending.mode, pending.iri));
                return DeliverOutcome::Failed;
            }
        };

        let builder = TreeBuilder::new(&self.schema, &self.theme);
        match pending.mode {
            PendingMode::Navigate => {
                // Build into scratch state so a shape mismatch cannot tear
                // down the tree currently on screen.
                let mut arena = InstanceArena::new();
                let mut used = UsedIds::new();
                match builder.build(&mut arena, &set, &pending.iri, &mut used, BuildMode::Root) {
                    Ok(root) => {
                        self.arena = arena;
                        self.used = used;
                        self.root = Some(root);
                    }
                    Err(err) => {
                        warn!("navigate to {} failed: {err}", pending.iri);
                        self.last_error = Some(err);
                        self.failed = Some((pending.mode, pending.iri));
                        return DeliverOutcome::Failed;
                    }
                }
            }
            PendingMode::Drill(node) => {
                match builder.build(
                    &mut self.arena,
                    &set,
                    &pending.iri,
                    &mut self.used,
                    BuildMode::Attach(node),
                ) {
                    Ok(_) => {}
                    Err(err) => {
                        warn!("drill into {} failed: {err}", pending.iri);
                        self.last_error = Some(err);
                        self.failed = Some((pending.mode, pending.iri));
                        return DeliverOutcome::Failed;
                    }
                }
            }
        }

        self.last_error = None;
        self.failed = None;
        self.render_pass();
        DeliverOutcome::Rendered
    }

    /// Toggle the detail panel of a node. Local mutation only: re-renders
    /// synchronously, never re-queries.
    pub fn toggle_detail(&mut self, node: NodeId) {
        if self.arena[node].classes.is_empty() {
            return;
        }
        let expanded = !self.arena[node].expanded;
        self.arena[node].expanded = expanded;
        self.render_pass();
    }

    /// Collapse or re-open a node's subtree. Local mutation only; the
    /// stashed children keep their own display state.
    pub fn toggle_children(&mut self, node: NodeId) {
        let record = &mut self.arena[node];
        if !record.children.is_empty() {
            record.collapsed_children = std::mem::take(&mut record.children);
        } else if !record.collapsed_children.is_empty() {
            record.children = std::mem::take(&mut record.collapsed_children);
        } else {
            return;
        }
        self.render_pass();
    }

    /// Advance the animation clock. The host calls this once per frame.
    pub fn tick(&mut self, now_ms: u64) {
        self.clock_ms = now_ms;
        self.nodes_scene.tick(now_ms);
        self.links_scene.tick(now_ms);
        self.history_scene.tick(now_ms);
    }

    /// One full measurement + layout + reconcile pass over the current tree.
    /// Expand/collapse handlers re-enter here synchronously; transitions are
    /// stamped with the pass counter and always retarget from the current
    /// animated value, so superseding an in-flight pass is safe.
    fn render_pass(&mut self) {
        let Some(root) = self.root else {
            return;
        };
        self.pass += 1;
        self.arena.reset_heights();

        let measurer = BlockMeasurer::new(&self.theme, &self.config);
        let layout = compute_tree_layout(&mut self.arena, root, &measurer, &self.config);
        debug!(
            "render pass {}: {} nodes, {} links",
            self.pass,
            layout.nodes.len(),
            layout.links.len()
        );

        let offset = self.config.node_width;
        let mut key_of: HashMap<NodeId, String> = HashMap::with_capacity(layout.nodes.len());
        let mut screen: HashMap<NodeId, (f32, f32)> = HashMap::with_capacity(layout.nodes.len());
        for placed in &layout.nodes {
            key_of.insert(placed.node, node_key(&self.arena, placed.node));
            screen.insert(placed.node, (offset + placed.depth, placed.breadth));
        }

        let mut node_targets = Vec::with_capacity(layout.nodes.len());
        for placed in &layout.nodes {
            let record = &self.arena[placed.node];
            let (x, y) = screen[&placed.node];
            let parent_key = record.parent.and_then(|p| key_of.get(&p).cloned());
            let enter_from = match record.parent {
                Some(parent) => {
                    let prior = parent_key
                        .as_ref()
                        .and_then(|key| self.nodes_scene.get(key))
                        .map(|item| (item.state.x, item.state.y));
                    let (px, py) = prior
                        .or_else(|| screen.get(&parent).copied())
                        .unwrap_or((offset, 0.0));
                    NodeSprite {
                        x: px,
                        y: py,
                        opacity: 0.0,
                    }
                }
                None => NodeSprite {
                    x: offset,
                    y: 0.0,
                    opacity: 0.0,
                },
            };
            node_targets.push(SceneTarget {
                key: key_of[&placed.node].clone(),
                state: NodeSprite { x, y, opacity: 1.0 },
                enter_from,
                data: NodeVisual {
                    node: placed.node,
                    iri: record.iri.clone(),
                    parent_key,
                    blocks: measurer.node_blocks(record),
                    height: placed.height,
                    head_color: record.head_color.clone(),
                    is_group: record.is_group,
                    has_children: record.has_children(),
                    expanded: record.expanded,
                    navigable: !record.is_group && !is_anonymous(&record.iri),
                },
            });
        }

        let mut link_targets = Vec::with_capacity(layout.links.len());
        for link in &layout.links {
            let points = link.points.map(|(depth, breadth)| (offset + depth, breadth));
            link_targets.push(SceneTarget {
                key: link_key(&self.arena, link.source, link.target),
                state: LinkSprite {
                    points,
                    opacity: 1.0,
                },
                enter_from: LinkSprite {
                    points: [(offset, 0.0); 4],
                    opacity: 1.0,
                },
                data: LinkVisual {
                    color: self.arena[link.target].head_color.clone(),
                },
            });
        }

        let panel_x = self.config.node_width / 2.0;
        let offsets = self.history.offsets(&self.config);
        let mut panel_targets = Vec::with_capacity(offsets.len());
        for (entry, y) in self.history.entries().iter().zip(offsets) {
            let summary = measurer.summary(&entry.name, &entry.head_color);
            panel_targets.push(SceneTarget {
                key: entry.iri.clone(),
                state: PanelSprite {
                    x: panel_x,
                    y,
                    opacity: 1.0,
                },
                enter_from: PanelSprite {
                    x: panel_x,
                    y,
                    opacity: 0.0,
                },
                data: PanelVisual {
                    iri: entry.iri.clone(),
                    lines: summary.lines,
                    color: entry.head_color.clone(),
                    height: entry.rendered_height,
                },
            });
        }

        let now = self.clock_ms;
        let duration = self.config.anim_duration_ms;
        let pass = self.pass;

        self.nodes_scene.apply(
            node_targets,
            |item, new_states| {
                // Disappearing cards chase the new position of their parent;
                // orphans fade in place.
                match item.data.parent_key.as_ref().and_then(|k| new_states.get(k)) {
                    Some(parent) => NodeSprite {
                        x: parent.x,
                        y: parent.y,
                        opacity: 0.0,
                    },
                    None => NodeSprite {
                        opacity: 0.0,
                        ..item.state.clone()
                    },
                }
            },
            now,
            duration,
            pass,
        );
        self.links_scene.apply(
            link_targets,
            |item, _| {
                // Collapse onto the landing point while fading.
                let end = item.state.points[3];
                LinkSprite {
                    points: [end; 4],
                    opacity: 0.0,
                }
            },
            now,
            duration,
            pass,
        );
        self.history_scene.apply(
            panel_targets,
            |item, _| PanelSprite {
                opacity: 0.0,
                ..item.state.clone()
            },
            now,
            duration,
            pass,
        );
    }
}
