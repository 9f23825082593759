use std::collections::HashMap;
use std::ops::{Index, IndexMut};

/// Arena handle for a rendered tree node. Parent/child relationships are
/// stored as handle lists, never as owning references, so cloning a record
/// never drags a subtree along with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

#[derive(Debug, Clone, PartialEq)]
pub struct ClassRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataProperty {
    pub name: String,
    pub value: String,
}

/// One incident object-property edge: `value` is the IRI of the opposite
/// endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPropertyEdge {
    pub id: String,
    pub name: String,
    pub value: String,
}

/// One node of the rendered tree: either an ontology individual or a
/// synthetic relation group (`is_group`).
#[derive(Debug, Clone)]
pub struct InstanceNode {
    pub iri: String,
    pub name: String,
    pub is_main: bool,
    pub is_group: bool,
    pub head_color: String,
    pub classes: Vec<ClassRef>,
    pub data_props: Vec<DataProperty>,
    pub in_props: Vec<ObjectPropertyEdge>,
    pub out_props: Vec<ObjectPropertyEdge>,
    pub expanded: bool,
    /// Distinguishes duplicate occurrences of the same source id within one
    /// tree. `None` for the canonical occurrence.
    pub clone_tag: Option<String>,
    pub children: Vec<NodeId>,
    /// Children stashed by a collapse; mutually exclusive with `children`
    /// being populated.
    pub collapsed_children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    /// Measured block height, memoized per layout pass.
    pub rendered_height: Option<f32>,
}

impl InstanceNode {
    pub fn new(iri: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            iri: iri.into(),
            name: name.into(),
            is_main: false,
            is_group: false,
            head_color: String::new(),
            classes: Vec::new(),
            data_props: Vec::new(),
            in_props: Vec::new(),
            out_props: Vec::new(),
            expanded: false,
            clone_tag: None,
            children: Vec::new(),
            collapsed_children: Vec::new(),
            parent: None,
            rendered_height: None,
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty() || !self.collapsed_children.is_empty()
    }

    pub fn is_leaf(&self) -> bool {
        !self.has_children()
    }
}

/// Flat storage for every node of the current exploration tree.
#[derive(Debug, Default)]
pub struct InstanceArena {
    nodes: Vec<InstanceNode>,
}

impl InstanceArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, node: InstanceNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Duplicate a record under a fresh handle. Display data is copied;
    /// topology (children, parent) and per-pass state are reset so the clone
    /// lives an independent life in the tree.
    pub fn clone_record(&mut self, source: NodeId, clone_tag: String) -> NodeId {
        let mut copy = self.nodes[source.0 as usize].clone();
        copy.clone_tag = Some(clone_tag);
        copy.children.clear();
        copy.collapsed_children.clear();
        copy.parent = None;
        copy.expanded = false;
        copy.rendered_height = None;
        self.alloc(copy)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Pre-order walk over the visible tree (collapsed subtrees excluded).
    pub fn visible(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            for &child in self[id].children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Clear memoized block heights ahead of a fresh measurement pass.
    pub fn reset_heights(&mut self) {
        for node in &mut self.nodes {
            node.rendered_height = None;
        }
    }
}

impl Index<NodeId> for InstanceArena {
    type Output = InstanceNode;

    fn index(&self, id: NodeId) -> &InstanceNode {
        &self.nodes[id.0 as usize]
    }
}

impl IndexMut<NodeId> for InstanceArena {
    fn index_mut(&mut self, id: NodeId) -> &mut InstanceNode {
        &mut self.nodes[id.0 as usize]
    }
}

/// One normalized record of the upstream query response.
#[derive(Debug, Clone, Default)]
pub struct FlatRecord {
    pub labels: Vec<String>,
    /// Non-empty marks the record the query was anchored on.
    pub aclass: Vec<String>,
    pub classes: Vec<String>,
    /// Paired (property iri, literal value).
    pub data_props: Vec<(String, String)>,
    /// Paired (property iri, target iri) for outgoing edges.
    pub out_edges: Vec<(String, String)>,
    /// Paired (property iri, source iri) for incoming edges.
    pub in_edges: Vec<(String, String)>,
}

/// Insertion-ordered flat map of normalized instance records. Relation
/// discovery order — and therefore relation-group order in the tree —
/// follows the order records first appeared here.
#[derive(Debug, Clone, Default)]
pub struct InstanceSet {
    order: Vec<String>,
    records: HashMap<String, FlatRecord>,
}

impl InstanceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&mut self, iri: &str) -> &mut FlatRecord {
        if !self.records.contains_key(iri) {
            self.order.push(iri.to_string());
            self.records.insert(iri.to_string(), FlatRecord::default());
        }
        self.records.get_mut(iri).expect("record inserted above")
    }

    pub fn get(&self, iri: &str) -> Option<&FlatRecord> {
        self.records.get(iri)
    }

    pub fn contains(&self, iri: &str) -> bool {
        self.records.contains_key(iri)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FlatRecord)> {
        self.order
            .iter()
            .map(|iri| (iri.as_str(), &self.records[iri]))
    }

    /// The record flagged as the query anchor, if any.
    pub fn focal(&self) -> Option<&str> {
        self.order
            .iter()
            .find(|iri| !self.records[*iri].aclass.is_empty())
            .map(String::as_str)
    }
}
