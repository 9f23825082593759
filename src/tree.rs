use std::collections::{HashMap, HashSet};

use crate::ir::{
    ClassRef, DataProperty, FlatRecord, InstanceArena, InstanceNode, InstanceSet, NodeId,
    ObjectPropertyEdge,
};
use crate::schema::{OntologySchema, display_name};
use crate::theme::{Theme, class_color};
use crate::view::ViewError;

/// Source ids already shown somewhere in the accumulated exploration tree,
/// plus the counter that mints clone tags. The registry spans every build
/// that grew the same tree, so re-rooting deeper keeps producing clones for
/// ids the user can already see.
#[derive(Debug, Default)]
pub struct UsedIds {
    seen: HashSet<String>,
    clone_seq: u32,
}

impl UsedIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when this id was never attached before; marks it used either way.
    pub fn first_use(&mut self, id: &str) -> bool {
        self.seen.insert(id.to_string())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn next_tag(&mut self) -> String {
        self.clone_seq += 1;
        format!("_{}", self.clone_seq)
    }
}

/// How the built relation fan attaches to the exploration tree.
pub enum BuildMode {
    /// Fresh render: the focal instance becomes the tree root.
    Root,
    /// Drill: the relation groups become children of an existing node.
    Attach(NodeId),
}

struct Relation {
    prop: String,
    incoming: bool,
    name: String,
    members: HashSet<String>,
}

impl Relation {
    fn group_iri(&self) -> String {
        let dir = if self.incoming { "in" } else { "out" };
        format!("{}@{}", self.prop, dir)
    }
}

/// Turns a flat instance map into a rooted relation tree: one synthetic
/// group node per (object property, direction) fanning out to the connected
/// instances, with structural clones for ids already shown elsewhere.
pub struct TreeBuilder<'a> {
    schema: &'a OntologySchema,
    theme: &'a Theme,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(schema: &'a OntologySchema, theme: &'a Theme) -> Self {
        Self { schema, theme }
    }

    pub fn build(
        &self,
        arena: &mut InstanceArena,
        set: &InstanceSet,
        focal_iri: &str,
        used: &mut UsedIds,
        mode: BuildMode,
    ) -> Result<NodeId, ViewError> {
        let focal_flagged = set
            .get(focal_iri)
            .map(|rec| !rec.aclass.is_empty())
            .unwrap_or(false);
        if !focal_flagged {
            return Err(ViewError::MissingFocal(focal_iri.to_string()));
        }

        let mut node_of: HashMap<&str, NodeId> = HashMap::new();
        for (iri, rec) in set.iter() {
            let node = self.make_node(iri, rec, focal_iri);
            node_of.insert(iri, arena.alloc(node));
        }

        let relations = self.collect_relations(set);

        // Relation groups materialize in the order instances are discovered,
        // not in side-table order.
        let mut groups: Vec<NodeId> = Vec::new();
        let mut group_of: HashMap<usize, NodeId> = HashMap::new();
        for (iri, _) in set.iter() {
            if iri == focal_iri {
                continue;
            }
            for (index, relation) in relations.iter().enumerate() {
                if !relation.members.contains(iri) {
                    continue;
                }
                let member = node_of[iri];
                let group = match group_of.get(&index) {
                    Some(&g) => g,
                    None => {
                        let g = self.alloc_group(arena, relation, member, used);
                        group_of.insert(index, g);
                        groups.push(g);
                        g
                    }
                };
                let attached = if used.first_use(iri) {
                    member
                } else {
                    arena.clone_record(member, used.next_tag())
                };
                arena[attached].parent = Some(group);
                arena[group].children.push(attached);
            }
        }

        let root = match mode {
            BuildMode::Attach(existing) => existing,
            BuildMode::Root => {
                let focal_node = node_of[focal_iri];
                if used.first_use(focal_iri) {
                    focal_node
                } else {
                    let copy = arena.clone_record(focal_node, used.next_tag());
                    arena[copy].is_main = true;
                    copy
                }
            }
        };

        arena[root].collapsed_children.clear();
        arena[root].children = groups.clone();
        for group in groups {
            arena[group].parent = Some(root);
        }
        Ok(root)
    }

    fn make_node(&self, iri: &str, rec: &FlatRecord, focal_iri: &str) -> InstanceNode {
        let name = display_name(iri, rec.labels.first().map(String::as_str));
        let mut node = InstanceNode::new(iri, name);
        node.is_main = iri == focal_iri;
        node.head_color = rec
            .classes
            .iter()
            .find(|class| self.schema.class_rank(class).is_some())
            .map(|class| class_color(class, self.schema.classes()))
            .unwrap_or_else(|| self.theme.muted_color.clone());
        node.classes = rec
            .classes
            .iter()
            .map(|class| ClassRef {
                id: class.clone(),
                name: self.schema.class_name(class),
            })
            .collect();
        node.data_props = rec
            .data_props
            .iter()
            .map(|(prop, value)| DataProperty {
                name: self.schema.data_property_name(prop),
                value: value.clone(),
            })
            .collect();
        node.in_props = self.edge_list(&rec.in_edges);
        node.out_props = self.edge_list(&rec.out_edges);
        node
    }

    fn edge_list(&self, edges: &[(String, String)]) -> Vec<ObjectPropertyEdge> {
        edges
            .iter()
            .map(|(prop, value)| ObjectPropertyEdge {
                id: prop.clone(),
                name: self.schema.object_property_name(prop),
                value: value.clone(),
            })
            .collect()
    }

    /// Accumulate the (property, direction) → neighbour-set side tables from
    /// every record's incident edges, incoming before outgoing.
    fn collect_relations(&self, set: &InstanceSet) -> Vec<Relation> {
        let mut relations: Vec<Relation> = Vec::new();
        let mut index: HashMap<(String, bool), usize> = HashMap::new();
        let mut add = |relations: &mut Vec<Relation>, prop: &str, incoming: bool, other: &str| {
            let key = (prop.to_string(), incoming);
            let slot = *index.entry(key).or_insert_with(|| {
                relations.push(Relation {
                    prop: prop.to_string(),
                    incoming,
                    name: self.schema.object_property_name(prop),
                    members: HashSet::new(),
                });
                relations.len() - 1
            });
            relations[slot].members.insert(other.to_string());
        };
        for (_, rec) in set.iter() {
            for (prop, source) in &rec.in_edges {
                add(&mut relations, prop, true, source);
            }
            for (prop, target) in &rec.out_edges {
                add(&mut relations, prop, false, target);
            }
        }
        relations
    }

    fn alloc_group(
        &self,
        arena: &mut InstanceArena,
        relation: &Relation,
        first_member: NodeId,
        used: &mut UsedIds,
    ) -> NodeId {
        let mut group = InstanceNode::new(relation.group_iri(), relation.name.clone());
        group.is_group = true;
        group.head_color = arena[first_member].head_color.clone();
        let id = arena.alloc(group);
        if !used.first_use(&arena[id].iri) {
            let tag = used.next_tag();
            arena[id].clone_tag = Some(tag);
        }
        id
    }
}
