use ontotree::diff::Phase;
use ontotree::dump::FrameDump;
use ontotree::view::IdentityQueries;
use ontotree::{
    DeliverOutcome, InstanceSet, OntologySchema, Theme, TreeView, ViewConfig, instance_result,
    render_frame,
};
use serde_json::{Value, json};

fn schema() -> OntologySchema {
    let mut schema = OntologySchema::new();
    schema.add_class("urn:C1", Some("Person"));
    schema.add_class("urn:C2", Some("Project"));
    schema.add_object_property("urn:P1", Some("worksOn"));
    schema.add_object_property("urn:P2", Some("managedBy"));
    schema.add_object_property("urn:P3", Some("fundedBy"));
    schema.add_data_property("urn:D1", Some("age"));
    schema
}

fn view() -> TreeView {
    TreeView::new(
        ViewConfig::default(),
        Theme::classic(),
        schema(),
        Box::new(IdentityQueries),
    )
}

fn row(pairs: &[(&str, &str)]) -> Value {
    let mut obj = serde_json::Map::new();
    for (var, value) in pairs {
        obj.insert((*var).to_string(), json!({ "type": "uri", "value": value }));
    }
    Value::Object(obj)
}

/// I1 --P1--> I2 and I3 --P2--> I1, shaped like the raw endpoint response.
fn basic_response() -> InstanceSet {
    let raw = json!({
        "head": { "vars": ["object", "class", "aclass", "label",
                           "dataProperty", "dpropertyValue",
                           "objpout", "objpoutval", "objpin", "objpinval"] },
        "results": { "bindings": [
            row(&[("object", "urn:I1"), ("aclass", "Instance One"), ("class", "urn:C1"), ("label", "Instance One")]),
            row(&[("object", "urn:I1"), ("dataProperty", "urn:D1"), ("dpropertyValue", "41")]),
            row(&[("object", "urn:I1"), ("objpout", "urn:P1"), ("objpoutval", "urn:I2")]),
            row(&[("object", "urn:I1"), ("objpin", "urn:P2"), ("objpinval", "urn:I3")]),
            row(&[("object", "urn:I2"), ("class", "urn:C2"), ("label", "Instance Two")]),
            row(&[("object", "urn:I3"), ("class", "urn:C1"), ("label", "Instance Three")]),
        ]}
    });
    instance_result(&raw, "object").expect("normalize")
}

fn shown(view: &mut TreeView, iri: &str, set: InstanceSet) {
    let request = view.navigate(iri);
    assert_eq!(
        view.deliver(request.generation, Ok(set)),
        DeliverOutcome::Rendered
    );
}

#[test]
fn end_to_end_tree_shape() {
    let mut view = view();
    shown(&mut view, "urn:I1", basic_response());

    let root = view.root().expect("root");
    let arena = view.arena();
    assert_eq!(arena[root].iri, "urn:I1");
    assert_eq!(arena[root].name, "Instance One");
    assert!(arena[root].is_main);
    assert_eq!(arena[root].data_props[0].name, "age");

    let groups = &arena[root].children;
    assert_eq!(groups.len(), 2, "one group per relation");
    assert_eq!(arena[groups[0]].name, "worksOn");
    assert_eq!(arena[groups[1]].name, "managedBy");
    assert_eq!(arena[arena[groups[0]].children[0]].iri, "urn:I2");
    assert_eq!(arena[arena[groups[1]].children[0]].iri, "urn:I3");

    // First pass: every card and connector enters.
    assert_eq!(view.nodes().len(), 5);
    assert_eq!(view.links().len(), 4);
    assert!(
        view.nodes()
            .items()
            .iter()
            .all(|item| item.phase == Phase::Entering)
    );
}

#[test]
fn expand_then_collapse_restores_the_structure() {
    let mut view = view();
    shown(&mut view, "urn:I1", basic_response());

    let root = view.root().expect("root");
    let leaf = {
        let arena = view.arena();
        arena[arena[root].children[0]].children[0]
    };

    let keys_before: Vec<String> = view.nodes().keys().map(String::from).collect();
    let shape_before: Vec<(String, Vec<String>)> = tree_shape(&view);

    view.toggle_detail(leaf);
    assert!(view.arena()[leaf].expanded);
    let keys_open: Vec<String> = view
        .nodes()
        .items()
        .iter()
        .filter(|item| item.phase != Phase::Exiting)
        .map(|item| item.key.clone())
        .collect();
    assert_ne!(keys_before, keys_open, "expansion changes the node identity");

    // The collapsed rendering of the leaf is leaving the scene while the
    // expanded one enters: same entity, different rendering.
    let old_key = keys_before
        .iter()
        .find(|k| k.starts_with("Instance Two"))
        .expect("leaf key");
    assert_eq!(
        view.nodes().get(old_key).map(|item| item.phase),
        Some(Phase::Exiting)
    );

    view.toggle_detail(leaf);
    assert!(!view.arena()[leaf].expanded);
    assert_eq!(tree_shape(&view), shape_before, "topology never changed");
}

fn tree_shape(view: &TreeView) -> Vec<(String, Vec<String>)> {
    let arena = view.arena();
    let root = view.root().expect("root");
    arena
        .visible(root)
        .into_iter()
        .map(|id| {
            (
                arena[id].iri.clone(),
                arena[id].classes.iter().map(|c| c.id.clone()).collect(),
            )
        })
        .collect()
}

#[test]
fn collapse_hides_the_subtree_and_restores_it() {
    let mut view = view();
    shown(&mut view, "urn:I1", basic_response());
    let root = view.root().expect("root");

    assert_eq!(view.nodes().items().iter().filter(|i| i.phase != Phase::Exiting).count(), 5);
    view.toggle_children(root);
    let alive = view
        .nodes()
        .items()
        .iter()
        .filter(|i| i.phase != Phase::Exiting)
        .count();
    assert_eq!(alive, 1, "only the root card stays");

    view.toggle_children(root);
    let restored = tree_shape(&view);
    assert_eq!(restored.len(), 5);
}

#[test]
fn drill_attaches_a_deeper_fan_with_clones() {
    let mut view = view();
    shown(&mut view, "urn:I1", basic_response());
    let leaf = {
        let arena = view.arena();
        let root = view.root().expect("root");
        arena[arena[root].children[0]].children[0]
    };

    let request = view.drill(leaf).expect("leaf drills");
    let raw = json!({
        "results": { "bindings": [
            row(&[("object", "urn:I2"), ("aclass", "Instance Two"), ("class", "urn:C2")]),
            row(&[("object", "urn:I2"), ("objpout", "urn:P3"), ("objpoutval", "urn:I1")]),
            row(&[("object", "urn:I1"), ("class", "urn:C1")]),
        ]}
    });
    let deeper = instance_result(&raw, "object").expect("normalize");
    assert_eq!(
        view.deliver(request.generation, Ok(deeper)),
        DeliverOutcome::Rendered
    );

    let arena = view.arena();
    assert_eq!(arena[leaf].children.len(), 1);
    let group = arena[leaf].children[0];
    assert_eq!(arena[group].name, "fundedBy");
    let back = arena[group].children[0];
    assert_eq!(arena[back].iri, "urn:I1");
    assert!(
        arena[back].clone_tag.is_some(),
        "I1 is already the tree root, so the deeper occurrence is a clone"
    );
}

#[test]
fn history_moves_revisited_roots_to_the_end() {
    let mut view = view();
    shown(&mut view, "urn:I1", basic_response());

    let mut second = InstanceSet::new();
    second.entry("urn:I2").aclass.push("anchor".to_string());
    shown(&mut view, "urn:I2", second);
    assert_eq!(view.history().len(), 1);

    let mut third = InstanceSet::new();
    third.entry("urn:I1").aclass.push("anchor".to_string());
    shown(&mut view, "urn:I1", third);
    assert_eq!(view.history().len(), 2);

    // Back to I2: its old breadcrumb disappears, I1 appends last.
    let request = view.history_jump("urn:I2").expect("known entry");
    let mut again = InstanceSet::new();
    again.entry("urn:I2").aclass.push("anchor".to_string());
    view.deliver(request.generation, Ok(again));

    let order: Vec<&str> = view
        .history()
        .entries()
        .iter()
        .map(|e| e.iri.as_str())
        .collect();
    assert_eq!(order, vec!["urn:I2", "urn:I1"]);
    assert_eq!(view.breadcrumbs().len(), 2);
}

#[test]
fn animations_settle_at_their_targets() {
    let mut view = view();
    shown(&mut view, "urn:I1", basic_response());
    let duration = view.config().anim_duration_ms;

    view.tick(duration);
    for item in view.nodes().items() {
        assert_eq!(item.phase, Phase::Updating);
        assert!((item.state.opacity - 1.0).abs() < 1e-4);
        assert!(!item.in_flight());
    }

    // Collapse mid-frame, then let the exit tweens finish.
    let root = view.root().expect("root");
    view.toggle_children(root);
    view.tick(duration + duration / 2);
    assert!(
        view.nodes()
            .items()
            .iter()
            .any(|item| item.phase == Phase::Exiting)
    );
    view.tick(duration * 2 + 1);
    assert_eq!(view.nodes().len(), 1);
    assert_eq!(view.links().len(), 0);
}

#[test]
fn frame_renders_to_svg() {
    let mut view = view();
    shown(&mut view, "urn:I1", basic_response());
    view.tick(view.config().anim_duration_ms);

    let svg = render_frame(&view);
    assert!(svg.starts_with("<svg"));
    assert!(svg.ends_with("</svg>"));
    assert!(svg.contains("Instance One"));
    assert!(svg.contains("worksOn"));

    let dump = FrameDump::from_view(&view);
    assert_eq!(dump.nodes.len(), 5);
    let text = dump.to_json().expect("serialize");
    assert!(text.contains("\"updating\""));
}

#[test]
fn malformed_response_is_a_clean_failure() {
    let mut view = view();
    let request = view.navigate("urn:I1");
    let raw = json!({ "head": { "vars": ["object"] } });
    let outcome = match instance_result(&raw, "object") {
        Ok(set) => view.deliver(request.generation, Ok(set)),
        Err(err) => view.deliver(request.generation, Err(err.to_string())),
    };
    assert_eq!(outcome, DeliverOutcome::Failed);
    assert!(view.root().is_none());
    assert!(view.last_error().is_some());
    assert!(view.retry().is_some());
}
