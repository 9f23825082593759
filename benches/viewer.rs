use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use ontotree::diff::{Animate, KeyedScene, SceneTarget, lerp_f32};
use ontotree::measure::BlockMeasurer;
use ontotree::tree::{BuildMode, TreeBuilder, UsedIds};
use ontotree::{InstanceArena, InstanceSet, OntologySchema, Theme, ViewConfig, compute_tree_layout};

fn fan_schema(properties: usize) -> OntologySchema {
    let mut schema = OntologySchema::new();
    schema.add_class("urn:C0", Some("Entity"));
    for p in 0..properties {
        let label = format!("relation {p}");
        schema.add_object_property(&format!("urn:P{p}"), Some(label.as_str()));
    }
    schema
}

/// A focal instance fanning out over `properties` relations with
/// `per_property` neighbours each.
fn fan_set(properties: usize, per_property: usize) -> InstanceSet {
    let mut set = InstanceSet::new();
    {
        let rec = set.entry("urn:I0");
        rec.aclass.push("anchor".to_string());
        rec.classes.push("urn:C0".to_string());
        for p in 0..properties {
            for n in 0..per_property {
                rec.out_edges
                    .push((format!("urn:P{p}"), format!("urn:N{p}_{n}")));
            }
        }
    }
    for p in 0..properties {
        for n in 0..per_property {
            let rec = set.entry(&format!("urn:N{p}_{n}"));
            rec.classes.push("urn:C0".to_string());
            rec.labels.push(format!("neighbour {p} {n} with a label"));
        }
    }
    set
}

const SIZES: [(usize, usize); 3] = [(4, 8), (8, 16), (12, 32)];

fn bench_tree_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_build");
    let theme = Theme::classic();
    for (properties, per_property) in SIZES {
        let schema = fan_schema(properties);
        let set = fan_set(properties, per_property);
        let name = format!("fan_{properties}x{per_property}");
        group.bench_with_input(BenchmarkId::from_parameter(name), &set, |b, set| {
            let builder = TreeBuilder::new(&schema, &theme);
            b.iter(|| {
                let mut arena = InstanceArena::new();
                let mut used = UsedIds::new();
                let root = builder
                    .build(&mut arena, black_box(set), "urn:I0", &mut used, BuildMode::Root)
                    .expect("build");
                black_box(arena[root].children.len());
            });
        });
    }
    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let theme = Theme::classic();
    let config = ViewConfig::default();
    for (properties, per_property) in SIZES {
        let schema = fan_schema(properties);
        let set = fan_set(properties, per_property);
        let builder = TreeBuilder::new(&schema, &theme);
        let mut arena = InstanceArena::new();
        let mut used = UsedIds::new();
        let root = builder
            .build(&mut arena, &set, "urn:I0", &mut used, BuildMode::Root)
            .expect("build");
        let name = format!("fan_{properties}x{per_property}");
        group.bench_function(name, |b| {
            let measurer = BlockMeasurer::new(&theme, &config);
            b.iter(|| {
                arena.reset_heights();
                let layout = compute_tree_layout(&mut arena, root, &measurer, &config);
                black_box(layout.nodes.len());
            });
        });
    }
    group.finish();
}

#[derive(Debug, Clone)]
struct Dot {
    x: f32,
    y: f32,
    opacity: f32,
}

impl Animate for Dot {
    fn lerp(from: &Self, to: &Self, t: f32) -> Self {
        Dot {
            x: lerp_f32(from.x, to.x, t),
            y: lerp_f32(from.y, to.y, t),
            opacity: lerp_f32(from.opacity, to.opacity, t),
        }
    }
}

fn dot_targets(count: usize, shift: f32) -> Vec<SceneTarget<Dot, usize>> {
    (0..count)
        .map(|i| SceneTarget {
            key: format!("k{i}"),
            state: Dot {
                x: i as f32 * 10.0 + shift,
                y: i as f32 * 4.0,
                opacity: 1.0,
            },
            enter_from: Dot {
                x: 0.0,
                y: 0.0,
                opacity: 0.0,
            },
            data: i,
        })
        .collect()
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");
    for count in [64usize, 256, 1024] {
        group.bench_with_input(
            BenchmarkId::from_parameter(count),
            &count,
            |b, &count| {
                b.iter(|| {
                    let mut scene: KeyedScene<Dot, usize> = KeyedScene::new();
                    scene.apply(
                        dot_targets(count, 0.0),
                        |item, _| Dot {
                            opacity: 0.0,
                            ..item.state.clone()
                        },
                        0,
                        500,
                        1,
                    );
                    scene.tick(250);
                    // Supersede mid-flight, then play both passes out.
                    scene.apply(
                        dot_targets(count, 50.0),
                        |item, _| Dot {
                            opacity: 0.0,
                            ..item.state.clone()
                        },
                        250,
                        500,
                        2,
                    );
                    scene.tick(750);
                    black_box(scene.len());
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_tree_build, bench_layout, bench_reconcile);
criterion_main!(benches);
