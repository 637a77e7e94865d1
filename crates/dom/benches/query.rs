use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dom_tree::{NodeId, Tree};

/// 100 sections × 10 items, every third item marked
fn wide_tree() -> Tree {
    let mut tree = Tree::new();
    let root = tree.root_id();
    for s in 0..100 {
        let section = tree.create_element("section");
        tree.set_id(section, Some(format!("section-{s}").as_str()))
            .unwrap();
        tree.append_child(root, section).unwrap();
        for i in 0..10 {
            let item = tree.create_element("li");
            if i % 3 == 0 {
                tree.add_class(item, "highlight").unwrap();
            }
            tree.append_child(section, item).unwrap();
        }
    }
    tree
}

fn bench_query_all(c: &mut Criterion) {
    let tree = wide_tree();
    c.bench_function("query_all by class", |b| {
        b.iter(|| black_box(tree.elements_by_class(black_box("highlight"))))
    });
    c.bench_function("lookup", |b| {
        b.iter(|| black_box(tree.lookup(black_box("section-57"))))
    });
}

fn bench_append_remove(c: &mut Criterion) {
    let mut tree = wide_tree();
    let parent: NodeId = tree.lookup("section-0").unwrap();
    let node = tree.create_element("li");
    c.bench_function("append + remove", |b| {
        b.iter(|| {
            tree.append_child(parent, node).unwrap();
            tree.remove_child(parent, node).unwrap();
        })
    });
}

criterion_group!(benches, bench_query_all, bench_append_remove);
criterion_main!(benches);
