//! Benchmark for wrapper reconciliation after edits.
//!
//! Each case builds a project with N class members, hands out a wrapper for
//! every node, then measures one edit per reconciliation strategy.

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use nodekeep::{FileId, Project, RenameOptions, StructuredContent, WrapperId};

/// Generate a brace document with one class holding `members` statements.
fn generate_class(members: usize) -> String {
    let mut doc = String::with_capacity(members * 16);
    doc.push_str("class Bench {\n");
    for i in 0..members {
        doc.push_str(&format!("    let var_{} = {};\n", i, i));
    }
    doc.push_str("}\n");
    doc
}

/// Wrap every node of the file so reconciliation has work to do.
fn setup_project(members: usize) -> (Project, FileId, WrapperId) {
    let mut project = Project::new();
    let file = project
        .add_file("bench.brace", generate_class(members))
        .expect("Should add bench file");
    let root = project.root(&file).expect("Should wrap root");

    let mut pending = vec![root];
    while let Some(node) = pending.pop() {
        pending.extend(project.children(node).expect("Should list children"));
    }

    let class = project.child(root, 0).unwrap().expect("Should have class");
    let list = project.child(class, 3).unwrap().expect("Should have member list");
    (project, file, list)
}

fn benchmark_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");

    for members in [10, 100, 500].iter() {
        group.bench_with_input(
            BenchmarkId::new("straight_rename", members),
            members,
            |b, &members| {
                b.iter_batched(
                    || {
                        let (mut project, _, list) = setup_project(members);
                        let first = project.child(list, 0).unwrap().expect("Should have member");
                        let name = project.child(first, 1).unwrap().expect("Should have name");
                        (project, name)
                    },
                    |(mut project, name)| {
                        project
                            .rename(name, "renamed", RenameOptions::file())
                            .expect("Should rename")
                    },
                    BatchSize::SmallInput,
                )
            },
        );

        group.bench_with_input(
            BenchmarkId::new("indexed_insert", members),
            members,
            |b, &members| {
                let content = StructuredContent::text("let inserted = 0;");
                b.iter_batched(
                    || setup_project(members),
                    |(mut project, _, list)| {
                        project
                            .insert_child(list, members / 2, &content)
                            .expect("Should insert child")
                    },
                    BatchSize::SmallInput,
                )
            },
        );

        group.bench_with_input(
            BenchmarkId::new("forgetting_replace", members),
            members,
            |b, &members| {
                b.iter_batched(
                    || {
                        let (mut project, _, list) = setup_project(members);
                        let middle = project
                            .child(list, members / 2)
                            .unwrap()
                            .expect("Should have member");
                        (project, middle)
                    },
                    |(mut project, middle)| {
                        project
                            .replace_text(middle, "let replaced = 1;")
                            .expect("Should replace text")
                    },
                    BatchSize::SmallInput,
                )
            },
        );
    }

    group.finish();
}

fn benchmark_forget_points(c: &mut Criterion) {
    let mut group = c.benchmark_group("forget_points");
    group.sample_size(20);

    group.bench_function("wrap_and_forget_500", |b| {
        b.iter_batched(
            || {
                let mut project = Project::new();
                let file = project
                    .add_file("bench.brace", generate_class(500))
                    .expect("Should add bench file");
                (project, file)
            },
            |(mut project, file)| {
                project.forget_nodes_created_in(|project| {
                    let root = project.root(&file).expect("Should wrap root");
                    let mut pending = vec![root];
                    while let Some(node) = pending.pop() {
                        pending.extend(project.children(node).expect("Should list children"));
                    }
                })
                .expect("Should forget wrapped nodes")
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, benchmark_strategies, benchmark_forget_points);
criterion_main!(benches);
