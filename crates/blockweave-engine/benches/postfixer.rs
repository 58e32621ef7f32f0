use blockweave_engine::lists::SequentialIds;
use blockweave_engine::lists::postfixer::repair;
use blockweave_engine::lists::trigger::TouchedSet;
use blockweave_engine::{Document, Editor, Element, Feature, ListType, Position};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
mod common;

fn loaded_editor(document: Document) -> Editor {
    let mut editor = Editor::builder()
        .feature(Feature::DocumentList)
        .ids(Box::new(SequentialIds::new("b")))
        .build()
        .unwrap();
    editor.model_mut().load(document);
    editor
}

fn bench_full_repair(c: &mut Criterion) {
    let mut group = c.benchmark_group("postfixer");
    group.sample_size(10);

    let documents = [
        (
            "settled_document",
            loaded_editor(common::generate_list_document(100, 50)),
        ),
        (
            "over_indented_document",
            loaded_editor(common::generate_broken_document(100, 50, 3)),
        ),
    ];

    for (name, editor) in &documents {
        let document = editor.model().document();
        let schema = editor.model().schema();
        let touched = TouchedSet::everything(document, schema);

        group.bench_function(*name, |b| {
            b.iter(|| {
                let operations = repair(
                    std::hint::black_box(document),
                    schema,
                    &touched,
                    &ListType::Bulleted,
                    &mut SequentialIds::default(),
                );
                std::hint::black_box(operations);
            });
        });
    }

    group.finish();
}

/// The same edit in documents of growing size. A session only repairs the
/// run it touched, so the time per edit should stay flat.
fn bench_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("session");
    group.sample_size(10);

    for runs in [10, 100, 1000] {
        let mut editor = loaded_editor(common::generate_list_document(runs, 50));

        group.bench_function(BenchmarkId::new("split_and_rejoin_first_run", runs), |b| {
            b.iter(|| {
                editor
                    .change(|writer| {
                        let at = std::hint::black_box(25);
                        let block = Element::block("paragraph", "x");
                        writer.insert(Position::in_root(at), vec![block])?;
                        writer.remove(&[at])
                    })
                    .unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_full_repair, bench_session);
criterion_main!(benches);
