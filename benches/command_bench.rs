use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Instant;
use watdo_form::builder::{BuilderOptions, CommandBuilder};
use watdo_form::clipboard::MemoryClipboard;
use watdo_form::command::{serialize, QuotePolicy};
use watdo_form::form::{FieldRegistry, FieldValue};

/// Benchmark serialization as the description grows
fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize");

    for size in &[16, 256, 4096] {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let description = "say \"hi\"\n".repeat(size / 9 + 1);
            let values = vec![
                FieldValue::Text("Groceries".to_string()),
                FieldValue::Text("home".to_string()),
                FieldValue::Flag(true),
                FieldValue::Text(String::new()),
                FieldValue::Text(description),
                FieldValue::Flag(true),
                FieldValue::Flag(false),
            ];

            b.iter(|| serialize("watdo todo", QuotePolicy::Minimal, black_box(&values)));
        });
    }

    group.finish();
}

/// Benchmark a keystroke: edit one field and rebuild the command
fn bench_keystroke(c: &mut Criterion) {
    let mut group = c.benchmark_group("keystroke");

    group.bench_function("type_into_title", |b| {
        let mut builder = CommandBuilder::new(
            FieldRegistry::watdo_todo(),
            MemoryClipboard::new(),
            BuilderOptions::default(),
        );

        b.iter(|| {
            builder.update(0, |field| {
                field
                    .editor_mut()
                    .is_some_and(|editor| editor.insert_char(black_box('x')))
            });
            if builder.command().as_str().len() > 4096 {
                builder.update(0, |field| field.editor_mut().is_some_and(|e| e.clear()));
            }
        });
    });

    group.bench_function("trigger_and_tick", |b| {
        let mut builder = CommandBuilder::new(
            FieldRegistry::watdo_todo(),
            MemoryClipboard::new(),
            BuilderOptions::default(),
        );

        b.iter(|| {
            let now = Instant::now();
            black_box(builder.trigger(now));
            builder.tick(now + builder.options().feedback_delay)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_serialize, bench_keystroke);
criterion_main!(benches);
