//! Benchmarks for chatmood extraction, aggregation and rendering.
//!
//! Run with: `cargo bench`
//! Run specific group: `cargo bench --bench pipeline -- extraction`

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chatmood::aggregate::aggregate;
use chatmood::export::to_csv;
use chatmood::extract::HtmlExtractor;
use chatmood::render::{VegaLiteBackend, render_timeline};
use chatmood::{Message, Sentiment};

// =============================================================================
// Test Data Generators
// =============================================================================

fn generate_export_html(count: usize) -> String {
    let mut html = String::with_capacity(count * 300);
    html.push_str("<html><body><div class=\"history\">");
    for i in 0..count {
        let day = (i / 50) % 28 + 1;
        if i % 20 == 7 {
            html.push_str(&format!(
                r#"<div class="message service"><div class="body details">User {} joined</div></div>"#,
                i
            ));
            continue;
        }
        html.push_str(&format!(
            r#"<div class="message default clearfix"><div class="body"><div class="pull_right date details" title="{:02}.01.2024 10:{:02}:00 UTC+03:00">10:00</div><div class="from_name">{}</div><div class="text">Message number {}</div></div></div>"#,
            day,
            i % 60,
            if i % 2 == 0 { "Alice" } else { "Bob" },
            i
        ));
    }
    html.push_str("</div></body></html>");
    html
}

fn generate_classified(count: usize) -> Vec<Message> {
    let topics = ["Politics", "Economy", "Technology", "World News", "News"];
    (0..count)
        .map(|i| {
            let mut msg = Message::new(
                format!("Message number {}", i),
                format!("{:02}/01/2024", (i / 50) % 28 + 1),
            );
            let mood = match i % 3 {
                0 => Sentiment::Positive,
                1 => Sentiment::Negative,
                _ => Sentiment::Neutral,
            };
            msg.update_labels(topics[i % topics.len()], mood);
            msg
        })
        .collect()
}

fn candidate_topics() -> Vec<String> {
    ["Politics", "Economy", "Technology", "World News", "News"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extraction");
    let extractor = HtmlExtractor::new(Default::default()).unwrap();

    for size in [100_usize, 1_000, 10_000] {
        let html = generate_export_html(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &html, |b, html| {
            b.iter(|| {
                let messages = extractor.extract(black_box(html));
                black_box(messages)
            });
        });
    }
    group.finish();
}

fn bench_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation");
    let topics = candidate_topics();

    for size in [1_000_usize, 10_000, 100_000] {
        let messages = generate_classified(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &messages,
            |b, messages| {
                b.iter(|| black_box(aggregate(black_box(messages), &topics)));
            },
        );
    }
    group.finish();
}

fn bench_outputs(c: &mut Criterion) {
    let mut group = c.benchmark_group("outputs");
    let topics = candidate_topics();

    for size in [1_000_usize, 10_000] {
        let messages = generate_classified(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(
            BenchmarkId::new("timeline_spec", size),
            &messages,
            |b, messages| {
                b.iter(|| {
                    let aggregates = aggregate(messages, &topics);
                    black_box(VegaLiteBackend::spec(&render_timeline(&aggregates.timeline)))
                });
            },
        );
        group.bench_with_input(BenchmarkId::new("csv", size), &messages, |b, messages| {
            b.iter(|| black_box(to_csv(black_box(messages)).unwrap()));
        });
    }
    group.finish();
}

// =============================================================================
// Criterion Configuration
// =============================================================================

criterion_group!(benches, bench_extraction, bench_aggregation, bench_outputs);

criterion_main!(benches);
