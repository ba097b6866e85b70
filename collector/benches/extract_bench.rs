//! Benchmarks for field extraction and text stripping.

use collector::extract::{default_rules, FieldExtractor};
use collector::fetch::{truncate_chars, visible_text};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const PARAGRAPH: &str = "The certification of trust must include the trust name, the date the \
    trust was executed and the identity of each trustee. Institutions should include a statement \
    that the trust has not been revoked. Common errors include missing trustee signatures. ";

fn sample_text() -> String {
    let mut text = String::new();
    for i in 0..400 {
        text.push_str(PARAGRAPH);
        if i % 10 == 0 {
            text.push('\n');
        }
    }
    text
}

fn extract_benchmark(c: &mut Criterion) {
    let Ok(extractor) = FieldExtractor::new(&default_rules()) else {
        return;
    };
    let text = truncate_chars(sample_text(), 100_000);

    c.bench_function("extract_default_rules", |b| {
        b.iter(|| extractor.extract(black_box(&text)));
    });
}

fn html_benchmark(c: &mut Criterion) {
    let html = format!(
        "<html><head><script>var x = 1;</script></head><body>{}</body></html>",
        (0..200).map(|_| format!("<p>{PARAGRAPH}</p>")).collect::<String>()
    );

    c.bench_function("visible_text", |b| {
        b.iter(|| visible_text(black_box(&html)));
    });
}

criterion_group!(benches, extract_benchmark, html_benchmark);
criterion_main!(benches);
