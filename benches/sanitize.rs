//! Benchmarks for the sanitizer gate.
//!
//! The sanitizer runs on every cache miss, so its throughput bounds worst
//! case render latency.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use mosaic::config::SanitizerConfig;
use mosaic::sanitize::Sanitizer;

fn table_fragment(rows: usize) -> String {
    let mut out = String::from(
        "<div class=\"tile\"><table><caption>Sales</caption>\
         <thead><tr><th scope=\"col\">Region</th><th scope=\"col\">Total</th></tr></thead><tbody>",
    );
    for i in 0..rows {
        out.push_str(&format!(
            "<tr><td>region-{}</td><td class=\"num\">{}</td></tr>",
            i,
            i * 37
        ));
    }
    out.push_str("</tbody></table></div>");
    out
}

fn hostile_fragment(rows: usize) -> String {
    let mut out = String::new();
    for i in 0..rows {
        out.push_str(&format!(
            "<tr onclick=\"steal({})\"><td><script>x()</script>cell &amp; {}</td></tr>",
            i, i
        ));
    }
    out
}

fn bench_clean_table(c: &mut Criterion) {
    let sanitizer = Sanitizer::new(&SanitizerConfig::default());
    let mut group = c.benchmark_group("sanitize_clean_table");
    for rows in [10usize, 100, 1000] {
        let input = table_fragment(rows);
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_function(format!("{}_rows", rows), |b| {
            b.iter(|| sanitizer.sanitize(black_box(&input)))
        });
    }
    group.finish();
}

fn bench_hostile_input(c: &mut Criterion) {
    let sanitizer = Sanitizer::new(&SanitizerConfig::default());
    let input = hostile_fragment(100);

    c.bench_function("sanitize_hostile_100_rows", |b| {
        b.iter(|| sanitizer.sanitize(black_box(&input)))
    });
}

fn bench_plain_text(c: &mut Criterion) {
    let sanitizer = Sanitizer::new(&SanitizerConfig::default());
    let input = "All systems nominal. ".repeat(200);

    c.bench_function("sanitize_plain_text_4kb", |b| {
        b.iter(|| sanitizer.sanitize(black_box(&input)))
    });
}

criterion_group!(
    benches,
    bench_clean_table,
    bench_hostile_input,
    bench_plain_text
);
criterion_main!(benches);
