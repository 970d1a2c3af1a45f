//! パフォーマンスベンチマーク
//!
//! このモジュールは、featuresheetクレートのパフォーマンスを測定するためのベンチマークを提供します。
//!
//! 実装するベンチマーク:
//! - Gherkinテキストの解析と正規化
//! - エクスポートグリッドの生成
//! - XLSXワークブックの書き出し（単一・並列一括）

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use featuresheet::gherkin::parse_feature;
use featuresheet::{normalize, Document, Exporter, ExporterBuilder};

/// ルールとシナリオを指定数含むFeatureテキストを生成
fn generate_feature(rules: usize, scenarios_per_rule: usize) -> String {
    let mut source = String::from(
        "@bench @generated\nFeature: Benchmark\n  Generated feature for benchmarks.\n\n  Background:\n    Given the system is running\n",
    );
    for rule in 0..rules {
        source.push_str(&format!("\n  @rule-{}\n  Rule: Rule {}\n", rule, rule));
        for scenario in 0..scenarios_per_rule {
            source.push_str(&format!(
                "\n    @scenario\n    Scenario: Scenario {}-{}\n      Given a precondition\n      And another precondition\n      When an action happens\n      Then an outcome is visible\n      But nothing else changes\n",
                rule, scenario
            ));
        }
    }
    source
}

fn document(rules: usize, scenarios_per_rule: usize) -> Document {
    let source = generate_feature(rules, scenarios_per_rule);
    match parse_feature(&source).and_then(|raw| normalize(&raw, "bench")) {
        Ok(document) => document,
        Err(e) => panic!("failed to build benchmark document: {}", e),
    }
}

fn exporter() -> Exporter {
    let date = NaiveDate::from_ymd_opt(2026, 1, 1).expect("valid date");
    match ExporterBuilder::new().with_generated_on(date).build() {
        Ok(exporter) => exporter,
        Err(e) => panic!("failed to build exporter: {}", e),
    }
}

/// 解析と正規化
fn benchmark_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_and_normalize");
    for (rules, scenarios) in [(1, 10), (10, 10), (20, 50)] {
        let source = generate_feature(rules, scenarios);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(rules * scenarios),
            &source,
            |b, source| {
                b.iter(|| {
                    let raw = parse_feature(black_box(source)).ok();
                    raw.and_then(|raw| normalize(&raw, "bench").ok())
                })
            },
        );
    }
    group.finish();
}

/// グリッド生成（書き出しを含まない）
fn benchmark_grid(c: &mut Criterion) {
    let exporter = exporter();
    let mut group = c.benchmark_group("build_grid");
    for (rules, scenarios) in [(1, 10), (10, 10), (20, 50)] {
        let document = document(rules, scenarios);
        group.throughput(Throughput::Elements(document.scenario_count() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(document.scenario_count()),
            &document,
            |b, document| b.iter(|| exporter.grid(black_box(document), "https://example.com")),
        );
    }
    group.finish();
}

/// XLSXワークブックの書き出し
fn benchmark_workbook(c: &mut Criterion) {
    let exporter = exporter();
    let document = document(10, 10);
    c.bench_function("export_xlsx_100_scenarios", |b| {
        b.iter(|| exporter.export_to_buffer(black_box(&document), "https://example.com"))
    });
}

/// 複数ドキュメントの並列書き出し
fn benchmark_export_all(c: &mut Criterion) {
    let exporter = exporter();
    let documents: Vec<Document> = (0..50).map(|_| document(2, 5)).collect();
    let mut group = c.benchmark_group("export_all");
    group.throughput(Throughput::Elements(documents.len() as u64));
    group.bench_function("50_documents", |b| {
        b.iter(|| exporter.export_all(black_box(&documents), |d| d.id.clone()))
    });
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(std::time::Duration::from_secs(10))
        .warm_up_time(std::time::Duration::from_secs(3));
    targets = benchmark_parse, benchmark_grid, benchmark_workbook, benchmark_export_all
}

criterion_main!(benches);
