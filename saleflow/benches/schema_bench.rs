//! Benchmarks for schema validation of model output.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use saleflow::context::ContextAccumulator;
use saleflow::schema::{FinalReport, SchemaValidator, StrategyEvaluationList};
use saleflow::testing::{EVALUATION_PARSER_REPLY, REPORT_REPLY};

fn schema_benchmark(c: &mut Criterion) {
    c.bench_function("validate_evaluation_list", |b| {
        b.iter(|| SchemaValidator::validate::<StrategyEvaluationList>(black_box(EVALUATION_PARSER_REPLY)))
    });

    c.bench_function("validate_final_report", |b| {
        b.iter(|| SchemaValidator::validate::<FinalReport>(black_box(REPORT_REPLY)))
    });

    c.bench_function("format_instructions", |b| {
        b.iter(SchemaValidator::format_instructions::<StrategyEvaluationList>)
    });
}

fn fingerprint_benchmark(c: &mut Criterion) {
    let context = ContextAccumulator::seeded(
        (0..10).map(|i| (format!("stage_{i}_output"), "x".repeat(2_000))),
    )
    .unwrap_or_default();

    c.bench_function("context_fingerprint", |b| b.iter(|| black_box(&context).fingerprint()));
}

criterion_group!(benches, schema_benchmark, fingerprint_benchmark);
criterion_main!(benches);
