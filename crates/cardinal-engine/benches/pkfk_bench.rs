//! Benchmarks for PK/FK join analysis and row count estimation.
//!
//! Measures a single fact-to-dimension join and a left-deep chain of joins
//! where every level consults the analyzer through the provider.

use cardinal_common::types::ColumnSet;
use cardinal_engine::query::optimizer::{
    ColumnStats, MetadataProvider, PkFkJoinAnalyzer, StatisticsProvider, TableStats,
};
use cardinal_engine::query::plan::{
    BinaryOp, FilterOp, JoinOp, JoinType, LogicalExpression, LogicalOperator, ProjectOp,
    TableScanOp,
};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

const DIMENSIONS: usize = 8;

fn scan(table: &str, columns: usize) -> LogicalOperator {
    LogicalOperator::TableScan(TableScanOp {
        table: table.to_string(),
        columns: (0..columns).map(|i| format!("{table}_{i}")).collect(),
    })
}

/// A fact table with one foreign key per dimension, and keyed dimensions.
fn statistics() -> StatisticsProvider {
    let provider = StatisticsProvider::default();
    let mut fact = TableStats::new(10_000_000);
    for d in 0..DIMENSIONS {
        fact = fact.with_column(&format!("fact_{d}"), ColumnStats::new(1000 * (d as u64 + 1)));
    }
    provider.add_table_stats("fact", fact);

    for d in 0..DIMENSIONS {
        let name = format!("dim{d}");
        provider.add_table_stats(
            &name,
            TableStats::new(5000)
                .with_column(
                    &format!("{name}_0"),
                    ColumnStats::new(5000).with_range(0.0, 5000.0),
                )
                .with_unique_key(ColumnSet::of(0)),
        );
    }
    provider
}

/// `dim{d}` filtered on its key and projected down to the key.
fn dimension(d: usize) -> LogicalOperator {
    let filtered = LogicalOperator::Filter(FilterOp {
        predicate: LogicalExpression::binary(
            LogicalExpression::column(0),
            BinaryOp::Lt,
            LogicalExpression::literal(1000),
        ),
        input: Box::new(scan(&format!("dim{d}"), 2)),
    });
    LogicalOperator::Project(ProjectOp {
        projections: vec![LogicalExpression::column(0)],
        input: Box::new(filtered),
    })
}

/// `fact ⋈ dim0 ⋈ dim1 ⋈ ...`, each join on the next foreign key.
fn star_join(dimensions: usize) -> LogicalOperator {
    let mut plan = scan("fact", DIMENSIONS);
    for d in 0..dimensions {
        // dimension keys are appended after the fact columns
        let width = plan.column_count();
        plan = LogicalOperator::Join(JoinOp::new(
            plan,
            dimension(d),
            JoinType::Inner,
            LogicalExpression::equals(
                LogicalExpression::column(d),
                LogicalExpression::column(width),
            ),
        ));
    }
    plan
}

fn bench_analyze(c: &mut Criterion) {
    let provider = statistics();
    let LogicalOperator::Join(join) = star_join(1) else {
        return;
    };

    c.bench_function("pkfk_analyze_single_join", |b| {
        b.iter(|| {
            PkFkJoinAnalyzer::new(&provider)
                .analyze(black_box(&join))
                .unwrap()
        });
    });
}

fn bench_star_join(c: &mut Criterion) {
    let provider = statistics();
    let mut group = c.benchmark_group("pkfk_star_join_row_count");

    for dimensions in [1, 2, 4, DIMENSIONS] {
        let plan = star_join(dimensions);
        group.bench_with_input(BenchmarkId::from_parameter(dimensions), &plan, |b, plan| {
            b.iter(|| provider.row_count(black_box(plan)).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_analyze, bench_star_join);
criterion_main!(benches);
