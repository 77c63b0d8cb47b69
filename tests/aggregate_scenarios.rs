//! End-to-end aggregate scenarios against the in-memory orders table.

mod common;

use std::collections::BTreeMap;

use aggquery::query::{BindValue, CompareOp};
use aggquery::{
    AggregateFunction, AggregateOutput, AggregateQuery, FilterValue, Formatter, MemoryCache,
    QueryConfig, QuerySpec,
};
use common::{raw, FakeDriver};
use serde_json::{json, Value};

fn run(driver: &FakeDriver, request: Value) -> AggregateOutput {
    let cache = MemoryCache::new();
    AggregateQuery::builder(driver, &cache)
        .config(QueryConfig::uncached())
        .build(&raw(request))
        .unwrap()
        .get_result()
        .unwrap()
}

fn run_spec(driver: &FakeDriver, spec: QuerySpec) -> AggregateOutput {
    let cache = MemoryCache::new();
    AggregateQuery::builder(driver, &cache)
        .build_spec(spec.caching(false))
        .unwrap()
        .get_result()
        .unwrap()
}

fn scalar_f64(output: &AggregateOutput) -> f64 {
    output.as_scalar().and_then(Value::as_f64).unwrap()
}

// =============================================================================
// Documented scenarios
// =============================================================================

#[test]
fn sum_excluding_refunded_orders() {
    let driver = FakeDriver::orders();
    let output = run(
        &driver,
        json!({"table": "orders", "column": "total", "function": "SUM", "status__not_in": ["refunded"]}),
    );
    assert_eq!(output, AggregateOutput::Scalar(json!(15.0)));
    assert_eq!(
        driver.executed_sql(),
        vec!["SELECT SUM(total) FROM wp_orders WHERE status NOT IN (%s)".to_string()]
    );
}

#[test]
fn count_grouped_by_status() {
    let driver = FakeDriver::orders();
    let output = run(
        &driver,
        json!({"table": "orders", "function": "COUNT", "group_by": "status"}),
    );

    let expected: BTreeMap<String, Value> = [
        ("complete".to_string(), json!(1)),
        ("pending".to_string(), json!(1)),
        ("refunded".to_string(), json!(1)),
    ]
    .into_iter()
    .collect();
    assert_eq!(output, AggregateOutput::Grouped(expected));
}

#[test]
fn sum_with_greater_than_comparison() {
    let driver = FakeDriver::orders();
    let output = run(
        &driver,
        json!({"table": "orders", "column": "total", "function": "SUM", "total": {"value": 10, "compare": ">"}}),
    );
    assert_eq!(output, AggregateOutput::Scalar(json!(20.0)));
}

// =============================================================================
// Aggregate functions
// =============================================================================

#[test]
fn functions_match_direct_computation() {
    let driver = FakeDriver::orders();
    let cases = [
        ("SUM", 35.0),
        ("AVG", 35.0 / 3.0),
        ("MIN", 5.0),
        ("MAX", 20.0),
    ];
    for (function, expected) in cases {
        let output = run(&driver, json!({"table": "orders", "column": "total", "function": function}));
        let actual = scalar_f64(&output);
        assert!(
            (actual - expected).abs() < 0.01,
            "{}: expected {}, got {}",
            function,
            expected,
            actual
        );
    }
}

#[test]
fn function_name_is_case_insensitive() {
    let driver = FakeDriver::orders();
    let output = run(&driver, json!({"table": "orders", "column": "total", "function": "max"}));
    assert_eq!(scalar_f64(&output), 20.0);
}

#[test]
fn count_is_an_integer_whatever_the_column() {
    let driver = FakeDriver::orders();
    for column in [json!(""), json!("status"), json!("total"), Value::Null] {
        let output = run(&driver, json!({"table": "orders", "function": "COUNT", "column": column}));
        let value = output.as_scalar().unwrap();
        assert!(value.is_i64(), "COUNT returned {}", value);
        assert_eq!(value, &json!(3));
    }
}

#[test]
fn unmatched_sum_is_null_not_zero() {
    let driver = FakeDriver::orders();
    let output = run(
        &driver,
        json!({"table": "orders", "column": "total", "status": "cancelled"}),
    );
    assert!(output.is_null());
}

#[test]
fn unmatched_count_is_zero() {
    let driver = FakeDriver::orders();
    let output = run(
        &driver,
        json!({"table": "orders", "function": "COUNT", "status": "cancelled"}),
    );
    assert_eq!(output, AggregateOutput::Scalar(json!(0)));
}

// =============================================================================
// Filters
// =============================================================================

#[test]
fn in_and_not_in_partition_the_rows() {
    let driver = FakeDriver::orders();
    let count = |request: Value| -> i64 {
        run(&driver, request).as_scalar().and_then(Value::as_i64).unwrap()
    };

    let all = count(json!({"table": "orders", "function": "COUNT"}));
    for subset in [
        json!(["complete"]),
        json!(["complete", "pending"]),
        json!(["refunded", "cancelled"]),
    ] {
        let inside = count(json!({"table": "orders", "function": "COUNT", "status__in": subset.clone()}));
        let outside = count(json!({"table": "orders", "function": "COUNT", "status__not_in": subset}));
        assert_eq!(inside + outside, all);
    }
}

#[test]
fn range_equals_two_comparisons() {
    let driver = FakeDriver::orders();
    let ranged = run(
        &driver,
        json!({"table": "orders", "column": "total", "total": {"min": 10, "max": 30}}),
    );
    let compared = run_spec(
        &driver,
        QuerySpec::new("orders", AggregateFunction::Sum)
            .column("total")
            .filter("total", FilterValue::compare(CompareOp::Gte, 10))
            .filter("total", FilterValue::compare(CompareOp::Lte, 30)),
    );
    assert_eq!(ranged, compared);
    assert_eq!(scalar_f64(&ranged), 30.0);
}

#[test]
fn half_open_ranges() {
    let driver = FakeDriver::orders();
    let low = run(
        &driver,
        json!({"table": "orders", "function": "COUNT", "total": {"min": 10, "max": null}}),
    );
    let high = run(
        &driver,
        json!({"table": "orders", "function": "COUNT", "total": {"max": 9.99}}),
    );
    assert_eq!(low, AggregateOutput::Scalar(json!(2)));
    assert_eq!(high, AggregateOutput::Scalar(json!(1)));
}

#[test]
fn equality_filter_and_text_binds_are_sanitized() {
    let driver = FakeDriver::orders();
    let output = run(
        &driver,
        json!({"table": "orders", "function": "COUNT", "status": "  <b>complete</b> "}),
    );
    assert_eq!(output, AggregateOutput::Scalar(json!(1)));

    let executed = driver.executed.lock().unwrap();
    assert_eq!(executed[0].1, vec![BindValue::from("complete")]);
}

#[test]
fn filters_combine_with_and() {
    let driver = FakeDriver::orders();
    let output = run(
        &driver,
        json!({
            "table": "orders",
            "column": "total",
            "status__in": ["complete", "refunded"],
            "total": {"value": 15, "compare": "<"},
        }),
    );
    assert_eq!(scalar_f64(&output), 10.0);
}

// =============================================================================
// Dates and grouping
// =============================================================================

#[test]
fn date_range_is_inclusive() {
    let driver = FakeDriver::orders();
    let output = run(
        &driver,
        json!({
            "table": "orders",
            "function": "COUNT",
            "date_column": "date_created",
            "date_start": "2023-01-05 00:00:00",
            "date_end": "2023-06-01 00:00:00",
        }),
    );
    assert_eq!(output, AggregateOutput::Scalar(json!(2)));

    let sql = driver.executed_sql();
    assert_eq!(
        sql[0],
        "SELECT COUNT(*) FROM wp_orders WHERE date_created >= %s AND date_created <= %s"
    );
}

#[test]
fn single_date_bound() {
    let driver = FakeDriver::orders();
    let output = run(
        &driver,
        json!({"table": "orders", "column": "total", "date_column": "date_created", "date_start": "2023-06-01"}),
    );
    assert_eq!(scalar_f64(&output), 25.0);
}

#[test]
fn grouped_sum_with_filter() {
    let driver = FakeDriver::orders();
    let output = run(
        &driver,
        json!({"table": "orders", "column": "total", "group_by": "status", "status__not_in": ["pending"]}),
    );
    let groups = output.as_grouped().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups["complete"], json!(10.0));
    assert_eq!(groups["refunded"], json!(20.0));
}

#[test]
fn empty_grouped_result_is_an_empty_map() {
    let driver = FakeDriver::orders();
    let output = run(
        &driver,
        json!({"table": "orders", "function": "COUNT", "group_by": "status", "status__in": ["cancelled"]}),
    );
    assert_eq!(output, AggregateOutput::Grouped(BTreeMap::new()));
    assert!(!output.is_null());
}

// =============================================================================
// Formatter
// =============================================================================

#[test]
fn formatter_applies_to_every_group() {
    let driver = FakeDriver::orders();
    let spec = QuerySpec::new("orders", AggregateFunction::Sum)
        .column("total")
        .group_by("status")
        .formatter(Formatter::new("money", |v| json!(format!("${:.2}", v.as_f64()))));
    let output = run_spec(&driver, spec);
    let groups = output.as_grouped().unwrap();
    assert_eq!(groups["complete"], json!("$10.00"));
    assert_eq!(groups["pending"], json!("$5.00"));
    assert_eq!(groups["refunded"], json!("$20.00"));
}

#[test]
fn formatter_skips_null_result() {
    let driver = FakeDriver::orders();
    let spec = QuerySpec::new("orders", AggregateFunction::Sum)
        .column("total")
        .filter("status", FilterValue::eq("cancelled"))
        .formatter(Formatter::new("zero", |_| json!(0)));
    assert!(run_spec(&driver, spec).is_null());
}

#[test]
fn statement_is_inspectable_without_executing() {
    let driver = FakeDriver::orders();
    let cache = MemoryCache::new();
    let query = AggregateQuery::new(
        &raw(json!({"table": "orders", "column": "total", "total": {"value": 2.5, "compare": ">="}})),
        &driver,
        &cache,
    )
    .unwrap();

    let statement = query.statement().unwrap();
    assert_eq!(statement.sql, "SELECT SUM(total) FROM wp_orders WHERE total >= %f");
    assert_eq!(statement.binds, vec![BindValue::Float(2.5)]);
    assert_eq!(driver.query_count(), 0);
}
