//! Shared fixtures: an in-memory driver that evaluates the statements the
//! assembler produces against a small row set.

#![allow(dead_code)]

use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use aggquery::driver::{ColumnDescription, DatabaseDriver, DriverError, DriverResult, Row};
use aggquery::query::BindValue;
use serde_json::{json, Map, Value};

pub const PREFIX: &str = "wp_";

pub struct FakeTable {
    pub columns: Vec<ColumnDescription>,
    pub rows: Vec<Map<String, Value>>,
}

/// In-memory driver with call-count spies.
#[derive(Default)]
pub struct FakeDriver {
    tables: HashMap<String, FakeTable>,
    pub scalar_calls: AtomicUsize,
    pub row_calls: AtomicUsize,
    pub fail_queries: AtomicBool,
    pub show_errors: AtomicBool,
    pub executed: Mutex<Vec<(String, Vec<BindValue>)>>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `orders` table: complete/10.00, pending/5.00, refunded/20.00
    pub fn orders() -> Self {
        let mut driver = Self::new();
        driver.add_table(
            "orders",
            FakeTable {
                columns: vec![
                    ColumnDescription::new("id", "bigint(20) unsigned"),
                    ColumnDescription::new("total", "decimal(10,2)"),
                    ColumnDescription::new("status", "varchar(20)"),
                    ColumnDescription::new("date_created", "datetime"),
                ],
                rows: vec![
                    order(1, "complete", 10.0, "2023-01-05 00:00:00"),
                    order(2, "pending", 5.0, "2023-06-01 00:00:00"),
                    order(3, "refunded", 20.0, "2023-07-01 00:00:00"),
                ],
            },
        );
        driver
    }

    pub fn add_table(&mut self, name: &str, table: FakeTable) {
        self.tables.insert(name.to_string(), table);
    }

    pub fn query_count(&self) -> usize {
        self.scalar_calls.load(Ordering::SeqCst) + self.row_calls.load(Ordering::SeqCst)
    }

    pub fn executed_sql(&self) -> Vec<String> {
        self.executed
            .lock()
            .unwrap()
            .iter()
            .map(|(sql, _)| sql.clone())
            .collect()
    }

    fn run(&self, sql: &str, binds: &[BindValue]) -> DriverResult<Vec<Row>> {
        self.executed
            .lock()
            .unwrap()
            .push((sql.to_string(), binds.to_vec()));
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(DriverError::Query("Lost connection during query".into()));
        }
        evaluate(&self.tables, sql, binds)
    }
}

impl DatabaseDriver for FakeDriver {
    fn table_exists(&self, table: &str) -> DriverResult<bool> {
        Ok(self.tables.contains_key(table))
    }

    fn describe_columns(&self, table: &str) -> DriverResult<Vec<ColumnDescription>> {
        self.tables
            .get(table)
            .map(|t| t.columns.clone())
            .ok_or_else(|| DriverError::Catalog(format!("no table {}", table)))
    }

    fn query_scalar(&self, sql: &str, binds: &[BindValue]) -> DriverResult<Option<Value>> {
        self.scalar_calls.fetch_add(1, Ordering::SeqCst);
        let rows = self.run(sql, binds)?;
        Ok(rows
            .first()
            .and_then(|row| row.first())
            .cloned()
            .filter(|v| !v.is_null()))
    }

    fn query_rows(&self, sql: &str, binds: &[BindValue]) -> DriverResult<Vec<Row>> {
        self.row_calls.fetch_add(1, Ordering::SeqCst);
        self.run(sql, binds)
    }

    fn prefixed_name(&self, table: &str) -> String {
        format!("{}{}", PREFIX, table)
    }

    fn show_errors(&self, enabled: bool) {
        self.show_errors.store(enabled, Ordering::SeqCst);
    }
}

pub fn order(id: i64, status: &str, total: f64, date: &str) -> Map<String, Value> {
    json!({"id": id, "status": status, "total": total, "date_created": date})
        .as_object()
        .cloned()
        .unwrap()
}

pub fn raw(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

enum Condition {
    Set {
        column: String,
        values: Vec<BindValue>,
        negate: bool,
    },
    Compare {
        column: String,
        op: String,
        value: BindValue,
    },
}

fn bad(reason: &str) -> DriverError {
    DriverError::Query(format!("fake driver cannot evaluate: {}", reason))
}

/// Evaluate `SELECT FN(col)[, g] FROM t [WHERE ...] [GROUP BY g]`.
/// Rows come back as `[aggregate]` or `[aggregate, group]`.
fn evaluate(
    tables: &HashMap<String, FakeTable>,
    sql: &str,
    binds: &[BindValue],
) -> DriverResult<Vec<Row>> {
    let rest = sql.strip_prefix("SELECT ").ok_or_else(|| bad("no SELECT"))?;
    let (select, rest) = rest.split_once(" FROM ").ok_or_else(|| bad("no FROM"))?;
    let (rest, group_by) = match rest.split_once(" GROUP BY ") {
        Some((head, group)) => (head, Some(group.to_string())),
        None => (rest, None),
    };
    let (table, where_clause) = match rest.split_once(" WHERE ") {
        Some((table, clause)) => (table, Some(clause)),
        None => (rest, None),
    };
    let table = table.strip_prefix(PREFIX).ok_or_else(|| bad("table not prefixed"))?;
    let table = tables.get(table).ok_or_else(|| bad("unknown table"))?;

    let aggregate = select.split(", ").next().ok_or_else(|| bad("empty select"))?;
    let (function, column) = aggregate
        .trim_end_matches(')')
        .split_once('(')
        .ok_or_else(|| bad("no aggregate"))?;

    let conditions = parse_conditions(where_clause, binds)?;
    let matching: Vec<&Map<String, Value>> = table
        .rows
        .iter()
        .filter(|row| conditions.iter().all(|c| holds(row, c)))
        .collect();

    match group_by {
        None => Ok(vec![vec![aggregate_rows(function, column, &matching)]]),
        Some(group) => {
            let mut groups: BTreeMap<String, Vec<&Map<String, Value>>> = BTreeMap::new();
            for row in matching {
                let key = row.get(&group).and_then(Value::as_str).unwrap_or("").to_string();
                groups.entry(key).or_default().push(row);
            }
            Ok(groups
                .into_iter()
                .map(|(key, rows)| vec![aggregate_rows(function, column, &rows), json!(key)])
                .collect())
        }
    }
}

fn parse_conditions(clause: Option<&str>, binds: &[BindValue]) -> DriverResult<Vec<Condition>> {
    let mut conditions = Vec::new();
    let mut binds = binds.iter().cloned();
    let clause = match clause {
        Some(clause) => clause,
        None => return Ok(conditions),
    };

    for atom in clause.split(" AND ") {
        let set = atom
            .split_once(" NOT IN (")
            .map(|(c, l)| (c, l, true))
            .or_else(|| atom.split_once(" IN (").map(|(c, l)| (c, l, false)));
        if let Some((column, list, negate)) = set {
            let count = list.trim_end_matches(')').split(',').count();
            let values: Vec<BindValue> = binds.by_ref().take(count).collect();
            if values.len() != count {
                return Err(bad("too few binds"));
            }
            conditions.push(Condition::Set {
                column: column.to_string(),
                values,
                negate,
            });
            continue;
        }

        let parts: Vec<&str> = atom.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(bad(atom));
        }
        conditions.push(Condition::Compare {
            column: parts[0].to_string(),
            op: parts[1].to_string(),
            value: binds.next().ok_or_else(|| bad("too few binds"))?,
        });
    }

    if binds.next().is_some() {
        return Err(bad("too many binds"));
    }
    Ok(conditions)
}

fn compare(actual: &Value, bind: &BindValue) -> Option<CmpOrdering> {
    let as_number = |v: &Value| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    };
    match bind {
        BindValue::Int(i) => as_number(actual)?.partial_cmp(&(*i as f64)),
        BindValue::Float(x) => as_number(actual)?.partial_cmp(x),
        BindValue::Text(text) => match actual {
            Value::String(s) => Some(s.as_str().cmp(text.as_str())),
            other => as_number(other)?.partial_cmp(&text.parse::<f64>().ok()?),
        },
    }
}

fn holds(row: &Map<String, Value>, condition: &Condition) -> bool {
    match condition {
        Condition::Set {
            column,
            values,
            negate,
        } => {
            let actual = match row.get(column) {
                Some(v) if !v.is_null() => v,
                _ => return false,
            };
            let member = values
                .iter()
                .any(|v| compare(actual, v) == Some(CmpOrdering::Equal));
            member != *negate
        }
        Condition::Compare { column, op, value } => {
            let ordering = match row.get(column).and_then(|v| compare(v, value)) {
                Some(ordering) => ordering,
                None => return false,
            };
            match op.as_str() {
                "=" => ordering == CmpOrdering::Equal,
                "!=" => ordering != CmpOrdering::Equal,
                ">" => ordering == CmpOrdering::Greater,
                ">=" => ordering != CmpOrdering::Less,
                "<" => ordering == CmpOrdering::Less,
                "<=" => ordering != CmpOrdering::Greater,
                _ => false,
            }
        }
    }
}

fn aggregate_rows(function: &str, column: &str, rows: &[&Map<String, Value>]) -> Value {
    if function == "COUNT" {
        return json!(rows.len() as i64);
    }
    let values: Vec<f64> = rows
        .iter()
        .filter_map(|row| row.get(column).and_then(Value::as_f64))
        .collect();
    if values.is_empty() {
        return Value::Null;
    }
    let result = match function {
        "SUM" => values.iter().sum(),
        "AVG" => values.iter().sum::<f64>() / values.len() as f64,
        "MIN" => values.iter().cloned().fold(f64::INFINITY, f64::min),
        "MAX" => values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        _ => return Value::Null,
    };
    // DECIMAL columns come back as text
    json!(format!("{:.2}", result))
}
