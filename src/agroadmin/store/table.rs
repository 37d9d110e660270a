//! Table contents and query evaluation shared by the store implementations.

use super::{Filter, Query};
use crate::error::{AdminError, Result};
use crate::model::Row;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: BTreeSet<String>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new<I, C>(columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(column)
    }

    fn check_column(&self, name: &str, column: &str) -> Result<()> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(AdminError::UndefinedColumn {
                table: name.to_string(),
                column: column.to_string(),
            })
        }
    }

    fn check_query(&self, name: &str, query: &Query) -> Result<()> {
        for column in query.referenced_columns() {
            self.check_column(name, column)?;
        }
        Ok(())
    }

    fn check_row(&self, name: &str, row: &Row) -> Result<()> {
        for column in row.keys() {
            self.check_column(name, column)?;
        }
        Ok(())
    }

    pub fn select(&self, name: &str, query: &Query) -> Result<Vec<Row>> {
        self.check_query(name, query)?;

        let mut rows: Vec<Row> = self
            .rows
            .iter()
            .filter(|row| matches_all(row, &query.filters))
            .cloned()
            .collect();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ord = compare_values(
                    a.get(&order.column).unwrap_or(&Value::Null),
                    b.get(&order.column).unwrap_or(&Value::Null),
                );
                if order.descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    pub fn insert(&mut self, name: &str, rows: &[Row]) -> Result<()> {
        // Validate the whole batch before touching anything.
        for row in rows {
            self.check_row(name, row)?;
        }
        self.rows.extend(rows.iter().cloned());
        Ok(())
    }

    pub fn update(&mut self, name: &str, query: &Query, patch: &Row) -> Result<usize> {
        self.check_query(name, query)?;
        self.check_row(name, patch)?;

        let mut changed = 0;
        for row in self.rows.iter_mut() {
            if matches_all(row, &query.filters) {
                for (k, v) in patch {
                    row.insert(k.clone(), v.clone());
                }
                changed += 1;
            }
        }
        Ok(changed)
    }

    pub fn delete(&mut self, name: &str, query: &Query) -> Result<usize> {
        self.check_query(name, query)?;
        let before = self.rows.len();
        self.rows.retain(|row| !matches_all(row, &query.filters));
        Ok(before - self.rows.len())
    }
}

fn matches_all(row: &Row, filters: &[Filter]) -> bool {
    filters.iter().all(|f| matches(row, f))
}

fn matches(row: &Row, filter: &Filter) -> bool {
    let value = row.get(filter.column()).unwrap_or(&Value::Null);
    match filter {
        Filter::Eq(_, expected) => value == expected,
        Filter::Neq(_, expected) => value != expected,
        Filter::In(_, set) => set.contains(value),
        Filter::IsNull(_) => value.is_null(),
        Filter::NotNull(_) => !value.is_null(),
    }
}

/// Nulls sort first; numbers numerically; everything else by string form.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}
