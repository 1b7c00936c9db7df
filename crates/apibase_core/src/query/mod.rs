//! SQLite select-query builder consumed by repositories.
//!
//! # Responsibility
//! - Collect ordered `(condition, values)` pairs and an optional page window.
//! - Render them into one parameterized statement and execute it.
//!
//! # Invariants
//! - Conditions are combined with `AND` in insertion order.
//! - A bound `List` value expands its single placeholder into `?, ?, ...`
//!   (an empty list renders `NULL`).
//! - Builders are plain values; every repository operation starts a fresh one.

use crate::db::{DbError, DbResult};
use crate::filter::{FilterValue, PLACEHOLDER};
use crate::model::entity::{RepoEntity, ID_COLUMN};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

/// Select statement over one table.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    table: String,
    columns: Vec<String>,
    conditions: Vec<(String, Vec<FilterValue>)>,
    order_by: Vec<String>,
    limit: Option<u64>,
    offset: u64,
}

impl SelectQuery {
    /// Starts a `SELECT *` over `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            conditions: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: 0,
        }
    }

    /// Starts a select of `T`'s id and persisted columns, ordered by id.
    pub fn for_entity<T: RepoEntity>() -> Self {
        let mut columns = Vec::with_capacity(T::columns().len() + 1);
        columns.push(ID_COLUMN.to_string());
        columns.extend(T::columns().iter().map(|column| column.to_string()));

        Self {
            columns,
            ..Self::new(T::table_name())
        }
        .order_by(format!("{ID_COLUMN} ASC"))
    }

    pub fn and_where(mut self, condition: impl Into<String>, values: Vec<FilterValue>) -> Self {
        self.conditions.push((condition.into(), values));
        self
    }

    /// Sets the page window. `limit == 0` clears it.
    pub fn paginate(mut self, limit: u64, offset: u64) -> Self {
        if limit == 0 {
            self.limit = None;
            self.offset = 0;
        } else {
            self.limit = Some(limit);
            self.offset = offset;
        }
        self
    }

    pub fn order_by(mut self, clause: impl Into<String>) -> Self {
        self.order_by.push(clause.into());
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn conditions(&self) -> &[(String, Vec<FilterValue>)] {
        &self.conditions
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Renders the full statement and its positional parameters.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let columns = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(", ")
        };
        let mut sql = format!("SELECT {columns} FROM {}", self.table);
        let mut params = Vec::new();

        self.push_where(&mut sql, &mut params);

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ?");
            params.push(Value::Integer(clamp_to_i64(limit)));
            if self.offset > 0 {
                sql.push_str(" OFFSET ?");
                params.push(Value::Integer(clamp_to_i64(self.offset)));
            }
        }

        (sql, params)
    }

    /// Renders `SELECT COUNT(*)` over the same conditions, ignoring paging.
    pub fn count_sql(&self) -> (String, Vec<Value>) {
        let mut sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let mut params = Vec::new();
        self.push_where(&mut sql, &mut params);
        (sql, params)
    }

    /// Executes the query and maps every row into `T`.
    pub fn fetch_all<T: RepoEntity>(&self, conn: &Connection) -> DbResult<Vec<T>> {
        let (sql, params) = self.to_sql();
        debug!(
            "event=query_execute module=query status=start table={} conditions={}",
            self.table,
            self.conditions.len()
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params), |row| T::from_row(row))?;
        let mut entities = Vec::new();
        for row in rows {
            entities.push(row?);
        }
        Ok(entities)
    }

    /// Executes the query restricted to its first row.
    pub fn fetch_one<T: RepoEntity>(&self, conn: &Connection) -> DbResult<Option<T>> {
        let first = self.clone().paginate(1, self.offset);
        Ok(first.fetch_all(conn)?.into_iter().next())
    }

    pub fn count(&self, conn: &Connection) -> DbResult<i64> {
        let (sql, params) = self.count_sql();
        conn.query_row(&sql, params_from_iter(params), |row| row.get(0))
            .map_err(DbError::from)
    }

    fn push_where(&self, sql: &mut String, params: &mut Vec<Value>) {
        if self.conditions.is_empty() {
            return;
        }

        let rendered: Vec<String> = self
            .conditions
            .iter()
            .map(|(condition, values)| format!("({})", expand_condition(condition, values, params)))
            .collect();
        sql.push_str(" WHERE ");
        sql.push_str(&rendered.join(" AND "));
    }
}

/// Rewrites placeholders of `condition`, flattening list values into `params`.
///
/// Placeholders without a matching value are left untouched so the driver
/// reports the mismatch.
fn expand_condition(condition: &str, values: &[FilterValue], params: &mut Vec<Value>) -> String {
    let mut rendered = String::with_capacity(condition.len());
    let mut values = values.iter();

    for ch in condition.chars() {
        if ch != PLACEHOLDER {
            rendered.push(ch);
            continue;
        }

        match values.next() {
            Some(FilterValue::List(items)) if items.is_empty() => rendered.push_str("NULL"),
            Some(FilterValue::List(items)) => {
                let placeholders = vec!["?"; items.len()].join(", ");
                rendered.push_str(&placeholders);
                params.extend(items.iter().map(to_sql_value));
            }
            Some(value) => {
                rendered.push(PLACEHOLDER);
                params.push(to_sql_value(value));
            }
            None => rendered.push(PLACEHOLDER),
        }
    }

    rendered
}

/// Converts a scalar filter value into a SQLite value.
pub(crate) fn to_sql_value(value: &FilterValue) -> Value {
    match value {
        FilterValue::Null => Value::Null,
        FilterValue::Integer(value) => Value::Integer(*value),
        FilterValue::Real(value) => Value::Real(*value),
        FilterValue::Bool(value) => Value::Integer(i64::from(*value)),
        FilterValue::Text(value) => Value::Text(value.clone()),
        FilterValue::Bytes(value) => Value::Blob(value.clone()),
        FilterValue::List(_) => Value::Text(value.to_canonical_string()),
    }
}

fn clamp_to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::SelectQuery;
    use crate::filter::FilterValue;
    use rusqlite::types::Value;

    #[test]
    fn conditions_are_and_joined_in_order() {
        let (sql, params) = SelectQuery::new("users")
            .and_where("active = ?", vec![FilterValue::from(1)])
            .and_where("name LIKE ?", vec![FilterValue::text("a%")])
            .to_sql();

        assert_eq!(
            sql,
            "SELECT * FROM users WHERE (active = ?) AND (name LIKE ?)"
        );
        assert_eq!(params, vec![Value::Integer(1), Value::Text("a%".to_string())]);
    }

    #[test]
    fn list_values_expand_in_placeholders() {
        let (sql, params) = SelectQuery::new("users")
            .and_where("id IN (?)", vec![FilterValue::list([1, 2, 3])])
            .to_sql();

        assert_eq!(sql, "SELECT * FROM users WHERE (id IN (?, ?, ?))");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn empty_list_renders_null() {
        let (sql, params) = SelectQuery::new("users")
            .and_where("id NOT IN (?)", vec![FilterValue::List(Vec::new())])
            .to_sql();

        assert_eq!(sql, "SELECT * FROM users WHERE (id NOT IN (NULL))");
        assert!(params.is_empty());
    }

    #[test]
    fn pagination_skips_zero_offset() {
        let (sql, params) = SelectQuery::new("users").paginate(10, 0).to_sql();
        assert_eq!(sql, "SELECT * FROM users LIMIT ?");
        assert_eq!(params, vec![Value::Integer(10)]);

        let (sql, params) = SelectQuery::new("users").paginate(10, 20).to_sql();
        assert_eq!(sql, "SELECT * FROM users LIMIT ? OFFSET ?");
        assert_eq!(params, vec![Value::Integer(10), Value::Integer(20)]);
    }

    #[test]
    fn zero_limit_clears_pagination() {
        let query = SelectQuery::new("users").paginate(10, 20).paginate(0, 0);
        assert_eq!(query.limit(), None);
        assert_eq!(query.to_sql().0, "SELECT * FROM users");
    }

    #[test]
    fn count_sql_ignores_paging_and_ordering() {
        let (sql, _) = SelectQuery::new("users")
            .and_where("active = ?", vec![FilterValue::from(true)])
            .order_by("id DESC")
            .paginate(5, 5)
            .count_sql();
        assert_eq!(sql, "SELECT COUNT(*) FROM users WHERE (active = ?)");
    }
}
