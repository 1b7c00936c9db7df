//! Generic entity repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Run composed filters against the entity's table through [`SelectQuery`].
//! - Provide CRUD over any [`RepoEntity`].
//!
//! # Invariants
//! - Every filter-accepting call composes its arguments first; a construction
//!   error aborts before any SQL runs.
//! - Each operation builds a fresh query; no query state survives a call.
//! - Collaborator failures are wrapped with operation and entity context.

use super::error::{RepoError, RepoResult};
use crate::db::DbError;
use crate::filter::{
    apply_all, bind_field_filter, prepare_filters, FilterArg, FilterType, FilterValue,
};
use crate::model::entity::{RepoEntity, ID_COLUMN};
use crate::query::{to_sql_value, SelectQuery};
use log::error;
use rusqlite::{params_from_iter, Connection};
use std::marker::PhantomData;

/// Repository interface bound to one entity type.
pub trait EntityRepository<T: RepoEntity> {
    fn new_empty(&self) -> T {
        T::default()
    }

    fn new_empty_slice(&self) -> Vec<T> {
        Vec::new()
    }

    fn get_by_id(&self, id: i64) -> RepoResult<T>;
    fn get_by_ids(&self, ids: &[i64]) -> RepoResult<Vec<T>>;
    /// Equality lookup on a filterable field.
    fn get_by_field(&self, field: &str, value: FilterValue) -> RepoResult<Vec<T>>;
    fn get_one(&self, args: Vec<FilterArg>) -> RepoResult<T>;
    fn get_results(&self, args: Vec<FilterArg>) -> RepoResult<Vec<T>>;
    /// Composes `args` into a query callers may extend before executing.
    fn apply_filters(&self, args: Vec<FilterArg>) -> RepoResult<SelectQuery>;
    fn count(&self, args: Vec<FilterArg>) -> RepoResult<i64>;
    /// Inserts `entity` and returns it with its assigned id.
    fn create(&self, entity: T) -> RepoResult<T>;
    /// Returns whether a row was changed.
    fn update(&self, entity: &T) -> RepoResult<bool>;
    /// Returns whether a row was removed.
    fn delete(&self, entity: &T) -> RepoResult<bool>;
}

/// Composes `args` and applies the resulting filters, in order, to a fresh
/// select over `T`.
pub fn build_query<T: RepoEntity>(args: Vec<FilterArg>) -> RepoResult<SelectQuery> {
    let filters = prepare_filters(args)?;
    Ok(apply_all(SelectQuery::for_entity::<T>(), &filters))
}

/// SQLite-backed repository for entity `T`.
pub struct SqliteEntityRepository<'conn, T> {
    conn: &'conn Connection,
    _entity: PhantomData<fn() -> T>,
}

impl<'conn, T: RepoEntity> SqliteEntityRepository<'conn, T> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            _entity: PhantomData,
        }
    }

    fn query_error(&self, operation: &'static str, source: impl Into<DbError>) -> RepoError {
        let source = source.into();
        error!(
            "event=repo_query module=repo status=error operation={} entity={} error={}",
            operation,
            T::table_name(),
            source
        );
        RepoError::Query {
            operation,
            entity: T::table_name(),
            source,
        }
    }

    fn fetch_all(&self, operation: &'static str, query: &SelectQuery) -> RepoResult<Vec<T>> {
        query
            .fetch_all(self.conn)
            .map_err(|err| self.query_error(operation, err))
    }

    fn execute(
        &self,
        operation: &'static str,
        sql: &str,
        values: Vec<FilterValue>,
    ) -> RepoResult<usize> {
        self.conn
            .execute(sql, params_from_iter(values.iter().map(to_sql_value)))
            .map_err(|err| self.query_error(operation, err))
    }
}

impl<T: RepoEntity> EntityRepository<T> for SqliteEntityRepository<'_, T> {
    fn get_by_id(&self, id: i64) -> RepoResult<T> {
        let query = SelectQuery::for_entity::<T>()
            .and_where(format!("{ID_COLUMN} = ?"), vec![FilterValue::Integer(id)]);

        query
            .fetch_one(self.conn)
            .map_err(|err| self.query_error("get_by_id", err))?
            .ok_or_else(|| RepoError::not_found(T::table_name(), id))
    }

    fn get_by_ids(&self, ids: &[i64]) -> RepoResult<Vec<T>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = SelectQuery::for_entity::<T>().and_where(
            format!("{ID_COLUMN} IN (?)"),
            vec![FilterValue::list(ids.iter().copied())],
        );
        self.fetch_all("get_by_ids", &query)
    }

    fn get_by_field(&self, field: &str, value: FilterValue) -> RepoResult<Vec<T>> {
        let filter = bind_field_filter::<T>(field, FilterType::Equal.as_sql(), value)?;
        let query = build_query::<T>(vec![FilterArg::from(filter)])?;
        self.fetch_all("get_by_field", &query)
    }

    fn get_one(&self, args: Vec<FilterArg>) -> RepoResult<T> {
        let query = build_query::<T>(args)?;
        let key = describe_conditions(&query);
        query
            .fetch_one(self.conn)
            .map_err(|err| self.query_error("get_one", err))?
            .ok_or_else(|| RepoError::not_found(T::table_name(), key))
    }

    fn get_results(&self, args: Vec<FilterArg>) -> RepoResult<Vec<T>> {
        let query = build_query::<T>(args)?;
        self.fetch_all("get_results", &query)
    }

    fn apply_filters(&self, args: Vec<FilterArg>) -> RepoResult<SelectQuery> {
        build_query::<T>(args)
    }

    fn count(&self, args: Vec<FilterArg>) -> RepoResult<i64> {
        let query = build_query::<T>(args)?;
        query
            .count(self.conn)
            .map_err(|err| self.query_error("count", err))
    }

    fn create(&self, mut entity: T) -> RepoResult<T> {
        let mut columns: Vec<&str> = Vec::with_capacity(T::columns().len() + 1);
        let mut values = Vec::with_capacity(T::columns().len() + 1);
        if entity.id() != 0 {
            columns.push(ID_COLUMN);
            values.push(FilterValue::Integer(entity.id()));
        }
        columns.extend_from_slice(T::columns());
        values.extend(entity.column_values());
        if columns.len() != values.len() {
            return Err(RepoError::InvalidData(format!(
                "{} has {} columns but {} values",
                T::table_name(),
                columns.len(),
                values.len()
            )));
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({});",
            T::table_name(),
            columns.join(", "),
            vec!["?"; columns.len()].join(", ")
        );
        self.execute("create", &sql, values)?;

        entity.set_id(self.conn.last_insert_rowid());
        Ok(entity)
    }

    fn update(&self, entity: &T) -> RepoResult<bool> {
        let mut values = entity.column_values();
        if values.len() != T::columns().len() {
            return Err(RepoError::InvalidData(format!(
                "{} has {} columns but {} values",
                T::table_name(),
                T::columns().len(),
                values.len()
            )));
        }

        let assignments: Vec<String> = T::columns()
            .iter()
            .map(|column| format!("{column} = ?"))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE {ID_COLUMN} = ?;",
            T::table_name(),
            assignments.join(", ")
        );
        values.push(FilterValue::Integer(entity.id()));

        Ok(self.execute("update", &sql, values)? > 0)
    }

    fn delete(&self, entity: &T) -> RepoResult<bool> {
        let sql = format!("DELETE FROM {} WHERE {ID_COLUMN} = ?;", T::table_name());
        Ok(self.execute("delete", &sql, vec![FilterValue::Integer(entity.id())])? > 0)
    }
}

/// Condition text used as the not-found key of filtered lookups.
fn describe_conditions(query: &SelectQuery) -> String {
    let conditions: Vec<&str> = query
        .conditions()
        .iter()
        .map(|(condition, _)| condition.as_str())
        .collect();
    if conditions.is_empty() {
        "<any>".to_string()
    } else {
        conditions.join(" AND ")
    }
}

/// Repository that never touches storage.
///
/// Lookups return defaults or empty results, writes report success.
pub struct EmptyRepository<T> {
    _entity: PhantomData<fn() -> T>,
}

impl<T> EmptyRepository<T> {
    pub fn new() -> Self {
        Self {
            _entity: PhantomData,
        }
    }
}

impl<T> Default for EmptyRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RepoEntity> EntityRepository<T> for EmptyRepository<T> {
    fn get_by_id(&self, _id: i64) -> RepoResult<T> {
        Ok(self.new_empty())
    }

    fn get_by_ids(&self, _ids: &[i64]) -> RepoResult<Vec<T>> {
        Ok(self.new_empty_slice())
    }

    fn get_by_field(&self, _field: &str, _value: FilterValue) -> RepoResult<Vec<T>> {
        Ok(self.new_empty_slice())
    }

    fn get_one(&self, args: Vec<FilterArg>) -> RepoResult<T> {
        build_query::<T>(args)?;
        Ok(self.new_empty())
    }

    fn get_results(&self, args: Vec<FilterArg>) -> RepoResult<Vec<T>> {
        build_query::<T>(args)?;
        Ok(self.new_empty_slice())
    }

    fn apply_filters(&self, args: Vec<FilterArg>) -> RepoResult<SelectQuery> {
        build_query::<T>(args)
    }

    fn count(&self, args: Vec<FilterArg>) -> RepoResult<i64> {
        build_query::<T>(args)?;
        Ok(0)
    }

    fn create(&self, entity: T) -> RepoResult<T> {
        Ok(entity)
    }

    fn update(&self, _entity: &T) -> RepoResult<bool> {
        Ok(true)
    }

    fn delete(&self, _entity: &T) -> RepoResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::{build_query, EmptyRepository, EntityRepository};
    use crate::filter::{FilterError, FilterValue, Pager};
    use crate::filter_args;
    use crate::model::entity::RepoEntity;
    use crate::repo::RepoError;
    use rusqlite::Row;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Widget {
        id: i64,
        name: String,
    }

    impl RepoEntity for Widget {
        fn id(&self) -> i64 {
            self.id
        }

        fn set_id(&mut self, id: i64) {
            self.id = id;
        }

        fn table_name() -> &'static str {
            "widgets"
        }

        fn is_filterable(field: &str) -> bool {
            field == "name"
        }

        fn columns() -> &'static [&'static str] {
            &["name"]
        }

        fn column_values(&self) -> Vec<FilterValue> {
            vec![FilterValue::text(self.name.clone())]
        }

        fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
            Ok(Self {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        }
    }

    #[test]
    fn build_query_applies_filters_in_order() {
        let query = build_query::<Widget>(filter_args![
            "name = ?",
            FilterValue::text("bolt"),
            Pager::new(1, 5),
        ])
        .unwrap();

        let (sql, _) = query.to_sql();
        assert_eq!(
            sql,
            "SELECT id, name FROM widgets WHERE (name = ?) ORDER BY id ASC LIMIT ? OFFSET ?"
        );
    }

    #[test]
    fn empty_repository_still_validates_filters() {
        let repo = EmptyRepository::<Widget>::new();
        assert_eq!(repo.get_by_id(9).unwrap(), Widget::default());
        assert!(repo.update(&Widget::default()).unwrap());

        let err = repo.get_results(filter_args!["name = 2", 1]).unwrap_err();
        assert!(matches!(
            err,
            RepoError::Filter(FilterError::ArityOverflow { .. })
        ));
    }
}
