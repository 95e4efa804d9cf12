//! Select/filter query builder
//!
//! Implements the "build query from filter" contract consumed by search
//! endpoints: a [`Filter`] contributes WHERE fragments plus bind values, and
//! [`SelectQuery`] assembles them with ordering and pagination on top of a
//! schema's SELECT. The full-text search execution engine itself lives
//! outside this crate; only query construction happens here.

use sqlx::{Executor, Sqlite, SqlitePool};

use crate::error::Result;
use crate::orm::schema::{FromSqlRow, Schema};
use crate::orm::value::SqlValue;

/// A filter document translated into SQL conditions.
///
/// Conditions use bare `?` placeholders; the query builder renumbers them
/// sequentially when combining multiple filters.
pub trait Filter: Send + Sync {
    /// WHERE clause fragments and the values to bind, 1:1 by `?` occurrence.
    fn to_sql_conditions(&self) -> (Vec<String>, Vec<SqlValue>);

    /// Whether the filter has any conditions at all.
    fn is_empty(&self) -> bool;
}

/// Sort direction for ORDER BY clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// One page of results plus the total match count.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

/// A parameterized SELECT under construction for one schema.
pub struct SelectQuery<'s> {
    schema: &'s Schema,
    where_clauses: Vec<String>,
    values: Vec<SqlValue>,
    order_by: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
    param_counter: usize,
}

impl<'s> SelectQuery<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            where_clauses: Vec::new(),
            values: Vec::new(),
            order_by: None,
            limit: None,
            offset: None,
            param_counter: 0,
        }
    }

    /// Apply a filter's conditions to the query.
    pub fn filter<F: Filter>(mut self, filter: &F) -> Self {
        if !filter.is_empty() {
            let (conditions, values) = filter.to_sql_conditions();
            for condition in conditions {
                let rewritten = self.rewrite_params(&condition);
                self.where_clauses.push(rewritten);
            }
            self.values.extend(values);
        }
        self
    }

    /// Add a raw WHERE condition with one bound value.
    pub fn where_clause(mut self, condition: &str, value: impl Into<SqlValue>) -> Self {
        let rewritten = self.rewrite_params(condition);
        self.where_clauses.push(rewritten);
        self.values.push(value.into());
        self
    }

    /// Add sorting on a schema column.
    pub fn order_by(mut self, column: &str, direction: SortDirection) -> Self {
        self.order_by = Some(format!("{} {}", column, direction.to_sql()));
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Rewrite bare `?` placeholders to sequential `?N` indices.
    fn rewrite_params(&mut self, condition: &str) -> String {
        let mut result = condition.to_string();
        let mut search_from = 0;
        while let Some(pos) = result[search_from..].find('?').map(|p| p + search_from) {
            let next_char = result[pos + 1..].chars().next();
            if next_char.is_none() || !next_char.unwrap().is_ascii_digit() {
                self.param_counter += 1;
                let numbered = format!("?{}", self.param_counter);
                result.replace_range(pos..pos + 1, &numbered);
                search_from = pos + numbered.len();
            } else {
                search_from = pos + 1;
            }
        }
        result
    }

    fn build_sql(&self) -> String {
        let mut sql = self.schema.select_sql();

        if !self.where_clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.where_clauses.join(" AND "));
        }

        if let Some(ref order) = self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        if let Some(offset) = self.offset {
            if offset > 0 {
                sql.push_str(&format!(" OFFSET {}", offset));
            }
        }

        sql
    }

    fn build_count_sql(&self) -> String {
        let mut sql = format!("SELECT COUNT(*) FROM {}", self.schema.table());

        if !self.where_clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.where_clauses.join(" AND "));
        }

        sql
    }

    /// Execute and decode all matching rows.
    pub async fn fetch_all<'e, T, E>(self, executor: E) -> Result<Vec<T>>
    where
        T: FromSqlRow,
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = self.build_sql();
        tracing::debug!(sql = %sql, "Executing select query");

        let mut query = sqlx::query(&sql);
        for value in &self.values {
            query = value.bind_to_query(query);
        }

        let rows = query.fetch_all(executor).await?;
        Ok(rows
            .iter()
            .map(T::from_row)
            .collect::<std::result::Result<Vec<T>, sqlx::Error>>()?)
    }

    /// Execute with `LIMIT 1` semantics and decode at most one row.
    pub async fn fetch_optional<'e, T, E>(self, executor: E) -> Result<Option<T>>
    where
        T: FromSqlRow,
        E: Executor<'e, Database = Sqlite>,
    {
        let this = self.limit(1);
        let sql = this.build_sql();
        tracing::debug!(sql = %sql, "Executing select query (one)");

        let mut query = sqlx::query(&sql);
        for value in &this.values {
            query = value.bind_to_query(query);
        }

        match query.fetch_optional(executor).await? {
            Some(row) => Ok(Some(T::from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Execute the matching COUNT query.
    pub async fn count<'e, E>(&self, executor: E) -> Result<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = self.build_count_sql();
        tracing::debug!(sql = %sql, "Executing count query");

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for value in &self.values {
            query = match value {
                SqlValue::Text(s) => query.bind(s.as_str()),
                SqlValue::Int(i) => query.bind(*i),
                SqlValue::Float(f) => query.bind(*f),
                SqlValue::Bool(b) => query.bind(if *b { 1i32 } else { 0i32 }),
                SqlValue::Null => query.bind(None::<String>),
            };
        }

        Ok(query.fetch_one(executor).await?)
    }

    /// Execute the query as one page of results plus the total match count.
    pub async fn fetch_page<T>(self, pool: &SqlitePool) -> Result<Page<T>>
    where
        T: FromSqlRow,
    {
        let total = self.count(pool).await?;
        let items = self.fetch_all(pool).await?;
        Ok(Page { items, total })
    }
}
