//! SQL statement builders
//!
//! Generates parameterized INSERT / UPDATE / DELETE statements from a
//! [`Schema`] and an entity's [`Row`]. Placeholders are positional (`?N`,
//! SQLite style) and matched 1:1 to the returned argument list. Only
//! identifiers (table and column names, which come from `'static` schema
//! declarations) are interpolated into the SQL text; values are always bound.

use sqlx::Executor;
use sqlx::Sqlite;
use sqlx::sqlite::SqliteQueryResult;

use crate::error::{Result, StoreError};
use crate::orm::schema::Schema;
use crate::orm::value::{Row, SqlValue};

/// One parameterized statement plus its positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<SqlValue>,
}

fn placeholder(n: usize) -> String {
    format!("?{n}")
}

/// Build a single-row INSERT covering every non-null field of `row`, in
/// schema column order.
///
/// Primary-key columns must carry a non-null value; a row that provides none
/// of the schema's columns is rejected.
pub fn build_insert(schema: &Schema, row: &Row) -> Result<Statement> {
    let mut columns: Vec<&str> = Vec::new();
    let mut args: Vec<SqlValue> = Vec::new();

    for col in schema.columns() {
        match row.get(col.column) {
            Some(value) if !value.is_null() => {
                columns.push(col.column);
                args.push(value.clone());
            }
            _ => {
                // Null and absent both mean "let the column default apply",
                // except for key columns, which must always be supplied
                if col.primary_key {
                    return Err(StoreError::Build(format!(
                        "insert into {} is missing primary-key column {}",
                        schema.table(),
                        col.column
                    )));
                }
            }
        }
    }

    if columns.is_empty() {
        return Err(StoreError::Build(format!(
            "insert into {} carries no columns",
            schema.table()
        )));
    }

    let placeholders: Vec<String> = (1..=columns.len()).map(placeholder).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        schema.table(),
        columns.join(", "),
        placeholders.join(", ")
    );

    Ok(Statement { sql, args })
}

/// Build an UPDATE of all non-key columns present in `row`, restricted to
/// primary-key equality.
///
/// Arguments are ordered value-columns-then-key-columns to match placeholder
/// order. A null value updates the column to NULL; an absent column is left
/// out of the SET list entirely.
pub fn build_update(schema: &Schema, row: &Row) -> Result<Statement> {
    let mut assignments: Vec<String> = Vec::new();
    let mut args: Vec<SqlValue> = Vec::new();
    let mut n = 0;

    for col in schema.value_columns() {
        if let Some(value) = row.get(col.column) {
            n += 1;
            assignments.push(format!("{} = {}", col.column, placeholder(n)));
            args.push(value.clone());
        }
    }

    if assignments.is_empty() {
        return Err(StoreError::Build(format!(
            "update of {} sets no columns",
            schema.table()
        )));
    }

    let mut conditions: Vec<String> = Vec::new();
    for col in schema.key_columns() {
        match row.get(col.column) {
            Some(value) if !value.is_null() => {
                n += 1;
                conditions.push(format!("{} = {}", col.column, placeholder(n)));
                args.push(value.clone());
            }
            _ => {
                return Err(StoreError::Build(format!(
                    "update of {} is missing primary-key column {}",
                    schema.table(),
                    col.column
                )));
            }
        }
    }

    let sql = format!(
        "UPDATE {} SET {} WHERE {}",
        schema.table(),
        assignments.join(", "),
        conditions.join(" AND ")
    );

    Ok(Statement { sql, args })
}

/// Build a single-row DELETE by primary key.
///
/// `keys` must supply one non-null value per primary-key column, in schema
/// declaration order.
pub fn build_delete(schema: &Schema, keys: &[SqlValue]) -> Result<Statement> {
    let key_columns: Vec<_> = schema.key_columns().collect();
    if keys.len() != key_columns.len() {
        return Err(StoreError::Build(format!(
            "delete from {} expects {} key value(s), got {}",
            schema.table(),
            key_columns.len(),
            keys.len()
        )));
    }

    let mut conditions: Vec<String> = Vec::new();
    let mut args: Vec<SqlValue> = Vec::new();
    for (i, (col, value)) in key_columns.iter().zip(keys).enumerate() {
        if value.is_null() {
            return Err(StoreError::Build(format!(
                "delete from {} has null primary-key column {}",
                schema.table(),
                col.column
            )));
        }
        conditions.push(format!("{} = {}", col.column, placeholder(i + 1)));
        args.push(value.clone());
    }

    let sql = format!(
        "DELETE FROM {} WHERE {}",
        schema.table(),
        conditions.join(" AND ")
    );

    Ok(Statement { sql, args })
}

/// Execute a built statement against the given executor (a pool, a
/// connection, or an open transaction) with all arguments bound.
pub async fn execute<'e, E>(stmt: &Statement, executor: E) -> Result<SqliteQueryResult>
where
    E: Executor<'e, Database = Sqlite>,
{
    tracing::debug!(sql = %stmt.sql, args = stmt.args.len(), "Executing statement");

    let mut query = sqlx::query(&stmt.sql);
    for value in &stmt.args {
        query = value.bind_to_query(query);
    }

    Ok(query.execute(executor).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::value::SqlValue;
    use pretty_assertions::assert_eq;

    fn schema() -> Schema {
        Schema::builder("products")
            .primary_key("id", "id", "TEXT")
            .column("productName", "productName", "TEXT")
            .nullable("description", "description", "TEXT")
            .column("price", "price", "TEXT")
            .build()
            .unwrap()
    }

    fn full_row() -> Row {
        Row::new()
            .push("id", "p1")
            .push("productName", "Widget")
            .push("description", "A widget")
            .push("price", "5.00")
    }

    #[test]
    fn test_insert_covers_all_non_null_fields() {
        let stmt = build_insert(&schema(), &full_row()).unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO products (id, productName, description, price) VALUES (?1, ?2, ?3, ?4)"
        );
        assert_eq!(stmt.args.len(), 4);
        assert_eq!(stmt.args[0], SqlValue::Text("p1".into()));
    }

    #[test]
    fn test_insert_skips_null_fields() {
        let row = Row::new()
            .push("id", "p1")
            .push("productName", "Widget")
            .push("description", SqlValue::Null)
            .push("price", "5.00");
        let stmt = build_insert(&schema(), &row).unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO products (id, productName, price) VALUES (?1, ?2, ?3)"
        );
        assert_eq!(stmt.args.len(), 3);
    }

    #[test]
    fn test_insert_requires_primary_key() {
        let row = Row::new().push("productName", "Widget");
        let err = build_insert(&schema(), &row).unwrap_err();
        assert!(matches!(err, StoreError::Build(_)));
    }

    #[test]
    fn test_update_orders_values_then_keys() {
        let stmt = build_update(&schema(), &full_row()).unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE products SET productName = ?1, description = ?2, price = ?3 WHERE id = ?4"
        );
        assert_eq!(stmt.args.last(), Some(&SqlValue::Text("p1".into())));
    }

    #[test]
    fn test_update_omits_absent_columns() {
        let row = Row::new().push("id", "p1").push("price", "9.99");
        let stmt = build_update(&schema(), &row).unwrap();
        assert_eq!(stmt.sql, "UPDATE products SET price = ?1 WHERE id = ?2");
    }

    #[test]
    fn test_update_without_key_is_build_error() {
        let row = Row::new().push("price", "9.99");
        assert!(matches!(
            build_update(&schema(), &row),
            Err(StoreError::Build(_))
        ));
    }

    #[test]
    fn test_delete_by_key() {
        let stmt = build_delete(&schema(), &[SqlValue::Text("p1".into())]).unwrap();
        assert_eq!(stmt.sql, "DELETE FROM products WHERE id = ?1");
        assert_eq!(stmt.args, vec![SqlValue::Text("p1".into())]);
    }

    #[test]
    fn test_delete_key_arity_mismatch() {
        assert!(matches!(
            build_delete(&schema(), &[]),
            Err(StoreError::Build(_))
        ));
    }
}
