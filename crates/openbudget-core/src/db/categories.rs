//! Category operations

use std::collections::HashMap;

use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::info;

use super::{
    category_from_row, decimal_column, new_id, placeholders, row_exists, CategoryFilter, Database,
    CATEGORY_COLUMNS,
};
use crate::dates;
use crate::error::{Error, Result};
use crate::models::{
    non_blank, Category, CategoryWithTransactions, NewCategory, TransactionSummary,
};

pub(crate) const CATEGORY_NOT_FOUND: &str = "Category not found";

/// Fetch a bare category row on an existing connection
pub(crate) fn fetch_category(conn: &Connection, id: &str) -> Result<Option<Category>> {
    let category = conn
        .query_row(
            &format!("SELECT {} FROM categories c WHERE c.id = ?", CATEGORY_COLUMNS),
            params![id],
            |row| category_from_row(row, 0),
        )
        .optional()?;
    Ok(category)
}

/// Load the id/amount/date projection of transactions for a set of categories
fn transaction_summaries(
    conn: &Connection,
    category_ids: &[&str],
) -> Result<HashMap<String, Vec<TransactionSummary>>> {
    let mut grouped: HashMap<String, Vec<TransactionSummary>> = HashMap::new();
    if category_ids.is_empty() {
        return Ok(grouped);
    }

    let sql = format!(
        "SELECT t.category_id, t.id, t.amount, t.date FROM transactions t
         WHERE t.category_id IN ({})
         ORDER BY t.date DESC, t.rowid DESC",
        placeholders(category_ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(category_ids.iter()), |row| {
        Ok((
            row.get::<_, String>(0)?,
            TransactionSummary {
                id: row.get(1)?,
                amount: decimal_column(row, 2)?,
                date: dates::from_db(row, 3)?,
            },
        ))
    })?;

    for row in rows {
        let (category_id, summary) = row?;
        grouped
            .entry(category_id)
            .or_default()
            .push(summary);
    }

    Ok(grouped)
}

impl Database {
    /// Create a category. Returns the stored record without relations.
    pub fn create_category(&self, input: &NewCategory) -> Result<Category> {
        input.validate()?;
        let conn = self.conn()?;

        let id = new_id();
        let now = dates::to_db(&Utc::now());
        conn.execute(
            r#"
            INSERT INTO categories (id, name, type, description, icon, color, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                id,
                input.name.trim(),
                input.category_type.as_str(),
                non_blank(&input.description),
                non_blank(&input.icon),
                non_blank(&input.color),
                now,
                now,
            ],
        )
        .map_err(Error::from_write)?;

        info!(category_id = %id, name = %input.name.trim(), "Created category");

        fetch_category(&conn, &id)?
            .ok_or_else(|| Error::NotFound(CATEGORY_NOT_FOUND.to_string()))
    }

    /// List categories, each with its transactions (id/amount/date only)
    pub fn list_categories(&self, filter: &CategoryFilter) -> Result<Vec<CategoryWithTransactions>> {
        let conn = self.conn()?;
        let built = filter.build();

        let sql = format!(
            "SELECT {} FROM categories c {} {}",
            CATEGORY_COLUMNS, built.where_clause, built.order_clause
        );
        let mut stmt = conn.prepare(&sql)?;
        let categories = stmt
            .query_map(built.params_refs().as_slice(), |row| category_from_row(row, 0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let ids: Vec<&str> = categories.iter().map(|c| c.id.as_str()).collect();
        let mut summaries = transaction_summaries(&conn, &ids)?;

        Ok(categories
            .into_iter()
            .map(|category| {
                let transactions = summaries.remove(&category.id).unwrap_or_default();
                CategoryWithTransactions {
                    category,
                    transactions,
                }
            })
            .collect())
    }

    /// Get a category with its transactions (id/amount/date only)
    pub fn get_category(&self, id: &str) -> Result<CategoryWithTransactions> {
        let conn = self.conn()?;
        let category = fetch_category(&conn, id)?
            .ok_or_else(|| Error::NotFound(CATEGORY_NOT_FOUND.to_string()))?;

        let transactions = transaction_summaries(&conn, &[id])?
            .remove(id)
            .unwrap_or_default();

        Ok(CategoryWithTransactions {
            category,
            transactions,
        })
    }

    /// Fail with `NotFound` unless the category exists
    pub fn require_category(&self, id: &str) -> Result<()> {
        let conn = self.conn()?;
        if !row_exists(&conn, "categories", id)? {
            return Err(Error::NotFound(CATEGORY_NOT_FOUND.to_string()));
        }
        Ok(())
    }

    /// Replace every field of a category. Returns the bare updated record.
    pub fn update_category(&self, id: &str, input: &NewCategory) -> Result<Category> {
        let conn = self.conn()?;
        if !row_exists(&conn, "categories", id)? {
            return Err(Error::NotFound(CATEGORY_NOT_FOUND.to_string()));
        }
        input.validate()?;

        conn.execute(
            r#"
            UPDATE categories
            SET name = ?, type = ?, description = ?, icon = ?, color = ?, updated_at = ?
            WHERE id = ?
            "#,
            params![
                input.name.trim(),
                input.category_type.as_str(),
                non_blank(&input.description),
                non_blank(&input.icon),
                non_blank(&input.color),
                dates::to_db(&Utc::now()),
                id,
            ],
        )
        .map_err(Error::from_write)?;

        fetch_category(&conn, id)?.ok_or_else(|| Error::NotFound(CATEGORY_NOT_FOUND.to_string()))
    }

    /// Delete a category. Its budgets and transactions go with it.
    pub fn delete_category(&self, id: &str) -> Result<()> {
        let conn = self.conn()?;
        let removed = conn
            .execute("DELETE FROM categories WHERE id = ?", params![id])
            .map_err(Error::from_write)?;

        if removed == 0 {
            return Err(Error::NotFound(CATEGORY_NOT_FOUND.to_string()));
        }

        info!(category_id = %id, "Deleted category");
        Ok(())
    }
}
