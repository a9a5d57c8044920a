//! Transaction operations

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use super::{
    amount_to_db, budget_from_row, row_exists, category_from_row, new_id, transaction_from_row, Database,
    TransactionFilter, BUDGET_COLUMNS, CATEGORY_COLUMNS, CATEGORY_WIDTH, TRANSACTION_COLUMNS,
    TRANSACTION_WIDTH,
};
use crate::dates;
use crate::error::{Error, Result};
use crate::models::{non_blank, NewTransaction, TransactionWithRelations};

pub(crate) const TRANSACTION_NOT_FOUND: &str = "Transaction not found";

fn not_found() -> Error {
    Error::NotFound(TRANSACTION_NOT_FOUND.to_string())
}

/// Transactions joined with their category and (optional) budget
fn select_with_relations() -> String {
    format!(
        "SELECT {}, {}, {} FROM transactions t
         JOIN categories c ON c.id = t.category_id
         LEFT JOIN budgets b ON b.id = t.budget_id",
        TRANSACTION_COLUMNS, CATEGORY_COLUMNS, BUDGET_COLUMNS
    )
}

/// Map a row produced by `select_with_relations`
fn row_with_relations(row: &rusqlite::Row) -> rusqlite::Result<TransactionWithRelations> {
    let budget_base = TRANSACTION_WIDTH + CATEGORY_WIDTH;
    let budget_id: Option<String> = row.get(budget_base)?;
    Ok(TransactionWithRelations {
        transaction: transaction_from_row(row, 0)?,
        category: category_from_row(row, TRANSACTION_WIDTH)?,
        budget: match budget_id {
            Some(_) => Some(budget_from_row(row, budget_base)?),
            None => None,
        },
    })
}

fn fetch_with_relations(conn: &Connection, id: &str) -> Result<Option<TransactionWithRelations>> {
    let tx = conn
        .query_row(
            &format!("{} WHERE t.id = ?", select_with_relations()),
            params![id],
            row_with_relations,
        )
        .optional()?;
    Ok(tx)
}

impl Database {
    /// Create a transaction (date defaults to now) and return it with its
    /// category and budget
    pub fn create_transaction(&self, input: &NewTransaction) -> Result<TransactionWithRelations> {
        input.validate()?;
        let conn = self.conn()?;

        let id = new_id();
        let now = Utc::now();
        let date = input.date.unwrap_or(now);
        let now = dates::to_db(&now);

        conn.execute(
            r#"
            INSERT INTO transactions (id, type, amount, description, category_id, date,
                                      is_recurring, recurring_frequency, budget_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                id,
                input.transaction_type.as_str(),
                amount_to_db(input.amount),
                input.description.trim(),
                input.category_id,
                dates::to_db(&date),
                input.is_recurring.unwrap_or(false),
                input.recurring_frequency.map(|f| f.as_str()),
                non_blank(&input.budget_id),
                now,
                now,
            ],
        )
        .map_err(Error::from_write)?;

        info!(transaction_id = %id, amount = %input.amount, "Created transaction");

        fetch_with_relations(&conn, &id)?.ok_or_else(not_found)
    }

    /// List transactions matching the filter, newest first
    pub fn list_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<TransactionWithRelations>> {
        let conn = self.conn()?;
        let built = filter.build();

        let sql = format!(
            "{} {} {}",
            select_with_relations(),
            built.where_clause,
            built.order_clause
        );
        let mut stmt = conn.prepare(&sql)?;
        let transactions = stmt
            .query_map(built.params_refs().as_slice(), row_with_relations)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Get a transaction with its category and budget
    pub fn get_transaction(&self, id: &str) -> Result<TransactionWithRelations> {
        let conn = self.conn()?;
        fetch_with_relations(&conn, id)?.ok_or_else(not_found)
    }

    /// Fail with `NotFound` unless the transaction exists
    pub fn require_transaction(&self, id: &str) -> Result<()> {
        let conn = self.conn()?;
        if !row_exists(&conn, "transactions", id)? {
            return Err(not_found());
        }
        Ok(())
    }

    /// Replace every field of a transaction, then return the hydrated record.
    /// An omitted date keeps the stored one.
    pub fn update_transaction(
        &self,
        id: &str,
        input: &NewTransaction,
    ) -> Result<TransactionWithRelations> {
        let conn = self.conn()?;
        if !row_exists(&conn, "transactions", id)? {
            return Err(not_found());
        }
        input.validate()?;

        conn.execute(
            r#"
            UPDATE transactions
            SET type = ?, amount = ?, description = ?, category_id = ?, date = COALESCE(?, date),
                is_recurring = ?, recurring_frequency = ?, budget_id = ?, updated_at = ?
            WHERE id = ?
            "#,
            params![
                input.transaction_type.as_str(),
                amount_to_db(input.amount),
                input.description.trim(),
                input.category_id,
                input.date.as_ref().map(dates::to_db),
                input.is_recurring.unwrap_or(false),
                input.recurring_frequency.map(|f| f.as_str()),
                non_blank(&input.budget_id),
                dates::to_db(&Utc::now()),
                id,
            ],
        )
        .map_err(Error::from_write)?;

        fetch_with_relations(&conn, id)?.ok_or_else(not_found)
    }

    /// Delete a transaction
    pub fn delete_transaction(&self, id: &str) -> Result<()> {
        let conn = self.conn()?;
        if !row_exists(&conn, "transactions", id)? {
            return Err(not_found());
        }

        conn.execute("DELETE FROM transactions WHERE id = ?", params![id])
            .map_err(Error::from_write)?;

        info!(transaction_id = %id, "Deleted transaction");
        Ok(())
    }
}
