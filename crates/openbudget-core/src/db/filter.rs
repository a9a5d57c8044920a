//! Filter builder for list queries
//!
//! One predicate builder serves all three list operations. Each resource
//! declares which query parameters it understands and how they map to
//! columns; the builder turns the present ones into a WHERE clause with
//! bound parameters. Absent parameters add nothing.

use chrono::{DateTime, Utc};
use rusqlite::ToSql;
use serde::Deserialize;
use tracing::debug;

use crate::dates;
use crate::error::{Error, Result};
use crate::models::TransactionType;

/// List parameters as they arrive in a query string.
///
/// Every value is kept as text so that a malformed value becomes a
/// validation error from the filter rather than a framework rejection.
/// Unknown parameters are ignored by serde.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    #[serde(rename = "type")]
    pub entry_type: Option<String>,
    pub category_id: Option<String>,
    pub budget_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub is_recurring: Option<String>,
}

/// Result of building a filter - contains SQL components and parameters
pub struct FilterResult {
    /// WHERE clause including "WHERE" keyword (empty if no conditions)
    pub where_clause: String,
    /// ORDER BY clause including "ORDER BY" keyword (empty if unordered)
    pub order_clause: String,
    /// Parameters for the query (boxed for rusqlite compatibility)
    pub params: Vec<Box<dyn ToSql>>,
}

impl FilterResult {
    /// Get parameter references for query execution
    pub fn params_refs(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}

/// Comparison applied to a column
#[derive(Debug, Clone, Copy)]
enum Op {
    Eq,
    Gte,
    Lte,
}

impl Op {
    fn as_sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Gte => ">=",
            Op::Lte => "<=",
        }
    }
}

/// Generic predicate builder: `column op ?` conditions joined with AND
#[derive(Default)]
pub struct QueryFilter {
    conditions: Vec<String>,
    params: Vec<Box<dyn ToSql>>,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    fn push<T: ToSql + 'static>(mut self, column: &str, op: Op, value: Option<T>) -> Self {
        if let Some(v) = value {
            self.conditions.push(format!("{} {} ?", column, op.as_sql()));
            self.params.push(Box::new(v));
        }
        self
    }

    /// `column = value` when the value is present
    pub fn eq<T: ToSql + 'static>(self, column: &str, value: Option<T>) -> Self {
        self.push(column, Op::Eq, value)
    }

    /// `column >= value` when the value is present
    pub fn gte<T: ToSql + 'static>(self, column: &str, value: Option<T>) -> Self {
        self.push(column, Op::Gte, value)
    }

    /// `column <= value` when the value is present
    pub fn lte<T: ToSql + 'static>(self, column: &str, value: Option<T>) -> Self {
        self.push(column, Op::Lte, value)
    }

    /// Finish the predicate, attaching an ORDER BY (empty string for none)
    pub fn build(self, order_by: &str) -> FilterResult {
        let where_clause = if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        };
        let order_clause = if order_by.is_empty() {
            String::new()
        } else {
            format!("ORDER BY {}", order_by)
        };

        debug!(%where_clause, %order_clause, params = self.params.len(), "Built list filter");

        FilterResult {
            where_clause,
            order_clause,
            params: self.params,
        }
    }
}

// ========== Parameter parsing ==========

/// Empty or whitespace-only parameters count as absent
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_type(value: &Option<String>) -> Result<Option<TransactionType>> {
    present(value)
        .map(|s| s.parse::<TransactionType>().map_err(Error::Validation))
        .transpose()
}

fn parse_date(name: &str, value: &Option<String>) -> Result<Option<DateTime<Utc>>> {
    present(value)
        .map(|s| {
            dates::parse_timestamp(s)
                .ok_or_else(|| Error::validation(format!("Invalid {}: {}", name, s)))
        })
        .transpose()
}

fn parse_bool(name: &str, value: &Option<String>) -> Result<Option<bool>> {
    present(value)
        .map(|s| match s {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(Error::validation(format!(
                "Invalid {}: {} (expected true or false)",
                name, other
            ))),
        })
        .transpose()
}

fn text(value: &Option<String>) -> Option<String> {
    present(value).map(str::to_string)
}

// ========== Per-resource filters ==========

/// Filters accepted by the category list
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CategoryFilter {
    pub category_type: Option<TransactionType>,
}

impl CategoryFilter {
    pub fn from_params(params: &FilterParams) -> Result<Self> {
        Ok(Self {
            category_type: parse_type(&params.entry_type)?,
        })
    }

    /// Categories have no imposed order; rowid keeps insertion order stable
    pub fn build(&self) -> FilterResult {
        QueryFilter::new()
            .eq("c.type", self.category_type.map(|t| t.as_str()))
            .build("c.rowid")
    }
}

/// Filters accepted by the budget list.
///
/// The two date bounds apply to different columns and are independent of
/// each other: `start_date` bounds the budget's start, `end_date` its end.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BudgetFilter {
    pub budget_type: Option<TransactionType>,
    pub category_id: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl BudgetFilter {
    pub fn from_params(params: &FilterParams) -> Result<Self> {
        Ok(Self {
            budget_type: parse_type(&params.entry_type)?,
            category_id: text(&params.category_id),
            start_date: parse_date("startDate", &params.start_date)?,
            end_date: parse_date("endDate", &params.end_date)?,
        })
    }

    pub fn build(&self) -> FilterResult {
        QueryFilter::new()
            .eq("b.type", self.budget_type.map(|t| t.as_str()))
            .eq("b.category_id", self.category_id.clone())
            .gte("b.start_date", self.start_date.as_ref().map(dates::to_db))
            .lte("b.end_date", self.end_date.as_ref().map(dates::to_db))
            .build("b.start_date DESC, b.rowid DESC")
    }
}

/// Filters accepted by the transaction list.
///
/// Both date bounds clamp the single `date` column to a closed range.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransactionFilter {
    pub transaction_type: Option<TransactionType>,
    pub category_id: Option<String>,
    pub budget_id: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_recurring: Option<bool>,
}

impl TransactionFilter {
    pub fn from_params(params: &FilterParams) -> Result<Self> {
        Ok(Self {
            transaction_type: parse_type(&params.entry_type)?,
            category_id: text(&params.category_id),
            budget_id: text(&params.budget_id),
            start_date: parse_date("startDate", &params.start_date)?,
            end_date: parse_date("endDate", &params.end_date)?,
            is_recurring: parse_bool("isRecurring", &params.is_recurring)?,
        })
    }

    pub fn build(&self) -> FilterResult {
        QueryFilter::new()
            .eq("t.type", self.transaction_type.map(|t| t.as_str()))
            .eq("t.category_id", self.category_id.clone())
            .eq("t.budget_id", self.budget_id.clone())
            .eq("t.is_recurring", self.is_recurring)
            .gte("t.date", self.start_date.as_ref().map(dates::to_db))
            .lte("t.date", self.end_date.as_ref().map(dates::to_db))
            .build("t.date DESC, t.rowid DESC")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> FilterParams {
        let mut p = FilterParams::default();
        for (key, value) in pairs {
            let v = Some(value.to_string());
            match *key {
                "type" => p.entry_type = v,
                "categoryId" => p.category_id = v,
                "budgetId" => p.budget_id = v,
                "startDate" => p.start_date = v,
                "endDate" => p.end_date = v,
                "isRecurring" => p.is_recurring = v,
                other => panic!("unknown key {}", other),
            }
        }
        p
    }

    #[test]
    fn test_empty_filter_has_no_where_clause() {
        let result = TransactionFilter::default().build();
        assert_eq!(result.where_clause, "");
        assert!(result.params.is_empty());
        assert_eq!(result.order_clause, "ORDER BY t.date DESC, t.rowid DESC");
    }

    #[test]
    fn test_blank_params_are_ignored() {
        let filter =
            BudgetFilter::from_params(&params(&[("type", ""), ("startDate", "  ")])).unwrap();
        assert_eq!(filter, BudgetFilter::default());
    }

    #[test]
    fn test_budget_bounds_use_separate_columns() {
        let filter = BudgetFilter::from_params(&params(&[
            ("type", "EXPENSE"),
            ("categoryId", "cat-1"),
            ("startDate", "2024-01-01"),
            ("endDate", "2024-12-31"),
        ]))
        .unwrap();
        let result = filter.build();
        assert_eq!(
            result.where_clause,
            "WHERE b.type = ? AND b.category_id = ? AND b.start_date >= ? AND b.end_date <= ?"
        );
        assert_eq!(result.params.len(), 4);
        assert_eq!(result.order_clause, "ORDER BY b.start_date DESC, b.rowid DESC");
    }

    #[test]
    fn test_budget_end_bound_alone() {
        let filter = BudgetFilter::from_params(&params(&[("endDate", "2024-12-31")])).unwrap();
        assert_eq!(filter.build().where_clause, "WHERE b.end_date <= ?");
    }

    #[test]
    fn test_transaction_bounds_share_date_column() {
        let filter = TransactionFilter::from_params(&params(&[
            ("startDate", "2024-01-01"),
            ("endDate", "2024-12-31"),
            ("isRecurring", "false"),
        ]))
        .unwrap();
        assert_eq!(filter.is_recurring, Some(false));
        assert_eq!(
            filter.build().where_clause,
            "WHERE t.is_recurring = ? AND t.date >= ? AND t.date <= ?"
        );
    }

    #[test]
    fn test_category_filter() {
        let filter = CategoryFilter::from_params(&params(&[("type", "INCOME")])).unwrap();
        assert_eq!(filter.category_type, Some(TransactionType::Income));
        assert_eq!(filter.build().where_clause, "WHERE c.type = ?");
    }

    #[test]
    fn test_unparseable_values_are_validation_errors() {
        let bad = [
            params(&[("startDate", "yesterday")]),
            params(&[("endDate", "2024-02-30")]),
            params(&[("isRecurring", "maybe")]),
            params(&[("type", "TRANSFER")]),
        ];
        for p in &bad {
            assert!(matches!(
                TransactionFilter::from_params(p),
                Err(Error::Validation(_))
            ));
        }
    }
}
