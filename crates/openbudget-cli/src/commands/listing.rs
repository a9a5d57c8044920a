//! Listing commands for categories, budgets and transactions
//!
//! These print the same filtered lists the HTTP API serves.

use anyhow::Result;
use openbudget_core::models::TransactionType;
use openbudget_core::{BudgetFilter, CategoryFilter, Database, FilterParams, TransactionFilter};
use serde::Serialize;

use super::truncate;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Red for expenses, green for income
fn colored_amount(kind: TransactionType, amount: impl std::fmt::Display) -> String {
    let text = format!("{:.2}", amount);
    match kind {
        TransactionType::Expense => format!("\x1b[31m-{:>10}\x1b[0m", text),
        TransactionType::Income => format!("\x1b[32m+{:>10}\x1b[0m", text),
    }
}

pub fn cmd_categories(db: &Database, params: &FilterParams, json: bool) -> Result<()> {
    let categories = db.list_categories(&CategoryFilter::from_params(params)?)?;
    if json {
        return print_json(&categories);
    }

    if categories.is_empty() {
        println!("No categories found.");
        return Ok(());
    }

    println!();
    println!("🏷️  Categories");
    println!("   ─────────────────────────────────────────────────────────────");

    for entry in &categories {
        let category = &entry.category;
        println!(
            "   {:<7} │ {:<24} │ {:>4} txns │ {}",
            category.category_type.as_str(),
            truncate(&category.name, 24),
            entry.transactions.len(),
            category.id
        );
    }

    Ok(())
}

pub fn cmd_budgets(db: &Database, params: &FilterParams, json: bool) -> Result<()> {
    let budgets = db.list_budgets(&BudgetFilter::from_params(params)?)?;
    if json {
        return print_json(&budgets);
    }

    if budgets.is_empty() {
        println!("No budgets found.");
        return Ok(());
    }

    println!();
    println!("🎯 Budgets");
    println!("   ─────────────────────────────────────────────────────────────");

    for entry in &budgets {
        let budget = &entry.budget;
        println!(
            "   {} → {} │ {} │ {:<20} │ {} ({} txns)",
            budget.start_date.format("%Y-%m-%d"),
            budget.end_date.format("%Y-%m-%d"),
            colored_amount(budget.budget_type, budget.amount),
            truncate(&budget.name, 20),
            entry.category.name,
            entry.transactions.len()
        );
    }

    Ok(())
}

pub fn cmd_transactions(db: &Database, params: &FilterParams, json: bool) -> Result<()> {
    let transactions = db.list_transactions(&TransactionFilter::from_params(params)?)?;
    if json {
        return print_json(&transactions);
    }

    if transactions.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }

    println!();
    println!("📝 Transactions");
    println!("   ─────────────────────────────────────────────────────────────");

    for entry in &transactions {
        let tx = &entry.transaction;
        let recurring = tx
            .recurring_frequency
            .map(|f| format!(" ↻ {}", f))
            .unwrap_or_default();
        println!(
            "   {} │ {} │ {:<30} │ {}{}",
            tx.date.format("%Y-%m-%d"),
            colored_amount(tx.transaction_type, tx.amount),
            truncate(&tx.description, 30),
            entry.category.name,
            recurring
        );
    }

    Ok(())
}
