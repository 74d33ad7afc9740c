// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use cashbook::application::LedgerService;
use cashbook::domain::{Category, TransactionType};
use cashbook::storage::{LedgerStore, SqliteStore};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService<SqliteStore>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let store = SqliteStore::init(db_path.to_str().unwrap()).await?;
    Ok((LedgerService::new(store), temp_dir))
}

/// Fund the ledger with an income transaction.
pub async fn fund<S: LedgerStore>(service: &LedgerService<S>, amount: i64) -> Result<()> {
    service
        .create_transaction("Salary", amount, TransactionType::Income, "Work")
        .await?;
    Ok(())
}

/// Titles of all categories, sorted.
pub async fn category_titles<S: LedgerStore>(service: &LedgerService<S>) -> Result<Vec<String>> {
    Ok(service
        .list_categories()
        .await?
        .into_iter()
        .map(|c: Category| c.title)
        .collect())
}
