mod memory;
mod sqlite;

use std::future::Future;

use thiserror::Error;

use crate::domain::{Category, NewTransaction, Transaction, TransactionId};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// SQL migration for initial schema
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

#[derive(Error, Debug)]
pub enum StoreError {
    /// A category with this title already exists.
    #[error("Category already exists: {0}")]
    CategoryConflict(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence seam for transactions and categories.
///
/// Every ledger component receives a handle to an implementation of this trait
/// instead of resolving a shared store on its own.
pub trait LedgerStore: Send + Sync {
    /// All transactions, in insertion order.
    fn find_all(&self) -> impl Future<Output = StoreResult<Vec<Transaction>>> + Send;

    fn find_by_id(
        &self,
        id: TransactionId,
    ) -> impl Future<Output = StoreResult<Option<Transaction>>> + Send;

    /// Categories whose title is exactly one of `titles`.
    fn find_categories_by_titles(
        &self,
        titles: &[String],
    ) -> impl Future<Output = StoreResult<Vec<Category>>> + Send;

    /// All categories, ordered by title.
    fn list_categories(&self) -> impl Future<Output = StoreResult<Vec<Category>>> + Send;

    /// Persist a single category.
    /// Fails with [`StoreError::CategoryConflict`] when the title is taken.
    fn create_category(&self, title: &str) -> impl Future<Output = StoreResult<Category>> + Send;

    /// Persist several categories in one write. Either all are created or none.
    fn create_categories_batch(
        &self,
        titles: &[String],
    ) -> impl Future<Output = StoreResult<Vec<Category>>> + Send;

    fn create_transaction(
        &self,
        fields: NewTransaction,
    ) -> impl Future<Output = StoreResult<Transaction>> + Send;

    /// Persist several transactions in one write, returned in input order.
    fn save_transactions_batch(
        &self,
        batch: Vec<NewTransaction>,
    ) -> impl Future<Output = StoreResult<Vec<Transaction>>> + Send;

    fn remove(&self, transaction: &Transaction) -> impl Future<Output = StoreResult<()>> + Send;
}
