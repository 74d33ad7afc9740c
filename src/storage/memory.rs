use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use anyhow::anyhow;
use chrono::Utc;

use crate::domain::{Category, NewTransaction, Transaction, TransactionId};

use super::{LedgerStore, StoreError, StoreResult};

#[derive(Default)]
struct MemoryState {
    transactions: Vec<Transaction>,
    categories: Vec<Category>,
}

impl MemoryState {
    fn has_category(&self, title: &str) -> bool {
        self.categories.iter().any(|c| c.title == title)
    }
}

/// In-process ledger store. Enforces the same category title uniqueness as the SQLite store.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> StoreResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Backend(anyhow!("ledger store lock poisoned")))
    }
}

impl LedgerStore for MemoryStore {
    async fn find_all(&self) -> StoreResult<Vec<Transaction>> {
        Ok(self.state()?.transactions.clone())
    }

    async fn find_by_id(&self, id: TransactionId) -> StoreResult<Option<Transaction>> {
        Ok(self
            .state()?
            .transactions
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    async fn find_categories_by_titles(&self, titles: &[String]) -> StoreResult<Vec<Category>> {
        let wanted: HashSet<&str> = titles.iter().map(String::as_str).collect();
        Ok(self
            .state()?
            .categories
            .iter()
            .filter(|c| wanted.contains(c.title.as_str()))
            .cloned()
            .collect())
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let mut categories = self.state()?.categories.clone();
        categories.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(categories)
    }

    async fn create_category(&self, title: &str) -> StoreResult<Category> {
        let mut state = self.state()?;
        if state.has_category(title) {
            return Err(StoreError::CategoryConflict(title.to_string()));
        }
        let category = Category::new(title);
        state.categories.push(category.clone());
        Ok(category)
    }

    async fn create_categories_batch(&self, titles: &[String]) -> StoreResult<Vec<Category>> {
        let mut state = self.state()?;

        let mut seen = HashSet::new();
        for title in titles {
            if state.has_category(title) || !seen.insert(title.as_str()) {
                return Err(StoreError::CategoryConflict(title.clone()));
            }
        }

        let created: Vec<Category> = titles.iter().map(|t| Category::new(t.as_str())).collect();
        state.categories.extend(created.iter().cloned());
        Ok(created)
    }

    async fn create_transaction(&self, fields: NewTransaction) -> StoreResult<Transaction> {
        let transaction = fields.into_transaction(Utc::now());
        self.state()?.transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn save_transactions_batch(
        &self,
        batch: Vec<NewTransaction>,
    ) -> StoreResult<Vec<Transaction>> {
        let now = Utc::now();
        let saved: Vec<Transaction> = batch
            .into_iter()
            .map(|fields| fields.into_transaction(now))
            .collect();
        self.state()?.transactions.extend(saved.iter().cloned());
        Ok(saved)
    }

    async fn remove(&self, transaction: &Transaction) -> StoreResult<()> {
        self.state()?.transactions.retain(|t| t.id != transaction.id);
        Ok(())
    }
}
