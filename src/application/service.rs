use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{
    compute_balance, format_cents, Balance, Category, Cents, NewTransaction, Transaction,
    TransactionId, TransactionType,
};
use crate::io::Importer;
use crate::storage::{LedgerStore, StoreError};

use super::AppError;

/// Application service providing the ledger operations.
/// This is the primary interface for any client (CLI, API, etc.).
pub struct LedgerService<S> {
    store: S,
}

/// All transactions together with the balance computed over them.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerSummary {
    pub transactions: Vec<Transaction>,
    pub balance: Balance,
}

impl<S: LedgerStore> LedgerService<S> {
    /// Create a new ledger service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Bulk importer sharing this service's store.
    pub fn importer(&self) -> Importer<'_, S> {
        Importer::new(&self.store)
    }

    // ========================
    // Balance
    // ========================

    /// Compute income, outcome and total over the complete transaction set.
    /// Always recomputed from the store.
    pub async fn get_balance(&self) -> Result<Balance, AppError> {
        let transactions = self.store.find_all().await?;
        Ok(compute_balance(&transactions)?)
    }

    /// List every transaction along with the current balance.
    pub async fn list_transactions(&self) -> Result<LedgerSummary, AppError> {
        let transactions = self.store.find_all().await?;
        let balance = compute_balance(&transactions)?;
        Ok(LedgerSummary {
            transactions,
            balance,
        })
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        Ok(self.store.list_categories().await?)
    }

    // ========================
    // Transaction operations
    // ========================

    /// Record a single transaction, creating its category on first use.
    ///
    /// Outcomes larger than the current total are rejected before any write.
    /// Two concurrent outcomes may both pass this check; callers needing strict
    /// solvency must serialize writes themselves.
    pub async fn create_transaction(
        &self,
        title: &str,
        value: Cents,
        transaction_type: TransactionType,
        category_title: &str,
    ) -> Result<Transaction, AppError> {
        let title = title.trim();
        let category_title = category_title.trim();

        if title.is_empty() {
            return Err(AppError::MissingField("title"));
        }
        if category_title.is_empty() {
            return Err(AppError::MissingField("category"));
        }
        if value < 0 {
            return Err(AppError::InvalidAmount(
                "Amount must not be negative".to_string(),
            ));
        }

        let balance = self.get_balance().await?;
        if transaction_type == TransactionType::Outcome && !balance.covers(value) {
            warn!(
                title,
                balance = %format_cents(balance.total),
                required = %format_cents(value),
                "rejected outcome: insufficient funds"
            );
            return Err(AppError::InsufficientFunds {
                balance: balance.total,
                required: value,
            });
        }
        balance.record(transaction_type, value)?;

        let category = self.resolve_category(category_title).await?;

        let transaction = self
            .store
            .create_transaction(NewTransaction::new(
                title,
                value,
                transaction_type,
                category.id,
            ))
            .await?;

        info!(
            id = %transaction.id,
            kind = %transaction.transaction_type,
            value = %format_cents(transaction.value),
            category = %category.title,
            "recorded transaction"
        );

        Ok(transaction)
    }

    /// Delete a transaction by id. Categories are left untouched.
    pub async fn delete_transaction(&self, id: TransactionId) -> Result<(), AppError> {
        let transaction = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::TransactionNotFound(id.to_string()))?;

        self.store.remove(&transaction).await?;
        info!(id = %id, "deleted transaction");
        Ok(())
    }

    // ========================
    // Category resolution
    // ========================

    /// Find the category with this exact title, creating it when missing.
    ///
    /// A concurrent writer may create the same title between the lookup and the
    /// insert; the store reports that as a conflict and the title is looked up again.
    async fn resolve_category(&self, title: &str) -> Result<Category, AppError> {
        if let Some(category) = self.find_category(title).await? {
            return Ok(category);
        }

        match self.store.create_category(title).await {
            Ok(category) => info!(id = %category.id, title, "created category"),
            Err(StoreError::CategoryConflict(_)) => {
                debug!(title, "category created concurrently, re-resolving")
            }
            Err(e) => return Err(e.into()),
        }

        self.find_category(title)
            .await?
            .ok_or_else(|| AppError::ConflictingCategory(title.to_string()))
    }

    async fn find_category(&self, title: &str) -> Result<Option<Category>, AppError> {
        let found = self
            .store
            .find_categories_by_titles(&[title.to_string()])
            .await?;
        Ok(found.into_iter().find(|c| c.title == title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn service() -> LedgerService<MemoryStore> {
        LedgerService::new(MemoryStore::new())
    }

    #[tokio::test]
    async fn test_create_rejects_blank_fields() {
        let service = service();

        let result = service
            .create_transaction("  ", 100, TransactionType::Income, "Work")
            .await;
        assert!(matches!(result, Err(AppError::MissingField("title"))));

        let result = service
            .create_transaction("Salary", 100, TransactionType::Income, "")
            .await;
        assert!(matches!(result, Err(AppError::MissingField("category"))));

        let result = service
            .create_transaction("Salary", -1, TransactionType::Income, "Work")
            .await;
        assert!(matches!(result, Err(AppError::InvalidAmount(_))));

        assert!(service.store().find_all().await.unwrap().is_empty());
        assert!(service.list_categories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_trims_titles() {
        let service = service();
        let transaction = service
            .create_transaction(" Salary ", 100, TransactionType::Income, " Work ")
            .await
            .unwrap();

        assert_eq!(transaction.title, "Salary");
        let categories = service.list_categories().await.unwrap();
        assert_eq!(categories[0].title, "Work");
        assert_eq!(categories[0].id, transaction.category_id);
    }

    #[tokio::test]
    async fn test_outcome_may_spend_exact_total() {
        let service = service();
        service
            .create_transaction("Salary", 1000, TransactionType::Income, "Work")
            .await
            .unwrap();
        service
            .create_transaction("Everything", 1000, TransactionType::Outcome, "Misc")
            .await
            .unwrap();

        let balance = service.get_balance().await.unwrap();
        assert_eq!(balance.total, 0);
    }

    #[tokio::test]
    async fn test_income_that_would_overflow_totals_is_rejected() {
        let service = service();
        let largest = Cents::MAX - Cents::MAX % 100;
        service
            .create_transaction("Jackpot", largest, TransactionType::Income, "Luck")
            .await
            .unwrap();

        let result = service
            .create_transaction("Jackpot again", largest, TransactionType::Income, "Luck")
            .await;
        assert!(matches!(result, Err(AppError::BalanceOverflow)));

        assert_eq!(service.store().find_all().await.unwrap().len(), 1);
        assert_eq!(service.get_balance().await.unwrap().total, largest);
    }

    #[tokio::test]
    async fn test_income_is_never_subject_to_solvency() {
        let service = service();
        let result = service
            .create_transaction("Gift", 0, TransactionType::Income, "Gifts")
            .await;
        assert!(result.is_ok());
    }
}
