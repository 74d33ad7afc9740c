use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::domain::{Category, NewTransaction, Transaction, TransactionId, TransactionType};

use super::{LedgerStore, MIGRATION_001_INITIAL, StoreError, StoreResult};

const TRANSACTION_COLUMNS: &str =
    "id, title, value_cents, transaction_type, category_id, created_at";

const INSERT_TRANSACTION: &str = r#"
    INSERT INTO transactions (id, title, value_cents, transaction_type, category_id, created_at)
    VALUES (?, ?, ?, ?, ?, ?)
"#;

const INSERT_CATEGORY: &str = "INSERT INTO categories (id, title, created_at) VALUES (?, ?, ?)";

/// SQLite-backed ledger store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open an existing database file.
    pub async fn connect(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{}", database_path);
        let pool = SqlitePool::connect(&url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Create the database file if needed and run migrations.
    pub async fn init(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{}?mode=rwc", database_path);
        let pool = SqlitePool::connect(&url)
            .await
            .context("Failed to create database")?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    fn row_to_transaction(row: &SqliteRow) -> Result<Transaction> {
        let id_str: String = row.get("id");
        let type_str: String = row.get("transaction_type");
        let category_str: String = row.get("category_id");
        let created_at_str: String = row.get("created_at");

        Ok(Transaction {
            id: Uuid::parse_str(&id_str).context("Invalid transaction ID")?,
            title: row.get("title"),
            value: row.get("value_cents"),
            transaction_type: TransactionType::from_str(&type_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid transaction type: {}", type_str))?,
            category_id: Uuid::parse_str(&category_str).context("Invalid category ID")?,
            created_at: parse_timestamp(&created_at_str)?,
        })
    }

    fn row_to_category(row: &SqliteRow) -> Result<Category> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(Category {
            id: Uuid::parse_str(&id_str).context("Invalid category ID")?,
            title: row.get("title"),
            created_at: parse_timestamp(&created_at_str)?,
        })
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .context("Invalid created_at timestamp")?
        .with_timezone(&Utc))
}

fn insert_transaction(transaction: &Transaction) -> Query<'_, Sqlite, SqliteArguments<'_>> {
    sqlx::query(INSERT_TRANSACTION)
        .bind(transaction.id.to_string())
        .bind(&transaction.title)
        .bind(transaction.value)
        .bind(transaction.transaction_type.as_str())
        .bind(transaction.category_id.to_string())
        .bind(transaction.created_at.to_rfc3339())
}

fn insert_category(category: &Category) -> Query<'_, Sqlite, SqliteArguments<'_>> {
    sqlx::query(INSERT_CATEGORY)
        .bind(category.id.to_string())
        .bind(&category.title)
        .bind(category.created_at.to_rfc3339())
}

/// A UNIQUE(title) violation means another writer created the category first.
fn category_insert_error(err: sqlx::Error, title: &str) -> StoreError {
    let is_conflict = err
        .as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation());

    if is_conflict {
        StoreError::CategoryConflict(title.to_string())
    } else {
        StoreError::Backend(anyhow::Error::new(err).context("Failed to save category"))
    }
}

impl LedgerStore for SqliteStore {
    async fn find_all(&self) -> StoreResult<Vec<Transaction>> {
        let query = format!(
            "SELECT {} FROM transactions ORDER BY seq",
            TRANSACTION_COLUMNS
        );
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list transactions")?;

        Ok(rows
            .iter()
            .map(Self::row_to_transaction)
            .collect::<Result<Vec<_>>>()?)
    }

    async fn find_by_id(&self, id: TransactionId) -> StoreResult<Option<Transaction>> {
        let query = format!(
            "SELECT {} FROM transactions WHERE id = ?",
            TRANSACTION_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch transaction")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_transaction(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_categories_by_titles(&self, titles: &[String]) -> StoreResult<Vec<Category>> {
        if titles.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; titles.len()].join(", ");
        let query = format!(
            "SELECT id, title, created_at FROM categories WHERE title IN ({})",
            placeholders
        );

        let mut sql_query = sqlx::query(&query);
        for title in titles {
            sql_query = sql_query.bind(title);
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch categories by title")?;

        Ok(rows
            .iter()
            .map(Self::row_to_category)
            .collect::<Result<Vec<_>>>()?)
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let rows = sqlx::query("SELECT id, title, created_at FROM categories ORDER BY title")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list categories")?;

        Ok(rows
            .iter()
            .map(Self::row_to_category)
            .collect::<Result<Vec<_>>>()?)
    }

    async fn create_category(&self, title: &str) -> StoreResult<Category> {
        let category = Category::new(title);

        insert_category(&category)
            .execute(&self.pool)
            .await
            .map_err(|e| category_insert_error(e, title))?;

        Ok(category)
    }

    async fn create_categories_batch(&self, titles: &[String]) -> StoreResult<Vec<Category>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin category batch")?;

        let mut categories = Vec::with_capacity(titles.len());
        for title in titles {
            let category = Category::new(title.as_str());
            insert_category(&category)
                .execute(&mut *tx)
                .await
                .map_err(|e| category_insert_error(e, title))?;
            categories.push(category);
        }

        tx.commit()
            .await
            .context("Failed to commit category batch")?;

        Ok(categories)
    }

    async fn create_transaction(&self, fields: NewTransaction) -> StoreResult<Transaction> {
        let transaction = fields.into_transaction(Utc::now());

        insert_transaction(&transaction)
            .execute(&self.pool)
            .await
            .context("Failed to save transaction")?;

        Ok(transaction)
    }

    async fn save_transactions_batch(
        &self,
        batch: Vec<NewTransaction>,
    ) -> StoreResult<Vec<Transaction>> {
        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction batch")?;

        let mut saved = Vec::with_capacity(batch.len());
        for fields in batch {
            let transaction = fields.into_transaction(now);
            insert_transaction(&transaction)
                .execute(&mut *tx)
                .await
                .context("Failed to save transaction batch")?;
            saved.push(transaction);
        }

        tx.commit()
            .await
            .context("Failed to commit transaction batch")?;

        Ok(saved)
    }

    async fn remove(&self, transaction: &Transaction) -> StoreResult<()> {
        sqlx::query("DELETE FROM transactions WHERE id = ?")
            .bind(transaction.id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete transaction")?;
        Ok(())
    }
}
