use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, CategoryId};

pub type TransactionId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money entering the ledger
    Income,
    /// Money leaving the ledger, subject to the solvency rule
    Outcome,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Outcome => "outcome",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Some(TransactionType::Income),
            "outcome" => Some(TransactionType::Outcome),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted ledger entry. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub title: String,
    pub value: Cents,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub category_id: CategoryId,
    pub created_at: DateTime<Utc>,
}

/// Fields of a transaction that has not been persisted yet.
/// The store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub title: String,
    pub value: Cents,
    pub transaction_type: TransactionType,
    pub category_id: CategoryId,
}

impl NewTransaction {
    pub fn new(
        title: impl Into<String>,
        value: Cents,
        transaction_type: TransactionType,
        category_id: CategoryId,
    ) -> Self {
        Self {
            title: title.into(),
            value,
            transaction_type,
            category_id,
        }
    }

    /// Materialize the record with a fresh identifier.
    pub fn into_transaction(self, created_at: DateTime<Utc>) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            title: self.title,
            value: self.value,
            transaction_type: self.transaction_type,
            category_id: self.category_id,
            created_at,
        }
    }
}
