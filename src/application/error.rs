use thiserror::Error;

use crate::domain::{BalanceOverflow, Cents, ParseAmountError};
use crate::storage::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: Cents, required: Cents },

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("Import source unreadable: {0}")]
    SourceUnreadable(String),

    #[error("Category title conflict could not be resolved: {0}")]
    ConflictingCategory(String),

    #[error("Import row on line {line} has no resolvable category")]
    UnresolvedCategory { line: usize },

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid transaction type: {0}")]
    InvalidTransactionType(String),

    #[error("Amount would overflow the ledger totals")]
    BalanceOverflow,

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::CategoryConflict(title) => AppError::ConflictingCategory(title),
            StoreError::Backend(e) => AppError::Database(e),
        }
    }
}

impl From<ParseAmountError> for AppError {
    fn from(err: ParseAmountError) -> Self {
        AppError::InvalidAmount(err.to_string())
    }
}

impl From<BalanceOverflow> for AppError {
    fn from(_: BalanceOverflow) -> Self {
        AppError::BalanceOverflow
    }
}
