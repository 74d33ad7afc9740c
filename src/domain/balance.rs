use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Cents, Transaction, TransactionType};

/// Income/outcome summary over the whole ledger. Derived, never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub income: Cents,
    pub outcome: Cents,
    pub total: Cents,
}

/// The running sums no longer fit in [`Cents`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("ledger totals exceed the largest representable amount")]
pub struct BalanceOverflow;

/// Compute the balance from the complete transaction set.
/// total = income - outcome
pub fn compute_balance(transactions: &[Transaction]) -> Result<Balance, BalanceOverflow> {
    transactions
        .iter()
        .try_fold(Balance::default(), |balance, transaction| {
            balance.record(transaction.transaction_type, transaction.value)
        })
}

impl Balance {
    /// Whether an outcome of `value` keeps the total non-negative.
    pub fn covers(&self, value: Cents) -> bool {
        value <= self.total
    }

    /// The balance after one more transaction, or an error if a sum would overflow.
    pub fn record(
        self,
        transaction_type: TransactionType,
        value: Cents,
    ) -> Result<Balance, BalanceOverflow> {
        let (income, outcome) = match transaction_type {
            TransactionType::Income => (
                self.income.checked_add(value).ok_or(BalanceOverflow)?,
                self.outcome,
            ),
            TransactionType::Outcome => (
                self.income,
                self.outcome.checked_add(value).ok_or(BalanceOverflow)?,
            ),
        };

        Ok(Balance {
            income,
            outcome,
            total: income.checked_sub(outcome).ok_or(BalanceOverflow)?,
        })
    }
}
