mod common;

use anyhow::Result;
use cashbook::application::AppError;
use cashbook::domain::{Balance, TransactionType};
use cashbook::storage::{LedgerStore, StoreError};
use common::{category_titles, fund, test_service};
use uuid::Uuid;

#[tokio::test]
async fn test_empty_ledger_balance_is_zero() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let balance = service.get_balance().await?;
    assert_eq!(
        balance,
        Balance {
            income: 0,
            outcome: 0,
            total: 0
        }
    );

    let summary = service.list_transactions().await?;
    assert!(summary.transactions.is_empty());
    assert_eq!(summary.balance, balance);

    Ok(())
}

#[tokio::test]
async fn test_balance_after_income_and_outcome() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service
        .create_transaction("Salary", 500000, TransactionType::Income, "Work")
        .await?;
    service
        .create_transaction("Rent", 120000, TransactionType::Outcome, "Housing")
        .await?;

    let balance = service.get_balance().await?;
    assert_eq!(balance.income, 500000);
    assert_eq!(balance.outcome, 120000);
    assert_eq!(balance.total, 380000);
    assert_eq!(balance.total, balance.income - balance.outcome);

    let summary = service.list_transactions().await?;
    let titles: Vec<&str> = summary
        .transactions
        .iter()
        .map(|t| t.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Salary", "Rent"]);
    assert_eq!(summary.balance, balance);

    Ok(())
}

#[tokio::test]
async fn test_insufficient_funds_leaves_ledger_unchanged() -> Result<()> {
    let (service, _temp) = test_service().await?;
    fund(&service, 10000).await?;

    let transactions_before = service.store().find_all().await?;
    let categories_before = category_titles(&service).await?;

    let result = service
        .create_transaction("New TV", 10001, TransactionType::Outcome, "Electronics")
        .await;

    match result {
        Err(AppError::InsufficientFunds { balance, required }) => {
            assert_eq!(balance, 10000);
            assert_eq!(required, 10001);
        }
        other => panic!("expected InsufficientFunds, got {:?}", other),
    }

    assert_eq!(service.store().find_all().await?, transactions_before);
    assert_eq!(category_titles(&service).await?, categories_before);
    assert!(!categories_before.contains(&"Electronics".to_string()));

    Ok(())
}

#[tokio::test]
async fn test_outcome_on_empty_ledger_is_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = service
        .create_transaction("Coffee", 1, TransactionType::Outcome, "Food")
        .await;
    assert!(matches!(result, Err(AppError::InsufficientFunds { .. })));

    // A zero outcome never exceeds the total
    service
        .create_transaction("Free sample", 0, TransactionType::Outcome, "Food")
        .await?;

    Ok(())
}

#[tokio::test]
async fn test_new_category_is_created_once_and_reused() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let first = service
        .create_transaction("Salary", 500000, TransactionType::Income, "Work")
        .await?;
    assert_eq!(category_titles(&service).await?, vec!["Work"]);

    let second = service
        .create_transaction("Bonus", 10000, TransactionType::Income, "Work")
        .await?;
    assert_eq!(category_titles(&service).await?, vec!["Work"]);
    assert_eq!(first.category_id, second.category_id);

    // Titles match exactly, so a different case is a different category
    let third = service
        .create_transaction("Side gig", 500, TransactionType::Income, "work")
        .await?;
    assert_ne!(third.category_id, first.category_id);
    assert_eq!(category_titles(&service).await?, vec!["Work", "work"]);

    Ok(())
}

#[tokio::test]
async fn test_created_transaction_is_persisted() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let created = service
        .create_transaction("Salary", 500000, TransactionType::Income, "Work")
        .await?;

    let stored = service
        .store()
        .find_by_id(created.id)
        .await?
        .expect("transaction should be stored");
    assert_eq!(stored.id, created.id);
    assert_eq!(stored.title, "Salary");
    assert_eq!(stored.value, 500000);
    assert_eq!(stored.transaction_type, TransactionType::Income);
    assert_eq!(stored.category_id, created.category_id);

    let categories = service.list_categories().await?;
    assert_eq!(categories[0].id, created.category_id);

    Ok(())
}

#[tokio::test]
async fn test_delete_missing_transaction_fails() -> Result<()> {
    let (service, _temp) = test_service().await?;
    fund(&service, 1000).await?;

    let before = service.store().find_all().await?;
    let missing = Uuid::new_v4();

    let result = service.delete_transaction(missing).await;
    match result {
        Err(AppError::TransactionNotFound(id)) => assert_eq!(id, missing.to_string()),
        other => panic!("expected TransactionNotFound, got {:?}", other),
    }

    assert_eq!(service.store().find_all().await?, before);
    Ok(())
}

#[tokio::test]
async fn test_delete_removes_only_that_transaction() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let salary = service
        .create_transaction("Salary", 500000, TransactionType::Income, "Work")
        .await?;
    let rent = service
        .create_transaction("Rent", 120000, TransactionType::Outcome, "Housing")
        .await?;

    service.delete_transaction(rent.id).await?;

    let remaining = service.store().find_all().await?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, salary.id);

    // Categories survive their transactions
    assert_eq!(category_titles(&service).await?, vec!["Housing", "Work"]);

    let balance = service.get_balance().await?;
    assert_eq!(balance.outcome, 0);
    assert_eq!(balance.total, 500000);

    // Deleting twice fails the second time
    let again = service.delete_transaction(rent.id).await;
    assert!(matches!(again, Err(AppError::TransactionNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_database_persists_across_connections() -> Result<()> {
    let (service, temp) = test_service().await?;
    fund(&service, 2500).await?;
    drop(service);

    let db_path = temp.path().join("test.db");
    let store = cashbook::SqliteStore::connect(db_path.to_str().unwrap()).await?;
    let reopened = cashbook::application::LedgerService::new(store);

    assert_eq!(reopened.get_balance().await?.total, 2500);
    Ok(())
}

#[tokio::test]
async fn test_sqlite_duplicate_category_title_conflicts() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service.store().create_category("Work").await?;
    let result = service.store().create_category("Work").await;

    assert!(matches!(result, Err(StoreError::CategoryConflict(title)) if title == "Work"));
    assert_eq!(category_titles(&service).await?, vec!["Work"]);

    Ok(())
}

#[tokio::test]
async fn test_sqlite_category_batch_rolls_back_on_conflict() -> Result<()> {
    let (service, _temp) = test_service().await?;
    service.store().create_category("Housing").await?;

    let result = service
        .store()
        .create_categories_batch(&["Work".to_string(), "Housing".to_string()])
        .await;

    assert!(matches!(result, Err(StoreError::CategoryConflict(title)) if title == "Housing"));
    assert_eq!(category_titles(&service).await?, vec!["Housing"]);

    Ok(())
}
