use std::collections::HashMap;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::application::LedgerService;
use crate::domain::{format_cents, parse_amount, TransactionType};
use crate::storage::SqliteStore;

/// Cashbook - Personal Finance Ledger
#[derive(Parser)]
#[command(name = "cashbook")]
#[command(about = "Record income and outcome transactions by category")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "cashbook.db")]
    pub database: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// List transactions together with the balance
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show income, outcome and total
    Balance,

    /// Record a transaction
    Add {
        /// Transaction title
        title: String,

        /// Amount (e.g., "50.00" or "50")
        amount: String,

        /// Transaction type: income, outcome
        #[arg(short = 't', long = "type")]
        transaction_type: String,

        /// Category title (created if it doesn't exist)
        #[arg(short, long)]
        category: String,
    },

    /// Delete a transaction by ID
    Delete {
        /// Transaction ID
        id: String,
    },

    /// Import transactions from CSV (title,type,value,category with a header row)
    Import {
        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },

    /// List categories
    Categories,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                SqliteStore::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::List { json } => {
                let service = connect(&self.database).await?;
                run_list_command(&service, json).await?;
            }

            Commands::Balance => {
                let service = connect(&self.database).await?;
                let balance = service.get_balance().await?;
                println!("Income:  {:>12}", format_cents(balance.income));
                println!("Outcome: {:>12}", format_cents(balance.outcome));
                println!("Total:   {:>12}", format_cents(balance.total));
            }

            Commands::Add {
                title,
                amount,
                transaction_type,
                category,
            } => {
                let service = connect(&self.database).await?;
                let value =
                    parse_amount(&amount).context("Invalid amount format. Use '50.00' or '50'")?;
                let transaction_type = TransactionType::from_str(&transaction_type)
                    .with_context(|| {
                        format!(
                            "Invalid transaction type '{}'. Valid types: income, outcome",
                            transaction_type
                        )
                    })?;

                let transaction = service
                    .create_transaction(&title, value, transaction_type, &category)
                    .await?;

                println!(
                    "Recorded {}: {} {} [{}] ({})",
                    transaction.transaction_type,
                    transaction.title,
                    format_cents(transaction.value),
                    category.trim(),
                    transaction.id
                );
            }

            Commands::Delete { id } => {
                let service = connect(&self.database).await?;
                let transaction_id =
                    Uuid::parse_str(&id).context("Invalid transaction ID format (expected UUID)")?;
                service.delete_transaction(transaction_id).await?;
                println!("Deleted transaction {}", transaction_id);
            }

            Commands::Import { input } => {
                let service = connect(&self.database).await?;
                run_import_command(&service, input.as_deref()).await?;
            }

            Commands::Categories => {
                let service = connect(&self.database).await?;
                let categories = service.list_categories().await?;
                if categories.is_empty() {
                    println!("No categories found.");
                }
                for category in categories {
                    println!("{:<30} {}", category.title, category.id);
                }
            }
        }

        Ok(())
    }
}

async fn connect(database: &str) -> Result<LedgerService<SqliteStore>> {
    let store = SqliteStore::connect(database).await?;
    Ok(LedgerService::new(store))
}

async fn run_list_command(service: &LedgerService<SqliteStore>, json: bool) -> Result<()> {
    let summary = service.list_transactions().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if summary.transactions.is_empty() {
        println!("No transactions found.");
    } else {
        let category_names: HashMap<Uuid, String> = service
            .list_categories()
            .await?
            .into_iter()
            .map(|c| (c.id, c.title))
            .collect();

        println!(
            "{:<12} {:<8} {:>12} {:<15} TITLE",
            "DATE", "TYPE", "VALUE", "CATEGORY"
        );
        println!("{}", "-".repeat(70));

        for transaction in &summary.transactions {
            let category = category_names
                .get(&transaction.category_id)
                .map(|s| s.as_str())
                .unwrap_or("?");

            println!(
                "{:<12} {:<8} {:>12} {:<15} {}",
                transaction.created_at.format("%Y-%m-%d"),
                transaction.transaction_type.as_str(),
                format_cents(transaction.value),
                truncate(category, 15),
                truncate(&transaction.title, 30)
            );
        }
        println!("{}", "-".repeat(70));
    }

    println!(
        "Income: {}  Outcome: {}  Total: {}",
        format_cents(summary.balance.income),
        format_cents(summary.balance.outcome),
        format_cents(summary.balance.total)
    );
    Ok(())
}

async fn run_import_command(service: &LedgerService<SqliteStore>, input: Option<&str>) -> Result<()> {
    let importer = service.importer();

    let result = match input {
        Some(path) => importer.import_file(path).await?,
        None => importer.import_reader(std::io::stdin()).await?,
    };

    println!("Import complete");
    println!("  Imported:           {}", result.transactions.len());
    println!("  Categories created: {}", result.created_categories.len());
    println!("  Skipped rows:       {}", result.skipped);

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
