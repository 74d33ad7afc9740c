use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use crate::application::AppError;
use crate::domain::{
    compute_balance, parse_amount, Category, CategoryId, Cents, NewTransaction, Transaction,
    TransactionType,
};
use crate::storage::LedgerStore;

/// A well-formed row of the tabular source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    pub line: usize,
    pub title: String,
    pub transaction_type: TransactionType,
    pub value: Cents,
    pub category: String,
}

/// Rows kept from the source plus the number of rows dropped as malformed.
#[derive(Debug, Clone, Default)]
pub struct ParsedRows {
    pub rows: Vec<ImportRow>,
    pub skipped: usize,
}

/// Result of an import operation
#[derive(Debug, Clone)]
pub struct ImportResult {
    /// Persisted transactions, in source row order
    pub transactions: Vec<Transaction>,
    pub created_categories: Vec<Category>,
    pub skipped: usize,
}

/// Parse a CSV source with columns `title, type, value, category`.
///
/// The first row is a header. Rows missing a title, type or value, or carrying an
/// unknown type or a malformed amount, are dropped and counted. I/O failures abort
/// the whole parse.
pub fn parse_rows<R: Read>(reader: R) -> Result<ParsedRows, AppError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut parsed = ParsedRows::default();

    for (index, result) in csv_reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                if let csv::ErrorKind::Io(io_err) = e.kind() {
                    return Err(AppError::SourceUnreadable(io_err.to_string()));
                }
                debug!(error = %e, "dropping malformed import row");
                parsed.skipped += 1;
                continue;
            }
        };

        let line = record
            .position()
            .map_or(index + 2, |pos| pos.line() as usize);

        match parse_record(&record) {
            Some((title, transaction_type, value, category)) => parsed.rows.push(ImportRow {
                line,
                title,
                transaction_type,
                value,
                category,
            }),
            None => {
                debug!(line, "dropping incomplete import row");
                parsed.skipped += 1;
            }
        }
    }

    Ok(parsed)
}

fn parse_record(record: &csv::StringRecord) -> Option<(String, TransactionType, Cents, String)> {
    let title = record.get(0).filter(|s| !s.is_empty())?;
    let transaction_type = record.get(1).and_then(TransactionType::from_str)?;
    let value = record.get(2).and_then(|s| parse_amount(s).ok())?;
    let category = record.get(3).unwrap_or("");

    Some((
        title.to_string(),
        transaction_type,
        value,
        category.to_string(),
    ))
}

/// Distinct titles in order of first appearance.
fn distinct_titles(rows: &[ImportRow]) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter(|row| seen.insert(row.category.as_str()))
        .map(|row| row.category.clone())
        .collect()
}

async fn parse_blocking<F>(parse: F) -> Result<ParsedRows, AppError>
where
    F: FnOnce() -> Result<ParsedRows, AppError> + Send + 'static,
{
    tokio::task::spawn_blocking(parse)
        .await
        .map_err(|e| AppError::SourceUnreadable(format!("import parser failed: {}", e)))?
}

/// Bulk importer: reconciles categories and persists a batch of transactions.
///
/// Imports do not apply the solvency rule. Category creation and the transaction
/// save are two separate writes; a failure between them leaves the new categories
/// without transactions.
pub struct Importer<'a, S> {
    store: &'a S,
}

impl<'a, S: LedgerStore> Importer<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Import transactions from a CSV file on disk.
    /// Opening and parsing run on the blocking thread pool.
    pub async fn import_file(&self, path: impl AsRef<Path>) -> Result<ImportResult, AppError> {
        let path = path.as_ref().to_path_buf();
        let parsed = parse_blocking(move || {
            let file = File::open(&path)
                .map_err(|e| AppError::SourceUnreadable(format!("{}: {}", path.display(), e)))?;
            parse_rows(file)
        })
        .await?;
        self.import_rows(parsed).await
    }

    /// Import transactions from a streaming CSV source such as stdin or a socket.
    /// Parsing runs on the blocking thread pool.
    pub async fn import_reader<R>(&self, reader: R) -> Result<ImportResult, AppError>
    where
        R: Read + Send + 'static,
    {
        let parsed = parse_blocking(move || parse_rows(reader)).await?;
        self.import_rows(parsed).await
    }

    /// Import transactions from an in-memory CSV source.
    /// Parses synchronously on the calling task, so use [`Importer::import_reader`]
    /// for anything that may block.
    pub async fn import_csv<R: Read>(&self, reader: R) -> Result<ImportResult, AppError> {
        let parsed = parse_rows(reader)?;
        self.import_rows(parsed).await
    }

    /// Reconcile categories for already parsed rows and persist them.
    pub async fn import_rows(&self, parsed: ParsedRows) -> Result<ImportResult, AppError> {
        let ParsedRows { rows, skipped } = parsed;

        if let Some(row) = rows.iter().find(|row| row.category.is_empty()) {
            return Err(AppError::UnresolvedCategory { line: row.line });
        }

        if rows.is_empty() {
            info!(skipped, "nothing to import");
            return Ok(ImportResult {
                transactions: Vec::new(),
                created_categories: Vec::new(),
                skipped,
            });
        }

        // Import skips the solvency rule, but the totals must stay representable
        let current = compute_balance(&self.store.find_all().await?)?;
        rows.iter().try_fold(current, |balance, row| {
            balance.record(row.transaction_type, row.value)
        })?;

        let referenced = distinct_titles(&rows);
        let existing = self.store.find_categories_by_titles(&referenced).await?;

        let known: HashSet<&str> = existing.iter().map(|c| c.title.as_str()).collect();
        let missing: Vec<String> = referenced
            .iter()
            .filter(|title| !known.contains(title.as_str()))
            .cloned()
            .collect();

        let created = if missing.is_empty() {
            Vec::new()
        } else {
            self.store.create_categories_batch(&missing).await?
        };

        let resolution: HashMap<&str, CategoryId> = created
            .iter()
            .chain(existing.iter())
            .map(|c| (c.title.as_str(), c.id))
            .collect();

        let batch = rows
            .iter()
            .map(|row| {
                resolution
                    .get(row.category.as_str())
                    .map(|&category_id| {
                        NewTransaction::new(
                            row.title.clone(),
                            row.value,
                            row.transaction_type,
                            category_id,
                        )
                    })
                    .ok_or(AppError::UnresolvedCategory { line: row.line })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let transactions = self.store.save_transactions_batch(batch).await?;

        info!(
            imported = transactions.len(),
            created_categories = created.len(),
            reused_categories = existing.len(),
            skipped,
            "import complete"
        );

        Ok(ImportResult {
            transactions,
            created_categories: created,
            skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rows_skips_header_and_trims() {
        let csv = "title, type, value, category\n  Salary , income , 5000 , Work \nRent,outcome,1200.50,Housing\n";
        let parsed = parse_rows(csv.as_bytes()).unwrap();

        assert_eq!(parsed.skipped, 0);
        assert_eq!(
            parsed.rows,
            vec![
                ImportRow {
                    line: 2,
                    title: "Salary".into(),
                    transaction_type: TransactionType::Income,
                    value: 500000,
                    category: "Work".into(),
                },
                ImportRow {
                    line: 3,
                    title: "Rent".into(),
                    transaction_type: TransactionType::Outcome,
                    value: 120050,
                    category: "Housing".into(),
                },
            ]
        );
    }

    #[test]
    fn test_parse_rows_drops_incomplete_rows() {
        let csv = "\
title,type,value,category
,income,10,Work
Coffee,,3,Food
Tea,outcome,,Food
Lunch,outcome,12,Food
Bonus,gift,100,Work
Refund,income,abc,Misc
Debt,income,-5,Misc
Short,income
";
        let parsed = parse_rows(csv.as_bytes()).unwrap();

        assert_eq!(parsed.skipped, 7);
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].title, "Lunch");
        assert_eq!(parsed.rows[0].line, 5);
    }

    #[test]
    fn test_parse_rows_keeps_rows_without_category() {
        let csv = "title,type,value,category\nSalary,income,10,\nTips,income,5\n";
        let parsed = parse_rows(csv.as_bytes()).unwrap();

        assert_eq!(parsed.rows.len(), 2);
        assert!(parsed.rows.iter().all(|r| r.category.is_empty()));
    }

    #[test]
    fn test_parse_rows_header_only() {
        let parsed = parse_rows("title,type,value,category\n".as_bytes()).unwrap();
        assert!(parsed.rows.is_empty());
        assert_eq!(parsed.skipped, 0);
    }

    #[test]
    fn test_distinct_titles_keeps_first_appearance() {
        let row = |category: &str| ImportRow {
            line: 0,
            title: "t".into(),
            transaction_type: TransactionType::Income,
            value: 1,
            category: category.into(),
        };
        let rows = vec![row("Food"), row("Work"), row("Food"), row("food")];

        assert_eq!(distinct_titles(&rows), vec!["Food", "Work", "food"]);
    }
}
