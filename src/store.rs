//! SQLite transaction store: schema, batch loading and aggregate queries

use std::path::Path;

use anyhow::Context;
use rusqlite::{params, Connection};

use crate::data::TransactionRecord;

/// Rows inserted per SQL transaction
pub const LOAD_BATCH_SIZE: usize = 1000;

const SCHEMA_SQL: &str = "
DROP TABLE IF EXISTS transactions;
CREATE TABLE transactions (
    invoice_no TEXT NOT NULL,
    product_id TEXT NOT NULL,
    quantity INTEGER,
    unit_price REAL,
    customer_id TEXT,
    country TEXT
);
CREATE INDEX invoice_product_idx ON transactions(invoice_no, product_id);

CREATE TABLE IF NOT EXISTS products (
    product_id TEXT PRIMARY KEY,
    description TEXT
);
";

/// Per-invoice totals for BI export
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionSummary {
    pub invoice_no: String,
    pub transaction_value: f64,
    pub unique_products: i64,
}

/// Per-customer totals for BI export
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerSummary {
    pub customer_id: String,
    pub transaction_count: i64,
    pub total_spend: f64,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database {}", path.display()))?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> crate::Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Drop and recreate the transactions table; create products if absent
    pub fn setup_schema(&self) -> crate::Result<()> {
        self.conn
            .execute_batch(SCHEMA_SQL)
            .context("failed to create schema")?;
        tracing::info!("database schema created");
        Ok(())
    }

    /// Insert records in batches of [`LOAD_BATCH_SIZE`], committing each batch
    pub fn load_transactions(&mut self, records: &[TransactionRecord]) -> crate::Result<usize> {
        for (batch_no, batch) in records.chunks(LOAD_BATCH_SIZE).enumerate() {
            let tx = self.conn.transaction()?;
            {
                let mut insert = tx.prepare_cached(
                    "INSERT INTO transactions
                     (invoice_no, product_id, quantity, unit_price, customer_id, country)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )?;
                for record in batch {
                    insert.execute(params![
                        record.invoice_no,
                        record.product_id,
                        record.quantity,
                        record.unit_price,
                        record.customer_id,
                        record.country,
                    ])?;
                }
            }
            tx.commit()
                .with_context(|| format!("failed to commit batch {batch_no}"))?;
            tracing::debug!(batch = batch_no, rows = batch.len(), "loaded batch");
        }

        tracing::info!(rows = records.len(), "loaded transactions");
        Ok(records.len())
    }

    pub fn transaction_count(&self) -> crate::Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(count)
    }

    /// (invoice, product) pairs of invoices with more than one line
    pub fn basket_pairs(&self) -> crate::Result<Vec<(String, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT invoice_no, product_id
             FROM transactions
             WHERE invoice_no IN (
                 SELECT invoice_no FROM transactions
                 GROUP BY invoice_no
                 HAVING COUNT(product_id) > 1
             )
             ORDER BY invoice_no, product_id",
        )?;
        let pairs = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<(String, String)>, _>>()?;
        Ok(pairs)
    }

    pub fn transaction_summaries(&self) -> crate::Result<Vec<TransactionSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT invoice_no,
                    SUM(quantity * unit_price) AS transaction_value,
                    COUNT(DISTINCT product_id) AS unique_products
             FROM transactions
             GROUP BY invoice_no
             ORDER BY invoice_no",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(TransactionSummary {
                    invoice_no: row.get(0)?,
                    transaction_value: row.get(1)?,
                    unique_products: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn customer_summaries(&self) -> crate::Result<Vec<CustomerSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT customer_id,
                    COUNT(DISTINCT invoice_no) AS transaction_count,
                    SUM(quantity * unit_price) AS total_spend
             FROM transactions
             WHERE customer_id IS NOT NULL
             GROUP BY customer_id
             ORDER BY customer_id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(CustomerSummary {
                    customer_id: row.get(0)?,
                    transaction_count: row.get(1)?,
                    total_spend: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
