//! Retail CSV cleaning and tabular export using Polars

use std::fs::File;
use std::path::Path;

use anyhow::Context;
use polars::df;
use polars::prelude::*;

use crate::rules::AssociationRule;
use crate::store::{CustomerSummary, TransactionSummary};

/// Columns the raw Online Retail II export must provide
pub const RAW_COLUMNS: [&str; 6] = [
    "Invoice",
    "StockCode",
    "Quantity",
    "Price",
    "Customer ID",
    "Country",
];

/// Columns of the cleaned transactions file, in order
pub const CLEANED_COLUMNS: [&str; 6] = [
    "invoice_no",
    "product_id",
    "quantity",
    "unit_price",
    "customer_id",
    "country",
];

/// Column order of the exported rules table
pub const RULE_COLUMNS: [&str; 7] = [
    "antecedents",
    "consequents",
    "support",
    "confidence",
    "lift",
    "leverage",
    "conviction",
];

/// One cleaned transaction line
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub invoice_no: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub customer_id: String,
    pub country: String,
}

/// Scan a CSV with every column read as a string; callers cast explicitly
fn scan_as_strings(path: &Path) -> crate::Result<LazyFrame> {
    let frame = LazyCsvReader::new(path)
        .with_infer_schema_length(Some(0))
        .finish()
        .with_context(|| format!("failed to open {}", path.display()))?;
    Ok(frame)
}

fn require_columns(frame: &LazyFrame, expected: &[&str], path: &Path) -> crate::Result<()> {
    let header = frame.clone().limit(0).collect()?;
    let missing: Vec<&str> = expected
        .iter()
        .copied()
        .filter(|name| header.column(name).is_err())
        .collect();
    if !missing.is_empty() {
        anyhow::bail!(
            "{} is missing columns {:?}; expected {:?}",
            path.display(),
            missing,
            expected
        );
    }
    Ok(())
}

/// Clean the raw retail export and write the cleaned transactions CSV.
///
/// Drops cancelled invoices (ids starting with `C`), returns and unparsable
/// quantities, guest checkouts without a customer id, and lines priced at
/// or below `min_unit_price`.
///
/// # Returns
/// * Number of rows written
pub fn clean_retail_data(input: &Path, output: &Path, min_unit_price: f64) -> crate::Result<usize> {
    let raw = scan_as_strings(input)?;
    require_columns(&raw, &RAW_COLUMNS, input)?;

    let mut cleaned = raw
        .filter(col("Invoice").str().starts_with(lit("C")).not())
        .with_columns([
            col("Quantity").cast(DataType::Int64),
            col("Price").cast(DataType::Float64),
            // Exports write ids like 17850.0
            col("Customer ID")
                .cast(DataType::Float64)
                .cast(DataType::Int64)
                .cast(DataType::String),
        ])
        .filter(
            col("Quantity")
                .gt(lit(0))
                .and(col("Customer ID").is_not_null())
                .and(col("Price").gt(lit(min_unit_price))),
        )
        .select([
            col("Invoice").alias("invoice_no"),
            col("StockCode").alias("product_id"),
            col("Quantity").alias("quantity"),
            col("Price").alias("unit_price"),
            col("Customer ID").alias("customer_id"),
            col("Country").alias("country"),
        ])
        .collect()
        .context("failed to clean retail data")?;

    write_csv(&mut cleaned, output)?;
    tracing::info!(rows = cleaned.height(), output = %output.display(), "cleaned retail data");
    Ok(cleaned.height())
}

/// Read the cleaned transactions CSV
pub fn read_cleaned_transactions(path: &Path) -> crate::Result<Vec<TransactionRecord>> {
    let frame = scan_as_strings(path)?;
    require_columns(&frame, &CLEANED_COLUMNS, path)?;

    let df = frame
        .select([
            col("invoice_no"),
            col("product_id"),
            col("quantity").cast(DataType::Int64),
            col("unit_price").cast(DataType::Float64),
            col("customer_id"),
            col("country"),
        ])
        .collect()?;

    let invoices = df.column("invoice_no")?.str()?;
    let products = df.column("product_id")?.str()?;
    let quantities = df.column("quantity")?.i64()?;
    let prices = df.column("unit_price")?.f64()?;
    let customers = df.column("customer_id")?.str()?;
    let countries = df.column("country")?.str()?;

    let mut records = Vec::with_capacity(df.height());
    let rows = invoices
        .into_iter()
        .zip(products)
        .zip(quantities)
        .zip(prices)
        .zip(customers)
        .zip(countries);
    for (row, (((((invoice, product), quantity), price), customer), country)) in rows.enumerate() {
        let (Some(invoice), Some(product), Some(quantity), Some(price), Some(customer)) =
            (invoice, product, quantity, price, customer)
        else {
            anyhow::bail!("{} row {} has a missing or invalid value", path.display(), row + 1);
        };
        records.push(TransactionRecord {
            invoice_no: invoice.to_string(),
            product_id: product.to_string(),
            quantity,
            unit_price: price,
            customer_id: customer.to_string(),
            country: country.unwrap_or_default().to_string(),
        });
    }

    tracing::debug!(rows = records.len(), "read cleaned transactions");
    Ok(records)
}

/// Build the rules table; item sets are comma-joined in sorted order
pub fn rules_frame(rules: &[AssociationRule]) -> crate::Result<DataFrame> {
    let antecedents: Vec<String> = rules.iter().map(|r| r.antecedent.join(",")).collect();
    let consequents: Vec<String> = rules.iter().map(|r| r.consequent.join(",")).collect();
    let support: Vec<f64> = rules.iter().map(|r| r.support).collect();
    let confidence: Vec<f64> = rules.iter().map(|r| r.confidence).collect();
    let lift: Vec<f64> = rules.iter().map(|r| r.lift).collect();
    let leverage: Vec<f64> = rules.iter().map(|r| r.leverage).collect();
    let conviction: Vec<f64> = rules.iter().map(|r| r.conviction).collect();

    let frame = df!(
        RULE_COLUMNS[0] => antecedents,
        RULE_COLUMNS[1] => consequents,
        RULE_COLUMNS[2] => support,
        RULE_COLUMNS[3] => confidence,
        RULE_COLUMNS[4] => lift,
        RULE_COLUMNS[5] => leverage,
        RULE_COLUMNS[6] => conviction
    )?;
    Ok(frame)
}

pub fn write_rules_csv(rules: &[AssociationRule], path: &Path) -> crate::Result<()> {
    let mut frame = rules_frame(rules)?;
    write_csv(&mut frame, path)?;
    tracing::info!(rules = rules.len(), output = %path.display(), "wrote association rules");
    Ok(())
}

pub fn write_transaction_summaries(
    summaries: &[TransactionSummary],
    path: &Path,
) -> crate::Result<()> {
    let mut frame = df!(
        "invoice_no" => summaries.iter().map(|s| s.invoice_no.clone()).collect::<Vec<_>>(),
        "transaction_value" => summaries.iter().map(|s| s.transaction_value).collect::<Vec<_>>(),
        "unique_products" => summaries.iter().map(|s| s.unique_products).collect::<Vec<_>>()
    )?;
    write_csv(&mut frame, path)
}

pub fn write_customer_summaries(summaries: &[CustomerSummary], path: &Path) -> crate::Result<()> {
    let mut frame = df!(
        "customer_id" => summaries.iter().map(|s| s.customer_id.clone()).collect::<Vec<_>>(),
        "transaction_count" => summaries.iter().map(|s| s.transaction_count).collect::<Vec<_>>(),
        "total_spend" => summaries.iter().map(|s| s.total_spend).collect::<Vec<_>>()
    )?;
    write_csv(&mut frame, path)
}

fn write_csv(frame: &mut DataFrame, path: &Path) -> crate::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let mut file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(frame)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleMetrics;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    // Two premium lines, then a cancellation, a return, a guest checkout,
    // a cheap line and one more premium line
    const RAW_CSV: &str = "\
Invoice,StockCode,Description,Quantity,InvoiceDate,Price,Customer ID,Country
536365,85123A,WHITE HANGING HEART T-LIGHT HOLDER,6,2010-12-01 08:26,5.55,17850.0,United Kingdom
536365,71053,WHITE METAL LANTERN,6,2010-12-01 08:26,6.39,17850.0,United Kingdom
C536379,D,Discount,-1,2010-12-01 09:41,27.50,14527.0,United Kingdom
536380,22633,HAND WARMER UNION JACK,-6,2010-12-01 09:45,8.85,17850.0,United Kingdom
536381,22752,SET 7 BABUSHKA NESTING BOXES,2,2010-12-01 09:50,7.65,,United Kingdom
536382,21730,GLASS STAR FROSTED T-LIGHT HOLDER,12,2010-12-01 10:00,4.25,13047.0,France
536383,22457,NATURAL SLATE HEART CHALKBOARD,4,2010-12-01 10:15,12.50,13047.0,France
";

    fn create_raw_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(RAW_CSV.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_clean_retail_data() {
        let raw = create_raw_csv();
        let dir = tempdir().unwrap();
        let output = dir.path().join("processed").join("cleaned_retail.csv");

        let rows = clean_retail_data(raw.path(), &output, 5.0).unwrap();
        assert_eq!(rows, 3);

        let records = read_cleaned_transactions(&output).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(
            records[0],
            TransactionRecord {
                invoice_no: "536365".to_string(),
                product_id: "85123A".to_string(),
                quantity: 6,
                unit_price: 5.55,
                customer_id: "17850".to_string(),
                country: "United Kingdom".to_string(),
            }
        );
        assert_eq!(records[2].invoice_no, "536383");
        assert_eq!(records[2].customer_id, "13047");
    }

    #[test]
    fn test_clean_rejects_missing_columns() {
        let mut raw = NamedTempFile::new().unwrap();
        writeln!(raw, "Invoice,StockCode,Quantity").unwrap();
        writeln!(raw, "1,A,2").unwrap();
        let dir = tempdir().unwrap();

        let result = clean_retail_data(raw.path(), &dir.path().join("out.csv"), 5.0);
        assert!(result.is_err());
    }

    #[test]
    fn test_read_rejects_missing_columns() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invoice_no,product_id").unwrap();
        writeln!(file, "1,A").unwrap();

        let err = read_cleaned_transactions(file.path()).unwrap_err();
        assert!(err.to_string().contains("missing columns"));
    }

    #[test]
    fn test_write_rules_csv() {
        let metrics = RuleMetrics::compute(0.1, 0.1, 0.5);
        let rule = AssociationRule {
            antecedent: vec!["22386".to_string(), "85099B".to_string()],
            consequent: vec!["21931".to_string()],
            antecedent_support: 0.1,
            consequent_support: 0.5,
            support: metrics.support,
            confidence: metrics.confidence,
            lift: metrics.lift,
            leverage: metrics.leverage,
            conviction: metrics.conviction,
        };
        let dir = tempdir().unwrap();
        let path = dir.path().join("association_rules.csv");

        write_rules_csv(&[rule], &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(RULE_COLUMNS.join(",").as_str()));
        let row = lines.next().unwrap();
        assert!(row.starts_with("\"22386,85099B\",21931,"));
        assert!(row.ends_with("inf"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_write_summaries() {
        let dir = tempdir().unwrap();
        let transactions = dir.path().join("pbi_transactions.csv");
        let customers = dir.path().join("pbi_customers.csv");

        write_transaction_summaries(
            &[TransactionSummary {
                invoice_no: "536365".to_string(),
                transaction_value: 53.0,
                unique_products: 2,
            }],
            &transactions,
        )
        .unwrap();
        write_customer_summaries(
            &[CustomerSummary {
                customer_id: "17850".to_string(),
                transaction_count: 2,
                total_spend: 89.0,
            }],
            &customers,
        )
        .unwrap();

        let text = std::fs::read_to_string(&transactions).unwrap();
        assert!(text.starts_with("invoice_no,transaction_value,unique_products\n"));
        let text = std::fs::read_to_string(&customers).unwrap();
        assert!(text.starts_with("customer_id,transaction_count,total_spend\n"));
    }
}
