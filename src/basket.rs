//! Basket extraction: group (invoice, item) records into per-invoice item sets

use std::collections::{BTreeMap, BTreeSet};

use crate::error::MiningError;

/// Smallest number of distinct items a basket needs to contribute to mining
pub const MIN_BASKET_SIZE: usize = 2;

/// The distinct items bought together on one invoice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Basket {
    pub invoice: String,
    pub items: BTreeSet<String>,
}

impl Basket {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: &str) -> bool {
        self.items.contains(item)
    }
}

/// Group records by invoice, collapsing repeated items.
///
/// Invoices left with fewer than [`MIN_BASKET_SIZE`] distinct items are
/// dropped here even if the source query already filtered them, because a
/// line-count filter lets through invoices that repeat a single product.
/// Baskets come back ordered by invoice id.
///
/// # Errors
/// A blank invoice or item id is rejected with the record's position.
pub fn extract_baskets<I, S, T>(records: I) -> Result<Vec<Basket>, MiningError>
where
    I: IntoIterator<Item = (S, T)>,
    S: AsRef<str>,
    T: AsRef<str>,
{
    let mut grouped: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for (position, (invoice, item)) in records.into_iter().enumerate() {
        let invoice = invoice.as_ref().trim();
        if invoice.is_empty() {
            return Err(MiningError::BlankInvoiceId { position });
        }
        let item = item.as_ref().trim();
        if item.is_empty() {
            return Err(MiningError::BlankItemId {
                position,
                invoice: invoice.to_string(),
            });
        }

        grouped
            .entry(invoice.to_string())
            .or_default()
            .insert(item.to_string());
    }

    let total_invoices = grouped.len();
    let baskets: Vec<Basket> = grouped
        .into_iter()
        .filter(|(_, items)| items.len() >= MIN_BASKET_SIZE)
        .map(|(invoice, items)| Basket { invoice, items })
        .collect();

    tracing::debug!(
        invoices = total_invoices,
        baskets = baskets.len(),
        "grouped records into baskets"
    );

    Ok(baskets)
}
