//! Error and early-exit types for the mining core

use thiserror::Error;

/// Structural violations of the basket and itemset invariants.
///
/// These are hard failures surfaced to the caller. Expected empty-data
/// conditions are reported through [`Exhausted`] instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MiningError {
    #[error("record {position} has a blank invoice id")]
    BlankInvoiceId { position: usize },
    #[error("record {position} (invoice {invoice}) has a blank item id")]
    BlankItemId { position: usize, invoice: String },
    #[error("threshold `{name}` = {value} is out of range: {expected}")]
    InvalidThreshold {
        name: &'static str,
        value: f64,
        expected: &'static str,
    },
    #[error("itemset of {len} items is too large to partition into rules (max {max})")]
    ItemsetTooLarge { len: usize, max: usize },
    #[error("itemset {itemset:?} is frequent but its subset {subset:?} has no recorded support")]
    MissingSubsetSupport {
        itemset: Vec<String>,
        subset: Vec<String>,
    },
}

/// Reasons a mining run ends without an output table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exhausted {
    NoBaskets,
    NoFrequentItemsets,
    NoRulesGenerated,
    NoRulesMetCriteria,
}

impl std::fmt::Display for Exhausted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Exhausted::NoBaskets => "no multi-item baskets found",
            Exhausted::NoFrequentItemsets => "no frequent itemsets found",
            Exhausted::NoRulesGenerated => "no association rules generated",
            Exhausted::NoRulesMetCriteria => "no rules met the business criteria",
        };
        f.write_str(msg)
    }
}
