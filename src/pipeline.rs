//! End-to-end mining: baskets → matrix → frequent itemsets → rules → ranked table

use crate::apriori::{dynamic_min_support, mine_frequent_itemsets, FrequentItemsets};
use crate::basket::extract_baskets;
use crate::config::MiningConfig;
use crate::encoder::PresenceMatrix;
use crate::error::{Exhausted, MiningError};
use crate::rules::{generate_rules, AssociationRule};

/// Everything a successful run produced
#[derive(Debug, Clone, PartialEq)]
pub struct MiningReport {
    pub n_baskets: usize,
    pub n_items: usize,
    pub min_support: f64,
    pub frequent: FrequentItemsets,
    /// Rules that passed the conviction gate
    pub n_candidate_rules: usize,
    /// Rules that passed the business filter, strongest leverage first
    pub rules: Vec<AssociationRule>,
}

/// Result of a run that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum MiningOutcome {
    Rules(MiningReport),
    Empty(Exhausted),
}

impl MiningOutcome {
    pub fn rules(&self) -> Option<&[AssociationRule]> {
        match self {
            MiningOutcome::Rules(report) => Some(&report.rules),
            MiningOutcome::Empty(_) => None,
        }
    }
}

/// Run every mining stage over (invoice, item) records.
///
/// Stops at the first stage that comes up empty and reports which one.
///
/// # Errors
/// Invalid thresholds, blank ids and oversized itemsets.
pub fn mine_rules<I, S, T>(records: I, config: &MiningConfig) -> Result<MiningOutcome, MiningError>
where
    I: IntoIterator<Item = (S, T)>,
    S: AsRef<str>,
    T: AsRef<str>,
{
    config.validate()?;

    let baskets = extract_baskets(records)?;
    let Some(matrix) = PresenceMatrix::encode(baskets) else {
        return Ok(MiningOutcome::Empty(Exhausted::NoBaskets));
    };
    let n_baskets = matrix.n_baskets();
    let n_items = matrix.n_items();
    tracing::info!(baskets = n_baskets, items = n_items, "encoded baskets");

    let min_support = config.min_support_override.unwrap_or_else(|| {
        dynamic_min_support(n_baskets, config.support_floor, config.min_basket_count)
    });
    let frequent = mine_frequent_itemsets(&matrix, min_support, config.max_itemset_len)?;
    tracing::info!(
        min_support,
        itemsets = frequent.len(),
        largest = frequent.max_len(),
        "mined frequent itemsets"
    );
    if frequent.is_empty() {
        return Ok(MiningOutcome::Empty(Exhausted::NoFrequentItemsets));
    }

    let candidates = generate_rules(&frequent, config.min_conviction)?;
    let n_candidate_rules = candidates.len();
    tracing::info!(rules = n_candidate_rules, "generated association rules");
    if candidates.is_empty() {
        return Ok(MiningOutcome::Empty(Exhausted::NoRulesGenerated));
    }

    let rules = config.business_filter().apply(candidates);
    tracing::info!(rules = rules.len(), "applied business filter");
    if rules.is_empty() {
        return Ok(MiningOutcome::Empty(Exhausted::NoRulesMetCriteria));
    }

    Ok(MiningOutcome::Rules(MiningReport {
        n_baskets,
        n_items,
        min_support,
        frequent,
        n_candidate_rules,
        rules,
    }))
}
