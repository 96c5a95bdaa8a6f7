//! Association rule generation from frequent itemsets

use crate::apriori::FrequentItemsets;
use crate::error::MiningError;

/// Largest itemset the bitmask partitioner can split
pub const MAX_PARTITION_LEN: usize = 63;

/// Antecedent → consequent rule with its interest metrics
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationRule {
    /// Sorted item ids
    pub antecedent: Vec<String>,
    /// Sorted item ids, disjoint from the antecedent
    pub consequent: Vec<String>,
    pub antecedent_support: f64,
    pub consequent_support: f64,
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
    pub leverage: f64,
    /// `f64::INFINITY` when confidence is 1
    pub conviction: f64,
}

/// Metrics of a rule computed from the three supports involved
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleMetrics {
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
    pub leverage: f64,
    pub conviction: f64,
}

impl RuleMetrics {
    pub fn compute(support: f64, antecedent_support: f64, consequent_support: f64) -> Self {
        let confidence = support / antecedent_support;
        let lift = confidence / consequent_support;
        let leverage = support - antecedent_support * consequent_support;
        let conviction = if confidence >= 1.0 {
            f64::INFINITY
        } else {
            (1.0 - consequent_support) / (1.0 - confidence)
        };

        Self {
            support,
            confidence,
            lift,
            leverage,
            conviction,
        }
    }
}

impl AssociationRule {
    pub fn has_infinite_conviction(&self) -> bool {
        self.conviction.is_infinite()
    }

    /// Render as `A, B -> C`
    pub fn describe(&self) -> String {
        format!(
            "{} -> {}",
            self.antecedent.join(", "),
            self.consequent.join(", ")
        )
    }
}

/// Every split of an itemset into a non-empty antecedent and consequent.
///
/// Walks the bitmasks `1..2^n - 1`; a set bit puts the element in the
/// antecedent, a clear bit in the consequent.
#[derive(Debug, Clone)]
pub struct Partitions<'a> {
    elements: &'a [usize],
    mask: u64,
    end: u64,
}

impl<'a> Partitions<'a> {
    pub fn new(elements: &'a [usize]) -> Result<Self, MiningError> {
        if elements.len() > MAX_PARTITION_LEN {
            return Err(MiningError::ItemsetTooLarge {
                len: elements.len(),
                max: MAX_PARTITION_LEN,
            });
        }
        let end = if elements.len() < 2 {
            1
        } else {
            (1u64 << elements.len()) - 1
        };
        Ok(Self {
            elements,
            mask: 1,
            end,
        })
    }
}

impl Iterator for Partitions<'_> {
    type Item = (Vec<usize>, Vec<usize>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.mask >= self.end {
            return None;
        }
        let mut antecedent = Vec::new();
        let mut consequent = Vec::new();
        for (bit, &element) in self.elements.iter().enumerate() {
            if self.mask & (1 << bit) != 0 {
                antecedent.push(element);
            } else {
                consequent.push(element);
            }
        }
        self.mask += 1;
        Some((antecedent, consequent))
    }
}

/// Derive all rules from itemsets of size ≥ 2 whose conviction is at least
/// `min_conviction`.
///
/// Rules come out in itemset order, then in partition order within an
/// itemset. An empty result means no rule cleared the threshold.
///
/// # Errors
/// `MissingSubsetSupport` if a subset of a frequent itemset was not itself
/// recorded as frequent, which breaks the downward-closure property.
pub fn generate_rules(
    frequent: &FrequentItemsets,
    min_conviction: f64,
) -> Result<Vec<AssociationRule>, MiningError> {
    let mut rules = Vec::new();
    let mut evaluated = 0usize;

    for itemset in frequent.itemsets.iter().filter(|itemset| itemset.len() >= 2) {
        let subset_support = |subset: &[usize]| {
            frequent
                .support_of(subset)
                .ok_or_else(|| MiningError::MissingSubsetSupport {
                    itemset: frequent.names(&itemset.columns),
                    subset: frequent.names(subset),
                })
        };

        for (antecedent, consequent) in Partitions::new(&itemset.columns)? {
            let antecedent_support = subset_support(&antecedent)?;
            let consequent_support = subset_support(&consequent)?;
            evaluated += 1;

            let metrics =
                RuleMetrics::compute(itemset.support, antecedent_support, consequent_support);
            if metrics.conviction < min_conviction {
                continue;
            }

            rules.push(AssociationRule {
                antecedent: frequent.names(&antecedent),
                consequent: frequent.names(&consequent),
                antecedent_support,
                consequent_support,
                support: metrics.support,
                confidence: metrics.confidence,
                lift: metrics.lift,
                leverage: metrics.leverage,
                conviction: metrics.conviction,
            });
        }
    }

    tracing::debug!(evaluated, retained = rules.len(), "generated candidate rules");
    Ok(rules)
}
