//! Level-wise (Apriori) frequent itemset mining over a presence matrix

use std::collections::{HashMap, HashSet};

use crate::encoder::PresenceMatrix;
use crate::error::MiningError;

/// A frequent itemset as sorted column indices plus its support
#[derive(Debug, Clone, PartialEq)]
pub struct Itemset {
    pub columns: Vec<usize>,
    pub support: f64,
}

impl Itemset {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// All itemsets meeting the minimum support, with their item names
#[derive(Debug, Clone, PartialEq)]
pub struct FrequentItemsets {
    /// Item universe copied from the matrix
    pub items: Vec<String>,
    /// Basket count the supports are relative to
    pub n_baskets: usize,
    /// Ordered by size, then lexicographically by column index
    pub itemsets: Vec<Itemset>,
    index: HashMap<Vec<usize>, usize>,
}

impl FrequentItemsets {
    /// Index `itemsets` by their columns for support lookups
    pub(crate) fn from_itemsets(
        items: Vec<String>,
        n_baskets: usize,
        itemsets: Vec<Itemset>,
    ) -> Self {
        let index = itemsets
            .iter()
            .enumerate()
            .map(|(position, itemset)| (itemset.columns.clone(), position))
            .collect();
        Self {
            items,
            n_baskets,
            itemsets,
            index,
        }
    }

    pub fn len(&self) -> usize {
        self.itemsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.itemsets.is_empty()
    }

    /// Support of a frequent itemset given as sorted column indices
    pub fn support_of(&self, columns: &[usize]) -> Option<f64> {
        self.index
            .get(columns)
            .map(|&position| self.itemsets[position].support)
    }

    /// Item names of an itemset's columns
    pub fn names(&self, columns: &[usize]) -> Vec<String> {
        columns.iter().map(|&col| self.items[col].clone()).collect()
    }

    /// Size of the largest frequent itemset
    pub fn max_len(&self) -> usize {
        self.itemsets.iter().map(Itemset::len).max().unwrap_or(0)
    }
}

/// Minimum support for a dataset of `n_baskets`: enough support to cover
/// `min_basket_count` baskets, but never below `support_floor`.
pub fn dynamic_min_support(n_baskets: usize, support_floor: f64, min_basket_count: f64) -> f64 {
    if n_baskets == 0 {
        return support_floor;
    }
    support_floor.max(min_basket_count / n_baskets as f64)
}

/// Enumerate every itemset whose support is at least `min_support`.
///
/// Candidates of size k+1 are built only from frequent k-itemsets sharing
/// their first k-1 columns, and discarded if any k-subset is infrequent.
/// Support is counted one matrix row at a time for the current level.
/// `max_len` stops the search after itemsets of that size.
///
/// # Errors
/// `min_support` must be positive and finite; a value above 1 just yields
/// an empty result.
pub fn mine_frequent_itemsets(
    matrix: &PresenceMatrix,
    min_support: f64,
    max_len: Option<usize>,
) -> Result<FrequentItemsets, MiningError> {
    if !min_support.is_finite() || min_support <= 0.0 {
        return Err(MiningError::InvalidThreshold {
            name: "min_support",
            value: min_support,
            expected: "a positive fraction",
        });
    }

    let n_baskets = matrix.n_baskets();
    let mut itemsets: Vec<Itemset> = Vec::new();
    let mut candidates: Vec<Vec<usize>> = (0..matrix.n_items()).map(|col| vec![col]).collect();
    let mut level = 1;

    while !candidates.is_empty() && max_len.map_or(true, |max| level <= max) {
        let counts = count_support(matrix, &candidates);
        let frequent: Vec<Itemset> = candidates
            .into_iter()
            .zip(counts)
            .map(|(columns, count)| Itemset {
                columns,
                support: count as f64 / n_baskets as f64,
            })
            .filter(|itemset| itemset.support >= min_support)
            .collect();

        tracing::debug!(level, frequent = frequent.len(), "apriori level complete");

        if frequent.is_empty() {
            break;
        }
        candidates = next_candidates(&frequent);
        itemsets.extend(frequent);
        level += 1;
    }

    Ok(FrequentItemsets::from_itemsets(
        matrix.items.clone(),
        n_baskets,
        itemsets,
    ))
}

fn count_support(matrix: &PresenceMatrix, candidates: &[Vec<usize>]) -> Vec<usize> {
    let mut counts = vec![0usize; candidates.len()];
    for row in matrix.rows() {
        for (count, candidate) in counts.iter_mut().zip(candidates) {
            if candidate.iter().all(|&col| row[col]) {
                *count += 1;
            }
        }
    }
    counts
}

/// Join frequent k-itemsets on a shared (k-1)-prefix and prune by subsets.
/// Input is sorted lexicographically, so each prefix group is contiguous.
fn next_candidates(frequent: &[Itemset]) -> Vec<Vec<usize>> {
    let known: HashSet<&[usize]> = frequent.iter().map(|i| i.columns.as_slice()).collect();
    let mut candidates = Vec::new();

    for (i, left) in frequent.iter().enumerate() {
        let prefix = &left.columns[..left.len() - 1];
        for right in &frequent[i + 1..] {
            if &right.columns[..right.len() - 1] != prefix {
                break;
            }
            let mut candidate = left.columns.clone();
            candidate.push(right.columns[right.len() - 1]);

            if all_subsets_frequent(&candidate, &known) {
                candidates.push(candidate);
            }
        }
    }

    candidates
}

fn all_subsets_frequent(candidate: &[usize], known: &HashSet<&[usize]>) -> bool {
    // The two subsets that drop one of the last two columns are the join inputs
    (0..candidate.len().saturating_sub(2)).all(|skip| {
        let subset: Vec<usize> = candidate
            .iter()
            .enumerate()
            .filter(|&(position, _)| position != skip)
            .map(|(_, &col)| col)
            .collect();
        known.contains(subset.as_slice())
    })
}
