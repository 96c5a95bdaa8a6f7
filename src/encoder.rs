//! One-hot encoding of baskets into a boolean presence matrix

use std::collections::{BTreeSet, HashMap};

use ndarray::{Array2, ArrayView1};

use crate::basket::Basket;

/// Boolean basket-by-item matrix
#[derive(Debug, Clone, PartialEq)]
pub struct PresenceMatrix {
    /// Item universe, sorted; column `j` holds `items[j]`
    pub items: Vec<String>,
    /// Invoice id of each row
    pub invoices: Vec<String>,
    /// Cells `(basket, item)`, true when the item is in the basket
    pub cells: Array2<bool>,
}

impl PresenceMatrix {
    /// Encode baskets into a presence matrix.
    ///
    /// Returns `None` for an empty basket collection so callers can
    /// short-circuit instead of carrying a zero-row matrix forward.
    pub fn encode(baskets: Vec<Basket>) -> Option<Self> {
        if baskets.is_empty() {
            return None;
        }

        let universe: BTreeSet<&str> = baskets
            .iter()
            .flat_map(|basket| basket.items.iter().map(String::as_str))
            .collect();
        let items: Vec<String> = universe.into_iter().map(str::to_string).collect();
        let column_of: HashMap<&str, usize> = items
            .iter()
            .enumerate()
            .map(|(col, item)| (item.as_str(), col))
            .collect();

        let mut cells = Array2::from_elem((baskets.len(), items.len()), false);
        for (row, basket) in baskets.iter().enumerate() {
            for item in &basket.items {
                cells[[row, column_of[item.as_str()]]] = true;
            }
        }

        let invoices = baskets.into_iter().map(|basket| basket.invoice).collect();

        tracing::debug!(
            rows = cells.nrows(),
            columns = cells.ncols(),
            "encoded presence matrix"
        );

        Some(Self {
            items,
            invoices,
            cells,
        })
    }

    /// Number of baskets (rows)
    pub fn n_baskets(&self) -> usize {
        self.cells.nrows()
    }

    /// Size of the item universe (columns)
    pub fn n_items(&self) -> usize {
        self.cells.ncols()
    }

    /// Column index of an item, if it was observed
    pub fn column(&self, item: &str) -> Option<usize> {
        self.items
            .binary_search_by(|known| known.as_str().cmp(item))
            .ok()
    }

    /// Iterate basket rows one at a time
    pub fn rows(&self) -> impl Iterator<Item = ArrayView1<'_, bool>> {
        self.cells.outer_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basket::extract_baskets;
    use proptest::prelude::*;

    fn grocery_baskets() -> Vec<Basket> {
        extract_baskets(vec![
            ("1", "milk"),
            ("1", "bread"),
            ("2", "milk"),
            ("2", "bread"),
            ("2", "eggs"),
            ("3", "bread"),
            ("3", "eggs"),
        ])
        .unwrap()
    }

    #[test]
    fn test_encode_sorts_columns() {
        let matrix = PresenceMatrix::encode(grocery_baskets()).unwrap();

        assert_eq!(matrix.items, vec!["bread", "eggs", "milk"]);
        assert_eq!(matrix.invoices, vec!["1", "2", "3"]);
        assert_eq!(matrix.cells.shape(), &[3, 3]);
        assert_eq!(matrix.column("milk"), Some(2));
        assert_eq!(matrix.column("butter"), None);
    }

    #[test]
    fn test_encode_cells() {
        let matrix = PresenceMatrix::encode(grocery_baskets()).unwrap();
        let rows: Vec<Vec<bool>> = matrix.rows().map(|row| row.to_vec()).collect();

        assert_eq!(
            rows,
            vec![
                vec![true, false, true],
                vec![true, true, true],
                vec![true, true, false],
            ]
        );
    }

    #[test]
    fn test_encode_empty_signals_none() {
        assert!(PresenceMatrix::encode(Vec::new()).is_none());
    }

    proptest! {
        #[test]
        fn cell_is_set_iff_item_in_basket(
            raw in prop::collection::vec(prop::collection::btree_set("[a-f]", 2..5), 1..12)
        ) {
            let baskets: Vec<Basket> = raw
                .into_iter()
                .enumerate()
                .map(|(i, items)| Basket { invoice: format!("{i:03}"), items })
                .collect();
            let expected = baskets.clone();

            let matrix = PresenceMatrix::encode(baskets).unwrap();

            for (row, basket) in matrix.rows().zip(expected.iter()) {
                prop_assert_eq!(row.len(), matrix.n_items());
                for (col, item) in matrix.items.iter().enumerate() {
                    prop_assert_eq!(row[col], basket.contains(item));
                }
            }
        }
    }
}
