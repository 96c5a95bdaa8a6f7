//! basketforge: market basket analysis for retail transaction data
//!
//! Cleans raw retail exports with Polars, loads them into SQLite, mines
//! frequent itemsets and association rules per invoice basket, and exports
//! summary tables for BI dashboards.

pub mod apriori;
pub mod basket;
pub mod cli;
pub mod config;
pub mod data;
pub mod encoder;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod rules;
pub mod store;
pub mod viz;
pub mod workflow;

// Re-export public items for easier access
pub use apriori::{dynamic_min_support, mine_frequent_itemsets, FrequentItemsets, Itemset};
pub use basket::{extract_baskets, Basket};
pub use cli::{Args, Command, MineOptions};
pub use config::{AppConfig, MiningConfig};
pub use data::{clean_retail_data, read_cleaned_transactions, write_rules_csv, TransactionRecord};
pub use encoder::PresenceMatrix;
pub use error::{Exhausted, MiningError};
pub use filter::BusinessFilter;
pub use pipeline::{mine_rules, MiningOutcome, MiningReport};
pub use rules::{generate_rules, AssociationRule, RuleMetrics};
pub use store::Store;
pub use workflow::{MineSummary, PipelineSummary};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
