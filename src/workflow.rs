//! Stage orchestration shared by the subcommands
//!
//! Each stage resolves its paths from the CLI options first and the config
//! second, so `run` and the standalone subcommands write to the same places.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::cli::MineOptions;
use crate::config::AppConfig;
use crate::data;
use crate::pipeline::{mine_rules, MiningOutcome};
use crate::store::Store;

/// File name of the rules table in the BI export directory
pub const BI_RULES_FILE: &str = "pbi_rules.csv";

/// Result of a mining stage
#[derive(Debug, Clone, PartialEq)]
pub struct MineSummary {
    pub outcome: MiningOutcome,
    /// Where the rules were written, `None` for an empty run
    pub rules_path: Option<PathBuf>,
}

/// Result of a full clean, load, mine and export run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSummary {
    pub cleaned_rows: usize,
    pub loaded_rows: usize,
    pub mine: MineSummary,
    pub bi_dir: PathBuf,
}

/// Clean the raw export. Returns the number of rows kept.
pub fn clean(
    config: &AppConfig,
    input: Option<&Path>,
    output: Option<&Path>,
) -> crate::Result<usize> {
    let input = input.unwrap_or(&config.paths.raw_input);
    let output = output.unwrap_or(&config.paths.cleaned);
    data::clean_retail_data(input, output, config.cleaning.min_unit_price)
}

/// Recreate the schema and load the cleaned transactions
pub fn load(config: &AppConfig, input: Option<&Path>, db: Option<&Path>) -> crate::Result<usize> {
    let input = input.unwrap_or(&config.paths.cleaned);
    let db = db.unwrap_or(&config.database.path);

    let records = data::read_cleaned_transactions(input)?;
    let mut store = Store::open(db)?;
    store.setup_schema()?;
    store.load_transactions(&records)
}

/// Mine rules from the store and write them to the rules CSV.
///
/// An empty run deletes any rules file left at the output path by an
/// earlier run, so the path never holds rules from different data.
pub fn mine(config: &AppConfig, options: &MineOptions) -> crate::Result<MineSummary> {
    let db = options.db.as_deref().unwrap_or(&config.database.path);
    let output = options
        .output
        .clone()
        .unwrap_or_else(|| config.paths.rules_csv());

    let mut mining = config.mining.clone();
    if let Some(min_support) = options.min_support {
        mining.min_support_override = Some(min_support);
    }
    if let Some(max_len) = options.max_len {
        mining.max_itemset_len = Some(usize::from(max_len));
    }
    mining.validate()?;

    let pairs = Store::open(db)?.basket_pairs()?;
    tracing::info!(rows = pairs.len(), "fetched basket data");

    let outcome = mine_rules(pairs, &mining)?;
    let rules_path = match &outcome {
        MiningOutcome::Rules(report) => {
            data::write_rules_csv(&report.rules, &output)?;
            Some(output)
        }
        MiningOutcome::Empty(reason) => {
            remove_stale(&output)?;
            tracing::info!(%reason, "no rules written");
            None
        }
    };

    Ok(MineSummary {
        outcome,
        rules_path,
    })
}

/// Write the BI tables to `out_dir`.
///
/// `rules` is copied to [`BI_RULES_FILE`]; without it any rules table from
/// an earlier export is removed. Returns whether a rules table was exported.
pub fn export(
    config: &AppConfig,
    db: Option<&Path>,
    out_dir: Option<&Path>,
    rules: Option<&Path>,
) -> crate::Result<bool> {
    let db = db.unwrap_or(&config.database.path);
    let out_dir = out_dir.unwrap_or(&config.paths.processed_dir);
    let store = Store::open(db)?;

    data::write_transaction_summaries(
        &store.transaction_summaries()?,
        &out_dir.join("pbi_transactions.csv"),
    )?;
    data::write_customer_summaries(
        &store.customer_summaries()?,
        &out_dir.join("pbi_customers.csv"),
    )?;

    let target = out_dir.join(BI_RULES_FILE);
    match rules {
        Some(rules) => {
            std::fs::copy(rules, &target).with_context(|| {
                format!("failed to copy {} to {}", rules.display(), target.display())
            })?;
            tracing::info!(output = %target.display(), "exported association rules");
            Ok(true)
        }
        None => {
            remove_stale(&target)?;
            tracing::warn!("no association rules to export");
            Ok(false)
        }
    }
}

/// Rules file the standalone export picks up: the configured rules CSV, if
/// a previous `mine` wrote one
pub fn default_rules(config: &AppConfig) -> Option<PathBuf> {
    Some(config.paths.rules_csv()).filter(|path| path.exists())
}

/// Clean, load, mine and export, handing the rules just mined to the export
pub fn run_pipeline(config: &AppConfig, options: &MineOptions) -> crate::Result<PipelineSummary> {
    let db = options
        .db
        .clone()
        .unwrap_or_else(|| config.database.path.clone());

    let cleaned_rows = clean(config, None, None)?;
    let loaded_rows = load(config, None, Some(&db))?;
    let mined = mine(config, options)?;
    export(config, Some(&db), None, mined.rules_path.as_deref())?;

    Ok(PipelineSummary {
        cleaned_rows,
        loaded_rows,
        mine: mined,
        bi_dir: config.paths.processed_dir.clone(),
    })
}

fn remove_stale(path: &Path) -> crate::Result<()> {
    if path.exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("failed to remove {}", path.display()))?;
        tracing::info!(path = %path.display(), "removed stale rules file");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_export_without_rules_removes_old_table() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("retail.db");
        Store::open(&db).unwrap().setup_schema().unwrap();

        let target = dir.path().join(BI_RULES_FILE);
        std::fs::write(&target, "antecedents,consequents\nold,rule\n").unwrap();

        let config = AppConfig::default();
        let exported = export(&config, Some(&db), Some(dir.path()), None).unwrap();

        assert!(!exported);
        assert!(!target.exists());
        assert!(dir.path().join("pbi_transactions.csv").exists());
    }

    #[test]
    fn test_export_copies_given_rules() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("retail.db");
        Store::open(&db).unwrap().setup_schema().unwrap();

        let rules = dir.path().join("elsewhere").join("rules.csv");
        std::fs::create_dir_all(rules.parent().unwrap()).unwrap();
        std::fs::write(&rules, "antecedents,consequents\na,b\n").unwrap();

        let out_dir = dir.path().join("bi");
        let config = AppConfig::default();
        assert!(export(&config, Some(&db), Some(&out_dir), Some(&rules)).unwrap());
        assert_eq!(
            std::fs::read_to_string(out_dir.join(BI_RULES_FILE)).unwrap(),
            "antecedents,consequents\na,b\n"
        );
    }

    #[test]
    fn test_empty_mine_removes_old_rules() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("empty.db");
        Store::open(&db).unwrap().setup_schema().unwrap();

        let output = dir.path().join("rules.csv");
        std::fs::write(&output, "antecedents,consequents\nold,rule\n").unwrap();

        let options = MineOptions {
            db: Some(db),
            output: Some(output.clone()),
            ..MineOptions::default()
        };
        let summary = mine(&AppConfig::default(), &options).unwrap();

        assert!(summary.rules_path.is_none());
        assert!(!output.exists());
    }

    #[test]
    fn test_default_rules_requires_existing_file() {
        let dir = tempdir().unwrap();
        let mut config = AppConfig::default();
        config.paths.processed_dir = dir.path().to_path_buf();
        assert_eq!(default_rules(&config), None);

        std::fs::write(config.paths.rules_csv(), "antecedents\n").unwrap();
        assert_eq!(default_rules(&config), Some(config.paths.rules_csv()));
    }
}
