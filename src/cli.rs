//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Market basket analysis: clean retail data, load it, mine association rules
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// YAML configuration file; built-in defaults are used when omitted
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Clean the raw retail export into the transactions CSV
    Clean {
        /// Raw Online Retail II CSV
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Cleaned CSV destination
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Recreate the database schema and load the cleaned transactions
    Load {
        /// Cleaned transactions CSV
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Mine association rules from the loaded transactions
    Mine {
        #[command(flatten)]
        options: MineOptions,
    },
    /// Export transaction, customer and rule tables for BI dashboards
    Export {
        /// SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
        /// Directory for the exported CSV files
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Rules CSV to publish; defaults to the configured rules file
        #[arg(long)]
        rules: Option<PathBuf>,
    },
    /// Run clean, load, mine and export in sequence
    Run {
        #[command(flatten)]
        options: MineOptions,
    },
}

#[derive(clap::Args, Debug, Clone, Default, PartialEq)]
pub struct MineOptions {
    /// SQLite database file
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Rules CSV destination
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Fixed minimum support instead of max(0.01, 50 / baskets)
    #[arg(long, value_parser = parse_fraction)]
    pub min_support: Option<f64>,

    /// Largest itemset size to search
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub max_len: Option<u16>,

    /// Also draw SVG charts of the rules to this path
    #[arg(long)]
    pub chart: Option<PathBuf>,
}

/// Parse a fraction in (0, 1]
pub fn parse_fraction(value: &str) -> Result<f64, String> {
    let parsed: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid number: {value}"))?;
    if parsed.is_finite() && parsed > 0.0 && parsed <= 1.0 {
        Ok(parsed)
    } else {
        Err(format!("{value} is not a fraction in (0, 1]"))
    }
}

impl Args {
    /// tracing filter directive implied by the verbosity flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "basketforge=debug"
        } else {
            "basketforge=info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fraction() {
        assert_eq!(parse_fraction("0.05"), Ok(0.05));
        assert_eq!(parse_fraction(" 1 "), Ok(1.0));
        assert!(parse_fraction("0").is_err());
        assert!(parse_fraction("1.5").is_err());
        assert!(parse_fraction("NaN").is_err());
        assert!(parse_fraction("half").is_err());
    }

    #[test]
    fn test_parse_mine_command() {
        let args = Args::try_parse_from([
            "basketforge",
            "mine",
            "--min-support",
            "0.5",
            "--max-len",
            "3",
            "-v",
        ])
        .unwrap();

        assert!(args.verbose);
        assert_eq!(args.log_level(), "basketforge=debug");
        let Command::Mine { options } = args.command else {
            panic!("expected mine");
        };
        assert_eq!(options.min_support, Some(0.5));
        assert_eq!(options.max_len, Some(3));
        assert_eq!(options.chart, None);
    }

    #[test]
    fn test_global_config_flag() {
        let args =
            Args::try_parse_from(["basketforge", "export", "--config", "pipeline.yaml"]).unwrap();

        assert_eq!(args.config, Some(PathBuf::from("pipeline.yaml")));
        assert_eq!(
            args.command,
            Command::Export {
                db: None,
                out_dir: None,
                rules: None
            }
        );
    }

    #[test]
    fn test_export_rules_flag() {
        let args =
            Args::try_parse_from(["basketforge", "export", "--rules", "out/custom.csv"]).unwrap();

        let Command::Export { rules, .. } = args.command else {
            panic!("expected export");
        };
        assert_eq!(rules, Some(PathBuf::from("out/custom.csv")));
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(Args::try_parse_from(["basketforge", "mine", "--min-support", "2"]).is_err());
        assert!(Args::try_parse_from(["basketforge", "mine", "--max-len", "0"]).is_err());
        assert!(Args::try_parse_from(["basketforge"]).is_err());
    }
}
