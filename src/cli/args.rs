use crate::config::EngineConfig;
use clap::Parser;
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Replay transfers and reconciliations against a set of money containers
#[derive(Parser, Debug)]
#[command(name = "treasury-engine")]
#[command(
    about = "Replay transfers and reconciliations against a set of money containers",
    long_about = None
)]
pub struct CliArgs {
    /// CSV file with the opening containers (kind,id,name,balance)
    #[arg(value_name = "CONTAINERS", help = "Path to the containers CSV file")]
    pub containers: PathBuf,

    /// CSV file with the operations to replay
    #[arg(value_name = "OPERATIONS", help = "Path to the operations CSV file")]
    pub operations: PathBuf,

    /// Reconciliation tolerance
    #[arg(
        long = "epsilon",
        value_name = "AMOUNT",
        help = "Differences below this are treated as already reconciled (default: 0.01)"
    )]
    pub epsilon: Option<Decimal>,

    /// Decimal places fees are rounded to
    #[arg(
        long = "fee-precision",
        value_name = "PLACES",
        help = "Decimal places fees are rounded to (default: 2, max: 28)"
    )]
    pub fee_precision: Option<u32>,

    /// Log level used when RUST_LOG is not set
    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        default_value = "warn",
        help = "Log level: error, warn, info, debug or trace (RUST_LOG takes precedence)"
    )]
    pub log_level: String,

    /// Where to write the transfer log
    #[arg(long = "transfers-out", value_name = "FILE")]
    pub transfers_out: Option<PathBuf>,

    /// Where to write the reconciliation log
    #[arg(long = "reconciliations-out", value_name = "FILE")]
    pub reconciliations_out: Option<PathBuf>,
}

impl CliArgs {
    /// Create an EngineConfig from CLI arguments
    ///
    /// Missing options take their defaults; invalid ones fall back to the
    /// defaults with a warning (see [`EngineConfig::new`]).
    pub fn to_engine_config(&self) -> EngineConfig {
        if self.epsilon.is_some() || self.fee_precision.is_some() {
            let default = EngineConfig::default();
            EngineConfig::new(
                self.epsilon.unwrap_or(default.reconciliation_epsilon),
                self.fee_precision.unwrap_or(default.fee_precision),
            )
        } else {
            EngineConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_positional_paths() {
        let parsed = CliArgs::try_parse_from(["program", "containers.csv", "ops.csv"]).unwrap();
        assert_eq!(parsed.containers, PathBuf::from("containers.csv"));
        assert_eq!(parsed.operations, PathBuf::from("ops.csv"));
        assert_eq!(parsed.log_level, "warn");
        assert_eq!(parsed.transfers_out, None);
        assert_eq!(parsed.reconciliations_out, None);
    }

    #[test]
    fn test_output_options() {
        let parsed = CliArgs::try_parse_from([
            "program",
            "--transfers-out",
            "transfers.csv",
            "--reconciliations-out",
            "recs.csv",
            "--log-level",
            "debug",
            "containers.csv",
            "ops.csv",
        ])
        .unwrap();

        assert_eq!(parsed.transfers_out, Some(PathBuf::from("transfers.csv")));
        assert_eq!(parsed.reconciliations_out, Some(PathBuf::from("recs.csv")));
        assert_eq!(parsed.log_level, "debug");
    }

    #[rstest]
    #[case::all_defaults(&["program", "c.csv", "o.csv"], Decimal::new(1, 2), 2)]
    #[case::custom_epsilon(&["program", "--epsilon", "0.5", "c.csv", "o.csv"], Decimal::new(5, 1), 2)]
    #[case::custom_precision(&["program", "--fee-precision", "4", "c.csv", "o.csv"], Decimal::new(1, 2), 4)]
    #[case::all_custom(
        &["program", "--epsilon", "0", "--fee-precision", "0", "c.csv", "o.csv"],
        Decimal::ZERO,
        0
    )]
    fn test_engine_config_conversion(
        #[case] args: &[&str],
        #[case] expected_epsilon: Decimal,
        #[case] expected_precision: u32,
    ) {
        let config = CliArgs::try_parse_from(args).unwrap().to_engine_config();

        assert_eq!(config.reconciliation_epsilon, expected_epsilon);
        assert_eq!(config.fee_precision, expected_precision);
    }

    // Out-of-range values fall back to defaults
    #[rstest]
    #[case::negative_epsilon(&["program", "--epsilon=-1", "c.csv", "o.csv"], Decimal::new(1, 2), 2)]
    #[case::precision_too_large(&["program", "--fee-precision", "40", "c.csv", "o.csv"], Decimal::new(1, 2), 2)]
    fn test_engine_config_fallback(
        #[case] args: &[&str],
        #[case] expected_epsilon: Decimal,
        #[case] expected_precision: u32,
    ) {
        let config = CliArgs::try_parse_from(args).unwrap().to_engine_config();

        assert_eq!(config.reconciliation_epsilon, expected_epsilon);
        assert_eq!(config.fee_precision, expected_precision);
    }

    #[rstest]
    #[case::missing_both(&["program"])]
    #[case::missing_operations(&["program", "c.csv"])]
    #[case::bad_epsilon(&["program", "--epsilon", "tiny", "c.csv", "o.csv"])]
    #[case::bad_precision(&["program", "--fee-precision", "-2", "c.csv", "o.csv"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        assert!(CliArgs::try_parse_from(args).is_err());
    }
}
