//! Replay of an operations file against a set of containers
//!
//! Loads the containers, feeds every operation through a [`Treasury`], and
//! writes the resulting balances (and optionally the two logs) as CSV.
//!
//! Rejected operations are logged with `warn!` and counted; they never stop
//! the replay. Only problems with the files themselves are fatal.

use crate::cli::CliArgs;
use crate::config::EngineConfig;
use crate::core::fee::CURRENCY_DECIMALS;
use crate::core::{InMemoryRegistry, Treasury};
use crate::io::{
    read_containers, write_balances_csv, write_reconciliations_csv, write_transfers_csv,
    Operation, OperationReader,
};
use crate::types::{EngineError, TransferId};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

/// Counts of applied and rejected operations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub applied: usize,
    pub rejected: usize,
}

/// A treasury plus the `ref` labels operations use to name transfers
pub struct Replay {
    treasury: Treasury,
    labels: HashMap<String, TransferId>,
}

impl Replay {
    pub fn new(treasury: Treasury) -> Self {
        Replay {
            treasury,
            labels: HashMap::new(),
        }
    }

    pub fn treasury(&self) -> &Treasury {
        &self.treasury
    }

    /// Apply one operation
    ///
    /// # Errors
    ///
    /// Any engine error, plus `ParseError` when a transfer reuses a label or a
    /// resolution names a label that was never assigned.
    pub fn apply(&mut self, operation: Operation) -> Result<(), EngineError> {
        match operation {
            Operation::Transfer { label, request } => {
                if let Some(label) = &label {
                    if self.labels.contains_key(label) {
                        return Err(EngineError::parse_error(
                            None,
                            &format!("transfer ref '{}' already used", label),
                        ));
                    }
                }

                let transfer = self.treasury.create_transfer(request)?;
                if let Some(label) = label {
                    self.labels.insert(label, transfer.id);
                }
                Ok(())
            }
            Operation::Resolve { label, resolution } => {
                let id = self.labels.get(&label).copied().ok_or_else(|| {
                    EngineError::parse_error(None, &format!("unknown transfer ref '{}'", label))
                })?;
                self.treasury.resolve_pending(id, resolution)?;
                Ok(())
            }
            Operation::Reconcile {
                container,
                actual,
                notes,
            } => {
                self.treasury.reconcile(&container, actual, notes)?;
                Ok(())
            }
        }
    }

    /// Labels keyed by transfer id, for the transfers CSV
    pub fn labels_by_transfer(&self) -> HashMap<TransferId, String> {
        self.labels
            .iter()
            .map(|(label, id)| (*id, label.clone()))
            .collect()
    }
}

/// Build a replay over the containers in `containers_path`
///
/// # Errors
///
/// Fails if the file cannot be read, a row is invalid, or a container is
/// listed twice.
pub fn load(containers_path: &Path, config: EngineConfig) -> Result<Replay, EngineError> {
    let registry = Arc::new(InMemoryRegistry::new());
    for container in read_containers(containers_path)? {
        registry.register(container)?;
    }
    tracing::info!(containers = registry.len(), "containers loaded");

    Ok(Replay::new(Treasury::new(registry, config)))
}

/// Run a full replay as described by the command line
///
/// Balances are written to `output`; the transfer and reconciliation logs go
/// to the files named by `--transfers-out` / `--reconciliations-out`.
pub fn run(args: &CliArgs, output: &mut dyn Write) -> Result<ReplaySummary, EngineError> {
    let config = args.to_engine_config();
    let decimals = config.fee_precision.max(CURRENCY_DECIMALS);
    let mut replay = load(&args.containers, config)?;
    let mut summary = ReplaySummary::default();

    for row in OperationReader::new(&args.operations)? {
        let outcome = match row {
            Ok(row) => replay
                .apply(row.operation)
                .map_err(|e| (Some(row.line), e)),
            // Parse errors already name their line
            Err(e) => Err((None, e)),
        };

        match outcome {
            Ok(()) => summary.applied += 1,
            Err((line, e)) => {
                tracing::warn!(line = ?line, code = e.code(), "operation rejected: {}", e);
                summary.rejected += 1;
            }
        }
    }

    let treasury = replay.treasury();
    write_balances_csv(&treasury.containers(), decimals, output)?;

    if let Some(path) = &args.transfers_out {
        let mut file = create_output(path)?;
        write_transfers_csv(
            &treasury.transfers(),
            &replay.labels_by_transfer(),
            decimals,
            &mut file,
        )?;
    }

    if let Some(path) = &args.reconciliations_out {
        let mut file = create_output(path)?;
        write_reconciliations_csv(&treasury.reconciliations(), decimals, &mut file)?;
    }

    tracing::info!(
        applied = summary.applied,
        rejected = summary.rejected,
        "replay finished"
    );
    Ok(summary)
}

fn create_output(path: &Path) -> Result<BufWriter<File>, EngineError> {
    Ok(BufWriter::new(File::create(path)?))
}
