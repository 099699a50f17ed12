//! Engine configuration
//!
//! Tunables shared by the transfer and reconciliation engines. Invalid values
//! fall back to the defaults with a warning instead of failing start-up.

use crate::core::fee::CURRENCY_DECIMALS;
use rust_decimal::Decimal;

/// Largest scale a `Decimal` can carry
const MAX_DECIMAL_SCALE: u32 = 28;

#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Differences smaller than this are treated as already reconciled
    pub reconciliation_epsilon: Decimal,
    /// Decimal places fees are rounded to
    pub fee_precision: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // 0.01, one minor unit of a two-decimal currency
            reconciliation_epsilon: Decimal::new(1, 2),
            fee_precision: CURRENCY_DECIMALS,
        }
    }
}

impl EngineConfig {
    /// Create a config, replacing invalid values by their defaults
    pub fn new(reconciliation_epsilon: Decimal, fee_precision: u32) -> Self {
        let default = Self::default();

        let reconciliation_epsilon = if reconciliation_epsilon < Decimal::ZERO {
            tracing::warn!(
                "Invalid reconciliation_epsilon ({}), using default ({})",
                reconciliation_epsilon,
                default.reconciliation_epsilon
            );
            default.reconciliation_epsilon
        } else {
            reconciliation_epsilon
        };

        let fee_precision = if fee_precision > MAX_DECIMAL_SCALE {
            tracing::warn!(
                "Invalid fee_precision ({}), using default ({})",
                fee_precision,
                default.fee_precision
            );
            default.fee_precision
        } else {
            fee_precision
        };

        Self {
            reconciliation_epsilon,
            fee_precision,
        }
    }
}
