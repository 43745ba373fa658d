//! Gas metering.
//!
//! One [`GasMeter`] is seeded per transaction and shared by every program the
//! transaction runs. Gas only ever moves from `remaining` to `used`.

use std::time::Instant;
use thiserror::Error;
use voc_core::ProtocolParams;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GasError {
    #[error("Run limit exceeded: required {required}, remaining {remaining}")]
    RunLimitExceeded { required: u64, remaining: u64 },

    #[error("Gas calculation overflow or inconsistency")]
    GasCalculate,

    #[error("Gas {used} exceeds the credit bought by the fee ({budget})")]
    OverGasCredit { used: u64, budget: u64 },

    #[error("Validation deadline exceeded")]
    DeadlineExceeded,
}

pub type Result<T> = std::result::Result<T, GasError>;

/// Base gas costs for instructions.
pub struct GasCosts;

impl GasCosts {
    // Tier 1: stack shuffles, pushes, control flow
    pub const BASE: u64 = 1;

    // Tier 2: numeric and comparison
    pub const LOW: u64 = 2;

    // Tier 3: splicing and multiplicative math
    pub const SPLICE: u64 = 4;
    pub const MID: u64 = 8;

    // Tier 4: hashing and introspection that hashes
    pub const HASH: u64 = 64;
    pub const CHECK_OUTPUT: u64 = 16;
    pub const TX_SIG_HASH: u64 = 256;

    // Tier 5: signatures and nested execution
    pub const SIGNATURE: u64 = 1024;
    pub const PREDICATE: u64 = 256;

    /// Charged per item pushed onto a stack, on top of its length.
    pub const PUSH_OVERHEAD: u64 = 8;

    /// How many charges pass between deadline checks.
    pub const DEADLINE_INTERVAL: u64 = 64;
}

/// Tracks the gas budget of one transaction.
#[derive(Debug, Clone)]
pub struct GasMeter {
    budget: u64,
    run_limit: u64,
    remaining: u64,
    used: u64,
    storage_gas: u64,
    visit_cost: u64,
    entries_visited: u64,
    charges: u64,
    exhausted: bool,
    deadline: Option<Instant>,
}

impl GasMeter {
    /// A meter with a flat limit and no storage or visit cost.
    pub fn new(limit: u64) -> Self {
        Self {
            budget: limit,
            run_limit: limit,
            remaining: limit,
            used: 0,
            storage_gas: 0,
            visit_cost: 0,
            entries_visited: 0,
            charges: 0,
            exhausted: false,
            deadline: None,
        }
    }

    /// Seed a meter from a transaction's declared fee and encoded size.
    ///
    /// The fee buys `fee / vm_gas_rate` gas, capped at the protocol maximum.
    /// Execution may run up to the default credit even when the fee buys less,
    /// but [`finalize`](Self::finalize) still holds the total to what was paid.
    pub fn for_fee(
        fee: u64,
        tx_size: u64,
        params: &ProtocolParams,
        deadline: Option<Instant>,
    ) -> Result<Self> {
        let bought = fee
            .checked_div(params.vm_gas_rate)
            .ok_or(GasError::GasCalculate)?;
        let budget = bought.min(params.max_gas_amount);
        let run_limit = budget
            .max(params.default_gas_credit)
            .min(params.max_gas_amount);
        let storage_gas = tx_size
            .checked_mul(params.storage_gas_rate)
            .ok_or(GasError::GasCalculate)?;

        Ok(Self {
            budget,
            run_limit,
            remaining: run_limit,
            used: 0,
            storage_gas,
            visit_cost: params.entry_visit_gas,
            entries_visited: 0,
            charges: 0,
            exhausted: false,
            deadline,
        })
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Consume gas. On failure nothing is deducted and the meter is marked
    /// exhausted.
    pub fn charge(&mut self, amount: u64) -> Result<()> {
        if amount > self.remaining {
            self.exhausted = true;
            return Err(GasError::RunLimitExceeded {
                required: amount,
                remaining: self.remaining,
            });
        }
        self.remaining -= amount;
        self.used += amount;

        self.charges += 1;
        if self.charges % GasCosts::DEADLINE_INTERVAL == 0 {
            self.check_deadline()?;
        }
        Ok(())
    }

    /// Charge for visiting one entry of the graph.
    pub fn visit_entry(&mut self) -> Result<()> {
        self.check_deadline()?;
        self.charge(self.visit_cost)?;
        self.entries_visited += 1;
        Ok(())
    }

    pub fn check_deadline(&self) -> Result<()> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(GasError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Close the books. Returns the total gas (execution plus storage).
    ///
    /// Exempt transactions (coinbase) skip the fee-credit check.
    pub fn finalize(&self, exempt: bool) -> Result<u64> {
        let total = self
            .used
            .checked_add(self.storage_gas)
            .ok_or(GasError::GasCalculate)?;
        if self.used.checked_add(self.remaining) != Some(self.run_limit) {
            return Err(GasError::GasCalculate);
        }
        if !exempt && total > self.budget {
            return Err(GasError::OverGasCredit {
                used: total,
                budget: self.budget,
            });
        }
        Ok(total)
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn budget(&self) -> u64 {
        self.budget
    }

    pub fn run_limit(&self) -> u64 {
        self.run_limit
    }

    pub fn storage_gas(&self) -> u64 {
        self.storage_gas
    }

    pub fn entries_visited(&self) -> u64 {
        self.entries_visited
    }

    /// Whether a charge has ever been refused.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_fee_uses_credit_floor() {
        let params = ProtocolParams::default();
        let meter = GasMeter::for_fee(200 * 100, 50, &params, None).unwrap();
        assert_eq!(meter.budget(), 100);
        assert_eq!(meter.run_limit(), params.default_gas_credit);
        assert_eq!(meter.storage_gas(), 50);
    }

    #[test]
    fn test_for_fee_caps_at_max_gas() {
        let params = ProtocolParams::default();
        let meter = GasMeter::for_fee(u64::MAX, 10, &params, None).unwrap();
        assert_eq!(meter.budget(), params.max_gas_amount);
        assert_eq!(meter.run_limit(), params.max_gas_amount);
    }

    #[test]
    fn test_for_fee_zero_rate_is_calculation_error() {
        let params = ProtocolParams {
            vm_gas_rate: 0,
            ..ProtocolParams::default()
        };
        assert_eq!(
            GasMeter::for_fee(1, 1, &params, None).unwrap_err(),
            GasError::GasCalculate
        );
    }

    #[test]
    fn test_charge_refusal_deducts_nothing() {
        let mut meter = GasMeter::new(10);
        meter.charge(7).unwrap();
        assert_eq!(
            meter.charge(4),
            Err(GasError::RunLimitExceeded {
                required: 4,
                remaining: 3
            })
        );
        assert_eq!(meter.remaining(), 3);
        assert_eq!(meter.used(), 7);
        assert!(meter.is_exhausted());
    }

    #[test]
    fn test_finalize_checks_credit() {
        let params = ProtocolParams::default();
        let mut meter = GasMeter::for_fee(200 * 100, 40, &params, None).unwrap();
        meter.charge(60).unwrap();
        assert_eq!(meter.finalize(false), Ok(100));

        meter.charge(1).unwrap();
        assert_eq!(
            meter.finalize(false),
            Err(GasError::OverGasCredit {
                used: 101,
                budget: 100
            })
        );
        assert_eq!(meter.finalize(true), Ok(101));
    }

    #[test]
    fn test_visit_entry_counts() {
        let params = ProtocolParams::default();
        let mut meter = GasMeter::for_fee(0, 0, &params, None).unwrap();
        meter.visit_entry().unwrap();
        meter.visit_entry().unwrap();
        assert_eq!(meter.entries_visited(), 2);
        assert_eq!(meter.used(), 2 * params.entry_visit_gas);
    }

    #[test]
    fn test_expired_deadline_cancels() {
        let past = Instant::now();
        let mut meter = GasMeter::new(1_000).with_deadline(past);
        assert_eq!(meter.visit_entry(), Err(GasError::DeadlineExceeded));

        let mut meter = GasMeter::new(1_000).with_deadline(past);
        let outcome = (0..GasCosts::DEADLINE_INTERVAL).try_for_each(|_| meter.charge(1));
        assert_eq!(outcome, Err(GasError::DeadlineExceeded));
    }
}
