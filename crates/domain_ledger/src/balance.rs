//! Running balance ledger
//!
//! A single balance record tracks the station's cash position. The record
//! is a view over live invoice state, not an independently-true source:
//! `planned` is derived from the active simulation's still-pending
//! invoices and `balance_after` from `available_funds - planned`, so
//! every read recomputes both and persists the refreshed values as a
//! cache-fill. Settlement moves `available_funds` exclusively through
//! [`BalanceLedger::apply_delta`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::Money;

use crate::invoice::InvoiceStore;
use crate::simulation::{PaymentSimulation, SimulationStore};

/// The singleton balance record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Operator-reconciled book balance
    pub current_balance: Money,
    /// Funds available for settlement
    pub available_funds: Money,
    /// Funds earmarked by the active simulation's still-pending invoices
    pub planned: Money,
    /// `available_funds - planned`
    pub balance_after: Money,
    /// Last time any field changed
    pub updated_at: DateTime<Utc>,
}

impl Balance {
    fn zeroed() -> Self {
        Self {
            current_balance: Money::ZERO,
            available_funds: Money::ZERO,
            planned: Money::ZERO,
            balance_after: Money::ZERO,
            updated_at: Utc::now(),
        }
    }
}

/// Recomputes `planned` from the active simulation
///
/// Only invoices that still exist and are still pending count; a
/// simulation whose invoices have since been settled contributes nothing.
pub fn compute_planned(
    simulation: Option<&PaymentSimulation>,
    invoices: &InvoiceStore,
) -> Money {
    match simulation {
        Some(sim) => sim
            .invoice_ids
            .iter()
            .filter_map(|id| invoices.find(*id))
            .filter(|inv| inv.is_pending())
            .map(|inv| inv.amount)
            .sum(),
        None => Money::ZERO,
    }
}

/// Owns the singleton balance record
///
/// The record is initialized lazily with zeroed fields on first access.
/// Callers hold the ledger behind the same lock as the rest of the
/// back office; there is no interior mutability here.
#[derive(Debug, Default)]
pub struct BalanceLedger {
    record: Option<Balance>,
}

impl BalanceLedger {
    /// Creates an empty ledger; the record materializes on first access
    pub fn new() -> Self {
        Self::default()
    }

    fn record_mut(&mut self) -> &mut Balance {
        self.record.get_or_insert_with(Balance::zeroed)
    }

    /// Reads the balance, refreshing the derived fields
    ///
    /// Recomputes `planned` from the active simulation, persists it if it
    /// drifted, recomputes `balance_after`, and returns the refreshed
    /// record.
    pub fn get(&mut self, simulations: &SimulationStore, invoices: &InvoiceStore) -> &Balance {
        let planned = compute_planned(simulations.latest(), invoices);
        let record = self.record_mut();
        if record.planned != planned {
            record.planned = planned;
            record.updated_at = Utc::now();
        }
        record.balance_after = record.available_funds - record.planned;
        record
    }

    /// Direct operator override, e.g. reconciling against a bank statement
    ///
    /// Recomputes `balance_after` from the (possibly new) available funds
    /// and the existing `planned`. Calling with neither field is accepted
    /// and simply refreshes `balance_after`.
    pub fn set_manual(
        &mut self,
        current_balance: Option<Decimal>,
        available_funds: Option<Decimal>,
    ) -> &Balance {
        let record = self.record_mut();
        if let Some(raw) = current_balance {
            record.current_balance = Money::new(raw);
        }
        if let Some(raw) = available_funds {
            record.available_funds = Money::new(raw);
        }
        record.balance_after = record.available_funds - record.planned;
        record.updated_at = Utc::now();
        record
    }

    /// Moves `available_funds` by `delta` and recomputes `balance_after`
    ///
    /// This is the only path by which settlement affects the ledger.
    pub(crate) fn apply_delta(&mut self, delta: Money) -> &Balance {
        let record = self.record_mut();
        record.available_funds += delta;
        record.balance_after = record.available_funds - record.planned;
        record.updated_at = Utc::now();

        tracing::info!(
            delta = %delta,
            available_funds = %record.available_funds,
            "balance delta applied"
        );
        record
    }

    /// Current available funds without refreshing derived fields
    ///
    /// Used by settlement to snapshot `balance_before`; reads zero when
    /// the record has not materialized yet.
    pub fn available_funds(&self) -> Money {
        self.record
            .as_ref()
            .map(|r| r.available_funds)
            .unwrap_or(Money::ZERO)
    }
}
