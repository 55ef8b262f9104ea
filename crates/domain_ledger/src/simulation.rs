//! Payment simulations
//!
//! A simulation is a disposable, non-committing grouping of pending
//! invoices used to preview the effect of a future payment. It never
//! mutates invoice status; that is the property separating it from
//! settlement. Multiple simulations may coexist; the store keeps them in
//! creation order and the *last created* one is the active simulation
//! that feeds the balance ledger's `planned` figure.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{InvoiceId, Money, SimulationId};

use crate::error::{LedgerError, LedgerResult};
use crate::invoice::InvoiceStore;

/// A non-committing preview of paying a set of pending invoices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSimulation {
    /// Unique identifier
    pub id: SimulationId,
    /// The hypothetical payment date
    pub simulation_date: NaiveDate,
    /// The previewed invoices
    pub invoice_ids: Vec<InvoiceId>,
    /// Human summary of the previewed invoice numbers; informational
    /// only, never authoritative
    pub description: String,
    /// Sum of the previewed amounts at creation time; informational only
    pub total: Money,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

/// Owns the simulation collection
///
/// Simulations are held in creation order. The active simulation is the
/// last one created that still exists. That is a named invariant, not an
/// incidental query ordering.
#[derive(Debug, Default)]
pub struct SimulationStore {
    simulations: Vec<PaymentSimulation>,
}

impl SimulationStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a simulation over the given pending invoices
    ///
    /// Invoice status is not touched.
    ///
    /// # Errors
    ///
    /// `Validation` if the id list is empty, contains duplicates, or
    /// references an invoice that is missing or not pending
    pub fn create(
        &mut self,
        simulation_date: NaiveDate,
        invoice_ids: Vec<InvoiceId>,
        invoices: &InvoiceStore,
    ) -> LedgerResult<&PaymentSimulation> {
        if invoice_ids.is_empty() {
            return Err(LedgerError::validation(
                "a simulation requires at least one invoice",
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for id in &invoice_ids {
            if !seen.insert(*id) {
                return Err(LedgerError::validation(format!(
                    "invoice {id} appears more than once in the simulation"
                )));
            }
        }

        let mut numbers = Vec::with_capacity(invoice_ids.len());
        let mut total = Money::ZERO;
        for id in &invoice_ids {
            let invoice = invoices.find(*id).ok_or_else(|| {
                LedgerError::validation(format!("invoice {id} does not exist"))
            })?;
            if !invoice.is_pending() {
                return Err(LedgerError::validation(format!(
                    "invoice {} is not pending",
                    invoice.number
                )));
            }
            numbers.push(invoice.number.clone());
            total += invoice.amount;
        }

        let simulation = PaymentSimulation {
            id: SimulationId::new(),
            simulation_date,
            description: describe(&numbers),
            total,
            invoice_ids,
            created_at: Utc::now(),
        };

        self.simulations.push(simulation);
        Ok(self.simulations.last().unwrap())
    }

    /// Deletes a simulation
    ///
    /// No side effects beyond removing the record; the previewed
    /// invoices were never touched.
    pub fn delete(&mut self, id: SimulationId) -> LedgerResult<()> {
        let position = self
            .simulations
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| LedgerError::not_found("simulation", id))?;
        self.simulations.remove(position);
        Ok(())
    }

    /// Deletes simulations older than the threshold, returning how many
    /// were removed. Intended to run periodically (the sweep uses 24h).
    pub fn purge_stale(&mut self, older_than: Duration) -> usize {
        let cutoff = Utc::now() - older_than;
        let before = self.simulations.len();
        self.simulations.retain(|s| s.created_at >= cutoff);
        before - self.simulations.len()
    }

    /// All simulations in creation order
    pub fn list(&self) -> &[PaymentSimulation] {
        &self.simulations
    }

    /// The active simulation: latest by creation order, if any
    pub fn latest(&self) -> Option<&PaymentSimulation> {
        self.simulations.last()
    }

    /// Gets a simulation by id
    pub fn get(&self, id: SimulationId) -> LedgerResult<&PaymentSimulation> {
        self.simulations
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| LedgerError::not_found("simulation", id))
    }

    /// Number of simulations held
    pub fn len(&self) -> usize {
        self.simulations.len()
    }

    /// Returns true if no simulations exist
    pub fn is_empty(&self) -> bool {
        self.simulations.is_empty()
    }
}

fn describe(numbers: &[String]) -> String {
    let noun = if numbers.len() == 1 { "invoice" } else { "invoices" };
    format!("{} {}: {}", numbers.len(), noun, numbers.join(", "))
}
