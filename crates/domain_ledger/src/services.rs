//! Back-office facade
//!
//! [`BackOffice`] owns every aggregate: fuel invoices and batches, the
//! vendor ledger, the balance record, simulations, and the correction
//! log. A caller needs exactly one value (and, in a concurrent setting,
//! one lock around it) to run the whole back office. Methods return
//! owned copies so results outlive any internal borrow.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use uuid::Uuid;

use core_kernel::{BatchId, InvoiceId, Money, SimulationId};

use crate::balance::{Balance, BalanceLedger};
use crate::correction::{AuditEntity, Correction, CorrectionLog};
use crate::error::LedgerResult;
use crate::invoice::{Invoice, InvoiceEdit, InvoiceStatus, InvoiceStore, NewInvoice};
use crate::settlement::{
    BatchAmendment, ClearingPolicy, PaymentBatch, PaymentMethod, RevertOutcome, SettlementEngine,
};
use crate::simulation::{PaymentSimulation, SimulationStore};
use crate::vendor::VendorLedger;

/// Hours a payment simulation stays before the periodic sweep removes it
pub const SIMULATION_RETENTION_HOURS: i64 = 24;

/// The sweep threshold as a duration
pub fn simulation_retention() -> Duration {
    Duration::hours(SIMULATION_RETENTION_HOURS)
}

/// Single entry point to the station's invoice and payment ledger
#[derive(Debug)]
pub struct BackOffice {
    fuel_invoices: InvoiceStore,
    fuel_engine: SettlementEngine,
    vendor: VendorLedger,
    balance: BalanceLedger,
    simulations: SimulationStore,
    corrections: CorrectionLog,
}

impl BackOffice {
    pub fn new() -> Self {
        Self {
            fuel_invoices: InvoiceStore::new(AuditEntity::FuelInvoice),
            fuel_engine: SettlementEngine::new(
                ClearingPolicy::Immediate,
                AuditEntity::FuelBatch,
            ),
            vendor: VendorLedger::new(),
            balance: BalanceLedger::new(),
            simulations: SimulationStore::new(),
            corrections: CorrectionLog::new(),
        }
    }

    // --- fuel invoices ---

    /// Records a fuel supplier invoice
    pub fn create_invoice(&mut self, new: NewInvoice) -> LedgerResult<Invoice> {
        self.fuel_invoices.create(new).cloned()
    }

    /// Edits a pending fuel invoice; key-field changes require a reason
    /// and are written to the correction log
    pub fn edit_invoice(
        &mut self,
        id: InvoiceId,
        edit: InvoiceEdit,
        reason: &str,
        changed_by: &str,
    ) -> LedgerResult<Invoice> {
        self.fuel_invoices
            .edit(id, edit, Some(reason), changed_by, &mut self.corrections)
            .cloned()
    }

    /// Deletes a pending fuel invoice
    pub fn delete_invoice(&mut self, id: InvoiceId) -> LedgerResult<()> {
        self.fuel_invoices.delete(id)
    }

    /// Lists fuel invoices in creation order, optionally by status
    pub fn list_invoices(&self, status: Option<InvoiceStatus>) -> Vec<Invoice> {
        self.fuel_invoices.list(status).into_iter().cloned().collect()
    }

    pub fn invoice(&self, id: InvoiceId) -> LedgerResult<Invoice> {
        self.fuel_invoices.get(id).cloned()
    }

    // --- balance ---

    /// The balance record with `planned` and `balance_after` refreshed
    /// against the active simulation
    pub fn balance(&mut self) -> Balance {
        self.balance.get(&self.simulations, &self.fuel_invoices).clone()
    }

    /// Operator override of the tracked balances
    pub fn set_balance_manual(
        &mut self,
        current_balance: Option<Decimal>,
        available_funds: Option<Decimal>,
    ) -> Balance {
        self.balance.set_manual(current_balance, available_funds).clone()
    }

    // --- payment simulations ---

    /// Previews paying a set of pending fuel invoices; reads nothing but
    /// the invoice store and writes nothing but the simulation record
    pub fn create_simulation(
        &mut self,
        simulation_date: NaiveDate,
        invoice_ids: Vec<InvoiceId>,
    ) -> LedgerResult<PaymentSimulation> {
        self.simulations
            .create(simulation_date, invoice_ids, &self.fuel_invoices)
            .cloned()
    }

    pub fn delete_simulation(&mut self, id: SimulationId) -> LedgerResult<()> {
        self.simulations.delete(id)
    }

    /// Removes simulations past [`simulation_retention`], returning the
    /// count removed
    pub fn purge_stale_simulations(&mut self) -> usize {
        self.simulations.purge_stale(simulation_retention())
    }

    pub fn list_simulations(&self) -> Vec<PaymentSimulation> {
        self.simulations.list().to_vec()
    }

    /// The simulation currently feeding the `planned` figure
    pub fn active_simulation(&self) -> Option<PaymentSimulation> {
        self.simulations.latest().cloned()
    }

    // --- fuel settlement ---

    /// Settles pending fuel invoices as one batch, deducting funds at
    /// commit whatever the instrument
    pub fn commit_batch(
        &mut self,
        payment_date: NaiveDate,
        reference: &str,
        method: PaymentMethod,
        invoice_ids: &[InvoiceId],
    ) -> LedgerResult<PaymentBatch> {
        self.fuel_engine
            .commit(
                &mut self.fuel_invoices,
                &mut self.balance,
                payment_date,
                reference,
                method,
                invoice_ids,
            )
            .cloned()
    }

    /// Amends a fuel batch's metadata with an audited reason
    pub fn amend_batch(
        &mut self,
        batch_id: BatchId,
        amendment: BatchAmendment,
        reason: &str,
        changed_by: &str,
    ) -> LedgerResult<PaymentBatch> {
        self.fuel_engine
            .amend(batch_id, amendment, reason, changed_by, &mut self.corrections)
            .cloned()
    }

    /// Reverts the latest fuel batch carrying this reference, restoring
    /// its invoices and funds
    pub fn revert_batch(&mut self, reference: &str) -> LedgerResult<RevertOutcome> {
        self.fuel_engine
            .revert(&mut self.fuel_invoices, &mut self.balance, reference)
    }

    pub fn batch(&mut self, batch_id: BatchId) -> LedgerResult<PaymentBatch> {
        self.fuel_engine.batch(batch_id).cloned()
    }

    pub fn batches(&mut self) -> Vec<PaymentBatch> {
        self.fuel_engine.batches().into_iter().cloned().collect()
    }

    // --- vendor ledger ---

    /// Records a vendor invoice; the due date follows supplier terms
    pub fn create_vendor_invoice(&mut self, new: NewInvoice) -> LedgerResult<Invoice> {
        self.vendor.create_invoice(new).cloned()
    }

    pub fn edit_vendor_invoice(
        &mut self,
        id: InvoiceId,
        edit: InvoiceEdit,
        reason: &str,
        changed_by: &str,
    ) -> LedgerResult<Invoice> {
        self.vendor
            .edit_invoice(id, edit, reason, changed_by, &mut self.corrections)
            .cloned()
    }

    pub fn delete_vendor_invoice(&mut self, id: InvoiceId) -> LedgerResult<()> {
        self.vendor.delete_invoice(id)
    }

    pub fn list_vendor_invoices(&self, status: Option<InvoiceStatus>) -> Vec<Invoice> {
        self.vendor.list_invoices(status).into_iter().cloned().collect()
    }

    pub fn vendor_invoice(&self, id: InvoiceId) -> LedgerResult<Invoice> {
        self.vendor.invoice(id).cloned()
    }

    /// Settles vendor invoices as one batch; a check batch stays
    /// uncashed until [`BackOffice::mark_vendor_batch_cleared`]
    pub fn commit_vendor_batch(
        &mut self,
        payment_date: NaiveDate,
        reference: &str,
        method: PaymentMethod,
        invoice_ids: &[InvoiceId],
    ) -> LedgerResult<PaymentBatch> {
        self.vendor
            .commit_batch(&mut self.balance, payment_date, reference, method, invoice_ids)
            .cloned()
    }

    pub fn amend_vendor_batch(
        &mut self,
        batch_id: BatchId,
        amendment: BatchAmendment,
        reason: &str,
        changed_by: &str,
    ) -> LedgerResult<PaymentBatch> {
        self.vendor
            .amend_batch(batch_id, amendment, reason, changed_by, &mut self.corrections)
            .cloned()
    }

    pub fn revert_vendor_batch(&mut self, reference: &str) -> LedgerResult<RevertOutcome> {
        self.vendor.revert_batch(&mut self.balance, reference)
    }

    /// Clears an uncashed vendor check, finally deducting its funds
    pub fn mark_vendor_batch_cleared(&mut self, batch_id: BatchId) -> LedgerResult<()> {
        self.vendor.mark_batch_cleared(&mut self.balance, batch_id)
    }

    pub fn vendor_batch(&mut self, batch_id: BatchId) -> LedgerResult<PaymentBatch> {
        self.vendor.batch(batch_id).cloned()
    }

    pub fn vendor_batches(&mut self) -> Vec<PaymentBatch> {
        self.vendor.batches().into_iter().cloned().collect()
    }

    /// Sum of all uncashed vendor check totals
    pub fn vendor_uncashed_total(&self) -> Money {
        self.vendor.uncashed_total()
    }

    /// Available funds as if every outstanding vendor check had cashed
    pub fn vendor_net_balance(&self) -> Money {
        self.vendor.net_balance(&self.balance)
    }

    // --- corrections ---

    /// The full correction trail, oldest first
    pub fn corrections(&self) -> &[Correction] {
        self.corrections.entries()
    }

    /// Corrections recorded against one invoice or batch
    pub fn corrections_for(&self, entity_id: Uuid) -> Vec<&Correction> {
        self.corrections.for_entity(entity_id)
    }
}

impl Default for BackOffice {
    fn default() -> Self {
        Self::new()
    }
}
