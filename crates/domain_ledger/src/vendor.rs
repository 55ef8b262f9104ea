//! Vendor ledger
//!
//! Non-fuel supplier invoices (repairs, deliveries, services) run through
//! the same invoice store and settlement engine as fuel, with one
//! difference: check payments stay uncashed until explicitly marked
//! cleared. Until then they count against the *net* balance but not
//! against available funds.

use chrono::NaiveDate;

use core_kernel::{BatchId, InvoiceId, Money};

use crate::balance::BalanceLedger;
use crate::correction::{AuditEntity, CorrectionLog};
use crate::error::LedgerResult;
use crate::invoice::{Invoice, InvoiceEdit, InvoiceStatus, InvoiceStore, NewInvoice};
use crate::settlement::{
    BatchAmendment, ClearingPolicy, PaymentBatch, PaymentMethod, RevertOutcome, SettlementEngine,
};

/// Invoices and settlements for non-fuel suppliers
///
/// Vendor invoices carry an explicit due date per supplier terms rather
/// than the fuel default, and vendor checks clear on a deferred schedule.
#[derive(Debug)]
pub struct VendorLedger {
    invoices: InvoiceStore,
    engine: SettlementEngine,
}

impl VendorLedger {
    pub fn new() -> Self {
        Self {
            invoices: InvoiceStore::new(AuditEntity::VendorInvoice),
            engine: SettlementEngine::new(
                ClearingPolicy::DeferredCheck,
                AuditEntity::VendorBatch,
            ),
        }
    }

    /// Records a vendor invoice
    pub fn create_invoice(&mut self, new: NewInvoice) -> LedgerResult<&Invoice> {
        self.invoices.create(new)
    }

    /// Edits a pending vendor invoice, logging corrections for key fields
    pub fn edit_invoice(
        &mut self,
        id: InvoiceId,
        edit: InvoiceEdit,
        reason: &str,
        changed_by: &str,
        log: &mut CorrectionLog,
    ) -> LedgerResult<&Invoice> {
        self.invoices.edit(id, edit, Some(reason), changed_by, log)
    }

    /// Deletes a pending vendor invoice
    pub fn delete_invoice(&mut self, id: InvoiceId) -> LedgerResult<()> {
        self.invoices.delete(id)
    }

    /// Lists vendor invoices, optionally filtered by status
    pub fn list_invoices(&self, status: Option<InvoiceStatus>) -> Vec<&Invoice> {
        self.invoices.list(status)
    }

    pub fn invoice(&self, id: InvoiceId) -> LedgerResult<&Invoice> {
        self.invoices.get(id)
    }

    /// Settles vendor invoices as one batch; a check batch stays uncashed
    pub fn commit_batch(
        &mut self,
        balance: &mut BalanceLedger,
        payment_date: NaiveDate,
        reference: &str,
        method: PaymentMethod,
        invoice_ids: &[InvoiceId],
    ) -> LedgerResult<&PaymentBatch> {
        self.engine.commit(
            &mut self.invoices,
            balance,
            payment_date,
            reference,
            method,
            invoice_ids,
        )
    }

    /// Amends a vendor batch's metadata with an audited reason
    pub fn amend_batch(
        &mut self,
        batch_id: BatchId,
        amendment: BatchAmendment,
        reason: &str,
        changed_by: &str,
        log: &mut CorrectionLog,
    ) -> LedgerResult<&PaymentBatch> {
        self.engine.amend(batch_id, amendment, reason, changed_by, log)
    }

    /// Reverts the latest vendor batch carrying this reference
    pub fn revert_batch(
        &mut self,
        balance: &mut BalanceLedger,
        reference: &str,
    ) -> LedgerResult<RevertOutcome> {
        self.engine.revert(&mut self.invoices, balance, reference)
    }

    /// Clears an uncashed vendor check, deducting its funds
    pub fn mark_batch_cleared(
        &mut self,
        balance: &mut BalanceLedger,
        batch_id: BatchId,
    ) -> LedgerResult<()> {
        self.engine.mark_cleared(balance, batch_id)
    }

    pub fn batch(&mut self, batch_id: BatchId) -> LedgerResult<&PaymentBatch> {
        self.engine.batch(batch_id)
    }

    pub fn batches(&mut self) -> Vec<&PaymentBatch> {
        self.engine.batches()
    }

    /// Sum of all uncashed vendor check totals
    pub fn uncashed_total(&self) -> Money {
        self.engine.uncashed_total()
    }

    /// Available funds as if every outstanding check had been cashed
    ///
    /// Computed on demand so it can never drift from the batches it is
    /// derived from.
    pub fn net_balance(&self, balance: &BalanceLedger) -> Money {
        balance.available_funds() - self.uncashed_total()
    }
}

impl Default for VendorLedger {
    fn default() -> Self {
        Self::new()
    }
}
