//! Settlement engine
//!
//! Creates, amends, and reverts payment batches. This is the only
//! component allowed to transition invoices between pending and paid.
//! Every multi-row mutation validates all of its preconditions before the
//! first write, so an error return always leaves invoices, batches, and
//! the balance exactly as they were.
//!
//! # Clearing
//!
//! The engine is policy-driven. Under [`ClearingPolicy::Immediate`] (the
//! fuel flow) every batch deducts `available_funds` at commit, whatever
//! the instrument. Under [`ClearingPolicy::DeferredCheck`] (the vendor
//! flow) an EFT batch deducts at commit while a check batch leaves the
//! balance untouched until [`SettlementEngine::mark_cleared`] runs; an
//! uncashed check is money promised, not money gone. Revert reverses
//! whatever was actually applied, keyed on `cleared_at` alone.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use core_kernel::{BatchId, InvoiceId, LineItemId, Money};

use crate::balance::BalanceLedger;
use crate::correction::{AuditEntity, CorrectionLog};
use crate::error::{LedgerError, LedgerResult};
use crate::invoice::InvoiceStore;

/// Payment instrument for a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Electronic funds transfer; clears immediately
    Eft,
    /// Check; clearing depends on the engine's policy
    Check,
}

/// When a batch's deduction hits the balance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearingPolicy {
    /// Every instrument deducts at commit (fuel-supplier flow)
    Immediate,
    /// Checks stay uncashed until explicitly marked cleared
    /// (vendor flow); EFT still deducts at commit
    DeferredCheck,
}

impl ClearingPolicy {
    fn clears_at_commit(&self, method: PaymentMethod) -> bool {
        match self {
            ClearingPolicy::Immediate => true,
            ClearingPolicy::DeferredCheck => method == PaymentMethod::Eft,
        }
    }
}

/// Snapshot of a paid invoice at the time of payment
///
/// Copies the invoice's number, amount, and date so later edits to the
/// invoice's notes (the only mutable field left) cannot reshape history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettledLineItem {
    /// Unique identifier
    pub id: LineItemId,
    /// The settled invoice
    pub invoice_id: InvoiceId,
    /// Invoice number at time of payment
    pub number: String,
    /// Invoice amount at time of payment
    pub amount: Money,
    /// Invoice date at time of payment
    pub invoice_date: NaiveDate,
}

/// A group of invoices settled together under one bank transaction
///
/// `(payment_date, reference)` is the idempotency key: the same bank
/// transaction can never settle twice. `reference` alone is *not* unique;
/// revert-by-reference deliberately means "undo the latest occurrence".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentBatch {
    /// Unique identifier
    pub id: BatchId,
    /// Date the payment was made
    pub payment_date: NaiveDate,
    /// Bank transaction reference
    pub reference: String,
    /// Payment instrument
    pub method: PaymentMethod,
    /// Cached total; the authoritative value is always the line item sum
    /// and is recomputed on every read
    pub total_amount: Money,
    /// Available funds snapshot taken at commit
    pub balance_before: Money,
    /// Projected funds after the batch: `balance_before - total`
    pub balance_after: Money,
    /// When the instrument cleared; `None` for an uncashed check
    pub cleared_at: Option<DateTime<Utc>>,
    /// Settled invoice snapshots
    pub line_items: Vec<SettledLineItem>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl PaymentBatch {
    /// The authoritative total: the sum of the line item amounts
    pub fn computed_total(&self) -> Money {
        self.line_items.iter().map(|item| item.amount).sum()
    }

    /// Returns true if the batch's deduction has hit the balance
    pub fn is_cleared(&self) -> bool {
        self.cleared_at.is_some()
    }

    /// Returns true for a check whose funds are not yet deducted
    pub fn is_uncashed(&self) -> bool {
        self.method == PaymentMethod::Check && self.cleared_at.is_none()
    }

    fn refresh_total(&mut self) {
        self.total_amount = self.computed_total();
    }
}

/// Metadata amendment for a settled batch; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchAmendment {
    pub payment_date: Option<NaiveDate>,
    pub reference: Option<String>,
}

/// Result of reverting a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevertOutcome {
    /// Invoices restored to pending
    pub reverted_invoice_ids: Vec<InvoiceId>,
    /// True if the batch ran out of line items and was deleted
    pub batch_deleted: bool,
}

/// Creates, amends, and reverts payment batches for one invoice population
#[derive(Debug)]
pub struct SettlementEngine {
    policy: ClearingPolicy,
    audit_entity: AuditEntity,
    batches: HashMap<BatchId, PaymentBatch>,
}

impl SettlementEngine {
    /// Creates an engine with the given clearing policy, logging batch
    /// corrections under the given entity kind
    pub fn new(policy: ClearingPolicy, audit_entity: AuditEntity) -> Self {
        Self {
            policy,
            audit_entity,
            batches: HashMap::new(),
        }
    }

    /// Settles a group of pending invoices as one batch
    ///
    /// Performed as a single atomic unit: either the batch exists with
    /// every invoice flipped to paid (and, when the instrument clears at
    /// commit, the balance deducted), or nothing changed.
    ///
    /// # Errors
    ///
    /// - `Validation` if the reference is empty, the id list is empty or
    ///   has duplicates, or any invoice is missing or not pending
    /// - `Conflict` if `(payment_date, reference)` is already used
    pub fn commit(
        &mut self,
        invoices: &mut InvoiceStore,
        balance: &mut BalanceLedger,
        payment_date: NaiveDate,
        reference: &str,
        method: PaymentMethod,
        invoice_ids: &[InvoiceId],
    ) -> LedgerResult<&PaymentBatch> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(LedgerError::validation("payment reference must not be empty"));
        }
        if invoice_ids.is_empty() {
            return Err(LedgerError::validation(
                "a payment batch requires at least one invoice",
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for id in invoice_ids {
            if !seen.insert(*id) {
                return Err(LedgerError::validation(format!(
                    "invoice {id} appears more than once in the batch"
                )));
            }
        }

        if self.key_in_use(payment_date, reference, None) {
            return Err(LedgerError::conflict(format!(
                "a batch with reference {reference} on {payment_date} already exists"
            )));
        }

        // Snapshot every invoice before mutating anything.
        let mut line_items = Vec::with_capacity(invoice_ids.len());
        let mut total = Money::ZERO;
        for id in invoice_ids {
            let invoice = invoices.find(*id).ok_or_else(|| {
                LedgerError::validation(format!("invoice {id} does not exist"))
            })?;
            if !invoice.is_pending() {
                return Err(LedgerError::validation(format!(
                    "invoice {} is not pending",
                    invoice.number
                )));
            }
            total += invoice.amount;
            line_items.push(SettledLineItem {
                id: LineItemId::new(),
                invoice_id: invoice.id,
                number: invoice.number.clone(),
                amount: invoice.amount,
                invoice_date: invoice.invoice_date,
            });
        }

        // All preconditions hold; apply the batch.
        let clears_now = self.policy.clears_at_commit(method);
        let balance_before = balance.available_funds();
        let batch_id = BatchId::new();
        let now = Utc::now();
        let batch = PaymentBatch {
            id: batch_id,
            payment_date,
            reference: reference.to_string(),
            method,
            total_amount: total,
            balance_before,
            balance_after: balance_before - total,
            cleared_at: clears_now.then_some(now),
            line_items,
            created_at: now,
        };

        for id in invoice_ids {
            invoices.mark_paid(*id, batch_id);
        }
        if clears_now {
            balance.apply_delta(-total);
        }

        tracing::info!(
            batch = %batch_id,
            reference = %reference,
            method = ?method,
            total = %total,
            cleared = clears_now,
            invoices = invoice_ids.len(),
            "batch committed"
        );

        self.batches.insert(batch_id, batch);
        Ok(&self.batches[&batch_id])
    }

    /// Amends a settled batch's metadata, never its contents or amounts
    ///
    /// Allowed at any time. Each changed field is appended to the
    /// correction log; nothing is written for unchanged fields.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the batch does not exist
    /// - `Validation` if a field changes without a reason, or the new
    ///   reference is empty
    /// - `Conflict` if the amended `(payment_date, reference)` collides
    ///   with another batch
    pub fn amend(
        &mut self,
        batch_id: BatchId,
        amendment: BatchAmendment,
        reason: &str,
        changed_by: &str,
        log: &mut CorrectionLog,
    ) -> LedgerResult<&PaymentBatch> {
        let batch = self
            .batches
            .get(&batch_id)
            .ok_or_else(|| LedgerError::not_found("payment batch", batch_id))?;

        let new_reference = match amendment.reference {
            Some(r) => {
                let r = r.trim().to_string();
                if r.is_empty() {
                    return Err(LedgerError::validation(
                        "payment reference must not be empty",
                    ));
                }
                Some(r)
            }
            None => None,
        };

        let effective_date = amendment.payment_date.unwrap_or(batch.payment_date);
        let effective_reference = new_reference.as_deref().unwrap_or(&batch.reference);

        let mut changes: Vec<(&str, String, String)> = Vec::new();
        if effective_date != batch.payment_date {
            changes.push((
                "payment_date",
                batch.payment_date.to_string(),
                effective_date.to_string(),
            ));
        }
        if effective_reference != batch.reference {
            changes.push((
                "reference",
                batch.reference.clone(),
                effective_reference.to_string(),
            ));
        }

        if changes.is_empty() {
            let batch = self.batches.get_mut(&batch_id).unwrap();
            batch.refresh_total();
            return Ok(batch);
        }

        if reason.trim().is_empty() {
            return Err(LedgerError::validation(
                "a reason is required when amending a batch",
            ));
        }
        if self.key_in_use(effective_date, effective_reference, Some(batch_id)) {
            return Err(LedgerError::conflict(format!(
                "a batch with reference {effective_reference} on {effective_date} already exists"
            )));
        }

        let batch = self.batches.get_mut(&batch_id).unwrap();
        if let Some(d) = amendment.payment_date {
            batch.payment_date = d;
        }
        if let Some(r) = new_reference {
            batch.reference = r;
        }
        batch.refresh_total();

        for (field, old_value, new_value) in changes {
            log.record(
                self.audit_entity,
                *batch_id.as_uuid(),
                field,
                old_value,
                new_value,
                reason.trim(),
                changed_by,
            );
        }

        Ok(&self.batches[&batch_id])
    }

    /// Reverts the most recent batch carrying this reference
    ///
    /// "Most recent" means latest `payment_date`, ties broken by latest
    /// creation order. Every line item whose source invoice still exists
    /// is restored to pending and removed from the batch; if the batch
    /// ends up empty it is deleted, otherwise its cached total is
    /// recomputed. When the batch had cleared, the restored amounts are
    /// credited back to the balance, the exact inverse of what commit or
    /// clearing applied. An uncashed check never deducted anything, so
    /// reverting one touches no funds.
    pub fn revert(
        &mut self,
        invoices: &mut InvoiceStore,
        balance: &mut BalanceLedger,
        reference: &str,
    ) -> LedgerResult<RevertOutcome> {
        let batch_id = self
            .batches
            .values()
            .filter(|b| b.reference == reference)
            .max_by_key(|b| (b.payment_date, b.id))
            .map(|b| b.id)
            .ok_or_else(|| LedgerError::not_found("payment batch", reference))?;

        let batch = self.batches.get_mut(&batch_id).unwrap();
        let was_cleared = batch.is_cleared();

        let mut reverted_invoice_ids = Vec::new();
        let mut restored_total = Money::ZERO;
        batch.line_items.retain(|item| {
            if invoices.restore_pending(item.invoice_id) {
                reverted_invoice_ids.push(item.invoice_id);
                restored_total += item.amount;
                false
            } else {
                true
            }
        });

        let batch_deleted = batch.line_items.is_empty();
        if batch_deleted {
            self.batches.remove(&batch_id);
        } else {
            batch.refresh_total();
        }

        if was_cleared && !restored_total.is_zero() {
            balance.apply_delta(restored_total);
        }

        tracing::info!(
            batch = %batch_id,
            reference = %reference,
            restored = %restored_total,
            deleted = batch_deleted,
            invoices = reverted_invoice_ids.len(),
            "batch reverted"
        );

        Ok(RevertOutcome {
            reverted_invoice_ids,
            batch_deleted,
        })
    }

    /// Clears an uncashed check, deducting its funds
    ///
    /// This is the only point at which a deferred check actually reduces
    /// available funds.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the batch does not exist
    /// - `InvalidState` if the batch is not a check or already cleared
    pub fn mark_cleared(
        &mut self,
        balance: &mut BalanceLedger,
        batch_id: BatchId,
    ) -> LedgerResult<()> {
        let batch = self
            .batches
            .get_mut(&batch_id)
            .ok_or_else(|| LedgerError::not_found("payment batch", batch_id))?;

        if batch.method != PaymentMethod::Check {
            return Err(LedgerError::invalid_state(format!(
                "batch {} is not a check payment",
                batch.reference
            )));
        }
        if batch.is_cleared() {
            return Err(LedgerError::invalid_state(format!(
                "batch {} has already cleared",
                batch.reference
            )));
        }

        batch.refresh_total();
        let total = batch.total_amount;
        batch.cleared_at = Some(Utc::now());
        balance.apply_delta(-total);

        tracing::info!(batch = %batch_id, total = %total, "check cleared");
        Ok(())
    }

    /// Gets a batch by id, refreshing its cached total from line items
    pub fn batch(&mut self, batch_id: BatchId) -> LedgerResult<&PaymentBatch> {
        let batch = self
            .batches
            .get_mut(&batch_id)
            .ok_or_else(|| LedgerError::not_found("payment batch", batch_id))?;
        batch.refresh_total();
        Ok(batch)
    }

    /// Lists all batches in creation order, refreshing cached totals
    pub fn batches(&mut self) -> Vec<&PaymentBatch> {
        for batch in self.batches.values_mut() {
            batch.refresh_total();
        }
        let mut result: Vec<&PaymentBatch> = self.batches.values().collect();
        result.sort_by_key(|b| b.id);
        result
    }

    /// Sum of all uncashed check batch totals, computed on demand
    pub fn uncashed_total(&self) -> Money {
        self.batches
            .values()
            .filter(|b| b.is_uncashed())
            .map(|b| b.computed_total())
            .sum()
    }

    fn key_in_use(&self, date: NaiveDate, reference: &str, exclude: Option<BatchId>) -> bool {
        self.batches.values().any(|b| {
            Some(b.id) != exclude && b.payment_date == date && b.reference == reference
        })
    }
}
