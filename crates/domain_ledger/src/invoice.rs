//! Supplier invoice lifecycle and store
//!
//! Invoices are created pending, transition to paid only as a side effect
//! of settlement, and return to pending only through a batch revert. A
//! paid invoice is an immutable terminal record: edits and deletes are
//! rejected outright, and its amount, number, and dates can only ever
//! change by being reverted back to pending first.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use core_kernel::{BatchId, InvoiceId, Money};

use crate::correction::{AuditEntity, CorrectionLog};
use crate::error::{LedgerError, LedgerResult};

/// Days after the invoice date that payment falls due, unless the caller
/// supplies an explicit due date.
pub const DUE_DATE_OFFSET_DAYS: i64 = 5;

/// Invoice lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Awaiting settlement
    Pending,
    /// Settled in a payment batch
    Paid,
}

/// A supplier invoice (fuel or vendor population)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier
    pub id: InvoiceId,
    /// Supplier's invoice number
    pub number: String,
    /// Invoice amount
    pub amount: Money,
    /// Supplier or goods category label
    pub kind: String,
    /// Date on the invoice
    pub invoice_date: NaiveDate,
    /// Payment due date
    pub due_date: NaiveDate,
    /// Lifecycle status
    pub status: InvoiceStatus,
    /// Free-form operator notes
    pub notes: Option<String>,
    /// Settlement linkage: the batch this invoice is currently paid in
    pub settled_in: Option<BatchId>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Returns true if the invoice is awaiting settlement
    pub fn is_pending(&self) -> bool {
        self.status == InvoiceStatus::Pending
    }
}

/// Caller-supplied fields for creating an invoice
///
/// `amount` is a raw decimal and is rounded to cents exactly once, at
/// this boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInvoice {
    pub number: String,
    pub amount: Decimal,
    pub kind: String,
    pub invoice_date: NaiveDate,
    /// Explicit due date override; derived (+5 days) when absent
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Partial update for a pending invoice; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvoiceEdit {
    pub number: Option<String>,
    pub amount: Option<Decimal>,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Owns one invoice population and its lifecycle
///
/// Status transitions are reserved for the settlement engine via the
/// crate-visible [`mark_paid`](InvoiceStore::mark_paid) and
/// [`restore_pending`](InvoiceStore::restore_pending); the public surface
/// only creates, edits, deletes, and lists.
#[derive(Debug)]
pub struct InvoiceStore {
    audit_entity: AuditEntity,
    invoices: HashMap<InvoiceId, Invoice>,
}

impl InvoiceStore {
    /// Creates an empty store that logs corrections under the given
    /// entity kind
    pub fn new(audit_entity: AuditEntity) -> Self {
        Self {
            audit_entity,
            invoices: HashMap::new(),
        }
    }

    /// Creates a pending invoice
    ///
    /// # Errors
    ///
    /// - `Validation` if the number is empty or the amount is not positive
    /// - `Conflict` if another *pending* invoice already carries the same
    ///   number (numbers may repeat among paid invoices across payment
    ///   cycles)
    pub fn create(&mut self, new: NewInvoice) -> LedgerResult<&Invoice> {
        let number = new.number.trim().to_string();
        if number.is_empty() {
            return Err(LedgerError::validation("invoice number must not be empty"));
        }

        let amount = Money::new(new.amount);
        if !amount.is_positive() {
            return Err(LedgerError::validation(format!(
                "invoice amount must be positive, got {}",
                new.amount
            )));
        }

        if self.has_pending_number(&number) {
            return Err(LedgerError::conflict(format!(
                "a pending invoice with number {number} already exists"
            )));
        }

        let due_date = new
            .due_date
            .unwrap_or(new.invoice_date + Duration::days(DUE_DATE_OFFSET_DAYS));

        let now = Utc::now();
        let id = InvoiceId::new();
        let invoice = Invoice {
            id,
            number,
            amount,
            kind: new.kind,
            invoice_date: new.invoice_date,
            due_date,
            status: InvoiceStatus::Pending,
            notes: new.notes,
            settled_in: None,
            created_at: now,
            updated_at: now,
        };

        self.invoices.insert(id, invoice);
        Ok(&self.invoices[&id])
    }

    /// Edits a pending invoice, appending one correction per changed field
    ///
    /// A reason is required whenever a financially meaningful field
    /// (number, amount, invoice date, due date) changes. A notes-only edit
    /// may omit the reason and then writes no correction.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the id does not exist
    /// - `InvalidState` if the invoice is paid
    /// - `Validation` for a non-positive amount, an empty number, or a
    ///   missing reason on a financially meaningful change
    /// - `Conflict` if the new number collides with another pending invoice
    pub fn edit(
        &mut self,
        id: InvoiceId,
        edit: InvoiceEdit,
        reason: Option<&str>,
        changed_by: &str,
        log: &mut CorrectionLog,
    ) -> LedgerResult<&Invoice> {
        let current = self
            .invoices
            .get(&id)
            .ok_or_else(|| LedgerError::not_found("invoice", id))?;

        if !current.is_pending() {
            return Err(LedgerError::invalid_state(format!(
                "invoice {} is paid and cannot be edited",
                current.number
            )));
        }

        // Resolve every requested change before touching the record.
        let new_number = match edit.number {
            Some(n) => {
                let n = n.trim().to_string();
                if n.is_empty() {
                    return Err(LedgerError::validation("invoice number must not be empty"));
                }
                if n != current.number && self.pending_number_held_by_other(&n, id) {
                    return Err(LedgerError::conflict(format!(
                        "a pending invoice with number {n} already exists"
                    )));
                }
                Some(n)
            }
            None => None,
        };

        let new_amount = match edit.amount {
            Some(raw) => {
                let amount = Money::new(raw);
                if !amount.is_positive() {
                    return Err(LedgerError::validation(format!(
                        "invoice amount must be positive, got {raw}"
                    )));
                }
                Some(amount)
            }
            None => None,
        };

        let current = &self.invoices[&id];
        let mut changes: Vec<(&str, String, String)> = Vec::new();
        if let Some(n) = &new_number {
            if *n != current.number {
                changes.push(("number", current.number.clone(), n.clone()));
            }
        }
        if let Some(a) = new_amount {
            if a != current.amount {
                changes.push(("amount", current.amount.to_string(), a.to_string()));
            }
        }
        if let Some(d) = edit.invoice_date {
            if d != current.invoice_date {
                changes.push(("invoice_date", current.invoice_date.to_string(), d.to_string()));
            }
        }
        if let Some(d) = edit.due_date {
            if d != current.due_date {
                changes.push(("due_date", current.due_date.to_string(), d.to_string()));
            }
        }

        let reason = reason.map(str::trim).filter(|r| !r.is_empty());
        if !changes.is_empty() && reason.is_none() {
            return Err(LedgerError::validation(
                "a reason is required when changing invoice number, amount, or dates",
            ));
        }

        let notes_changed = match &edit.notes {
            Some(n) => current.notes.as_deref() != Some(n.as_str()),
            None => false,
        };

        // All checks passed; apply the edit.
        let invoice = self.invoices.get_mut(&id).unwrap();
        if let Some(n) = new_number {
            invoice.number = n;
        }
        if let Some(a) = new_amount {
            invoice.amount = a;
        }
        if let Some(d) = edit.invoice_date {
            invoice.invoice_date = d;
        }
        if let Some(d) = edit.due_date {
            invoice.due_date = d;
        }
        if let Some(n) = edit.notes {
            invoice.notes = Some(n);
        }
        if !changes.is_empty() || notes_changed {
            invoice.updated_at = Utc::now();
        }

        if let Some(reason) = reason {
            for (field, old_value, new_value) in changes {
                log.record(
                    self.audit_entity,
                    *id.as_uuid(),
                    field,
                    old_value,
                    new_value,
                    reason,
                    changed_by,
                );
            }
        }

        Ok(&self.invoices[&id])
    }

    /// Deletes a pending invoice
    ///
    /// # Errors
    ///
    /// - `NotFound` if the id does not exist
    /// - `InvalidState` if the invoice is paid
    pub fn delete(&mut self, id: InvoiceId) -> LedgerResult<()> {
        let invoice = self
            .invoices
            .get(&id)
            .ok_or_else(|| LedgerError::not_found("invoice", id))?;

        if !invoice.is_pending() {
            return Err(LedgerError::invalid_state(format!(
                "invoice {} is paid and cannot be deleted",
                invoice.number
            )));
        }

        self.invoices.remove(&id);
        Ok(())
    }

    /// Lists invoices, optionally filtered by status, in creation order
    pub fn list(&self, status: Option<InvoiceStatus>) -> Vec<&Invoice> {
        let mut result: Vec<&Invoice> = self
            .invoices
            .values()
            .filter(|inv| status.map_or(true, |s| inv.status == s))
            .collect();
        result.sort_by_key(|inv| inv.id);
        result
    }

    /// Gets an invoice by id
    pub fn get(&self, id: InvoiceId) -> LedgerResult<&Invoice> {
        self.invoices
            .get(&id)
            .ok_or_else(|| LedgerError::not_found("invoice", id))
    }

    /// Gets an invoice by id if it exists
    pub fn find(&self, id: InvoiceId) -> Option<&Invoice> {
        self.invoices.get(&id)
    }

    /// Returns true if a *pending* invoice carries this number
    pub fn has_pending_number(&self, number: &str) -> bool {
        self.invoices
            .values()
            .any(|inv| inv.is_pending() && inv.number == number)
    }

    fn pending_number_held_by_other(&self, number: &str, this: InvoiceId) -> bool {
        self.invoices
            .values()
            .any(|inv| inv.id != this && inv.is_pending() && inv.number == number)
    }

    /// Number of invoices in the store
    pub fn len(&self) -> usize {
        self.invoices.len()
    }

    /// Returns true if the store has no invoices
    pub fn is_empty(&self) -> bool {
        self.invoices.is_empty()
    }

    /// Flips a pending invoice to paid and records its settlement linkage.
    /// Settlement-engine use only; the caller has already validated the
    /// pending state.
    pub(crate) fn mark_paid(&mut self, id: InvoiceId, batch: BatchId) {
        if let Some(invoice) = self.invoices.get_mut(&id) {
            invoice.status = InvoiceStatus::Paid;
            invoice.settled_in = Some(batch);
            invoice.updated_at = Utc::now();
        }
    }

    /// Restores a paid invoice to pending and drops its settlement
    /// linkage. Settlement-engine use only.
    pub(crate) fn restore_pending(&mut self, id: InvoiceId) -> bool {
        match self.invoices.get_mut(&id) {
            Some(invoice) => {
                invoice.status = InvoiceStatus::Pending;
                invoice.settled_in = None;
                invoice.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }
}
