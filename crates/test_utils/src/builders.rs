//! Test Data Builders
//!
//! Builder patterns for constructing test data with sensible defaults,
//! so tests specify only the fields they care about.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use domain_ledger::NewInvoice;

use crate::fixtures::{DateFixtures, MoneyFixtures};

/// Builder for new invoice input
pub struct NewInvoiceBuilder {
    number: String,
    amount: Decimal,
    kind: String,
    invoice_date: NaiveDate,
    due_date: Option<NaiveDate>,
    notes: Option<String>,
}

impl NewInvoiceBuilder {
    /// Creates a builder with default fuel invoice values
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            amount: MoneyFixtures::fuel_delivery(),
            kind: "diesel".to_string(),
            invoice_date: DateFixtures::invoice_date(),
            due_date: None,
            notes: None,
        }
    }

    /// Switches the defaults to a vendor invoice with explicit terms
    pub fn vendor(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            amount: MoneyFixtures::vendor_repair(),
            kind: "repairs".to_string(),
            invoice_date: DateFixtures::invoice_date(),
            due_date: Some(DateFixtures::vendor_due_date()),
            notes: None,
        }
    }

    /// Sets the amount
    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = amount;
        self
    }

    /// Sets the invoice kind
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Sets the invoice date
    pub fn with_invoice_date(mut self, date: NaiveDate) -> Self {
        self.invoice_date = date;
        self
    }

    /// Sets an explicit due date
    pub fn with_due_date(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    /// Sets free-form notes
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Builds the invoice input
    pub fn build(self) -> NewInvoice {
        NewInvoice {
            number: self.number,
            amount: self.amount,
            kind: self.kind,
            invoice_date: self.invoice_date,
            due_date: self.due_date,
            notes: self.notes,
        }
    }
}
