//! Invoice payment and settlement ledger for a fuel station back office
//!
//! Tracks supplier invoices from receipt to payment: fuel invoices are
//! settled in batches that deduct available funds immediately, vendor
//! invoices run the same flow with deferred check clearing, payment
//! simulations preview a plan without touching anything, and every edit
//! to a money-bearing field lands in an append-only correction log.
//!
//! [`services::BackOffice`] is the intended entry point; the individual
//! stores and the settlement engine are public for finer-grained use.

pub mod balance;
pub mod correction;
pub mod error;
pub mod invoice;
pub mod services;
pub mod settlement;
pub mod simulation;
pub mod vendor;

pub use balance::{Balance, BalanceLedger};
pub use correction::{AuditEntity, Correction, CorrectionLog};
pub use error::{LedgerError, LedgerResult};
pub use invoice::{Invoice, InvoiceEdit, InvoiceStatus, InvoiceStore, NewInvoice};
pub use services::{simulation_retention, BackOffice, SIMULATION_RETENTION_HOURS};
pub use settlement::{
    BatchAmendment, ClearingPolicy, PaymentBatch, PaymentMethod, RevertOutcome, SettledLineItem,
    SettlementEngine,
};
pub use simulation::{PaymentSimulation, SimulationStore};
pub use vendor::VendorLedger;
