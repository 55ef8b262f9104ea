//! Core Kernel - Foundational types and utilities for the station ledger
//!
//! This crate provides the fundamental building blocks used across the
//! domain modules:
//! - Money type with precise decimal arithmetic and currency-convention
//!   rounding
//! - Strongly-typed, creation-ordered identifiers

pub mod identifiers;
pub mod money;

pub use identifiers::{BatchId, CorrectionId, InvoiceId, LineItemId, SimulationId};
pub use money::{format_money, round_money, Money};
