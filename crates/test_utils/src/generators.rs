//! Property-based Test Generators
//!
//! Proptest strategies for ledger inputs.

use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for positive invoice amounts up to 100,000.00 with up to
/// four raw decimal places, exercising the rounding path. Floored at
/// 0.0050 so every value still rounds to at least one cent.
pub fn invoice_amount() -> impl Strategy<Value = Decimal> {
    (50i64..=1_000_000_000i64).prop_map(|minor| Decimal::new(minor, 4))
}

/// Strategy for bank transaction references
pub fn payment_reference() -> impl Strategy<Value = String> {
    "(REF|CHK|EFT)-[0-9]{3,6}"
}
