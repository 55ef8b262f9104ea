//! Pre-built Test Fixtures
//!
//! Ready-to-use test data for the ledger test suite. Fixtures are
//! consistent and predictable so assertions can use literal figures.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Fixture for money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// A typical fuel delivery invoice amount
    pub fn fuel_delivery() -> Decimal {
        dec!(120.00)
    }

    /// A second delivery, chosen so the pair sums to 200.30
    pub fn fuel_delivery_small() -> Decimal {
        dec!(80.30)
    }

    /// A typical vendor repair invoice amount
    pub fn vendor_repair() -> Decimal {
        dec!(500.00)
    }

    /// Opening available funds for most scenarios
    pub fn opening_funds() -> Decimal {
        dec!(1000.00)
    }

    /// An amount that needs rounding (2.125 rounds away from zero)
    pub fn unrounded() -> Decimal {
        dec!(2.125)
    }
}

/// Fixture for date test data
pub struct DateFixtures;

impl DateFixtures {
    /// Standard invoice date (Jan 2, 2026)
    pub fn invoice_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 2).expect("valid date")
    }

    /// Standard payment date (Jan 5, 2026)
    pub fn payment_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 5).expect("valid date")
    }

    /// A later payment date for revert tie-break scenarios
    pub fn later_payment_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 12).expect("valid date")
    }

    /// Vendor due date per supplier terms (net 30 from invoice date)
    pub fn vendor_due_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 1).expect("valid date")
    }
}

/// Fixture for string test data
pub struct StringFixtures;

impl StringFixtures {
    /// A bank transaction reference
    pub fn reference() -> &'static str {
        "REF100"
    }

    /// A check number style reference
    pub fn check_reference() -> &'static str {
        "CHK-0042"
    }

    /// The operator recorded on corrections
    pub fn operator() -> &'static str {
        "back-office"
    }

    /// A correction reason that passes validation
    pub fn reason() -> &'static str {
        "supplier statement mismatch"
    }
}
