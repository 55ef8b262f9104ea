//! Comprehensive tests for domain_ledger

use chrono::{Days, NaiveDate};
use rust_decimal_macros::dec;

use core_kernel::Money;

use domain_ledger::{
    AuditEntity, BackOffice, BatchAmendment, InvoiceEdit, InvoiceStatus, LedgerError,
    PaymentMethod,
};
use test_utils::{DateFixtures, MoneyFixtures, NewInvoiceBuilder, StringFixtures};

fn office_with_funds() -> BackOffice {
    let mut office = BackOffice::new();
    office.set_balance_manual(Some(dec!(5000.00)), Some(MoneyFixtures::opening_funds()));
    office
}

// ============================================================================
// Invoice Lifecycle Tests
// ============================================================================

mod invoice_tests {
    use super::*;

    #[test]
    fn test_create_defaults_due_date_five_days_out() {
        let mut office = office_with_funds();
        let invoice = office
            .create_invoice(NewInvoiceBuilder::new("INV-1").build())
            .unwrap();

        assert_eq!(
            invoice.due_date,
            DateFixtures::invoice_date().checked_add_days(Days::new(5)).unwrap()
        );
        assert_eq!(invoice.status, InvoiceStatus::Pending);
        assert_eq!(invoice.settled_in, None);
    }

    #[test]
    fn test_create_rounds_amount_half_away_from_zero() {
        let mut office = office_with_funds();
        let invoice = office
            .create_invoice(
                NewInvoiceBuilder::new("INV-1")
                    .with_amount(MoneyFixtures::unrounded())
                    .build(),
            )
            .unwrap();
        assert_eq!(invoice.amount.amount(), dec!(2.13));
    }

    #[test]
    fn test_duplicate_pending_number_is_conflict() {
        let mut office = office_with_funds();
        office
            .create_invoice(NewInvoiceBuilder::new("INV-1").build())
            .unwrap();

        let err = office
            .create_invoice(NewInvoiceBuilder::new("INV-1").build())
            .unwrap_err();
        assert!(matches!(err, LedgerError::Conflict(_)));
    }

    #[test]
    fn test_number_reusable_once_original_is_paid() {
        let mut office = office_with_funds();
        let first = office
            .create_invoice(NewInvoiceBuilder::new("INV-1").build())
            .unwrap();
        office
            .commit_batch(
                DateFixtures::payment_date(),
                StringFixtures::reference(),
                PaymentMethod::Eft,
                &[first.id],
            )
            .unwrap();

        // Uniqueness only constrains the pending population
        assert!(office
            .create_invoice(NewInvoiceBuilder::new("INV-1").build())
            .is_ok());
    }

    #[test]
    fn test_edit_key_field_requires_reason_and_logs_correction() {
        let mut office = office_with_funds();
        let invoice = office
            .create_invoice(NewInvoiceBuilder::new("INV-1").build())
            .unwrap();

        let edit = InvoiceEdit {
            amount: Some(dec!(99.00)),
            ..Default::default()
        };
        let err = office
            .edit_invoice(invoice.id, edit.clone(), "", StringFixtures::operator())
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert!(office.corrections().is_empty());

        office
            .edit_invoice(
                invoice.id,
                edit,
                StringFixtures::reason(),
                StringFixtures::operator(),
            )
            .unwrap();

        let trail = office.corrections();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].field, "amount");
        assert_eq!(trail[0].entity, AuditEntity::FuelInvoice);
        assert_eq!(trail[0].reason, StringFixtures::reason());
    }

    #[test]
    fn test_notes_edit_needs_no_reason() {
        let mut office = office_with_funds();
        let invoice = office
            .create_invoice(NewInvoiceBuilder::new("INV-1").build())
            .unwrap();

        let edited = office
            .edit_invoice(
                invoice.id,
                InvoiceEdit {
                    notes: Some("driver confirmed delivery".to_string()),
                    ..Default::default()
                },
                "",
                StringFixtures::operator(),
            )
            .unwrap();

        assert_eq!(edited.notes.as_deref(), Some("driver confirmed delivery"));
        assert!(office.corrections().is_empty());
    }

    #[test]
    fn test_paid_invoice_cannot_be_edited_or_deleted() {
        let mut office = office_with_funds();
        let invoice = office
            .create_invoice(NewInvoiceBuilder::new("INV-1").build())
            .unwrap();
        office
            .commit_batch(
                DateFixtures::payment_date(),
                StringFixtures::reference(),
                PaymentMethod::Eft,
                &[invoice.id],
            )
            .unwrap();

        let err = office
            .edit_invoice(
                invoice.id,
                InvoiceEdit {
                    amount: Some(dec!(1.00)),
                    ..Default::default()
                },
                StringFixtures::reason(),
                StringFixtures::operator(),
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState(_)));

        let err = office.delete_invoice(invoice.id).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState(_)));
    }

    #[test]
    fn test_list_filters_by_status() {
        let mut office = office_with_funds();
        let a = office
            .create_invoice(NewInvoiceBuilder::new("INV-1").build())
            .unwrap();
        let b = office
            .create_invoice(NewInvoiceBuilder::new("INV-2").build())
            .unwrap();
        office
            .commit_batch(
                DateFixtures::payment_date(),
                StringFixtures::reference(),
                PaymentMethod::Eft,
                &[a.id],
            )
            .unwrap();

        let pending = office.list_invoices(Some(InvoiceStatus::Pending));
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, b.id);

        let paid = office.list_invoices(Some(InvoiceStatus::Paid));
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].id, a.id);

        assert_eq!(office.list_invoices(None).len(), 2);
    }
}

// ============================================================================
// Simulation Tests
// ============================================================================

mod simulation_tests {
    use super::*;

    #[test]
    fn test_simulation_never_mutates_invoices_or_funds() {
        let mut office = office_with_funds();
        let a = office
            .create_invoice(NewInvoiceBuilder::new("INV-1").build())
            .unwrap();
        let b = office
            .create_invoice(
                NewInvoiceBuilder::new("INV-2")
                    .with_amount(MoneyFixtures::fuel_delivery_small())
                    .build(),
            )
            .unwrap();

        let simulation = office
            .create_simulation(DateFixtures::payment_date(), vec![a.id, b.id])
            .unwrap();

        assert_eq!(simulation.total.amount(), dec!(200.30));
        assert_eq!(simulation.description, "2 invoices: INV-1, INV-2");

        // The preview changed nothing
        assert_eq!(
            office.list_invoices(Some(InvoiceStatus::Pending)).len(),
            2
        );
        assert_eq!(office.balance().available_funds.amount(), dec!(1000.00));
    }

    #[test]
    fn test_balance_planned_follows_latest_simulation() {
        let mut office = office_with_funds();
        let a = office
            .create_invoice(NewInvoiceBuilder::new("INV-1").build())
            .unwrap();
        let b = office
            .create_invoice(
                NewInvoiceBuilder::new("INV-2")
                    .with_amount(MoneyFixtures::fuel_delivery_small())
                    .build(),
            )
            .unwrap();

        office
            .create_simulation(DateFixtures::payment_date(), vec![a.id, b.id])
            .unwrap();
        assert_eq!(office.balance().planned.amount(), dec!(200.30));
        assert_eq!(office.balance().balance_after.amount(), dec!(799.70));

        // A newer simulation supersedes the old one
        let latest = office
            .create_simulation(DateFixtures::later_payment_date(), vec![a.id])
            .unwrap();
        assert_eq!(office.balance().planned.amount(), dec!(120.00));

        // Deleting it falls back to the previous one
        office.delete_simulation(latest.id).unwrap();
        assert_eq!(office.balance().planned.amount(), dec!(200.30));
    }

    #[test]
    fn test_planned_drops_simulated_invoices_that_disappear() {
        let mut office = office_with_funds();
        let a = office
            .create_invoice(NewInvoiceBuilder::new("INV-1").build())
            .unwrap();
        let b = office
            .create_invoice(
                NewInvoiceBuilder::new("INV-2")
                    .with_amount(MoneyFixtures::fuel_delivery_small())
                    .build(),
            )
            .unwrap();
        office
            .create_simulation(DateFixtures::payment_date(), vec![a.id, b.id])
            .unwrap();

        office.delete_invoice(b.id).unwrap();
        // The stale reference no longer counts
        assert_eq!(office.balance().planned.amount(), dec!(120.00));
    }

    #[test]
    fn test_simulation_rejects_missing_or_paid_invoices() {
        let mut office = office_with_funds();
        let a = office
            .create_invoice(NewInvoiceBuilder::new("INV-1").build())
            .unwrap();
        office
            .commit_batch(
                DateFixtures::payment_date(),
                StringFixtures::reference(),
                PaymentMethod::Eft,
                &[a.id],
            )
            .unwrap();

        let err = office
            .create_simulation(DateFixtures::payment_date(), vec![a.id])
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }
}

// ============================================================================
// Fuel Settlement Tests
// ============================================================================

mod settlement_tests {
    use super::*;

    #[test]
    fn test_settlement_round_trip_restores_everything() {
        let mut office = office_with_funds();
        let a = office
            .create_invoice(NewInvoiceBuilder::new("INV-1").build())
            .unwrap();
        let b = office
            .create_invoice(
                NewInvoiceBuilder::new("INV-2")
                    .with_amount(MoneyFixtures::fuel_delivery_small())
                    .build(),
            )
            .unwrap();

        let batch = office
            .commit_batch(
                DateFixtures::payment_date(),
                StringFixtures::reference(),
                PaymentMethod::Eft,
                &[a.id, b.id],
            )
            .unwrap();

        assert_eq!(batch.total_amount.amount(), dec!(200.30));
        assert_eq!(batch.balance_before.amount(), dec!(1000.00));
        assert_eq!(batch.balance_after.amount(), dec!(799.70));
        assert_eq!(office.balance().available_funds.amount(), dec!(799.70));
        assert_eq!(office.invoice(a.id).unwrap().settled_in, Some(batch.id));

        let outcome = office.revert_batch(StringFixtures::reference()).unwrap();
        assert!(outcome.batch_deleted);
        assert_eq!(outcome.reverted_invoice_ids.len(), 2);

        assert_eq!(office.balance().available_funds.amount(), dec!(1000.00));
        assert!(office.batches().is_empty());
        for id in [a.id, b.id] {
            let invoice = office.invoice(id).unwrap();
            assert_eq!(invoice.status, InvoiceStatus::Pending);
            assert_eq!(invoice.settled_in, None);
        }
    }

    #[test]
    fn test_same_bank_transaction_never_settles_twice() {
        let mut office = office_with_funds();
        let a = office
            .create_invoice(NewInvoiceBuilder::new("INV-1").build())
            .unwrap();
        let b = office
            .create_invoice(NewInvoiceBuilder::new("INV-2").build())
            .unwrap();

        office
            .commit_batch(
                DateFixtures::payment_date(),
                StringFixtures::reference(),
                PaymentMethod::Eft,
                &[a.id],
            )
            .unwrap();

        let err = office
            .commit_batch(
                DateFixtures::payment_date(),
                StringFixtures::reference(),
                PaymentMethod::Eft,
                &[b.id],
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::Conflict(_)));

        // The failed attempt had no side effects
        assert_eq!(office.invoice(b.id).unwrap().status, InvoiceStatus::Pending);
        assert_eq!(office.balance().available_funds.amount(), dec!(880.00));
    }

    #[test]
    fn test_no_invoice_settles_in_two_batches() {
        let mut office = office_with_funds();
        let a = office
            .create_invoice(NewInvoiceBuilder::new("INV-1").build())
            .unwrap();
        office
            .commit_batch(
                DateFixtures::payment_date(),
                StringFixtures::reference(),
                PaymentMethod::Eft,
                &[a.id],
            )
            .unwrap();

        let err = office
            .commit_batch(
                DateFixtures::later_payment_date(),
                "REF200",
                PaymentMethod::Eft,
                &[a.id],
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_fuel_check_deducts_at_commit() {
        let mut office = office_with_funds();
        let a = office
            .create_invoice(NewInvoiceBuilder::new("INV-1").build())
            .unwrap();

        let batch = office
            .commit_batch(
                DateFixtures::payment_date(),
                StringFixtures::check_reference(),
                PaymentMethod::Check,
                &[a.id],
            )
            .unwrap();

        assert!(batch.is_cleared());
        assert_eq!(office.balance().available_funds.amount(), dec!(880.00));
    }

    #[test]
    fn test_revert_targets_latest_payment_date() {
        let mut office = office_with_funds();
        let a = office
            .create_invoice(NewInvoiceBuilder::new("INV-1").build())
            .unwrap();
        let b = office
            .create_invoice(NewInvoiceBuilder::new("INV-2").build())
            .unwrap();

        office
            .commit_batch(
                DateFixtures::payment_date(),
                StringFixtures::reference(),
                PaymentMethod::Eft,
                &[a.id],
            )
            .unwrap();
        office
            .commit_batch(
                DateFixtures::later_payment_date(),
                StringFixtures::reference(),
                PaymentMethod::Eft,
                &[b.id],
            )
            .unwrap();

        let outcome = office.revert_batch(StringFixtures::reference()).unwrap();
        assert_eq!(outcome.reverted_invoice_ids, vec![b.id]);
        assert_eq!(office.invoice(a.id).unwrap().status, InvoiceStatus::Paid);
    }

    #[test]
    fn test_amend_batch_metadata_is_audited() {
        let mut office = office_with_funds();
        let a = office
            .create_invoice(NewInvoiceBuilder::new("INV-1").build())
            .unwrap();
        let batch = office
            .commit_batch(
                DateFixtures::payment_date(),
                StringFixtures::reference(),
                PaymentMethod::Eft,
                &[a.id],
            )
            .unwrap();

        let new_date = NaiveDate::from_ymd_opt(2026, 1, 6).unwrap();
        let amended = office
            .amend_batch(
                batch.id,
                BatchAmendment {
                    payment_date: Some(new_date),
                    reference: Some("REF101".to_string()),
                },
                StringFixtures::reason(),
                StringFixtures::operator(),
            )
            .unwrap();

        assert_eq!(amended.payment_date, new_date);
        assert_eq!(amended.reference, "REF101");
        // Amounts and contents are untouched
        assert_eq!(amended.total_amount, batch.total_amount);
        assert_eq!(amended.line_items.len(), 1);

        let trail = office.corrections_for(*batch.id.as_uuid());
        assert_eq!(trail.len(), 2);
        assert!(trail.iter().any(|c| c.field == "payment_date"));
        assert!(trail.iter().any(|c| c.field == "reference"));

        // Revert follows the amended reference, not the original
        assert!(office.revert_batch(StringFixtures::reference()).is_err());
        assert!(office.revert_batch("REF101").is_ok());
    }

    #[test]
    fn test_batch_totals_always_match_line_items() {
        let mut office = office_with_funds();
        let a = office
            .create_invoice(NewInvoiceBuilder::new("INV-1").build())
            .unwrap();
        let b = office
            .create_invoice(
                NewInvoiceBuilder::new("INV-2")
                    .with_amount(MoneyFixtures::fuel_delivery_small())
                    .build(),
            )
            .unwrap();
        office
            .commit_batch(
                DateFixtures::payment_date(),
                StringFixtures::reference(),
                PaymentMethod::Eft,
                &[a.id, b.id],
            )
            .unwrap();

        for batch in office.batches() {
            let line_sum: Money = batch.line_items.iter().map(|i| i.amount).sum();
            assert_eq!(batch.total_amount, line_sum);
            assert_eq!(batch.total_amount, batch.computed_total());
        }
    }
}

// ============================================================================
// Vendor Ledger Tests
// ============================================================================

mod vendor_tests {
    use super::*;

    #[test]
    fn test_vendor_check_defers_until_cleared() {
        let mut office = BackOffice::new();
        office.set_balance_manual(None, Some(dec!(2000.00)));

        let invoice = office
            .create_vendor_invoice(NewInvoiceBuilder::vendor("V-1").build())
            .unwrap();
        assert_eq!(invoice.due_date, DateFixtures::vendor_due_date());

        let batch = office
            .commit_vendor_batch(
                DateFixtures::payment_date(),
                StringFixtures::check_reference(),
                PaymentMethod::Check,
                &[invoice.id],
            )
            .unwrap();

        // Funds untouched, batch uncashed, net view carries the promise
        assert_eq!(office.balance().available_funds.amount(), dec!(2000.00));
        assert_eq!(office.vendor_uncashed_total().amount(), dec!(500.00));
        assert_eq!(office.vendor_net_balance().amount(), dec!(1500.00));
        assert!(office.vendor_batch(batch.id).unwrap().is_uncashed());

        office.mark_vendor_batch_cleared(batch.id).unwrap();
        assert_eq!(office.balance().available_funds.amount(), dec!(1500.00));
        assert_eq!(office.vendor_uncashed_total(), Money::ZERO);
        assert_eq!(office.vendor_net_balance().amount(), dec!(1500.00));

        let err = office.mark_vendor_batch_cleared(batch.id).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState(_)));
    }

    #[test]
    fn test_vendor_eft_clears_immediately() {
        let mut office = office_with_funds();
        let invoice = office
            .create_vendor_invoice(NewInvoiceBuilder::vendor("V-1").build())
            .unwrap();

        let batch = office
            .commit_vendor_batch(
                DateFixtures::payment_date(),
                "EFT-7",
                PaymentMethod::Eft,
                &[invoice.id],
            )
            .unwrap();

        assert!(batch.is_cleared());
        assert_eq!(office.balance().available_funds.amount(), dec!(500.00));
        assert_eq!(office.vendor_net_balance().amount(), dec!(500.00));
    }

    #[test]
    fn test_reverting_uncashed_check_restores_no_funds() {
        let mut office = office_with_funds();
        let invoice = office
            .create_vendor_invoice(NewInvoiceBuilder::vendor("V-1").build())
            .unwrap();
        office
            .commit_vendor_batch(
                DateFixtures::payment_date(),
                StringFixtures::check_reference(),
                PaymentMethod::Check,
                &[invoice.id],
            )
            .unwrap();

        let outcome = office
            .revert_vendor_batch(StringFixtures::check_reference())
            .unwrap();
        assert!(outcome.batch_deleted);

        // Nothing was ever deducted, so nothing comes back
        assert_eq!(office.balance().available_funds.amount(), dec!(1000.00));
        assert_eq!(office.vendor_uncashed_total(), Money::ZERO);
        assert_eq!(
            office.vendor_invoice(invoice.id).unwrap().status,
            InvoiceStatus::Pending
        );
    }

    #[test]
    fn test_reverting_cleared_check_restores_funds() {
        let mut office = office_with_funds();
        let invoice = office
            .create_vendor_invoice(NewInvoiceBuilder::vendor("V-1").build())
            .unwrap();
        let batch = office
            .commit_vendor_batch(
                DateFixtures::payment_date(),
                StringFixtures::check_reference(),
                PaymentMethod::Check,
                &[invoice.id],
            )
            .unwrap();
        office.mark_vendor_batch_cleared(batch.id).unwrap();
        assert_eq!(office.balance().available_funds.amount(), dec!(500.00));

        office
            .revert_vendor_batch(StringFixtures::check_reference())
            .unwrap();
        assert_eq!(office.balance().available_funds.amount(), dec!(1000.00));
    }

    #[test]
    fn test_vendor_corrections_carry_vendor_entities() {
        let mut office = office_with_funds();
        let invoice = office
            .create_vendor_invoice(NewInvoiceBuilder::vendor("V-1").build())
            .unwrap();

        office
            .edit_vendor_invoice(
                invoice.id,
                InvoiceEdit {
                    amount: Some(dec!(525.00)),
                    ..Default::default()
                },
                StringFixtures::reason(),
                StringFixtures::operator(),
            )
            .unwrap();

        let trail = office.corrections();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].entity, AuditEntity::VendorInvoice);
    }
}
