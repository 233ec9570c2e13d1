//! Integration tests for the payment repository.
//!
//! Covers the balance invariant, the status transitions driven by
//! recording and deleting payments, and payment updates. Requires a
//! running Postgres (set `DATABASE_URL`).

mod common;

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use uuid::Uuid;

use facture_core::invoice::{InvoiceStatus as CoreStatus, LineItemInput};
use facture_db::entities::sea_orm_active_enums::{InvoiceStatus, PaymentMethod};
use facture_db::repositories::invoice::{CreateInvoiceInput, InvoiceRepository};
use facture_db::repositories::payment::{
    PaymentError, PaymentRepository, RecordPaymentInput, UpdatePaymentInput,
};

/// Creates a DRAFT invoice totalling 110.00 (100 + 10% tax).
async fn create_invoice(
    repo: &InvoiceRepository,
    user_id: Uuid,
    client_id: Uuid,
) -> facture_db::entities::invoices::Model {
    let today = Utc::now().date_naive();
    let input = CreateInvoiceInput {
        user_id,
        client_id,
        issue_date: today,
        due_date: today + Duration::days(30),
        tax_rate: dec!(10),
        currency: "USD".to_string(),
        notes: None,
        items: vec![LineItemInput {
            description: "Retainer".to_string(),
            quantity: dec!(1),
            unit_price: dec!(100),
        }],
    };
    repo.create(input, today)
        .await
        .expect("Failed to create invoice")
        .invoice
}

fn payment(amount: rust_decimal::Decimal) -> RecordPaymentInput {
    RecordPaymentInput {
        amount,
        payment_date: Utc::now().date_naive(),
        payment_method: PaymentMethod::BankTransfer,
        notes: None,
    }
}

// ============================================================================
// Test: Partial payment on a DRAFT invoice moves it to SENT
// ============================================================================
#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_partial_payment_moves_draft_to_sent() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let client = common::create_client(&db, user.id).await;
    let invoices = InvoiceRepository::new(db.clone());
    let payments = PaymentRepository::new(db);

    let invoice = create_invoice(&invoices, user.id, client.id).await;

    payments
        .record(user.id, invoice.id, payment(dec!(40)))
        .await
        .expect("Failed to record payment");

    let detail = invoices
        .find_by_id(user.id, invoice.id)
        .await
        .expect("Failed to reload invoice");
    assert_eq!(detail.invoice.status, InvoiceStatus::Sent);
    assert_eq!(detail.invoice.payment_date, None);
}

// ============================================================================
// Test: Full coverage marks the invoice PAID and stamps payment_date
// ============================================================================
#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_full_payment_marks_paid_and_stamps_date() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let client = common::create_client(&db, user.id).await;
    let invoices = InvoiceRepository::new(db.clone());
    let payments = PaymentRepository::new(db);

    let invoice = create_invoice(&invoices, user.id, client.id).await;
    let pay_date = Utc::now().date_naive();

    payments
        .record(user.id, invoice.id, payment(dec!(60)))
        .await
        .expect("Failed to record first payment");
    payments
        .record(user.id, invoice.id, payment(dec!(50)))
        .await
        .expect("Failed to record second payment");

    let detail = invoices
        .find_by_id(user.id, invoice.id)
        .await
        .expect("Failed to reload invoice");
    assert_eq!(detail.invoice.status, InvoiceStatus::Paid);
    assert_eq!(detail.invoice.payment_date, Some(pay_date));
    assert_eq!(detail.payments.len(), 2);
}

// ============================================================================
// Test: Overpayment is rejected with the exact remaining balance
// ============================================================================
#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_overpayment_rejected_with_remaining() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let client = common::create_client(&db, user.id).await;
    let invoices = InvoiceRepository::new(db.clone());
    let payments = PaymentRepository::new(db);

    let invoice = create_invoice(&invoices, user.id, client.id).await;

    payments
        .record(user.id, invoice.id, payment(dec!(70)))
        .await
        .expect("Failed to record payment");

    // Total is 110.00; 70 paid leaves 40.00.
    let result = payments.record(user.id, invoice.id, payment(dec!(50))).await;
    match result {
        Err(PaymentError::Validation(
            facture_core::payment::PaymentError::BalanceExceeded { remaining },
        )) => assert_eq!(remaining, dec!(40.00)),
        other => panic!("Expected BalanceExceeded, got {other:?}"),
    }

    // The rejected payment must not have been stored.
    let listed = payments
        .list_for_invoice(user.id, invoice.id)
        .await
        .expect("Failed to list payments");
    assert_eq!(listed.len(), 1);
}

// ============================================================================
// Test: Non-positive amounts are rejected
// ============================================================================
#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_non_positive_amount_rejected() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let client = common::create_client(&db, user.id).await;
    let invoices = InvoiceRepository::new(db.clone());
    let payments = PaymentRepository::new(db);

    let invoice = create_invoice(&invoices, user.id, client.id).await;

    let result = payments.record(user.id, invoice.id, payment(dec!(0))).await;
    assert!(matches!(result, Err(PaymentError::Validation(_))));
}

// ============================================================================
// Test: Deleting the last payment reverts PAID to SENT and clears the date
// ============================================================================
#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_delete_last_payment_reverts_to_sent() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let client = common::create_client(&db, user.id).await;
    let invoices = InvoiceRepository::new(db.clone());
    let payments = PaymentRepository::new(db);

    let invoice = create_invoice(&invoices, user.id, client.id).await;
    let today = Utc::now().date_naive();

    let recorded = payments
        .record(user.id, invoice.id, payment(dec!(110)))
        .await
        .expect("Failed to record payment");

    payments
        .delete(user.id, recorded.id, today)
        .await
        .expect("Failed to delete payment");

    let detail = invoices
        .find_by_id(user.id, invoice.id)
        .await
        .expect("Failed to reload invoice");
    assert_eq!(detail.invoice.status, InvoiceStatus::Sent);
    assert_eq!(detail.invoice.payment_date, None);
    assert!(detail.payments.is_empty());
}

// ============================================================================
// Test: Deleting the last payment on a past-due invoice reverts to OVERDUE
// ============================================================================
#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_delete_payment_past_due_reverts_to_overdue() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let client = common::create_client(&db, user.id).await;
    let invoices = InvoiceRepository::new(db.clone());
    let payments = PaymentRepository::new(db);

    let today = Utc::now().date_naive();
    let input = CreateInvoiceInput {
        user_id: user.id,
        client_id: client.id,
        issue_date: today - Duration::days(40),
        due_date: today - Duration::days(10),
        tax_rate: dec!(0),
        currency: "USD".to_string(),
        notes: None,
        items: vec![LineItemInput {
            description: "Retainer".to_string(),
            quantity: dec!(1),
            unit_price: dec!(100),
        }],
    };
    let invoice = invoices
        .create(input, today)
        .await
        .expect("Failed to create invoice")
        .invoice;

    let recorded = payments
        .record(user.id, invoice.id, payment(dec!(100)))
        .await
        .expect("Failed to record payment");

    payments
        .delete(user.id, recorded.id, today)
        .await
        .expect("Failed to delete payment");

    let detail = invoices
        .find_by_id(user.id, invoice.id)
        .await
        .expect("Failed to reload invoice");
    assert_eq!(detail.invoice.status, InvoiceStatus::Overdue);
    assert_eq!(detail.invoice.payment_date, None);
}

// ============================================================================
// Test: Amount update re-validates the balance and re-derives status
// ============================================================================
#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_update_amount_revalidates_balance() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let client = common::create_client(&db, user.id).await;
    let invoices = InvoiceRepository::new(db.clone());
    let payments = PaymentRepository::new(db);

    let invoice = create_invoice(&invoices, user.id, client.id).await;

    let first = payments
        .record(user.id, invoice.id, payment(dec!(60)))
        .await
        .expect("Failed to record first payment");
    payments
        .record(user.id, invoice.id, payment(dec!(30)))
        .await
        .expect("Failed to record second payment");

    // 30 already booked elsewhere; raising this one to 90 would exceed 110.
    let over = payments
        .update(
            user.id,
            first.id,
            UpdatePaymentInput {
                amount: Some(dec!(90)),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(over, Err(PaymentError::Validation(_))));

    // Raising it to exactly the remainder completes the invoice.
    payments
        .update(
            user.id,
            first.id,
            UpdatePaymentInput {
                amount: Some(dec!(80)),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to update payment");

    let detail = invoices
        .find_by_id(user.id, invoice.id)
        .await
        .expect("Failed to reload invoice");
    assert_eq!(detail.invoice.status, InvoiceStatus::Paid);
    assert!(detail.invoice.payment_date.is_some());
}

// ============================================================================
// Test: Payments against a CANCELLED invoice are rejected
// ============================================================================
#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_payment_on_cancelled_invoice_rejected() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let client = common::create_client(&db, user.id).await;
    let invoices = InvoiceRepository::new(db.clone());
    let payments = PaymentRepository::new(db);

    let invoice = create_invoice(&invoices, user.id, client.id).await;
    let today = Utc::now().date_naive();

    invoices
        .update_status(user.id, invoice.id, CoreStatus::Cancelled, None, today)
        .await
        .expect("Failed to cancel invoice");

    let result = payments.record(user.id, invoice.id, payment(dec!(10))).await;
    assert!(matches!(result, Err(PaymentError::Invoice(_))));
}
