//! Integration tests for the invoice repository.
//!
//! Covers creation with computed totals and number allocation, item
//! replacement on update, the PAID edit/delete guards, and the overdue
//! sweep. Requires a running Postgres (set `DATABASE_URL`).

mod common;

use chrono::{Datelike, Duration, Utc};
use rust_decimal_macros::dec;
use uuid::Uuid;

use facture_core::invoice::{
    InvoiceStatus as CoreStatus, LineItemInput, format_number, parse_sequence,
};
use facture_db::entities::sea_orm_active_enums::InvoiceStatus;
use facture_db::repositories::invoice::{
    CreateInvoiceInput, InvoiceError, InvoiceFilter, InvoiceRepository, UpdateInvoiceInput,
};

fn sample_items() -> Vec<LineItemInput> {
    vec![
        LineItemInput {
            description: "Consulting".to_string(),
            quantity: dec!(2),
            unit_price: dec!(10.005),
        },
    ]
}

fn create_input(user_id: Uuid, client_id: Uuid, items: Vec<LineItemInput>) -> CreateInvoiceInput {
    let today = Utc::now().date_naive();
    CreateInvoiceInput {
        user_id,
        client_id,
        issue_date: today,
        due_date: today + Duration::days(30),
        tax_rate: dec!(10),
        currency: "USD".to_string(),
        notes: None,
        items,
    }
}

// ============================================================================
// Test: Create computes rounded totals and allocates a number
// ============================================================================
#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_create_computes_totals_and_allocates_number() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let client = common::create_client(&db, user.id).await;
    let repo = InvoiceRepository::new(db);

    let today = Utc::now().date_naive();
    let created = repo
        .create(create_input(user.id, client.id, sample_items()), today)
        .await
        .expect("Failed to create invoice");

    // 2 x 10.005 rounds per line to 20.01, tax 10% -> 2.00
    assert_eq!(created.invoice.subtotal, dec!(20.01));
    assert_eq!(created.invoice.tax_amount, dec!(2.00));
    assert_eq!(created.invoice.total, dec!(22.01));
    assert_eq!(created.invoice.status, InvoiceStatus::Draft);
    assert_eq!(created.invoice.payment_date, None);
    assert_eq!(created.items.len(), 1);
    assert_eq!(created.items[0].total, dec!(20.01));

    let sequence = parse_sequence(&created.invoice.invoice_number)
        .expect("Number should match INV-YYYY-NNNN");
    assert!(sequence >= 1);
    assert!(created
        .invoice
        .invoice_number
        .starts_with(&format!("INV-{}-", today.year())));
}

// ============================================================================
// Test: Numbers increment per owner
// ============================================================================
#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_numbers_increment_per_owner() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let client = common::create_client(&db, user.id).await;
    let repo = InvoiceRepository::new(db);

    let today = Utc::now().date_naive();
    let first = repo
        .create(create_input(user.id, client.id, sample_items()), today)
        .await
        .expect("Failed to create first invoice");
    let second = repo
        .create(create_input(user.id, client.id, sample_items()), today)
        .await
        .expect("Failed to create second invoice");

    let first_seq = parse_sequence(&first.invoice.invoice_number).unwrap();
    let second_seq = parse_sequence(&second.invoice.invoice_number).unwrap();
    assert_eq!(second_seq, first_seq + 1);
}

// ============================================================================
// Test: Sequences stay dense across owners despite global uniqueness
// ============================================================================
#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_numbers_stay_dense_across_owners() {
    let db = common::connect().await;
    let first_owner = common::create_user(&db).await;
    let first_client = common::create_client(&db, first_owner.id).await;
    let second_owner = common::create_user(&db).await;
    let second_client = common::create_client(&db, second_owner.id).await;
    let repo = InvoiceRepository::new(db);

    let today = Utc::now().date_naive();
    let first = repo
        .create(
            create_input(first_owner.id, first_client.id, sample_items()),
            today,
        )
        .await
        .expect("Failed to create first owner's invoice");

    // The second owner has no invoices, so their own sequence starts
    // at 1 — which the first owner may already hold globally. The
    // allocator must bump past taken numbers to the next free
    // sequence, not drop to the timestamp fallback.
    let second = repo
        .create(
            create_input(second_owner.id, second_client.id, sample_items()),
            today,
        )
        .await
        .expect("Failed to create second owner's invoice");

    let first_seq = parse_sequence(&first.invoice.invoice_number).unwrap();
    assert_eq!(
        second.invoice.invoice_number,
        format_number(today.year(), first_seq + 1)
    );
}

// ============================================================================
// Test: Update replaces items and recomputes totals
// ============================================================================
#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_update_replaces_items_and_recomputes_totals() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let client = common::create_client(&db, user.id).await;
    let repo = InvoiceRepository::new(db);

    let today = Utc::now().date_naive();
    let created = repo
        .create(create_input(user.id, client.id, sample_items()), today)
        .await
        .expect("Failed to create invoice");

    let patch = UpdateInvoiceInput {
        items: Some(vec![
            LineItemInput {
                description: "Design".to_string(),
                quantity: dec!(3),
                unit_price: dec!(50),
            },
            LineItemInput {
                description: "Hosting".to_string(),
                quantity: dec!(1),
                unit_price: dec!(25.50),
            },
        ]),
        ..Default::default()
    };
    let updated = repo
        .update(user.id, created.invoice.id, patch)
        .await
        .expect("Failed to update invoice");

    assert_eq!(updated.invoice.subtotal, dec!(175.50));
    assert_eq!(updated.invoice.tax_amount, dec!(17.55));
    assert_eq!(updated.invoice.total, dec!(193.05));
    assert_eq!(updated.items.len(), 2);

    // Old item rows are gone, replaced wholesale.
    let detail = repo
        .find_by_id(user.id, created.invoice.id)
        .await
        .expect("Failed to reload invoice");
    assert_eq!(detail.items.len(), 2);
    assert_eq!(detail.items[0].description, "Design");
}

// ============================================================================
// Test: PAID invoices reject edits and deletion
// ============================================================================
#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_paid_invoice_rejects_edit_and_delete() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let client = common::create_client(&db, user.id).await;
    let repo = InvoiceRepository::new(db);

    let today = Utc::now().date_naive();
    let created = repo
        .create(create_input(user.id, client.id, sample_items()), today)
        .await
        .expect("Failed to create invoice");

    let marked = repo
        .update_status(user.id, created.invoice.id, CoreStatus::Paid, None, today)
        .await
        .expect("Failed to mark invoice paid");
    assert_eq!(marked.status, InvoiceStatus::Paid);
    assert_eq!(marked.payment_date, Some(today));

    let edit = repo
        .update(user.id, created.invoice.id, UpdateInvoiceInput::default())
        .await;
    assert!(matches!(edit, Err(InvoiceError::Domain(_))));

    let delete = repo.delete(user.id, created.invoice.id).await;
    assert!(matches!(delete, Err(InvoiceError::Domain(_))));
}

// ============================================================================
// Test: CANCELLED invoices are terminal
// ============================================================================
#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_cancelled_invoice_rejects_status_change() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let client = common::create_client(&db, user.id).await;
    let repo = InvoiceRepository::new(db);

    let today = Utc::now().date_naive();
    let created = repo
        .create(create_input(user.id, client.id, sample_items()), today)
        .await
        .expect("Failed to create invoice");

    repo.update_status(user.id, created.invoice.id, CoreStatus::Cancelled, None, today)
        .await
        .expect("Failed to cancel invoice");

    let reopen = repo
        .update_status(user.id, created.invoice.id, CoreStatus::Sent, None, today)
        .await;
    assert!(matches!(reopen, Err(InvoiceError::Domain(_))));
}

// ============================================================================
// Test: Ownership scoping hides other users' invoices
// ============================================================================
#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_invoices_scoped_to_owner() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let stranger = common::create_user(&db).await;
    let client = common::create_client(&db, user.id).await;
    let repo = InvoiceRepository::new(db);

    let today = Utc::now().date_naive();
    let created = repo
        .create(create_input(user.id, client.id, sample_items()), today)
        .await
        .expect("Failed to create invoice");

    let lookup = repo.find_by_id(stranger.id, created.invoice.id).await;
    assert!(matches!(lookup, Err(InvoiceError::NotFound(_))));

    let listed = repo
        .list(stranger.id, InvoiceFilter::default())
        .await
        .expect("List should succeed");
    assert!(listed.is_empty());
}

// ============================================================================
// Test: Overdue sweep flips past-due SENT invoices and is idempotent
// ============================================================================
#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_mark_overdue_sweep_is_idempotent() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let client = common::create_client(&db, user.id).await;
    let repo = InvoiceRepository::new(db);

    let today = Utc::now().date_naive();
    let mut input = create_input(user.id, client.id, sample_items());
    input.due_date = today - Duration::days(5);
    let created = repo
        .create(input, today)
        .await
        .expect("Failed to create invoice");

    repo.update_status(user.id, created.invoice.id, CoreStatus::Sent, None, today)
        .await
        .expect("Failed to send invoice");

    let flipped = repo.mark_overdue(today).await.expect("Sweep failed");
    assert!(flipped >= 1);

    let detail = repo
        .find_by_id(user.id, created.invoice.id)
        .await
        .expect("Failed to reload invoice");
    assert_eq!(detail.invoice.status, InvoiceStatus::Overdue);

    // A second sweep must not touch it again.
    repo.mark_overdue(today).await.expect("Second sweep failed");
    let detail = repo
        .find_by_id(user.id, created.invoice.id)
        .await
        .expect("Failed to reload invoice");
    assert_eq!(detail.invoice.status, InvoiceStatus::Overdue);
}
