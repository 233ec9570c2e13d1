//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the
//! application. Every query is scoped to the owning user; a row owned
//! by someone else is indistinguishable from a missing row.

pub mod category;
pub mod client;
pub mod expense;
pub mod invoice;
pub mod payment;
pub mod user;

pub use category::{CategoryError, CategoryRepository, CreateCategoryInput, UpdateCategoryInput};
pub use client::{ClientError, ClientRepository, CreateClientInput, UpdateClientInput};
pub use expense::{CreateExpenseInput, ExpenseError, ExpenseFilter, ExpenseRepository, UpdateExpenseInput};
pub use invoice::{
    CreateInvoiceInput, InvoiceDetail, InvoiceError, InvoiceFilter, InvoicePdfPayload,
    InvoiceRepository, InvoiceWithItems, UpdateInvoiceInput,
};
pub use payment::{PaymentError, PaymentRepository, RecordPaymentInput, UpdatePaymentInput};
pub use user::UserRepository;
