//! `SeaORM` entity definitions.

pub mod clients;
pub mod expense_categories;
pub mod expenses;
pub mod invoice_items;
pub mod invoices;
pub mod payments;
pub mod sea_orm_active_enums;
pub mod users;
