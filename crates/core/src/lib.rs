//! Core business logic for Facture.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain rules, validation, and calculations live here.
//!
//! # Modules
//!
//! - `invoice` - Totals calculation, numbering, and the status state machine
//! - `payment` - Payment validation and the balance invariant

pub mod invoice;
pub mod payment;
