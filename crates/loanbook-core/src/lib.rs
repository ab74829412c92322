//! Core state machine for the Loanbook ledger.
//!
//! This crate exposes the building blocks the rest of the stack relies upon:
//!
//! * [`ledger`] — the loan book itself: one record per borrower, two guarded
//!   mutations, and an append-only event journal.
//! * [`notify`] — fan-out of journal events to external subscribers.
//! * [`service`] — serialized, shareable access to a single loan book.
//!
//! The modules are intentionally small and focused so that higher level
//! surfaces (CLI, future services) can drive the ledger without bespoke
//! plumbing in each consumer.

pub mod ledger;
pub mod notify;
pub mod service;

mod error;

pub use error::LedgerError;
