use thiserror::Error;

use crate::ledger::AccountId;

/// Canonical error type exposed by the loan book operations.
///
/// Every variant is a rejected precondition: the operation observes the
/// current state, refuses, and leaves the book unchanged.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The borrower already holds a stored loan with a non-zero amount.
    #[error("borrower {borrower} already has a recorded loan")]
    DuplicateRequest { borrower: AccountId },

    /// The caller attempting an approval is not the book owner.
    #[error("caller {caller} is not the ledger owner")]
    Unauthorized { caller: AccountId },

    /// The approval target has no stored loan.
    #[error("no loan recorded for borrower {borrower}")]
    NotFound { borrower: AccountId },
}
