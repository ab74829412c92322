use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::LedgerError;

pub type AccountId = String;
pub type Amount = u64;

/// A single borrower's loan record.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Loan {
    pub borrower: AccountId,
    pub amount: Amount,
    pub interest_rate: u64,
    pub duration: u64,
    pub approved: bool,
}

/// Journal entry appended alongside every successful mutation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    LoanRequested {
        borrower: AccountId,
        amount: Amount,
        interest_rate: u64,
        duration: u64,
    },
    LoanApproved {
        borrower: AccountId,
    },
}

/// Read-only view of the book with a digest over the loan records.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoanSnapshot {
    pub owner: AccountId,
    pub loans: BTreeMap<AccountId, Loan>,
    pub events: Vec<LedgerEvent>,
    pub digest: [u8; 32],
}

/// The loan book: one owner fixed at construction, at most one loan record
/// per borrower, and the journal of every mutation applied so far.
///
/// Records are never deleted. Per borrower the reachable states are
/// absent, pending, and approved, in that order.
pub struct LoanBook {
    owner: AccountId,
    loans: BTreeMap<AccountId, Loan>,
    events: Vec<LedgerEvent>,
}

impl LoanBook {
    /// Create a book owned by `owner`. The owner is fixed for the book's
    /// lifetime.
    pub fn new(owner: impl Into<AccountId>) -> Self {
        Self {
            owner: owner.into(),
            loans: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    pub fn owner(&self) -> &AccountId {
        &self.owner
    }

    /// Current record for `borrower`, if any.
    pub fn loan_of(&self, borrower: &AccountId) -> Option<&Loan> {
        self.loans.get(borrower)
    }

    /// Journal of every mutation applied so far, oldest first.
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Register a new loan request from `caller`.
    ///
    /// A record counts as present only while its stored `amount` is non-zero:
    /// a zero-amount request succeeds, is journaled, and does not arm the
    /// duplicate guard, so a later request from the same borrower overwrites
    /// it.
    pub fn request_loan(
        &mut self,
        caller: &AccountId,
        amount: Amount,
        interest_rate: u64,
        duration: u64,
    ) -> Result<LedgerEvent, LedgerError> {
        if self
            .loans
            .get(caller)
            .map_or(false, |loan| loan.amount > 0)
        {
            return Err(LedgerError::DuplicateRequest {
                borrower: caller.clone(),
            });
        }
        self.loans.insert(
            caller.clone(),
            Loan {
                borrower: caller.clone(),
                amount,
                interest_rate,
                duration,
                approved: false,
            },
        );
        let event = LedgerEvent::LoanRequested {
            borrower: caller.clone(),
            amount,
            interest_rate,
            duration,
        };
        self.events.push(event.clone());
        Ok(event)
    }

    /// Mark `borrower`'s loan approved. Only the owner may approve.
    ///
    /// There is no guard on the current flag: re-approving an already
    /// approved loan succeeds and is journaled again.
    pub fn approve_loan(
        &mut self,
        caller: &AccountId,
        borrower: &AccountId,
    ) -> Result<LedgerEvent, LedgerError> {
        if caller != &self.owner {
            return Err(LedgerError::Unauthorized {
                caller: caller.clone(),
            });
        }
        let loan = self
            .loans
            .get_mut(borrower)
            .filter(|loan| loan.amount > 0)
            .ok_or_else(|| LedgerError::NotFound {
                borrower: borrower.clone(),
            })?;
        loan.approved = true;
        let event = LedgerEvent::LoanApproved {
            borrower: borrower.clone(),
        };
        self.events.push(event.clone());
        Ok(event)
    }

    pub fn snapshot(&self) -> LoanSnapshot {
        LoanSnapshot {
            owner: self.owner.clone(),
            loans: self.loans.clone(),
            events: self.events.clone(),
            digest: compute_digest(&self.loans),
        }
    }
}

fn compute_digest(loans: &BTreeMap<AccountId, Loan>) -> [u8; 32] {
    let mut leaves: Vec<[u8; 32]> = Vec::new();
    for (borrower, loan) in loans {
        let mut hasher = Sha256::new();
        hasher.update(b"loan");
        hasher.update(borrower.as_bytes());
        hasher.update(loan.amount.to_le_bytes());
        hasher.update(loan.interest_rate.to_le_bytes());
        hasher.update(loan.duration.to_le_bytes());
        hasher.update([loan.approved as u8]);
        leaves.push(hasher.finalize().into());
    }
    build_merkle(leaves)
}

fn build_merkle(mut leaves: Vec<[u8; 32]>) -> [u8; 32] {
    if leaves.is_empty() {
        return Sha256::digest(b"loanbook-empty").into();
    }
    while leaves.len() > 1 {
        let mut next = Vec::with_capacity((leaves.len() + 1) / 2);
        for chunk in leaves.chunks(2) {
            let mut hasher = Sha256::new();
            hasher.update(b"node");
            hasher.update(&chunk[0]);
            if chunk.len() == 2 {
                hasher.update(&chunk[1]);
            } else {
                hasher.update(&chunk[0]);
            }
            next.push(hasher.finalize().into());
        }
        leaves = next;
    }
    leaves[0]
}
