use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::LedgerError;
use crate::ledger::{AccountId, Amount, LedgerEvent, Loan, LoanBook, LoanSnapshot};
use crate::notify::NotificationBus;

struct Inner {
    book: LoanBook,
    bus: NotificationBus,
}

/// Cloneable handle giving serialized access to one loan book.
///
/// Every operation holds the lock for the whole read-check-write sequence,
/// so calls are globally serialized and the journal entry, the state write,
/// and the subscriber fan-out commit together. A rejected precondition
/// releases the lock with the book untouched and nothing emitted.
#[derive(Clone)]
pub struct LedgerService {
    inner: Arc<Mutex<Inner>>,
}

impl LedgerService {
    /// Create a service around a fresh book owned by `owner`.
    pub fn new(owner: impl Into<AccountId>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                book: LoanBook::new(owner),
                bus: NotificationBus::new(),
            })),
        }
    }

    /// Attach a listener that sees every subsequent notification.
    pub fn subscribe(&self) -> Receiver<LedgerEvent> {
        self.lock().bus.subscribe()
    }

    pub fn request_loan(
        &self,
        caller: &AccountId,
        amount: Amount,
        interest_rate: u64,
        duration: u64,
    ) -> Result<LedgerEvent, LedgerError> {
        let mut inner = self.lock();
        let event = inner
            .book
            .request_loan(caller, amount, interest_rate, duration)?;
        inner.bus.emit(&event);
        Ok(event)
    }

    pub fn approve_loan(
        &self,
        caller: &AccountId,
        borrower: &AccountId,
    ) -> Result<LedgerEvent, LedgerError> {
        let mut inner = self.lock();
        let event = inner.book.approve_loan(caller, borrower)?;
        inner.bus.emit(&event);
        Ok(event)
    }

    /// Current record for `borrower`, if any.
    pub fn loan_of(&self, borrower: &AccountId) -> Option<Loan> {
        self.lock().book.loan_of(borrower).cloned()
    }

    pub fn owner(&self) -> AccountId {
        self.lock().book.owner().clone()
    }

    pub fn snapshot(&self) -> LoanSnapshot {
        self.lock().book.snapshot()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("ledger lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::TryRecvError;
    use std::thread;

    #[test]
    fn request_then_approve_notifies_in_order() {
        let service = LedgerService::new("owner");
        assert_eq!(service.owner(), "owner");
        let events = service.subscribe();
        service
            .request_loan(&"alice".to_string(), 1_000, 5, 30)
            .unwrap();
        service
            .approve_loan(&"owner".to_string(), &"alice".to_string())
            .unwrap();
        assert_eq!(
            events.recv().unwrap(),
            LedgerEvent::LoanRequested {
                borrower: "alice".into(),
                amount: 1_000,
                interest_rate: 5,
                duration: 30,
            }
        );
        assert_eq!(
            events.recv().unwrap(),
            LedgerEvent::LoanApproved {
                borrower: "alice".into()
            }
        );
        assert!(service.loan_of(&"alice".to_string()).unwrap().approved);
    }

    #[test]
    fn rejected_calls_notify_nothing() {
        let service = LedgerService::new("owner");
        service
            .request_loan(&"alice".to_string(), 1_000, 5, 30)
            .unwrap();
        let events = service.subscribe();
        service
            .request_loan(&"alice".to_string(), 2_000, 3, 10)
            .unwrap_err();
        service
            .approve_loan(&"bob".to_string(), &"alice".to_string())
            .unwrap_err();
        service
            .approve_loan(&"owner".to_string(), &"carol".to_string())
            .unwrap_err();
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn concurrent_requests_for_distinct_borrowers_all_land() {
        let service = LedgerService::new("owner");
        let handles: Vec<_> = (0..8)
            .map(|idx| {
                let service = service.clone();
                thread::spawn(move || {
                    let borrower = format!("borrower-{idx}");
                    service.request_loan(&borrower, 100 + idx, 5, 30).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let snapshot = service.snapshot();
        assert_eq!(snapshot.loans.len(), 8);
        assert_eq!(snapshot.events.len(), 8);
    }

    #[test]
    fn duplicate_guard_holds_under_concurrency() {
        let service = LedgerService::new("owner");
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                thread::spawn(move || {
                    service
                        .request_loan(&"alice".to_string(), 1_000, 5, 30)
                        .is_ok()
                })
            })
            .collect();
        let successes = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|accepted| *accepted)
            .count();
        assert_eq!(successes, 1);
        assert_eq!(service.snapshot().events.len(), 1);
    }
}
