use std::sync::mpsc::{channel, Receiver, Sender};

use crate::ledger::LedgerEvent;

/// Fan-out of ledger events to external subscribers.
///
/// A subscriber sees every event emitted after it joins. Dropping the
/// receiving end unsubscribes; the dead sender is pruned on the next emit.
#[derive(Default)]
pub struct NotificationBus {
    subscribers: Vec<Sender<LedgerEvent>>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener and hand back its receiving end.
    pub fn subscribe(&mut self) -> Receiver<LedgerEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber.
    pub fn emit(&mut self, event: &LedgerEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> LedgerEvent {
        LedgerEvent::LoanApproved {
            borrower: "alice".into(),
        }
    }

    #[test]
    fn subscribers_receive_emitted_events() {
        let mut bus = NotificationBus::new();
        let first = bus.subscribe();
        let second = bus.subscribe();
        bus.emit(&sample_event());
        assert_eq!(first.recv().unwrap(), sample_event());
        assert_eq!(second.recv().unwrap(), sample_event());
    }

    #[test]
    fn dropped_subscribers_are_pruned_on_emit() {
        let mut bus = NotificationBus::new();
        let kept = bus.subscribe();
        let dropped = bus.subscribe();
        drop(dropped);
        bus.emit(&sample_event());
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(kept.recv().unwrap(), sample_event());
    }
}
