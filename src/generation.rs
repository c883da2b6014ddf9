//! Monotonic counters that detect stale asynchronous results.
//!
//! An operation captures a [`Ticket`] when it starts and checks it against
//! the live [`Generation`] when it resolves. Any intervening `advance`
//! invalidates the ticket and the result is discarded.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
pub struct Generation {
    value: u64,
}

impl Generation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidates every outstanding ticket and returns the new current one.
    pub fn advance(&mut self) -> Ticket {
        self.value = self.value.wrapping_add(1);
        Ticket(self.value)
    }

    #[must_use]
    pub fn current(&self) -> Ticket {
        Ticket(self.value)
    }

    #[must_use]
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.value == ticket.0
    }
}
