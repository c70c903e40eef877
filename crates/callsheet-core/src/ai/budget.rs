//! Shared AI spend counter.
//!
//! One [`AiBudget`] is shared (behind an `Arc`) by every request served by an
//! extractor. Calls and tokens are reserved before an AI call with a single
//! compare-and-swap each, so concurrent requests can never overspend.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::models::config::AiConfig;

/// Tokens and calls held for one AI call.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a reservation must be committed or released"]
pub struct Reservation {
    tokens: u64,
}

impl Reservation {
    /// Tokens held for the call.
    pub fn tokens(&self) -> u64 {
        self.tokens
    }
}

/// Token and call limits with lock-free accounting.
#[derive(Debug)]
pub struct AiBudget {
    token_limit: u64,
    call_limit: u64,
    tokens_used: AtomicU64,
    calls_used: AtomicU64,
}

impl AiBudget {
    pub fn new(token_limit: u64, call_limit: u64) -> Self {
        Self {
            token_limit,
            call_limit,
            tokens_used: AtomicU64::new(0),
            calls_used: AtomicU64::new(0),
        }
    }

    /// A budget that never runs out.
    pub fn unlimited() -> Self {
        Self::new(u64::MAX, u64::MAX)
    }

    pub fn from_config(config: &AiConfig) -> Self {
        Self::new(config.token_budget, config.call_budget)
    }

    pub fn tokens_used(&self) -> u64 {
        self.tokens_used.load(Ordering::Acquire)
    }

    pub fn calls_used(&self) -> u64 {
        self.calls_used.load(Ordering::Acquire)
    }

    pub fn remaining_tokens(&self) -> u64 {
        self.token_limit.saturating_sub(self.tokens_used())
    }

    pub fn remaining_calls(&self) -> u64 {
        self.call_limit.saturating_sub(self.calls_used())
    }

    /// True when no further call can be reserved.
    pub fn is_exhausted(&self) -> bool {
        self.remaining_calls() == 0 || self.remaining_tokens() == 0
    }

    /// Reserve one call and up to `max_tokens` tokens.
    ///
    /// Returns `None` when the call limit is reached or no tokens are left.
    pub fn try_reserve(&self, max_tokens: u64) -> Option<Reservation> {
        let call_limit = self.call_limit;
        self.calls_used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                (used < call_limit).then_some(used + 1)
            })
            .ok()?;

        let token_limit = self.token_limit;
        let mut reserved = 0;
        let taken = self
            .tokens_used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                reserved = token_limit.saturating_sub(used).min(max_tokens);
                (reserved > 0).then_some(used + reserved)
            });

        if taken.is_err() {
            self.calls_used.fetch_sub(1, Ordering::AcqRel);
            return None;
        }

        Some(Reservation { tokens: reserved })
    }

    /// Settle a reservation with the tokens the call actually spent.
    ///
    /// Unused tokens go back to the pool; overspend is charged.
    pub fn commit(&self, reservation: Reservation, spent: u64) {
        if spent >= reservation.tokens {
            self.tokens_used
                .fetch_add(spent - reservation.tokens, Ordering::AcqRel);
        } else {
            self.give_back(reservation.tokens - spent);
        }
    }

    /// Return a reservation's tokens after a failed call. The call still
    /// counts against the call limit.
    pub fn release(&self, reservation: Reservation) {
        self.give_back(reservation.tokens);
    }

    fn give_back(&self, tokens: u64) {
        let _ = self
            .tokens_used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                Some(used.saturating_sub(tokens))
            });
    }
}

impl Default for AiBudget {
    fn default() -> Self {
        Self::from_config(&AiConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_reserve_commit_release() {
        let budget = AiBudget::new(1000, 10);

        let reservation = budget.try_reserve(400).unwrap();
        assert_eq!(reservation.tokens(), 400);
        assert_eq!(budget.remaining_tokens(), 600);

        budget.commit(reservation, 150);
        assert_eq!(budget.tokens_used(), 150);
        assert_eq!(budget.calls_used(), 1);

        let reservation = budget.try_reserve(400).unwrap();
        budget.release(reservation);
        assert_eq!(budget.tokens_used(), 150);
        assert_eq!(budget.calls_used(), 2);
    }

    #[test]
    fn test_reservation_is_capped_by_remaining_tokens() {
        let budget = AiBudget::new(100, 10);
        let reservation = budget.try_reserve(2000).unwrap();
        assert_eq!(reservation.tokens(), 100);
        assert!(budget.try_reserve(1).is_none());
        // the failed attempt does not consume a call
        assert_eq!(budget.calls_used(), 1);
        budget.commit(reservation, 120);
        assert_eq!(budget.tokens_used(), 120);
        assert_eq!(budget.remaining_tokens(), 0);
    }

    #[test]
    fn test_call_limit() {
        let budget = AiBudget::new(u64::MAX, 2);
        let a = budget.try_reserve(10).unwrap();
        let b = budget.try_reserve(10).unwrap();
        assert!(budget.try_reserve(10).is_none());
        assert!(budget.is_exhausted());
        budget.commit(a, 10);
        budget.commit(b, 10);
    }

    #[test]
    fn test_concurrent_reservations_never_overspend() {
        let budget = Arc::new(AiBudget::new(1_000, 1_000));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let budget = Arc::clone(&budget);
                thread::spawn(move || {
                    let mut granted = 0;
                    while let Some(reservation) = budget.try_reserve(7) {
                        let tokens = reservation.tokens();
                        granted += tokens;
                        budget.commit(reservation, tokens);
                    }
                    granted
                })
            })
            .collect();

        let granted: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(granted, 1_000);
        assert_eq!(budget.tokens_used(), 1_000);
        assert!(budget.is_exhausted());
    }
}
