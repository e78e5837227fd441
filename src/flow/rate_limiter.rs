//! # Rate Limiter
//!
//! Push-through filter that forwards a value only when more than a minimum
//! delay has passed since the last forwarded value. Everything in between is
//! dropped, not queued.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::trace;

use super::{Consumer, Emitter};
use crate::clock::ClockRef;

/// Drops values arriving faster than `min_delay`
pub struct RateLimiter<T> {
    min_delay: Duration,
    last_output: Cell<Option<Instant>>,
    clock: ClockRef,
    output: Emitter<T>,
}

impl<T: Clone> RateLimiter<T> {
    /// Create a rate limiter. The first value pushed is always forwarded.
    pub fn new(min_delay: Duration, clock: ClockRef) -> Self {
        Self {
            min_delay,
            last_output: Cell::new(None),
            clock,
            output: Emitter::new(),
        }
    }

    /// Connect a downstream consumer
    pub fn connect_to(&self, consumer: Rc<dyn Consumer<T>>) {
        self.output.connect_to(consumer);
    }

    /// Offer a value. Forwarded iff the elapsed time is strictly greater
    /// than the minimum delay.
    pub fn push(&self, value: T) {
        let now = self.clock.now();
        let elapsed_enough = match self.last_output.get() {
            Some(last) => now.saturating_duration_since(last) > self.min_delay,
            None => true,
        };

        if elapsed_enough {
            self.last_output.set(Some(now));
            self.output.emit(value);
        } else {
            trace!("Rate limiter dropped value (min delay {:?})", self.min_delay);
        }
    }
}

impl<T: Clone> Consumer<T> for RateLimiter<T> {
    fn set_input(&self, value: T) {
        self.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::cell::RefCell;

    fn limiter(min_delay_ms: u64) -> (Rc<ManualClock>, RateLimiter<u32>, Rc<RefCell<Vec<u32>>>) {
        let clock = ManualClock::new();
        let limiter = RateLimiter::new(Duration::from_millis(min_delay_ms), clock.clone());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        limiter.connect_to(Rc::new(move |v: u32| sink.borrow_mut().push(v)));
        (clock, limiter, seen)
    }

    #[test]
    fn test_drops_values_inside_window() {
        let (clock, limiter, seen) = limiter(1000);

        limiter.push(0);
        clock.advance(Duration::from_millis(500));
        limiter.push(500);
        assert_eq!(*seen.borrow(), vec![0]);

        clock.advance(Duration::from_millis(1000));
        limiter.push(1500);
        assert_eq!(*seen.borrow(), vec![0, 1500]);
    }

    #[test]
    fn test_exact_min_delay_is_dropped() {
        let (clock, limiter, seen) = limiter(1000);

        limiter.push(1);
        clock.advance(Duration::from_millis(1000));
        limiter.push(2);
        assert_eq!(*seen.borrow(), vec![1]);

        clock.advance(Duration::from_millis(1));
        limiter.push(3);
        assert_eq!(*seen.borrow(), vec![1, 3]);
    }

    #[test]
    fn test_dropped_values_do_not_reset_window() {
        let (clock, limiter, seen) = limiter(100);

        limiter.push(1);
        for i in 0..5 {
            clock.advance(Duration::from_millis(20));
            limiter.push(10 + i);
        }
        clock.advance(Duration::from_millis(1));
        limiter.push(99);

        assert_eq!(*seen.borrow(), vec![1, 99]);
    }

    #[test]
    fn test_works_as_consumer() {
        let (_clock, limiter, seen) = limiter(1000);
        let consumer: &dyn Consumer<u32> = &limiter;
        consumer.set_input(5);
        assert_eq!(*seen.borrow(), vec![5]);
    }
}
