//! # Dataflow Module
//!
//! Minimal push-based plumbing used between sensor producers and encoders.
//!
//! This module handles:
//! - Consumer/emitter edges (synchronous, unbuffered delivery)
//! - Time-bounded readings ([`ExpiringField`])
//! - Update-rate limiting ([`RateLimiter`])
//! - Boolean OR-merge across channels ([`AnyMerge`])
//! - Owned status slots with one writer each ([`StatusBoard`])

pub mod any_merge;
pub mod expiring;
pub mod rate_limiter;
pub mod status_board;

pub use any_merge::AnyMerge;
pub use expiring::ExpiringField;
pub use rate_limiter::RateLimiter;
pub use status_board::StatusBoard;

use std::cell::RefCell;
use std::rc::Rc;

/// Receiving end of a dataflow edge
pub trait Consumer<T> {
    /// Deliver a value. Runs synchronously; there is no back-pressure.
    fn set_input(&self, value: T);
}

impl<T, F> Consumer<T> for F
where
    F: Fn(T),
{
    fn set_input(&self, value: T) {
        self(value)
    }
}

/// Sending end of a dataflow edge.
///
/// Values are delivered to every connected consumer in connection order.
pub struct Emitter<T> {
    consumers: RefCell<Vec<Rc<dyn Consumer<T>>>>,
}

impl<T> Default for Emitter<T> {
    fn default() -> Self {
        Self {
            consumers: RefCell::new(Vec::new()),
        }
    }
}

impl<T> std::fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("consumers", &self.consumers.borrow().len())
            .finish()
    }
}

impl<T: Clone> Emitter<T> {
    /// Create an emitter with no consumers
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a consumer
    pub fn connect_to(&self, consumer: Rc<dyn Consumer<T>>) {
        self.consumers.borrow_mut().push(consumer);
    }

    /// Push a value to every consumer
    pub fn emit(&self, value: T) {
        // Snapshot so a consumer may connect new edges while being notified.
        let consumers: Vec<_> = self.consumers.borrow().iter().cloned().collect();
        for consumer in consumers {
            consumer.set_input(value.clone());
        }
    }

    /// Number of connected consumers
    pub fn consumer_count(&self) -> usize {
        self.consumers.borrow().len()
    }
}
