//! # Expiring Field
//!
//! A value paired with a freshness window. Reads after the window return the
//! configured sentinel instead of the last value.

use std::time::{Duration, Instant};

use crate::clock::ClockRef;

/// Time-bounded reading.
///
/// A field that was never updated has no timestamp and always reads as the
/// sentinel, whatever the expiry.
pub struct ExpiringField<T> {
    value: T,
    sentinel: T,
    expiry: Duration,
    last_update: Option<Instant>,
    clock: ClockRef,
}

impl<T: Clone> ExpiringField<T> {
    /// Create a field holding `sentinel` until its first update
    pub fn new(expiry: Duration, sentinel: T, clock: ClockRef) -> Self {
        Self {
            value: sentinel.clone(),
            sentinel,
            expiry,
            last_update: None,
            clock,
        }
    }

    /// Store a new value and stamp it with the current time
    pub fn update(&mut self, value: T) {
        self.value = value;
        self.last_update = Some(self.clock.now());
    }

    /// Current value, or the sentinel once expired
    pub fn get(&self) -> T {
        if self.is_expired() {
            self.sentinel.clone()
        } else {
            self.value.clone()
        }
    }

    /// Whether the value is older than the expiry (or was never set).
    ///
    /// An age exactly equal to the expiry is still fresh.
    pub fn is_expired(&self) -> bool {
        match self.last_update {
            Some(at) => self.clock.elapsed_since(at) > self.expiry,
            None => true,
        }
    }

    /// Freshness window
    pub fn expiry(&self) -> Duration {
        self.expiry
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ExpiringField<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiringField")
            .field("value", &self.value)
            .field("sentinel", &self.sentinel)
            .field("expiry", &self.expiry)
            .field("last_update", &self.last_update)
            .finish_non_exhaustive()
    }
}
