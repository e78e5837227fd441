//! # Any Merge
//!
//! N-input boolean OR. Keeps the last value of every channel and emits the
//! disjunction after each update, whether or not it changed.

use std::cell::RefCell;
use std::rc::Rc;

use super::{Consumer, Emitter};
use crate::error::FlowError;

/// Boolean OR across `N` channels
pub struct AnyMerge<const N: usize> {
    slots: RefCell<[bool; N]>,
    output: Emitter<bool>,
}

impl<const N: usize> Default for AnyMerge<N> {
    fn default() -> Self {
        Self {
            slots: RefCell::new([false; N]),
            output: Emitter::new(),
        }
    }
}

impl<const N: usize> AnyMerge<N> {
    /// Create a merge with every channel false
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a downstream consumer
    pub fn connect_to(&self, consumer: Rc<dyn Consumer<bool>>) {
        self.output.connect_to(consumer);
    }

    /// Update one channel and emit the OR of all channels.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::IndexOutOfRange`] if `channel >= N`; no slot is
    /// touched and nothing is emitted.
    pub fn set_input(&self, value: bool, channel: usize) -> Result<(), FlowError> {
        let any = {
            let mut slots = self.slots.borrow_mut();
            let slot = slots
                .get_mut(channel)
                .ok_or(FlowError::IndexOutOfRange { index: channel, width: N })?;
            *slot = value;
            slots.iter().any(|&s| s)
        };
        self.output.emit(any);
        Ok(())
    }

    /// Bind a consumer to one channel. The index is checked here, once.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::IndexOutOfRange`] if `channel >= N`.
    pub fn input(self: &Rc<Self>, channel: usize) -> Result<AnyMergeInput<N>, FlowError> {
        if channel >= N {
            return Err(FlowError::IndexOutOfRange { index: channel, width: N });
        }
        Ok(AnyMergeInput {
            merge: Rc::clone(self),
            channel,
        })
    }

    /// Last value seen on every channel
    pub fn slots(&self) -> [bool; N] {
        *self.slots.borrow()
    }
}

/// Consumer feeding a single, pre-validated channel of an [`AnyMerge`]
pub struct AnyMergeInput<const N: usize> {
    merge: Rc<AnyMerge<N>>,
    channel: usize,
}

impl<const N: usize> AnyMergeInput<N> {
    /// Channel this input writes to
    pub fn channel(&self) -> usize {
        self.channel
    }
}

impl<const N: usize> Consumer<bool> for AnyMergeInput<N> {
    fn set_input(&self, value: bool) {
        // `channel` was checked against N when this input was created.
        let _ = self.merge.set_input(value, self.channel);
    }
}
