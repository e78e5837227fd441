//! # Status Board
//!
//! A fixed set of boolean status slots (alarm lamps, for example) that
//! several components read, where each slot has exactly one writer.
//!
//! Writers are handed out by [`StatusBoard::writer`]; asking twice for the
//! same slot fails, so the single-writer rule holds by construction.

use std::cell::RefCell;
use std::rc::Rc;

use super::Consumer;
use crate::error::FlowError;

/// Owned array of boolean status slots
#[derive(Debug)]
pub struct StatusBoard<const N: usize> {
    slots: RefCell<[bool; N]>,
    claimed: RefCell<[bool; N]>,
}

impl<const N: usize> Default for StatusBoard<N> {
    fn default() -> Self {
        Self {
            slots: RefCell::new([false; N]),
            claimed: RefCell::new([false; N]),
        }
    }
}

impl<const N: usize> StatusBoard<N> {
    /// Create a board with all slots clear
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Claim the writer for `index`.
    ///
    /// # Errors
    ///
    /// - [`FlowError::IndexOutOfRange`] if `index >= N`
    /// - [`FlowError::SlotAlreadyClaimed`] if the slot already has a writer
    pub fn writer(self: &Rc<Self>, index: usize) -> Result<StatusWriter<N>, FlowError> {
        let mut claimed = self.claimed.borrow_mut();
        let taken = claimed
            .get_mut(index)
            .ok_or(FlowError::IndexOutOfRange { index, width: N })?;
        if *taken {
            return Err(FlowError::SlotAlreadyClaimed(index));
        }
        *taken = true;

        Ok(StatusWriter {
            board: Rc::clone(self),
            index,
        })
    }

    /// Value of one slot, `None` if out of range
    pub fn get(&self, index: usize) -> Option<bool> {
        self.slots.borrow().get(index).copied()
    }

    /// Copy of every slot
    pub fn snapshot(&self) -> [bool; N] {
        *self.slots.borrow()
    }

    /// One character per slot: `*` when set, `_` when clear
    pub fn render(&self) -> String {
        self.slots
            .borrow()
            .iter()
            .map(|&set| if set { '*' } else { '_' })
            .collect()
    }
}

/// The single writer of one [`StatusBoard`] slot
#[derive(Debug)]
pub struct StatusWriter<const N: usize> {
    board: Rc<StatusBoard<N>>,
    index: usize,
}

impl<const N: usize> StatusWriter<N> {
    /// Slot this writer owns
    pub fn index(&self) -> usize {
        self.index
    }

    /// Set the slot
    pub fn set(&self, value: bool) {
        self.board.slots.borrow_mut()[self.index] = value;
    }
}

impl<const N: usize> Consumer<bool> for StatusWriter<N> {
    fn set_input(&self, value: bool) {
        self.set(value);
    }
}

impl<const N: usize> Drop for StatusWriter<N> {
    fn drop(&mut self) {
        self.board.claimed.borrow_mut()[self.index] = false;
    }
}
