//! # Transport Module
//!
//! Sinks that receive the logical NMEA 2000 messages produced by the
//! encoders.
//!
//! This module handles:
//! - The fire-and-forget [`Transport`] interface
//! - Logging every message through `tracing` ([`LogTransport`])
//! - Capturing messages to a JSON Lines file ([`jsonl::JsonlTransport`])
//! - Keeping messages in memory ([`RecordingTransport`])
//!
//! A transport never reports failure back to the encoder: there is no
//! acknowledgment, retry or queueing.

pub mod jsonl;

use tracing::debug;

use crate::n2k::N2kMessage;

/// Destination for encoded messages
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    /// Hand a message to the bus. Must not block.
    fn send(&mut self, message: &N2kMessage);
}

/// Transport that logs each message at debug level
#[derive(Debug, Default)]
pub struct LogTransport {
    sent: u64,
}

impl LogTransport {
    /// Create a log transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages seen
    pub fn sent(&self) -> u64 {
        self.sent
    }
}

impl Transport for LogTransport {
    fn send(&mut self, message: &N2kMessage) {
        self.sent += 1;
        debug!(
            "PGN {} prio {} ({} bytes): {}",
            message.pgn,
            message.priority,
            message.payload.len(),
            message.to_hex()
        );
    }
}

/// Transport that keeps every message in memory
#[derive(Debug, Default, Clone)]
pub struct RecordingTransport {
    messages: Vec<N2kMessage>,
}

impl RecordingTransport {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages in send order
    pub fn messages(&self) -> &[N2kMessage] {
        &self.messages
    }

    /// Messages with the given PGN, in send order
    pub fn with_pgn(&self, pgn: u32) -> Vec<&N2kMessage> {
        self.messages.iter().filter(|m| m.pgn == pgn).collect()
    }

    /// Drop everything recorded so far
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl Transport for RecordingTransport {
    fn send(&mut self, message: &N2kMessage) {
        self.messages.push(message.clone());
    }
}
