//! # Sensor Input Module
//!
//! Routes text readings of the form `<path> <value>` to the encoder field
//! they belong to, for example:
//!
//! ```text
//! engine.0.speed 1500
//! engine.0.low_oil_level true
//! tank.1.level 0.42
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. A bad line is logged
//! and dropped; it never stops the feed.

use std::collections::BTreeMap;
use std::rc::Rc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use crate::error::InputError;
use crate::flow::Consumer;

/// Typed destination of one input path
enum Sink {
    /// Physical value (rpm, Pa, K, V, L/h, s, ratio)
    Number(Rc<dyn Consumer<f64>>),
    /// Signed percentage
    Percent(Rc<dyn Consumer<i8>>),
    /// Alarm or indicator
    Flag(Rc<dyn Consumer<bool>>),
}

impl Sink {
    fn deliver(&self, path: &str, text: &str) -> Result<(), InputError> {
        let invalid = || InputError::InvalidValue {
            path: path.to_string(),
            value: text.to_string(),
        };

        match self {
            Sink::Number(consumer) => consumer.set_input(text.parse().map_err(|_| invalid())?),
            Sink::Percent(consumer) => consumer.set_input(text.parse().map_err(|_| invalid())?),
            Sink::Flag(consumer) => consumer.set_input(parse_flag(text).ok_or_else(invalid)?),
        }
        Ok(())
    }
}

fn parse_flag(text: &str) -> Option<bool> {
    match text {
        "1" | "true" | "on" => Some(true),
        "0" | "false" | "off" => Some(false),
        _ => None,
    }
}

/// Path table from reading names to encoder inputs
#[derive(Default)]
pub struct InputRouter {
    sinks: BTreeMap<String, Sink>,
}

impl std::fmt::Debug for InputRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputRouter")
            .field("paths", &self.sinks.len())
            .finish()
    }
}

/// Counters returned when the feed ends
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FeedStats {
    pub accepted: u64,
    pub rejected: u64,
}

impl InputRouter {
    /// Create an empty router
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a numeric input
    ///
    /// # Errors
    ///
    /// Returns [`InputError::DuplicatePath`] if the path is taken
    pub fn register_number(&mut self, path: impl Into<String>, consumer: Rc<dyn Consumer<f64>>) -> Result<(), InputError> {
        self.insert(path.into(), Sink::Number(consumer))
    }

    /// Register a percentage input
    ///
    /// # Errors
    ///
    /// Returns [`InputError::DuplicatePath`] if the path is taken
    pub fn register_percent(&mut self, path: impl Into<String>, consumer: Rc<dyn Consumer<i8>>) -> Result<(), InputError> {
        self.insert(path.into(), Sink::Percent(consumer))
    }

    /// Register a boolean input
    ///
    /// # Errors
    ///
    /// Returns [`InputError::DuplicatePath`] if the path is taken
    pub fn register_flag(&mut self, path: impl Into<String>, consumer: Rc<dyn Consumer<bool>>) -> Result<(), InputError> {
        self.insert(path.into(), Sink::Flag(consumer))
    }

    fn insert(&mut self, path: String, sink: Sink) -> Result<(), InputError> {
        if self.sinks.contains_key(&path) {
            return Err(InputError::DuplicatePath(path));
        }
        self.sinks.insert(path, sink);
        Ok(())
    }

    /// Registered paths, sorted
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.sinks.keys().map(String::as_str)
    }

    /// Number of registered paths
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether no path is registered
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Parse one `<path> <value>` line and deliver the value
    ///
    /// # Errors
    ///
    /// Returns error if the line is malformed, the path is unknown or the
    /// value does not parse
    pub fn dispatch(&self, line: &str) -> Result<(), InputError> {
        let mut tokens = line.split_whitespace();
        let (path, value) = match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(path), Some(value), None) => (path, value),
            _ => return Err(InputError::Malformed(line.to_string())),
        };

        let sink = self
            .sinks
            .get(path)
            .ok_or_else(|| InputError::UnknownPath(path.to_string()))?;
        sink.deliver(path, value)?;
        debug!("{} <- {}", path, value);
        Ok(())
    }
}

/// Feed lines from `reader` into the router until end of input
///
/// Lines that are not valid UTF-8 count as rejected like any other bad line.
///
/// # Errors
///
/// Returns error if reading fails
pub async fn pump<R>(mut reader: R, router: &InputRouter) -> std::io::Result<FeedStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut stats = FeedStats::default();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim(),
            Err(e) => {
                stats.rejected += 1;
                warn!("Dropping input: not UTF-8 ({})", e);
                continue;
            }
        };
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match router.dispatch(line) {
            Ok(()) => stats.accepted += 1,
            Err(e) => {
                stats.rejected += 1;
                warn!("Dropping input: {}", e);
            }
        }
    }

    info!(
        "Input closed ({} readings accepted, {} rejected)",
        stats.accepted, stats.rejected
    );
    Ok(stats)
}
