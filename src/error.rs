//! # Error Types
//!
//! Custom error types for N2K Bridge using `thiserror`.

use thiserror::Error;

/// Main error type for N2K Bridge
#[derive(Debug, Error)]
pub enum N2kBridgeError {
    /// NMEA 2000 message construction errors
    #[error("NMEA 2000 protocol error: {0}")]
    Protocol(String),

    /// Configuration file errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Encoder configuration errors
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Dataflow wiring errors
    #[error(transparent)]
    Flow(#[from] FlowError),

    /// Sensor input errors
    #[error(transparent)]
    Input(#[from] InputError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised when applying a configuration map to an encoder.
///
/// All of them are reported before the encoder is touched, so a failed
/// `set_configuration` leaves the previous parameters in place.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// A required key is absent
    #[error("missing configuration key `{0}`")]
    MissingKey(String),

    /// An enum-valued key holds a string outside the fixed table
    #[error("unknown value `{value}` for `{key}`")]
    UnknownEnumValue { key: String, value: String },

    /// A key holds a value of the wrong type or out of range
    #[error("invalid value for `{key}`: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Errors raised by the dataflow primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// Channel or slot index beyond the configured width
    #[error("index {index} out of range for width {width}")]
    IndexOutOfRange { index: usize, width: usize },

    /// A status slot already has its single writer
    #[error("slot {0} already has a writer")]
    SlotAlreadyClaimed(usize),
}

/// Errors raised while routing a sensor reading to its encoder input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// The line is not `<path> <value>`
    #[error("malformed input line `{0}`")]
    Malformed(String),

    /// No input is registered under this path
    #[error("unknown input `{0}`")]
    UnknownPath(String),

    /// The value does not parse as the input's type
    #[error("invalid value `{value}` for `{path}`")]
    InvalidValue { path: String, value: String },

    /// Two encoders tried to register the same path
    #[error("input `{0}` is already registered")]
    DuplicatePath(String),
}

/// A category string that matches no entry of its table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category `{0}`")]
pub struct UnknownCategory(pub String);

/// Result type alias for N2K Bridge
pub type Result<T> = std::result::Result<T, N2kBridgeError>;
