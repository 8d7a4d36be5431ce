//! Error types for kphone-ui
//!
//! Fetch errors leave the affected selector empty; selection errors are shown
//! to the user as a notice and never reach the network.

use thiserror::Error;

/// Main error type for the KeplerPhone client
#[derive(Error, Debug)]
pub enum UiError {
    /// Request could not be sent or the connection failed
    #[error("Network error: {0}")]
    Network(String),

    /// Server answered with a non-success status
    #[error("Server error {0}: {1}")]
    Status(u16, String),

    /// Response body was not the expected JSON shape
    #[error("Malformed response: {0}")]
    Decode(String),

    /// No identifier selected or typed
    #[error("No object identifier selected")]
    EmptyIdentifier,

    /// Identifier cannot be placed in a request path
    #[error("Invalid object identifier: {0:?}")]
    InvalidIdentifier(String),

    /// Scale list not loaded or nothing selected
    #[error("No scale selected")]
    NoScale,

    /// A choice outside the options a selector offers
    #[error("Unknown {control} option: {value}")]
    UnknownOption { control: &'static str, value: String },

    /// Playback is disabled until failed lists are reloaded
    #[error("Playback disabled until the object and scale lists load")]
    PlaybackDisabled,

    /// Playback backend failure
    #[error("Playback error: {0}")]
    Playback(String),

    /// Shared library error
    #[error(transparent)]
    Common(#[from] kphone_common::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using UiError
pub type Result<T> = std::result::Result<T, UiError>;
