//! Crate error type.
//!
//! Device operations themselves never fail: an `update()` on an uninitialized
//! device is a no-op, an unknown id yields `None`/`false`. What remains are
//! registration collisions and configuration problems.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A device with this id is already registered.
    #[error("a device with id `{0}` is already registered")]
    DuplicateId(String),

    /// No device with this id (or not of the requested kind).
    #[error("no device with id `{0}`")]
    UnknownDevice(String),

    /// The configuration document is well-formed but not usable.
    #[error("invalid input configuration: {0}")]
    Config(String),

    #[error("failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
