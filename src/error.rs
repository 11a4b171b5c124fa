// SPDX-License-Identifier: MPL-2.0
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Io(String),
    Config(String),
    Geometry(GeometryError),
}

/// Geometry failures that cannot produce a meaningful number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeometryError {
    /// One of the rays has zero length (a touch point sits on the gesture center).
    DegenerateVector,
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::DegenerateVector => write!(f, "zero-length vector"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O Error: {}", e),
            Error::Config(e) => write!(f, "Config Error: {}", e),
            Error::Geometry(e) => write!(f, "Geometry Error: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl std::error::Error for GeometryError {}

impl From<GeometryError> for Error {
    fn from(err: GeometryError) -> Self {
        Error::Geometry(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
