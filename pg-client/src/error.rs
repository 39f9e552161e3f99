//! PostGuard client errors.

use core::{array::TryFromSliceError, num::TryFromIntError};

/// A PostGuard client error.
#[derive(Debug)]
pub enum Error {
    /// The serialized plaintext is too large to be padded.
    PayloadTooLarge {
        /// The length of the serialized plaintext.
        len: usize,
    },
    /// The padded payload is corrupted or does not conform to the format.
    MalformedPayload,
    /// The client has not been initialized with the PKG parameters.
    ModuleNotReady,
    /// The PKG did not hand out a user secret key.
    TokenRequestFailed(String),
    /// The identity verification failed or was abandoned.
    VerificationFailed(String),
    /// The token store failed.
    Store(String),
    /// HTTP transport error.
    Http(reqwest::Error),
    /// An URL could not be constructed.
    InvalidUrl(String),
    /// Serde JSON error.
    Json(serde_json::Error),
    /// Bincode serialization/deserialization error.
    Bincode(bincode::Error),
    /// The bytestream does not conform to the sealed format.
    FormatViolation(String),
    /// The wrong version specifier was found in the preamble.
    IncorrectVersion {
        /// The expected version specifier.
        expected: u16,
        /// The found version specifier,
        found: u16,
    },
    /// Constraint violation.
    ConstraintViolation,
    /// The system clock is set before the UNIX epoch.
    Clock,
    /// Opaque key encapsulation error.
    KEM,
    /// Opaque symmetric encryption error.
    Symmetric,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PayloadTooLarge { len } => {
                write!(f, "payload too large: {len} bytes, must be less than 65534")
            }
            Self::MalformedPayload => write!(f, "malformed payload"),
            Self::ModuleNotReady => write!(f, "client not initialized, call init() first"),
            Self::TokenRequestFailed(s) => write!(f, "key request failed: {s}"),
            Self::VerificationFailed(s) => write!(f, "identity verification failed: {s}"),
            Self::Store(s) => write!(f, "token store error: {s}"),
            Self::Http(e) => write!(f, "HTTP error: {e}"),
            Self::InvalidUrl(s) => write!(f, "invalid URL: {s}"),
            Self::Json(e) => write!(f, "JSON error: {e}"),
            Self::Bincode(e) => write!(f, "Bincode error: {e}"),
            Self::FormatViolation(s) => write!(f, "{s} not (correctly) found in format"),
            Self::IncorrectVersion { expected, found } => {
                write!(f, "wrong version, expected: {expected}, found: {found}")
            }
            Self::ConstraintViolation => write!(f, "constraint violation"),
            Self::Clock => write!(f, "system clock is set before the UNIX epoch"),
            Self::KEM => write!(f, "KEM error"),
            Self::Symmetric => write!(f, "symmetric encryption operation error"),
        }
    }
}

impl std::error::Error for Error {}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Self::Bincode(e)
    }
}

impl From<TryFromIntError> for Error {
    fn from(_: TryFromIntError) -> Self {
        Self::ConstraintViolation
    }
}

impl From<TryFromSliceError> for Error {
    fn from(_: TryFromSliceError) -> Self {
        Self::ConstraintViolation
    }
}

impl From<aead::Error> for Error {
    fn from(_: aead::Error) -> Self {
        Self::Symmetric
    }
}

impl From<aes_gcm::aes::cipher::InvalidLength> for Error {
    fn from(_: aes_gcm::aes::cipher::InvalidLength) -> Self {
        Self::Symmetric
    }
}
