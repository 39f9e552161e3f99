//! Definitions of the PKG REST API (version 1).

use crate::artifacts::UserSecretKey;
use crate::error::Error;
use crate::identity::Attribute;
use ibe::kem::cgw_kv::CGWKV;
use serde::{Deserialize, Serialize};

/// The public parameters of the Private Key Generator (PKG).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameters<T> {
    /// The formatting version of the Master Public Key.
    pub format_version: u8,

    /// The maximum age (in seconds) of an IRMA session token, as accepted by the PKG.
    pub max_age: u64,

    /// The Master Public Key.
    pub public_key: T,
}

/// A request to start an IRMA session for a single attribute.
#[derive(Debug, Serialize, Deserialize)]
pub struct KeyRequest {
    /// The attribute the user wants to prove.
    pub attribute: Attribute,
}

/// Progress of a key request, as reported by the PKG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyStatus {
    /// The IRMA session has been started.
    Initialized,
    /// The IRMA app is pairing with the session.
    Pairing,
    /// The IRMA app is connected to the session.
    Connected,
    /// The user cancelled the session.
    Cancelled,
    /// The session finished and the disclosed attribute matched.
    DoneValid,
    /// The session finished but the disclosure was not valid.
    DoneInvalid,
    /// The session timed out.
    Timeout,
}

/// The key response from the Private Key Generator (PKG).
#[derive(Debug, Serialize, Deserialize)]
pub struct KeyResponse<T> {
    /// The status of the key request.
    pub status: KeyStatus,

    /// The key will remain `None` until the status is [`KeyStatus::DoneValid`].
    #[serde(skip_serializing_if = "Option::is_none", default = "Option::default")]
    pub key: Option<T>,
}

impl KeyResponse<UserSecretKey<CGWKV>> {
    /// Returns the user secret key if the PKG handed one out.
    pub fn into_key(self) -> Result<UserSecretKey<CGWKV>, Error> {
        match self {
            KeyResponse {
                status: KeyStatus::DoneValid,
                key: Some(key),
            } => Ok(key),
            KeyResponse {
                status: KeyStatus::DoneValid,
                key: None,
            } => Err(Error::TokenRequestFailed(
                "status DONE_VALID without a key".to_string(),
            )),
            KeyResponse { status, .. } => {
                Err(Error::TokenRequestFailed(format!("status {status:?}")))
            }
        }
    }
}
