//! The identity-based encryption primitive.
//!
//! The client only hands padded payloads to an [`IbeModule`] and never looks inside the
//! ciphertexts it produces, apart from asking for the embedded [`Identity`].
//!
//! ## Wire format of [`CgwKvModule`]
//!
//! ```text
//! PRELUDE (4) || VERSION (2) || HEADER LEN (4) || HEADER (*) || AES-128-GCM(PAYLOAD) (*)
//! ```
//!
//! The header (bincode) holds the identity, the KEM ciphertext and the IV, and is authenticated
//! as associated data of the payload.

use crate::artifacts::{Ciphertext, PublicKey, UserSecretKey};
use crate::consts::*;
use crate::error::Error;
use crate::identity::Identity;

use aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Nonce};
use ibe::kem::{cgw_kv::CGWKV, IBKEM};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// An identity-based encryption primitive.
pub trait IbeModule {
    /// Encrypts `payload` for `identity` under the master public key `pk`.
    fn encrypt<R: RngCore + CryptoRng>(
        &self,
        pk: &PublicKey<CGWKV>,
        identity: &Identity,
        payload: &[u8],
        rng: &mut R,
    ) -> Result<Vec<u8>, Error>;

    /// Decrypts `ciphertext` using the user secret key of its identity.
    fn decrypt(&self, ciphertext: &[u8], usk: &UserSecretKey<CGWKV>) -> Result<Vec<u8>, Error>;

    /// Returns the identity `ciphertext` was encrypted for.
    fn extract_identity(&self, ciphertext: &[u8]) -> Result<Identity, Error>;
}

/// Header preceding the payload.
#[derive(Debug, Serialize, Deserialize)]
struct Header {
    identity: Identity,
    ct: Ciphertext<CGWKV>,
    iv: [u8; IV_SIZE],
}

/// CGW-KV key encapsulation with AES-128-GCM data encapsulation.
#[derive(Debug, Default, Clone, Copy)]
pub struct CgwKvModule;

fn preamble_checked(b: &[u8]) -> Result<usize, Error> {
    if b.len() < PREAMBLE_SIZE {
        return Err(Error::FormatViolation("preamble".to_string()));
    }

    if b[..PRELUDE_SIZE] != PRELUDE {
        return Err(Error::FormatViolation("prelude".to_string()));
    }

    let version = u16::from_be_bytes(b[PRELUDE_SIZE..PRELUDE_SIZE + VERSION_SIZE].try_into()?);
    if version != VERSION_V1 {
        return Err(Error::IncorrectVersion {
            expected: VERSION_V1,
            found: version,
        });
    }

    let header_len = u32::from_be_bytes(b[PRELUDE_SIZE + VERSION_SIZE..PREAMBLE_SIZE].try_into()?);
    let header_len = usize::try_from(header_len)?;
    if header_len > MAX_HEADER_SIZE {
        return Err(Error::ConstraintViolation);
    }

    Ok(header_len)
}

// Splits a ciphertext into its raw header, parsed header and encrypted payload.
fn split(b: &[u8]) -> Result<(&[u8], Header, &[u8]), Error> {
    let header_len = preamble_checked(b)?;
    let rest = &b[PREAMBLE_SIZE..];

    if rest.len() < header_len {
        return Err(Error::FormatViolation("header".to_string()));
    }

    let (header_bytes, payload) = rest.split_at(header_len);
    let header: Header = bincode::deserialize(header_bytes)?;

    Ok((header_bytes, header, payload))
}

impl IbeModule for CgwKvModule {
    fn encrypt<R: RngCore + CryptoRng>(
        &self,
        pk: &PublicKey<CGWKV>,
        identity: &Identity,
        payload: &[u8],
        rng: &mut R,
    ) -> Result<Vec<u8>, Error> {
        let id = identity.derive_kem::<CGWKV>()?;
        let (ct, ss) = CGWKV::encaps(&pk.0, &id, rng);

        let mut iv = [0u8; IV_SIZE];
        rng.fill_bytes(&mut iv);

        let header_buf = bincode::serialize(&Header {
            identity: identity.clone(),
            ct: Ciphertext(ct),
            iv,
        })?;

        let aead = Aes128Gcm::new_from_slice(&ss.0[..KEY_SIZE])?;
        let enc = aead.encrypt(
            Nonce::from_slice(&iv),
            Payload {
                msg: payload,
                aad: &header_buf,
            },
        )?;

        let mut out = Vec::with_capacity(PREAMBLE_SIZE + header_buf.len() + enc.len());
        out.extend_from_slice(&PRELUDE);
        out.extend_from_slice(&VERSION_V1.to_be_bytes());
        out.extend_from_slice(&u32::try_from(header_buf.len())?.to_be_bytes());
        out.extend_from_slice(&header_buf);
        out.extend_from_slice(&enc);

        Ok(out)
    }

    fn decrypt(&self, ciphertext: &[u8], usk: &UserSecretKey<CGWKV>) -> Result<Vec<u8>, Error> {
        let (header_bytes, header, payload) = split(ciphertext)?;

        if payload.len() < TAG_SIZE {
            return Err(Error::FormatViolation("payload".to_string()));
        }

        let ss = CGWKV::decaps(None, &usk.0, &header.ct.0).map_err(|_e| Error::KEM)?;

        let aead = Aes128Gcm::new_from_slice(&ss.0[..KEY_SIZE])?;
        let plain = aead.decrypt(
            Nonce::from_slice(&header.iv),
            Payload {
                msg: payload,
                aad: header_bytes,
            },
        )?;

        Ok(plain)
    }

    fn extract_identity(&self, ciphertext: &[u8]) -> Result<Identity, Error> {
        let (_, header, _) = split(ciphertext)?;
        Ok(header.identity)
    }
}
