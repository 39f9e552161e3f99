//! Artifacts exchanged with the PKG and embedded in ciphertexts.
//!
//! Human-readable formats (JSON, as served by the PKG) encode artifacts as padded base64,
//! binary formats (bincode, used in the ciphertext header) as raw bytes.

use crate::util::open_ct;
use base64ct::{Base64, Encoding};
use ibe::{
    kem::{cgw_kv::CGWKV, IBKEM},
    Compress,
};
use serde::de::Error;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

fn serialize_bytes<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    if serializer.is_human_readable() {
        serializer.serialize_str(&Base64::encode_string(bytes))
    } else {
        serializer.serialize_bytes(bytes)
    }
}

fn deserialize_array<'de, D: Deserializer<'de>, const N: usize>(
    deserializer: D,
) -> Result<[u8; N], D::Error> {
    let bytes = if deserializer.is_human_readable() {
        let encoded = String::deserialize(deserializer)?;
        Base64::decode_vec(&encoded)
            .map_err(|e| D::Error::custom(format!("base64ct decoding error: {e}")))?
    } else {
        Vec::<u8>::deserialize(deserializer)?
    };

    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| D::Error::custom(format!("expected {N} bytes, found {len}")))
}

/// Master public keys.
#[derive(Debug, Clone, Copy)]
pub struct PublicKey<K: IBKEM>(pub K::Pk);

/// User secret keys.
#[derive(Debug, Clone)]
pub struct UserSecretKey<K: IBKEM>(pub K::Usk);

/// Ciphertexts.
#[derive(Debug, Clone)]
pub struct Ciphertext<K: IBKEM>(pub K::Ct);

// The buffer sizes depend on the scheme, and constant expressions cannot depend on a generic
// parameter (https://github.com/rust-lang/rust/issues/68436), so the impls are per scheme.
macro_rules! impl_serialize {
    ($type: ty, $inner: ty) => {
        impl Serialize for $type {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serialize_bytes(self.0.to_bytes().as_ref(), serializer)
            }
        }

        impl<'de> Deserialize<'de> for $type {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let buf = deserialize_array::<D, { <$inner as Compress>::OUTPUT_SIZE }>(
                    deserializer,
                )?;

                let artifact = open_ct(<$inner as Compress>::from_bytes(&buf)).ok_or(
                    D::Error::custom(format!("not a valid {}", stringify!($type))),
                )?;

                Ok(Self(artifact))
            }
        }
    };
}

impl_serialize!(PublicKey<CGWKV>, <CGWKV as IBKEM>::Pk);
impl_serialize!(UserSecretKey<CGWKV>, <CGWKV as IBKEM>::Usk);
impl_serialize!(Ciphertext<CGWKV>, <CGWKV as IBKEM>::Ct);
