//! Identity definitions and utilities.

use crate::error::Error;
use ibe::kem::IBKEM;
use ibe::Derive;
use serde::{Deserialize, Serialize};
use tiny_keccak::{Hasher, Sha3};

const IDENTITY_UNSET: u64 = u64::MAX;

/// An IRMA attribute, the subject of both encryption and verification.
///
/// The serialized form doubles as the key under which session tokens are cached, see
/// [`Attribute::canonical_key`].
#[derive(Serialize, Deserialize, Debug, Ord, PartialOrd, PartialEq, Eq, Clone, Default)]
pub struct Attribute {
    /// Attribute type, e.g., `pbdf.sidn-pbdf.email.email`.
    #[serde(rename = "type")]
    pub atype: String,

    /// Attribute value.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<String>,
}

impl Attribute {
    /// Construct a new attribute request.
    pub fn new(atype: &str, value: Option<&str>) -> Self {
        let atype = atype.to_string();
        let value = value.map(|s| s.to_string());

        Attribute { atype, value }
    }

    /// The canonical serialization of this attribute.
    ///
    /// Fields are always written in the order `type`, `value`, so attributes parsed from
    /// differently ordered JSON objects still map to the same key.
    pub fn canonical_key(&self) -> String {
        // Serializing two strings into JSON cannot fail.
        let mut out = String::from("{\"type\":");
        out.push_str(&serde_json::Value::from(self.atype.as_str()).to_string());
        if let Some(v) = &self.value {
            out.push_str(",\"value\":");
            out.push_str(&serde_json::Value::from(v.as_str()).to_string());
        }
        out.push('}');
        out
    }
}

/// The identity a message is encrypted for.
///
/// Embedded in the header of every ciphertext, so that a recipient knows which attribute to
/// prove and which timestamp to request a key for.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Default)]
pub struct Identity {
    /// The attribute the recipient has to prove.
    pub attribute: Attribute,

    /// Timestamp (UNIX time) of encryption.
    pub timestamp: u64,
}

impl Identity {
    /// Create an identity for `attribute` at the current time.
    pub fn now(attribute: Attribute) -> Result<Self, Error> {
        Ok(Identity {
            attribute,
            timestamp: crate::util::now_secs()?,
        })
    }

    /// Derives a 64-byte identity from an [`Identity`].
    pub fn derive(&self) -> [u8; 64] {
        // Domain separation:
        // = H(0 || f || f' || timestamp),
        // where f  = H(1 || a.typ.len() || a.typ),
        // and   f' = H(2 || a.val.len() || a.val).
        //
        // Since lengths encoded as usize are not platform-agnostic, we convert all
        // usize to u64.
        let mut tmp = [0u8; 64];
        let mut pre_h = Sha3::v512();

        // 0 indicates the IRMA authentication method.
        pre_h.update(&[0x00]);

        let mut f = Sha3::v512();
        f.update(&1u64.to_be_bytes());
        let at_bytes = self.attribute.atype.as_bytes();
        f.update(&(at_bytes.len() as u64).to_be_bytes());
        f.update(at_bytes);
        f.finalize(&mut tmp);
        pre_h.update(&tmp);

        let mut f = Sha3::v512();
        f.update(&2u64.to_be_bytes());
        match &self.attribute.value {
            None => f.update(&IDENTITY_UNSET.to_be_bytes()),
            Some(val) => {
                let val_bytes = val.as_bytes();
                f.update(&(val_bytes.len() as u64).to_be_bytes());
                f.update(val_bytes);
            }
        }
        f.finalize(&mut tmp);
        pre_h.update(&tmp);

        pre_h.update(&self.timestamp.to_be_bytes());
        let mut res = [0u8; 64];
        pre_h.finalize(&mut res);

        res
    }

    /// Derive a KEM identity from an [`Identity`].
    pub fn derive_kem<K: IBKEM>(&self) -> Result<<K as IBKEM>::Id, Error> {
        Ok(<K as IBKEM>::Id::derive(&self.derive()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibe::kem::cgw_kv::CGWKV;

    #[test]
    fn test_canonical_key() {
        let attr = Attribute::new("pbdf.sidn-pbdf.email.email", Some("alice@example.com"));
        assert_eq!(
            attr.canonical_key(),
            r#"{"type":"pbdf.sidn-pbdf.email.email","value":"alice@example.com"}"#
        );

        let no_value = Attribute::new("pbdf.sidn-pbdf.email.email", None);
        assert_eq!(
            no_value.canonical_key(),
            r#"{"type":"pbdf.sidn-pbdf.email.email"}"#
        );
    }

    #[test]
    fn test_canonical_key_ordering() {
        let a: Attribute =
            serde_json::from_str(r#"{"type":"pbdf.gemeente.personalData.bsn","value":"123"}"#)
                .unwrap();
        let b: Attribute =
            serde_json::from_str(r#"{"value":"123","type":"pbdf.gemeente.personalData.bsn"}"#)
                .unwrap();

        assert_eq!(a, b);
        assert_eq!(a.canonical_key(), b.canonical_key());
        assert_eq!(a.canonical_key(), serde_json::to_string(&a).unwrap());
    }

    #[test]
    fn test_canonical_key_escaping() {
        let attr = Attribute::new("x", Some("\"quoted\",\"value\":\"y"));
        let parsed: Attribute = serde_json::from_str(&attr.canonical_key()).unwrap();
        assert_eq!(parsed, attr);
        assert_ne!(
            attr.canonical_key(),
            Attribute::new("x", Some("quoted")).canonical_key()
        );
    }

    #[test]
    fn test_derive() {
        let id = Identity {
            attribute: Attribute::new("pbdf.sidn-pbdf.email.email", Some("bob@example.com")),
            timestamp: 1566722350,
        };

        assert!(id.derive_kem::<CGWKV>().is_ok());
        assert_eq!(id.derive(), id.clone().derive());

        // The timestamp should matter, and therefore map to a different IBE identity.
        let mut later = id.clone();
        later.timestamp += 1;
        assert_ne!(id.derive(), later.derive());

        // An absent value differs from an empty one.
        let mut unset = id.clone();
        unset.attribute.value = None;
        let mut empty = id;
        empty.attribute.value = Some(String::new());
        assert_ne!(unset.derive(), empty.derive());
    }
}
