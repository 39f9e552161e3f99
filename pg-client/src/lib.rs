//! # PostGuard client library
#![deny(
    missing_debug_implementations,
    rust_2018_idioms,
    rustdoc::broken_intra_doc_links
)]
#![warn(missing_docs)]
//! PostGuard lets anyone encrypt data for an IRMA attribute (e.g., an e-mail address), which only
//! someone who can prove that attribute is able to decrypt.
//!
//! This library is the client side of that protocol:
//!
//! * [Payloads][`payload`] are serialized as JSON and padded to a multiple of 512 bytes, so that
//! ciphertexts do not leak the exact size of their plaintext.
//!
//! * Encryption is identity-based, using the public key of the Private Key Generator (PKG) and the
//! [identity][`identity::Identity`] of the recipient. The primitive is pluggable, see
//! [`module::IbeModule`].
//!
//! * To decrypt, the recipient proves the attribute in an [IRMA session][`session`], which results
//! in a session token. With this token the [PKG][`pkg::PkgClient`] hands out the user secret key.
//!
//! * Session tokens are [cached][`cache`], so that the recipient does not have to prove the same
//! attribute over and over again.
//!
//! [`client::Client`] ties all of this together.
//!
//! ## Examples
//!
//! ```
//! use pg_client::module::{CgwKvModule, IbeModule};
//! use pg_client::identity::{Attribute, Identity};
//! use pg_client::payload;
//! # use pg_client::test::TestSetup;
//! # use pg_client::error::Error;
//!
//! # fn main() -> Result<(), Error> {
//! let mut rng = rand::thread_rng();
//! # let TestSetup { mpk, usk, .. } = TestSetup::new(&mut rng);
//!
//! // Retrieve the public key and user secret key from the PKG.
//!
//! let identity = Identity {
//!     attribute: Attribute::new("pbdf.sidn-pbdf.email.email", Some("bob@example.com")),
//!     timestamp: 1566722350,
//! };
//!
//! let padded = payload::encode("SECRET DATA")?;
//! let ct = CgwKvModule.encrypt(&mpk, &identity, &padded, &mut rng)?;
//!
//! let original: String = payload::decode(&CgwKvModule.decrypt(&ct, &usk)?)?;
//! assert_eq!(original, "SECRET DATA");
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod artifacts;
pub mod cache;
pub mod client;
pub mod consts;
pub mod error;
pub mod identity;
pub mod module;
pub mod payload;
pub mod pkg;
pub mod session;

#[doc(hidden)]
pub use ibe::{kem, Compress};

#[doc(hidden)]
pub use consts::*;


mod util;
