//! The PostGuard client.
//!
//! A [`Client`] starts out uninitialized. Only after the public parameters of the PKG are known
//! (see [`Client::init`]) can it encrypt, decrypt or hand out cached session tokens.
//!
//! ```no_run
//! use pg_client::cache::FileStore;
//! use pg_client::client::Client;
//! use pg_client::identity::Attribute;
//! use pg_client::pkg::PkgClient;
//! use pg_client::session::IrmaVerifier;
//! # use pg_client::error::Error;
//!
//! # async fn run() -> Result<(), Error> {
//! let url = "https://main.irmaseal-pkg.ihub.ru.nl";
//! let verifier = IrmaVerifier::new(PkgClient::new(url)?, |qr: &irma::Qr| println!("{}", qr.u));
//!
//! let mut client = Client::new(url, verifier)?.with_store(FileStore::new("tokens.json"));
//! client.init().await?;
//!
//! let attribute = Attribute::new("pbdf.sidn-pbdf.email.email", Some("bob@example.com"));
//! let ct = client.encrypt(&attribute, "SECRET DATA")?;
//!
//! let identity = client.extract_identity(&ct)?;
//! let token = client.get_token(&identity.attribute).await?;
//! let usk = client.request_key(&token, identity.timestamp).await?;
//! let original: String = client.decrypt(&usk, &ct)?;
//! # Ok(())
//! # }
//! ```

use crate::api::Parameters;
use crate::artifacts::{PublicKey, UserSecretKey};
use crate::cache::{CacheMode, TokenCache, TokenStore};
use crate::error::Error;
use crate::identity::{Attribute, Identity};
use crate::module::{CgwKvModule, IbeModule};
use crate::payload;
use crate::pkg::PkgClient;
use crate::session::IdentityVerifier;

use ibe::kem::cgw_kv::CGWKV;
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug)]
enum State {
    Uninitialized,
    Ready(Parameters<PublicKey<CGWKV>>),
}

/// A client for encrypting to and decrypting from IRMA attributes.
#[derive(Debug)]
pub struct Client<V, M = CgwKvModule> {
    pkg: PkgClient,
    tokens: TokenCache<V>,
    module: M,
    state: State,
}

impl<V: IdentityVerifier> Client<V> {
    /// Create a new, uninitialized client for the PKG at `baseurl`.
    ///
    /// Tokens are not cached until a store is set using [`Client::with_store`].
    pub fn new(baseurl: &str, verifier: V) -> Result<Self, Error> {
        Ok(Client {
            pkg: PkgClient::new(baseurl)?,
            tokens: TokenCache::new(verifier, CacheMode::Disabled),
            module: CgwKvModule,
            state: State::Uninitialized,
        })
    }
}

impl<V: IdentityVerifier, M: IbeModule> Client<V, M> {
    /// Cache session tokens in `store`.
    pub fn with_store<S: TokenStore + 'static>(mut self, store: S) -> Self {
        self.tokens.set_mode(CacheMode::from(store));
        self
    }

    /// Use another encryption primitive.
    pub fn with_module<N: IbeModule>(self, module: N) -> Client<V, N> {
        Client {
            pkg: self.pkg,
            tokens: self.tokens,
            module,
            state: self.state,
        }
    }

    /// The PKG client.
    pub fn pkg(&self) -> &PkgClient {
        &self.pkg
    }

    /// Fetch the public parameters from the PKG, unless already done.
    pub async fn init(&mut self) -> Result<(), Error> {
        if let State::Uninitialized = self.state {
            let params = self.pkg.parameters().await?;
            self.state = State::Ready(params);
        }

        Ok(())
    }

    /// Initialize using already known parameters.
    pub fn init_with_parameters(&mut self, params: Parameters<PublicKey<CGWKV>>) {
        self.state = State::Ready(params);
    }

    /// Whether the client has been initialized.
    pub fn is_ready(&self) -> bool {
        matches!(self.state, State::Ready(_))
    }

    /// The public parameters, if initialized.
    pub fn parameters(&self) -> Result<&Parameters<PublicKey<CGWKV>>, Error> {
        match &self.state {
            State::Ready(params) => Ok(params),
            State::Uninitialized => Err(Error::ModuleNotReady),
        }
    }

    /// Encrypt `plaintext` for `attribute` at the current time.
    pub fn encrypt<T: Serialize + ?Sized>(
        &self,
        attribute: &Attribute,
        plaintext: &T,
    ) -> Result<Vec<u8>, Error> {
        let params = self.parameters()?;
        let padded = payload::encode(plaintext)?;
        let identity = Identity::now(attribute.clone())?;

        let mut rng = rand::thread_rng();
        self.module
            .encrypt(&params.public_key, &identity, &padded, &mut rng)
    }

    /// Returns the identity `ciphertext` was encrypted for.
    pub fn extract_identity(&self, ciphertext: &[u8]) -> Result<Identity, Error> {
        self.parameters()?;
        self.module.extract_identity(ciphertext)
    }

    /// Decrypt `ciphertext` and decode it into a `T`.
    pub fn decrypt<T: DeserializeOwned>(
        &self,
        usk: &UserSecretKey<CGWKV>,
        ciphertext: &[u8],
    ) -> Result<T, Error> {
        self.parameters()?;
        let padded = self.module.decrypt(ciphertext, usk)?;
        payload::decode(&padded)
    }

    /// Obtain a fresh session token for `attribute`, bypassing the cache.
    pub async fn request_token(&self, attribute: &Attribute) -> Result<String, Error> {
        self.tokens.verifier().request_verification(attribute).await
    }

    /// Obtain a session token for `attribute`, from the cache if possible.
    pub async fn get_token(&self, attribute: &Attribute) -> Result<String, Error> {
        let max_age = self.parameters()?.max_age;
        self.tokens.get_token(attribute, max_age).await
    }

    /// Request the user secret key for `timestamp` using a session token.
    pub async fn request_key(
        &self,
        token: &str,
        timestamp: u64,
    ) -> Result<UserSecretKey<CGWKV>, Error> {
        self.pkg.request_key(token, timestamp).await
    }
}
