//! Caching of session tokens.
//!
//! A session token stays valid at the PKG for `max_age` seconds (see
//! [`Parameters`][`crate::api::Parameters`]). Within that window the same token can be used to
//! request keys for several timestamps, so that the user only has to prove an attribute once.

use crate::error::Error;
use crate::identity::Attribute;
use crate::session::IdentityVerifier;
use crate::util::now_millis;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A cached session token.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CachedToken {
    /// The session token.
    #[serde(default)]
    pub token: String,

    /// Expiry as UNIX time in milliseconds, `None` means the token does not expire.
    #[serde(
        rename = "validUntil",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub valid_until: Option<u64>,
}

impl CachedToken {
    /// Whether this token can still be used at time `now` (UNIX milliseconds).
    ///
    /// An entry without a token is never valid.
    pub fn is_valid_at(&self, now: u64) -> bool {
        !self.token.is_empty() && self.valid_until.map_or(true, |until| now < until)
    }
}

/// Entries as read from or written to a [`TokenStore`].
pub type Entries = BTreeMap<String, CachedToken>;

/// An asynchronous key-value store for session tokens.
#[async_trait(?Send)]
pub trait TokenStore {
    /// Look up `key`. The returned mapping contains `key` if it is stored.
    async fn get(&self, key: &str) -> Result<Entries, Error>;

    /// Store all `entries`, overwriting existing ones.
    async fn set(&self, entries: Entries) -> Result<(), Error>;
}

/// Whether tokens are cached, and where.
pub enum CacheMode {
    /// Every token request goes to the verifier.
    Disabled,
    /// Tokens are cached in a store.
    Enabled(Box<dyn TokenStore>),
}

impl core::fmt::Debug for CacheMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Disabled => write!(f, "Disabled"),
            Self::Enabled(_) => write!(f, "Enabled(..)"),
        }
    }
}

impl Default for CacheMode {
    fn default() -> Self {
        Self::Disabled
    }
}

impl<S: TokenStore + 'static> From<S> for CacheMode {
    fn from(store: S) -> Self {
        Self::Enabled(Box::new(store))
    }
}

/// Memoizes session tokens per attribute.
///
/// Concurrent misses for the same attribute are not de-duplicated: both ask the verifier and
/// the last write wins.
#[derive(Debug)]
pub struct TokenCache<V> {
    verifier: V,
    mode: CacheMode,
}

impl<V: IdentityVerifier> TokenCache<V> {
    /// Create a new token cache.
    pub fn new(verifier: V, mode: CacheMode) -> Self {
        TokenCache { verifier, mode }
    }

    /// Replace the cache mode.
    pub fn set_mode(&mut self, mode: CacheMode) {
        self.mode = mode;
    }

    /// The identity verifier.
    pub fn verifier(&self) -> &V {
        &self.verifier
    }

    /// Returns a session token for `attribute`, from the store if possible.
    ///
    /// Fresh tokens are stored with an expiry of `max_age` seconds from now.
    pub async fn get_token(&self, attribute: &Attribute, max_age: u64) -> Result<String, Error> {
        let store = match &self.mode {
            CacheMode::Disabled => return self.verifier.request_verification(attribute).await,
            CacheMode::Enabled(store) => store,
        };

        let key = attribute.canonical_key();
        let cached = store.get(&key).await?.remove(&key);

        if let Some(cached) = cached {
            if cached.is_valid_at(now_millis()?) {
                log::debug!("token cache hit for {}", attribute.atype);
                return Ok(cached.token);
            }
        }

        log::debug!("token cache miss for {}", attribute.atype);

        let token = self.verifier.request_verification(attribute).await?;
        let fresh = CachedToken {
            token: token.clone(),
            valid_until: Some(now_millis()?.saturating_add(max_age.saturating_mul(1000))),
        };

        store.set(Entries::from([(key, fresh)])).await?;

        Ok(token)
    }
}

/// A [`TokenStore`] that keeps tokens in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<Entries>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `entries`.
    pub fn with_entries(entries: Entries) -> Self {
        MemoryStore {
            entries: RefCell::new(entries),
        }
    }

    /// A copy of all stored entries.
    pub fn snapshot(&self) -> Entries {
        self.entries.borrow().clone()
    }
}

#[async_trait(?Send)]
impl TokenStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Entries, Error> {
        Ok(self
            .entries
            .borrow()
            .get_key_value(key)
            .map(|(k, v)| (k.clone(), v.clone()))
            .into_iter()
            .collect())
    }

    async fn set(&self, entries: Entries) -> Result<(), Error> {
        self.entries.borrow_mut().extend(entries);
        Ok(())
    }
}

/// A [`TokenStore`] backed by a JSON file.
///
/// The file holds a single object mapping keys to [`CachedToken`]s. A missing file is an
/// empty store.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store at `path`. The file is created on the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }

    async fn read_all(&self) -> Result<Entries, Error> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Entries::new()),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| Error::Store(format!("{}: {e}", self.path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Entries::new()),
            Err(e) => Err(Error::Store(format!("{}: {e}", self.path.display()))),
        }
    }
}

#[async_trait(?Send)]
impl TokenStore for FileStore {
    async fn get(&self, key: &str) -> Result<Entries, Error> {
        let mut all = self.read_all().await?;
        Ok(all.remove_entry(key).into_iter().collect())
    }

    async fn set(&self, entries: Entries) -> Result<(), Error> {
        let mut all = self.read_all().await?;
        all.extend(entries);

        let bytes = serde_json::to_vec_pretty(&all)?;
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|e| Error::Store(format!("{}: {e}", self.path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const ATTR_TYPE: &str = "pbdf.sidn-pbdf.email.email";

    struct MockVerifier {
        calls: Cell<u32>,
        fail: bool,
    }

    impl MockVerifier {
        fn new() -> Self {
            MockVerifier {
                calls: Cell::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            MockVerifier {
                calls: Cell::new(0),
                fail: true,
            }
        }
    }

    #[async_trait(?Send)]
    impl IdentityVerifier for MockVerifier {
        async fn request_verification(&self, _attribute: &Attribute) -> Result<String, Error> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(Error::VerificationFailed("session cancelled".to_string()));
            }
            Ok(format!("fresh-{}", self.calls.get()))
        }
    }

    // Counts every access, to check that a store is left alone.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        gets: Cell<u32>,
        sets: Cell<u32>,
    }

    #[async_trait(?Send)]
    impl TokenStore for std::rc::Rc<CountingStore> {
        async fn get(&self, key: &str) -> Result<Entries, Error> {
            self.gets.set(self.gets.get() + 1);
            self.inner.get(key).await
        }

        async fn set(&self, entries: Entries) -> Result<(), Error> {
            self.sets.set(self.sets.get() + 1);
            self.inner.set(entries).await
        }
    }

    fn attr() -> Attribute {
        Attribute::new(ATTR_TYPE, Some("alice@example.com"))
    }

    fn store_with(token: CachedToken) -> MemoryStore {
        MemoryStore::with_entries(Entries::from([(attr().canonical_key(), token)]))
    }

    #[test]
    fn test_validity() {
        let now = 1_000_000;
        let t = |token: &str, valid_until| CachedToken {
            token: token.to_string(),
            valid_until,
        };

        assert!(t("T", None).is_valid_at(now));
        assert!(t("T", Some(now + 1)).is_valid_at(now));
        assert!(!t("T", Some(now)).is_valid_at(now));
        assert!(!t("T", Some(now - 1)).is_valid_at(now));
        assert!(!t("", None).is_valid_at(now));
        assert!(!t("", Some(now + 1)).is_valid_at(now));
    }

    #[test]
    fn test_cached_token_wire() {
        let parsed: CachedToken =
            serde_json::from_str(r#"{"token":"T","validUntil":1566722350000}"#).unwrap();
        assert_eq!(parsed.valid_until, Some(1566722350000));

        let empty: CachedToken = serde_json::from_str("{}").unwrap();
        assert!(empty.token.is_empty());
        assert_eq!(empty.valid_until, None);
        assert!(!empty.is_valid_at(0));
    }

    #[tokio::test]
    async fn test_cache_hit() {
        let store = store_with(CachedToken {
            token: "T".to_string(),
            valid_until: Some(now_millis().unwrap() + 1000 * 1000),
        });
        let cache = TokenCache::new(MockVerifier::new(), store.into());

        let token = cache.get_token(&attr(), 300).await.unwrap();

        assert_eq!(token, "T");
        assert_eq!(cache.verifier().calls.get(), 0);
    }

    #[tokio::test]
    async fn test_cache_without_expiry() {
        let store = store_with(CachedToken {
            token: "T".to_string(),
            valid_until: None,
        });
        let cache = TokenCache::new(MockVerifier::new(), store.into());

        assert_eq!(cache.get_token(&attr(), 300).await.unwrap(), "T");
        assert_eq!(cache.verifier().calls.get(), 0);
    }

    #[tokio::test]
    async fn test_cache_expiry() {
        let counting = std::rc::Rc::new(CountingStore::default());
        let key = attr().canonical_key();
        counting
            .inner
            .set(Entries::from([(
                key.clone(),
                CachedToken {
                    token: "T".to_string(),
                    valid_until: Some(now_millis().unwrap() - 1000),
                },
            )]))
            .await
            .unwrap();

        let cache = TokenCache::new(MockVerifier::new(), counting.clone().into());

        let before = now_millis().unwrap();
        let token = cache.get_token(&attr(), 300).await.unwrap();

        assert_eq!(token, "fresh-1");
        assert_eq!(cache.verifier().calls.get(), 1);
        assert_eq!(counting.sets.get(), 1);

        let stored = counting.inner.snapshot().remove(&key).unwrap();
        assert_eq!(stored.token, "fresh-1");
        let valid_until = stored.valid_until.unwrap();
        assert!(valid_until >= before + 300_000);
        assert!(valid_until <= now_millis().unwrap() + 300_000);

        // The fresh token is now served from the store.
        assert_eq!(cache.get_token(&attr(), 300).await.unwrap(), "fresh-1");
        assert_eq!(cache.verifier().calls.get(), 1);
    }

    #[tokio::test]
    async fn test_cache_miss_per_attribute() {
        let cache = TokenCache::new(MockVerifier::new(), MemoryStore::new().into());

        let other = Attribute::new(ATTR_TYPE, Some("bob@example.com"));
        assert_eq!(cache.get_token(&attr(), 300).await.unwrap(), "fresh-1");
        assert_eq!(cache.get_token(&other, 300).await.unwrap(), "fresh-2");
        assert_eq!(cache.get_token(&attr(), 300).await.unwrap(), "fresh-1");
        assert_eq!(cache.verifier().calls.get(), 2);
    }

    #[tokio::test]
    async fn test_empty_entry_is_refreshed() {
        let store = store_with(CachedToken {
            token: String::new(),
            valid_until: None,
        });
        let cache = TokenCache::new(MockVerifier::new(), store.into());

        assert_eq!(cache.get_token(&attr(), 300).await.unwrap(), "fresh-1");
    }

    #[tokio::test]
    async fn test_no_store() {
        let counting = std::rc::Rc::new(CountingStore::default());
        let mut cache = TokenCache::new(MockVerifier::new(), counting.clone().into());
        cache.set_mode(CacheMode::Disabled);

        assert_eq!(cache.get_token(&attr(), 300).await.unwrap(), "fresh-1");
        assert_eq!(cache.get_token(&attr(), 300).await.unwrap(), "fresh-2");
        assert_eq!(cache.verifier().calls.get(), 2);
        assert_eq!(counting.gets.get(), 0);
        assert_eq!(counting.sets.get(), 0);
    }

    #[tokio::test]
    async fn test_verifier_failure_is_not_cached() {
        let counting = std::rc::Rc::new(CountingStore::default());
        let cache = TokenCache::new(MockVerifier::failing(), counting.clone().into());

        let res = cache.get_token(&attr(), 300).await;

        assert!(matches!(res, Err(Error::VerificationFailed(_))));
        assert_eq!(counting.sets.get(), 0);
        assert!(counting.inner.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_file_store() {
        let path = std::env::temp_dir().join(format!(
            "pg-client-tokens-{}.json",
            rand::random::<u64>()
        ));
        let store = FileStore::new(&path);
        let key = attr().canonical_key();

        assert!(store.get(&key).await.unwrap().is_empty());

        let token = CachedToken {
            token: "T".to_string(),
            valid_until: Some(42),
        };
        store
            .set(Entries::from([(key.clone(), token.clone())]))
            .await
            .unwrap();
        store
            .set(Entries::from([("other".to_string(), token.clone())]))
            .await
            .unwrap();

        // A second handle on the same file sees both entries.
        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get(&key).await.unwrap().get(&key), Some(&token));
        assert_eq!(reopened.get("other").await.unwrap().len(), 1);
        assert!(reopened.get("missing").await.unwrap().is_empty());

        tokio::fs::write(&path, b"not json").await.unwrap();
        assert!(matches!(reopened.get(&key).await, Err(Error::Store(_))));

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
