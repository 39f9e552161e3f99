//! HTTP client for the Private Key Generator (PKG).

use crate::api::*;
use crate::artifacts::{PublicKey, UserSecretKey};
use crate::consts::IHUB_IRMA_URL;
use crate::error::Error;
use crate::identity::Attribute;

use ibe::kem::cgw_kv::CGWKV;
use lazy_static::lazy_static;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{ClientBuilder, StatusCode, Url};

const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Header with which the PKG identifies its clients.
pub const PG_CLIENT_HEADER: &str = "X-Postguard-Client-Version";

lazy_static! {
    static ref HEADER_VAL: String = format!("unknown,unknown,pg-client,{PKG_VERSION}");
    static ref HEADERS: HeaderMap = {
        let mut headers = HeaderMap::new();
        headers.insert(PG_CLIENT_HEADER, HeaderValue::from_static(&HEADER_VAL));
        headers
    };
}

fn parse_base(url: &str) -> Result<Url, Error> {
    // Without a trailing slash, joining would replace the last path segment.
    let mut normalized = url.to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }

    Url::parse(&normalized).map_err(|e| Error::InvalidUrl(e.to_string()))
}

// The PKGs at ihub.ru.nl hand out session pointers relative to their IRMA server. Elsewhere, the
// IRMA server is assumed to be proxied by the PKG itself.
fn default_irma_url(baseurl: &Url) -> Result<Url, Error> {
    match baseurl.host_str() {
        Some(host) if host == "ihub.ru.nl" || host.ends_with(".ihub.ru.nl") => {
            parse_base(IHUB_IRMA_URL)
        }
        _ => Ok(baseurl.clone()),
    }
}

// Decodes the body of a key response. Anything but a well-formed `DONE_VALID` response with a
// key is a failed request.
fn key_from_body(body: &[u8]) -> Result<UserSecretKey<CGWKV>, Error> {
    serde_json::from_slice::<KeyResponse<UserSecretKey<CGWKV>>>(body)
        .map_err(|e| Error::TokenRequestFailed(format!("unexpected key response: {e}")))?
        .into_key()
}

/// A client for the PKG REST API.
#[derive(Debug, Clone)]
pub struct PkgClient {
    baseurl: Url,
    irma_url: Url,
    client: reqwest::Client,
}

impl PkgClient {
    /// Create a new client for the PKG at `baseurl`.
    pub fn new(baseurl: &str) -> Result<Self, Error> {
        let baseurl = parse_base(baseurl)?;
        let irma_url = default_irma_url(&baseurl)?;
        let client = ClientBuilder::new().default_headers(HEADERS.clone()).build()?;

        Ok(PkgClient {
            baseurl,
            irma_url,
            client,
        })
    }

    /// Resolve relative session pointers against the IRMA server at `irma_url`.
    pub fn with_irma_url(mut self, irma_url: &str) -> Result<Self, Error> {
        self.irma_url = parse_base(irma_url)?;
        Ok(self)
    }

    /// The base URL of the PKG.
    pub fn baseurl(&self) -> &Url {
        &self.baseurl
    }

    /// The URL against which relative session pointers are resolved.
    pub fn irma_url(&self) -> &Url {
        &self.irma_url
    }

    pub(crate) fn create_url(&self, u: &str) -> Result<Url, Error> {
        self.baseurl
            .join(u)
            .map_err(|e| Error::InvalidUrl(e.to_string()))
    }

    /// The absolute URL of an IRMA session pointer.
    pub fn session_url(&self, u: &str) -> Result<Url, Error> {
        match Url::parse(u) {
            Ok(url) => Ok(url),
            Err(_) => self
                .irma_url
                .join(u)
                .map_err(|e| Error::InvalidUrl(e.to_string())),
        }
    }

    pub(crate) fn status_url(&self, u: &str) -> Result<Url, Error> {
        let session = self.session_url(u)?;
        Url::parse(&format!("{}/status", session.as_str().trim_end_matches('/')))
            .map_err(|e| Error::InvalidUrl(e.to_string()))
    }

    /// Fetch the public parameters.
    pub async fn parameters(&self) -> Result<Parameters<PublicKey<CGWKV>>, Error> {
        let res = self
            .client
            .get(self.create_url("v1/parameters")?)
            .send()
            .await?
            .error_for_status()?
            .json::<Parameters<PublicKey<CGWKV>>>()
            .await?;

        log::info!(
            "fetched parameters from {} (format version {}, max age {}s)",
            self.baseurl,
            res.format_version,
            res.max_age
        );

        Ok(res)
    }

    /// Start an IRMA session in which the user proves `attribute`.
    ///
    /// The returned session pointer is absolute, so it can be rendered as a QR code and polled.
    pub async fn request_start(&self, attribute: &Attribute) -> Result<irma::SessionData, Error> {
        let kr = KeyRequest {
            attribute: attribute.clone(),
        };

        let mut res = self
            .client
            .post(self.create_url("v1/request")?)
            .json(&kr)
            .send()
            .await?
            .error_for_status()?
            .json::<irma::SessionData>()
            .await?;

        res.session_ptr.u = self.session_url(&res.session_ptr.u)?.to_string();

        Ok(res)
    }

    /// Request a user secret key for a finished session.
    ///
    /// Fails with [`Error::TokenRequestFailed`] unless the PKG responds with `200 OK` and status
    /// `DONE_VALID`.
    pub async fn request_key(
        &self,
        token: &str,
        timestamp: u64,
    ) -> Result<UserSecretKey<CGWKV>, Error> {
        let res = self
            .client
            .get(self.create_url(&format!("v1/request/{token}/{timestamp}"))?)
            .send()
            .await?;

        if res.status() != StatusCode::OK {
            return Err(Error::TokenRequestFailed(format!(
                "PKG responded with {}",
                res.status()
            )));
        }

        key_from_body(&res.bytes().await?)
    }

    /// Retrieve the status of an IRMA session from the IRMA server.
    pub async fn session_status(&self, qr: &irma::Qr) -> Result<irma::SessionStatus, Error> {
        let res = self
            .client
            .get(self.status_url(&qr.u)?)
            .send()
            .await?
            .error_for_status()?
            .json::<irma::SessionStatus>()
            .await?;

        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::DEFAULT_PKG_URL;

    #[test]
    fn test_create_url() {
        let client = PkgClient::new("https://pkg.example.com/api").unwrap();
        assert_eq!(
            client.create_url("v1/parameters").unwrap().as_str(),
            "https://pkg.example.com/api/v1/parameters"
        );

        let client = PkgClient::new("https://pkg.example.com/").unwrap();
        assert_eq!(
            client
                .create_url("v1/request/abc/1566722350")
                .unwrap()
                .as_str(),
            "https://pkg.example.com/v1/request/abc/1566722350"
        );
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            PkgClient::new("not a url"),
            Err(Error::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_relative_session_ptr() {
        let client = PkgClient::new(DEFAULT_PKG_URL).unwrap();
        assert_eq!(client.irma_url().as_str(), IHUB_IRMA_URL);

        assert_eq!(
            client.session_url("Ab12Cd34Ef56Gh78").unwrap().as_str(),
            "https://ihub.ru.nl/irma/1/Ab12Cd34Ef56Gh78"
        );
        assert_eq!(
            client.status_url("Ab12Cd34Ef56Gh78").unwrap().as_str(),
            "https://ihub.ru.nl/irma/1/Ab12Cd34Ef56Gh78/status"
        );
    }

    #[test]
    fn test_absolute_session_ptr() {
        let client = PkgClient::new(DEFAULT_PKG_URL).unwrap();
        assert_eq!(
            client
                .status_url("https://irma.example.com/irma/session/Ab12/")
                .unwrap()
                .as_str(),
            "https://irma.example.com/irma/session/Ab12/status"
        );
    }

    #[test]
    fn test_irma_url() {
        let client = PkgClient::new("https://pkg.example.com/api").unwrap();
        assert_eq!(
            client.status_url("Ab12").unwrap().as_str(),
            "https://pkg.example.com/api/Ab12/status"
        );

        let client = client.with_irma_url("https://irma.example.com/session").unwrap();
        assert_eq!(
            client.session_url("Ab12").unwrap().as_str(),
            "https://irma.example.com/session/Ab12"
        );
    }

    #[test]
    fn test_key_from_body() {
        assert!(matches!(
            key_from_body(br#"{"status":"EXPIRED"}"#),
            Err(Error::TokenRequestFailed(_))
        ));
        assert!(matches!(
            key_from_body(b"not json"),
            Err(Error::TokenRequestFailed(_))
        ));
        assert!(matches!(
            key_from_body(br#"{"status":"DONE_INVALID"}"#),
            Err(Error::TokenRequestFailed(_))
        ));
    }
}
