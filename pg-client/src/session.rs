//! Identity verification.
//!
//! A session token is only handed out once the user proved an [`Attribute`] using the IRMA (or
//! Yivi) app. How the session is shown to the user (a popup, a QR code in a terminal, a deep
//! link on mobile) is up to the caller, see [`SessionHandler`].

use crate::consts::{DEFAULT_MAX_POLLS, DEFAULT_POLL_INTERVAL_MS};
use crate::error::Error;
use crate::identity::Attribute;
use crate::pkg::PkgClient;

use async_trait::async_trait;
use irma::SessionStatus;
use std::time::Duration;

/// Something that can verify an identity and produce a session token.
#[async_trait(?Send)]
pub trait IdentityVerifier {
    /// Let the user prove `attribute`, returns the session token on success.
    async fn request_verification(&self, attribute: &Attribute) -> Result<String, Error>;
}

/// Presents an IRMA session to the user.
pub trait SessionHandler {
    /// Called once the session has been started, with the pointer the IRMA app has to scan.
    fn on_start(&self, session_ptr: &irma::Qr);
}

impl<F: Fn(&irma::Qr)> SessionHandler for F {
    fn on_start(&self, session_ptr: &irma::Qr) {
        self(session_ptr)
    }
}

/// Verifies identities through an IRMA session started at the PKG.
#[derive(Debug)]
pub struct IrmaVerifier<H> {
    pkg: PkgClient,
    handler: H,
    poll_interval: Duration,
    max_polls: u32,
}

impl<H: SessionHandler> IrmaVerifier<H> {
    /// Create a new verifier that starts sessions at `pkg`.
    pub fn new(pkg: PkgClient, handler: H) -> Self {
        IrmaVerifier {
            pkg,
            handler,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_polls: DEFAULT_MAX_POLLS,
        }
    }

    /// Set the interval between two session status polls.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set the number of polls after which the session is abandoned.
    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = max_polls;
        self
    }

    async fn wait_on_session(&self, sd: &irma::SessionData) -> Result<(), Error> {
        for _ in 0..self.max_polls {
            let status = self
                .pkg
                .session_status(&sd.session_ptr)
                .await
                .map_err(|e| Error::VerificationFailed(e.to_string()))?;

            match status_outcome(&status) {
                Some(outcome) => return outcome,
                None => {
                    log::debug!("session {} not finished: {status:?}", sd.token.0);
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }

        log::warn!("giving up on session {}", sd.token.0);

        Err(Error::VerificationFailed(format!(
            "session not finished after {} polls",
            self.max_polls
        )))
    }
}

// Maps the status of a session to its outcome, or `None` if the session is still running.
fn status_outcome(status: &SessionStatus) -> Option<Result<(), Error>> {
    match status {
        SessionStatus::Done => Some(Ok(())),
        SessionStatus::Cancelled => Some(Err(Error::VerificationFailed(
            "session cancelled".to_string(),
        ))),
        SessionStatus::Timeout => Some(Err(Error::VerificationFailed(
            "session timed out".to_string(),
        ))),
        _ => None,
    }
}

#[async_trait(?Send)]
impl<H: SessionHandler> IdentityVerifier for IrmaVerifier<H> {
    async fn request_verification(&self, attribute: &Attribute) -> Result<String, Error> {
        let sd = self
            .pkg
            .request_start(attribute)
            .await
            .map_err(|e| Error::VerificationFailed(e.to_string()))?;

        log::info!("started session {} for {}", sd.token.0, attribute.atype);

        self.handler.on_start(&sd.session_ptr);
        self.wait_on_session(&sd).await?;

        Ok(sd.token.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_outcome() {
        assert!(matches!(status_outcome(&SessionStatus::Done), Some(Ok(()))));
        assert!(matches!(
            status_outcome(&SessionStatus::Cancelled),
            Some(Err(Error::VerificationFailed(_)))
        ));
        assert!(matches!(
            status_outcome(&SessionStatus::Timeout),
            Some(Err(Error::VerificationFailed(_)))
        ));
        assert!(status_outcome(&SessionStatus::Initialized).is_none());
        assert!(status_outcome(&SessionStatus::Connected).is_none());
    }

    #[test]
    fn test_builder() {
        let pkg = PkgClient::new("https://pkg.example.com").unwrap();
        let verifier = IrmaVerifier::new(pkg, |_: &irma::Qr| {})
            .with_poll_interval(Duration::from_millis(10))
            .with_max_polls(3);

        assert_eq!(verifier.poll_interval, Duration::from_millis(10));
        assert_eq!(verifier.max_polls, 3);
    }
}
