//! Secure request execution: one HTTP GET over mutually authenticated TLS, trusting only the
//! metadata CA bundle and, when pins are given, only the pinned server public keys.

mod material;
mod verifier;

use crate::error::render_chain;
use crate::params::TrustParameters;
use crate::pins::{PinError, PinSet};
use crate::transport::verifier::PinnedServerCertVerifier;
use log::{debug, info};
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::{ClientConfig, RootCertStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Process-wide TLS transport state.
///
/// Create one with [`Transport::init`] before any request and keep it alive until every request
/// has completed; executors borrow it, so it cannot be dropped while one is in use. Dropping it
/// releases the transport regardless of how the requests went.
#[derive(Debug)]
pub struct Transport {
    provider: Arc<CryptoProvider>,
}

impl Transport {
    /// Initializes the transport with the `ring` crypto provider.
    pub fn init() -> Self {
        debug!("initializing TLS transport");
        Self {
            provider: Arc::new(rustls::crypto::ring::default_provider()),
        }
    }

    fn provider(&self) -> &Arc<CryptoProvider> {
        &self.provider
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        debug!("TLS transport released");
    }
}

/// The result of a completed exchange. Neither field is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

/// An error that can arise executing a request.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RequestError {
    /// The client certificate could not be loaded.
    #[error("failed to load client certificate {}: {reason}", path.display())]
    ClientCertificate {
        /// Certificate path.
        path: PathBuf,
        /// Loader diagnostic.
        reason: String,
    },

    /// The client private key could not be loaded.
    #[error("failed to load client private key {}: {reason}", path.display())]
    ClientKey {
        /// Key path.
        path: PathBuf,
        /// Loader diagnostic.
        reason: String,
    },

    /// The CA bundle could not be loaded.
    #[error("failed to load CA bundle {}: {reason}", path.display())]
    CaBundle {
        /// Bundle path.
        path: PathBuf,
        /// Loader diagnostic.
        reason: String,
    },

    /// The pinned key blob is malformed.
    #[error("invalid pinned public keys: {0}")]
    InvalidPin(#[from] PinError),

    /// The server certificate verifier could not be built.
    #[error("failed building server certificate verifier: {0}")]
    VerifierBuilder(String),

    /// The TLS client configuration was rejected (for example a key not matching the certificate).
    #[error("TLS configuration error: {0}")]
    Tls(#[from] rustls::Error),

    /// The HTTP client could not be built.
    #[error("failed building HTTP client: {0}")]
    Client(String),

    /// The exchange failed: connection, TLS handshake, certificate or pin verification.
    #[error("{0}")]
    Transport(String),
}

/// Something that performs a trusted GET from assembled trust parameters.
pub trait RequestExecutor {
    /// Performs one GET of `params.server_url`.
    ///
    /// Success means the exchange completed; the HTTP status is not interpreted.
    ///
    /// # Errors
    ///
    /// Returns a [`RequestError`] carrying the transport's diagnostic on any transport-level
    /// failure. No retry is attempted.
    fn execute_get(&self, params: &TrustParameters<'_>) -> Result<Response, RequestError>;
}

/// Executes requests with a blocking HTTP client over rustls.
///
/// The server is trusted only if its chain validates against the CA bundle, its certificate is
/// valid for the URL host, and, when pins are given, its public key matches one of them.
/// Redirects are not followed and no timeout is applied.
#[derive(Debug, Clone, Copy)]
pub struct HttpsExecutor<'t> {
    transport: &'t Transport,
}

impl<'t> HttpsExecutor<'t> {
    /// Creates an executor using `transport`.
    pub fn new(transport: &'t Transport) -> Self {
        Self { transport }
    }

    fn client_config(&self, params: &TrustParameters<'_>) -> Result<ClientConfig, RequestError> {
        let pins = PinSet::parse(&params.pinned_keys_blob)?;
        if pins.is_empty() {
            debug!("no pins configured; public key pinning disabled");
        }

        let roots: Arc<RootCertStore> = material::roots_from_pem_file(params.ca_bundle_path)?;
        let chain: Vec<CertificateDer<'static>> =
            material::cert_chain_from_pem_file(params.client_cert_path)?;
        let key: PrivateKeyDer<'static> =
            material::private_key_from_pem_file(params.client_key_path)?;

        let provider = Arc::clone(self.transport.provider());
        let verifier = Arc::new(PinnedServerCertVerifier::new(
            roots,
            pins,
            Arc::clone(&provider),
        )?);

        let cfg = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()?
            .dangerous()
            .with_custom_certificate_verifier(verifier)
            .with_client_auth_cert(chain, key)?;

        Ok(cfg)
    }
}

impl RequestExecutor for HttpsExecutor<'_> {
    fn execute_get(&self, params: &TrustParameters<'_>) -> Result<Response, RequestError> {
        let tls = self.client_config(params)?;

        let client = Client::builder()
            .use_preconfigured_tls(tls)
            .redirect(Policy::none())
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| RequestError::Client(render_chain(&e)))?;

        info!("GET {}", params.server_url);

        let response = client
            .get(params.server_url.as_str())
            .send()
            .map_err(|e| RequestError::Transport(render_chain(&e)))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|e| RequestError::Transport(render_chain(&e)))?;

        info!("GET {} completed with status {status}", params.server_url);

        Ok(Response {
            status,
            body: body.to_vec(),
        })
    }
}
