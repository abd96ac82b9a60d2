//! Trust parameter assembly: flattening a resolved server and the caller's credentials into what
//! the transport needs for one request.

use crate::metadata::{Endpoint, ServerConnectionInfo};
use crate::pins::combine_pins;
use std::path::Path;

/// Transport-ready parameters for one pinned, mutually authenticated request.
///
/// Borrows the CA bundle path from the [`ServerConnectionInfo`] it was assembled from, so the CA
/// store cannot be released while the parameters are in use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustParameters<'a> {
    /// Endpoint base URL, `/`, and the request path.
    pub server_url: String,
    /// PEM bundle of the CAs trusted for the server's chain.
    pub ca_bundle_path: &'a Path,
    /// Combined public key pins; empty disables pin enforcement.
    pub pinned_keys_blob: String,
    /// PEM client certificate (chain) presented to the server.
    pub client_cert_path: &'a Path,
    /// PEM private key of the client certificate.
    pub client_key_path: &'a Path,
}

impl TrustParameters<'_> {
    /// Returns `true` if the server's public key must match a pin.
    pub fn enforces_pins(&self) -> bool {
        !self.pinned_keys_blob.is_empty()
    }
}

/// Strategy choosing which of an entity's endpoints to contact.
pub trait EndpointSelector {
    /// Selects an endpoint from a non-empty list ordered by registry priority.
    fn select<'e>(&self, endpoints: &'e [Endpoint]) -> &'e Endpoint;
}

/// Always picks the first endpoint, without looking at the others.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstEndpoint;

impl EndpointSelector for FirstEndpoint {
    fn select<'e>(&self, endpoints: &'e [Endpoint]) -> &'e Endpoint {
        // `ServerConnectionInfo` guarantees at least one endpoint.
        &endpoints[0]
    }
}

impl<F> EndpointSelector for F
where
    F: for<'e> Fn(&'e [Endpoint]) -> &'e Endpoint,
{
    fn select<'e>(&self, endpoints: &'e [Endpoint]) -> &'e Endpoint {
        self(endpoints)
    }
}

/// Assembles trust parameters for the first endpoint of `conn`.
///
/// `server_url` is the literal concatenation `endpoint.url + "/" + path_suffix`; duplicate or
/// missing slashes are not normalized. Credential paths are passed through unchecked.
pub fn assemble<'a>(
    conn: &'a ServerConnectionInfo,
    path_suffix: &str,
    cert_path: &'a Path,
    key_path: &'a Path,
) -> TrustParameters<'a> {
    assemble_with(&FirstEndpoint, conn, path_suffix, cert_path, key_path)
}

/// Like [`assemble`], with a custom endpoint selection strategy.
pub fn assemble_with<'a, S: EndpointSelector + ?Sized>(
    selector: &S,
    conn: &'a ServerConnectionInfo,
    path_suffix: &str,
    cert_path: &'a Path,
    key_path: &'a Path,
) -> TrustParameters<'a> {
    let endpoint = selector.select(conn.endpoints());

    TrustParameters {
        server_url: format!("{}/{}", endpoint.url(), path_suffix),
        ca_bundle_path: conn.castore().path(),
        pinned_keys_blob: combine_pins(endpoint.pins()),
        client_cert_path: cert_path,
        client_key_path: key_path,
    }
}
