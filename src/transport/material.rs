use crate::transport::RequestError;
use log::debug;
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::RootCertStore;
use std::path::Path;
use std::sync::Arc;

/// Load the CA bundle at `path` into a dedicated `RootCertStore`.
///
/// ## Errors
///
/// Returns [`RequestError::CaBundle`] if the file cannot be read, or if no certificate is accepted
/// into the store.
pub(crate) fn roots_from_pem_file(path: &Path) -> Result<Arc<RootCertStore>, RequestError> {
    let err = |reason: String| RequestError::CaBundle {
        path: path.to_path_buf(),
        reason,
    };

    let certs = read_certificates(path).map_err(err)?;

    let mut store = RootCertStore::empty();
    let (added, ignored) = store.add_parsable_certificates(certs);

    debug!("loaded {added} root cert(s) from {} ({ignored} ignored)", path.display());

    if store.is_empty() {
        return Err(err("no usable certificate authorities".into()));
    }

    Ok(Arc::new(store))
}

/// Load the client certificate chain at `path`, leaf first.
///
/// ## Errors
///
/// Returns [`RequestError::ClientCertificate`] if the file cannot be read or holds no certificate.
pub(crate) fn cert_chain_from_pem_file(
    path: &Path,
) -> Result<Vec<CertificateDer<'static>>, RequestError> {
    let err = |reason: String| RequestError::ClientCertificate {
        path: path.to_path_buf(),
        reason,
    };

    let chain = read_certificates(path).map_err(err)?;
    if chain.is_empty() {
        return Err(err("no certificate found".into()));
    }

    Ok(chain)
}

/// Load the first private key (PKCS#8, PKCS#1 or SEC1) at `path`.
///
/// ## Errors
///
/// Returns [`RequestError::ClientKey`] if the file cannot be read or holds no private key.
pub(crate) fn private_key_from_pem_file(path: &Path) -> Result<PrivateKeyDer<'static>, RequestError> {
    PrivateKeyDer::from_pem_file(path).map_err(|e| RequestError::ClientKey {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn read_certificates(path: &Path) -> Result<Vec<CertificateDer<'static>>, String> {
    CertificateDer::pem_file_iter(path)
        .map_err(|e| e.to_string())?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())
}
