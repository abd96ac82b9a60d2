//! CA stores: trust anchors for validating a server's certificate chain, exposed to the
//! transport as a filesystem path.

use log::debug;
use std::fmt::Debug;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use x509_parser::pem::parse_x509_pem;

/// A set of trusted certificate authorities available as a PEM bundle file.
///
/// The path must stay valid for as long as the store is alive.
pub trait CaStore: Debug + Send + Sync {
    /// Returns the path of the PEM bundle.
    fn path(&self) -> &Path;
}

/// An error that can arise creating a CA store.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CaStoreError {
    /// No certificate authorities were provided.
    #[error("no certificate authorities to store")]
    Empty,

    /// A provided authority is not a PEM-encoded X.509 certificate.
    #[error("certificate authority #{index} is not a valid PEM X.509 certificate: {reason}")]
    InvalidCertificate {
        /// Position of the authority in the input.
        index: usize,
        /// Parser diagnostic.
        reason: String,
    },

    /// Writing the bundle file failed.
    #[error("failed writing CA bundle: {0}")]
    Io(#[from] io::Error),
}

/// A CA store backed by a temporary file that is deleted when the store is dropped.
#[derive(Debug)]
pub struct TempCaStore {
    file: NamedTempFile,
}

impl TempCaStore {
    /// Validates the PEM-encoded authorities and writes them, in order, to a new temporary file.
    ///
    /// # Errors
    ///
    /// Returns [`CaStoreError::Empty`] for an empty input, [`CaStoreError::InvalidCertificate`]
    /// if an entry does not parse, or [`CaStoreError::Io`] if the file cannot be written.
    pub fn from_pem_authorities<S: AsRef<str>>(authorities: &[S]) -> Result<Self, CaStoreError> {
        if authorities.is_empty() {
            return Err(CaStoreError::Empty);
        }

        for (index, pem) in authorities.iter().enumerate() {
            validate_pem_certificate(pem.as_ref())
                .map_err(|reason| CaStoreError::InvalidCertificate { index, reason })?;
        }

        let mut file = tempfile::Builder::new()
            .prefix("fedtls-ca-")
            .suffix(".pem")
            .tempfile()?;

        for pem in authorities {
            let pem = pem.as_ref().trim();
            writeln!(file, "{pem}")?;
        }
        file.flush()?;

        debug!(
            "wrote {} certificate authorities to {}",
            authorities.len(),
            file.path().display()
        );

        Ok(Self { file })
    }
}

impl CaStore for TempCaStore {
    fn path(&self) -> &Path {
        self.file.path()
    }
}

impl Drop for TempCaStore {
    fn drop(&mut self) {
        debug!("releasing CA bundle {}", self.file.path().display());
    }
}

/// A CA store backed by an existing bundle file owned by someone else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCaStore {
    path: PathBuf,
}

impl FileCaStore {
    /// Wraps an existing PEM bundle path. The file is neither read nor validated here.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CaStore for FileCaStore {
    fn path(&self) -> &Path {
        &self.path
    }
}

fn validate_pem_certificate(pem: &str) -> Result<(), String> {
    let (_, pem) = parse_x509_pem(pem.trim().as_bytes()).map_err(|e| e.to_string())?;
    pem.parse_x509().map_err(|e| e.to_string())?;
    Ok(())
}
