//! Trust registry resolution: from federation metadata, an entity identifier and a tag filter to
//! the endpoints and trust anchors needed to contact one of the entity's servers.

pub mod castore;
pub mod document;

use crate::metadata::castore::{CaStore, CaStoreError, TempCaStore};
use crate::metadata::document::{EntityRecord, MetadataDocument};
use crate::pins::sha256_pin;
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use url::Url;

/// The only pin digest algorithm the transport can enforce.
const SUPPORTED_PIN_ALG: &str = "sha256";

/// One reachable service location of an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: String,
    pins: Vec<String>,
}

impl Endpoint {
    /// Creates an endpoint from its base URL and public key pins.
    ///
    /// An empty pin list means the server's public key is not pinned.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::EmptyEndpointUrl`] if `url` is empty.
    pub fn new(url: impl Into<String>, pins: Vec<String>) -> Result<Self, ResolutionError> {
        let url = url.into();
        if url.is_empty() {
            return Err(ResolutionError::EmptyEndpointUrl);
        }
        Ok(Self { url, pins })
    }

    /// Returns the base URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the public key pins, in registry order.
    pub fn pins(&self) -> &[String] {
        &self.pins
    }
}

/// The resolved trust context for one entity.
///
/// Invariant: `endpoints` is never empty. The CA store is released when this value is dropped.
#[derive(Debug)]
pub struct ServerConnectionInfo {
    endpoints: Vec<Endpoint>,
    castore: Box<dyn CaStore>,
}

impl ServerConnectionInfo {
    /// Creates a connection info from endpoints in priority order and the CA store that anchors
    /// them.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::NoEndpoints`] if `endpoints` is empty.
    pub fn new(
        endpoints: Vec<Endpoint>,
        castore: impl CaStore + 'static,
    ) -> Result<Self, ResolutionError> {
        if endpoints.is_empty() {
            return Err(ResolutionError::NoEndpoints);
        }
        Ok(Self {
            endpoints,
            castore: Box::new(castore),
        })
    }

    /// Returns the endpoints, in priority order. Never empty.
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Returns the CA store.
    pub fn castore(&self) -> &dyn CaStore {
        self.castore.as_ref()
    }
}

/// An error that can arise resolving an entity's server from a trust registry.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ResolutionError {
    /// The metadata source is a URL with a scheme other than `file`.
    #[error("unsupported metadata source: {0}")]
    UnsupportedSource(String),

    /// The metadata file could not be read.
    #[error("failed to read metadata from {}: {source}", path.display())]
    Read {
        /// Path of the metadata file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The metadata is not a valid document.
    #[error("failed to parse metadata: {0}")]
    Parse(#[from] serde_json::Error),

    /// The entity is not present in the metadata.
    #[error("entity not found in metadata: {0}")]
    EntityNotFound(String),

    /// None of the entity's servers carries all requested tags.
    #[error("no server of entity {entity} matches tags {tags:?}")]
    NoMatchingServer {
        /// Entity identifier.
        entity: String,
        /// Requested tags.
        tags: Vec<String>,
    },

    /// A server publishes a pin the transport cannot enforce.
    #[error("unsupported pin algorithm {alg:?} for server {base_uri}")]
    UnsupportedPinAlgorithm {
        /// Base URI of the server.
        base_uri: String,
        /// Published algorithm.
        alg: String,
    },

    /// The entity publishes no issuers to anchor trust in its servers.
    #[error("entity {0} has no issuers")]
    NoIssuers(String),

    /// An endpoint has an empty base URL.
    #[error("endpoint URL must not be empty")]
    EmptyEndpointUrl,

    /// A resolution produced no endpoints.
    #[error("no endpoints resolved")]
    NoEndpoints,

    /// The CA store for the entity could not be created.
    #[error("failed to create CA store: {0}")]
    CaStore(#[from] CaStoreError),
}

/// A source of server connection information for federation entities.
pub trait TrustRegistry {
    /// Resolves the servers of `entity` that match all `tags`, using the metadata at `source`.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolutionError`] if the metadata cannot be loaded, the entity is unknown, or
    /// no server matches the tags.
    fn resolve(
        &self,
        source: &str,
        entity: &str,
        tags: &[String],
    ) -> Result<ServerConnectionInfo, ResolutionError>;
}

/// Resolves entities from a verified federation metadata JSON file.
#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    _private: (),
}

impl MetadataRegistry {
    /// Creates a registry reading metadata from the local filesystem.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrustRegistry for MetadataRegistry {
    fn resolve(
        &self,
        source: &str,
        entity: &str,
        tags: &[String],
    ) -> Result<ServerConnectionInfo, ResolutionError> {
        let path = metadata_path(source)?;
        let document = load_document(&path)?;

        let record = document
            .entity(entity)
            .ok_or_else(|| ResolutionError::EntityNotFound(entity.to_owned()))?;

        connection_info_for(record, tags)
    }
}

/// Maps a metadata source (path or `file://` URL) to a local path.
pub(crate) fn metadata_path(source: &str) -> Result<PathBuf, ResolutionError> {
    match Url::parse(source) {
        Ok(url) if url.scheme() == "file" => url
            .to_file_path()
            .map_err(|()| ResolutionError::UnsupportedSource(source.to_owned())),
        // Single letter schemes are Windows drive letters.
        Ok(url) if url.scheme().len() > 1 => {
            Err(ResolutionError::UnsupportedSource(source.to_owned()))
        }
        _ => Ok(PathBuf::from(source)),
    }
}

fn load_document(path: &Path) -> Result<MetadataDocument, ResolutionError> {
    let read_err = |source| ResolutionError::Read {
        path: path.to_path_buf(),
        source,
    };

    let bytes = fs::read(path).map_err(read_err)?;
    let document = MetadataDocument::from_json(&bytes)?;

    info!(
        "loaded metadata from {} with {} entities",
        path.display(),
        document.entities.len()
    );

    match fs::metadata(path).and_then(|m| m.modified()) {
        Ok(modified) if is_stale(modified, document.cache_ttl(), SystemTime::now()) => {
            warn!(
                "metadata {} is older than its cache_ttl of {}s; fetch a fresh copy",
                path.display(),
                document.cache_ttl().as_secs()
            );
        }
        Ok(_) => {}
        Err(e) => debug!("cannot determine age of {}: {e}", path.display()),
    }

    Ok(document)
}

/// Returns `true` if a document fetched at `modified` has outlived `ttl` at `now`.
pub(crate) fn is_stale(modified: SystemTime, ttl: Duration, now: SystemTime) -> bool {
    modified.checked_add(ttl).map_or(false, |expiry| now >= expiry)
}

fn connection_info_for(
    record: &EntityRecord,
    tags: &[String],
) -> Result<ServerConnectionInfo, ResolutionError> {
    let endpoints = record
        .servers
        .iter()
        .filter(|server| server.has_tags(tags))
        .map(|server| {
            let pins = server
                .pins
                .iter()
                .map(|pin| {
                    if pin.alg == SUPPORTED_PIN_ALG {
                        Ok(sha256_pin(&pin.digest))
                    } else {
                        Err(ResolutionError::UnsupportedPinAlgorithm {
                            base_uri: server.base_uri.clone(),
                            alg: pin.alg.clone(),
                        })
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;

            Endpoint::new(server.base_uri.clone(), pins)
        })
        .collect::<Result<Vec<_>, _>>()?;

    if endpoints.is_empty() {
        return Err(ResolutionError::NoMatchingServer {
            entity: record.entity_id.clone(),
            tags: tags.to_vec(),
        });
    }

    debug!(
        "entity {} has {} server(s) matching tags {tags:?}",
        record.entity_id,
        endpoints.len()
    );

    if record.issuers.is_empty() {
        return Err(ResolutionError::NoIssuers(record.entity_id.clone()));
    }

    let issuers: Vec<&str> = record
        .issuers
        .iter()
        .map(|i| i.x509certificate.as_str())
        .collect();
    let castore = TempCaStore::from_pem_authorities(&issuers)?;

    ServerConnectionInfo::new(endpoints, castore)
}
