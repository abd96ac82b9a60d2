#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

//! This library resolves a server of a federation member from federation trust metadata and
//! performs a single HTTP GET against it over mutually authenticated, key-pinned TLS.
//!
//! The pipeline is:
//!
//! 1. [`tags::parse_tags`] turns a comma-separated selection string into a tag filter.
//! 2. A [`TrustRegistry`] (for example [`MetadataRegistry`]) resolves the entity and tag filter
//!    into a [`ServerConnectionInfo`]: the entity's endpoints plus a CA store.
//! 3. [`params::assemble`] flattens the first endpoint and the caller's credentials into
//!    [`TrustParameters`].
//! 4. A [`RequestExecutor`] (for example [`HttpsExecutor`]) performs the GET.
//!
//! # Examples
//!
//! ```no_run
//! use fedtls::get::{run, Invocation};
//! use fedtls::{HttpsExecutor, MetadataRegistry, Transport};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = Transport::init();
//! let executor = HttpsExecutor::new(&transport);
//!
//! let invocation = Invocation {
//!     metadata: "metadata.json".into(),
//!     entity: "https://sp.example.org".into(),
//!     server_tags: "sync,v2".into(),
//!     cert: "client.pem".into(),
//!     key: "client.key".into(),
//!     path: "status".into(),
//! };
//!
//! let outcome = run(&MetadataRegistry::new(), &executor, &invocation)?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod get;
pub mod metadata;
pub mod params;
pub mod pins;
pub mod tags;
pub mod transport;

// -----------------------
// Re-exports
// -----------------------

pub use crate::error::{Error, FailureKind};
pub use crate::metadata::castore::{CaStore, CaStoreError, FileCaStore, TempCaStore};
pub use crate::metadata::{
    Endpoint, MetadataRegistry, ResolutionError, ServerConnectionInfo, TrustRegistry,
};
pub use crate::params::{assemble, EndpointSelector, FirstEndpoint, TrustParameters};
pub use crate::pins::{combine_pins, PinError};
pub use crate::tags::parse_tags;
pub use crate::transport::{HttpsExecutor, RequestError, RequestExecutor, Response, Transport};
