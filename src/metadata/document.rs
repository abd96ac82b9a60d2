//! Serde model of a federation metadata document.
//!
//! Only the parts needed to reach an entity's servers are modeled; unknown fields are ignored.
//! The document is expected to have been fetched and signature-verified already.

use serde::Deserialize;
use std::time::Duration;

/// Cache lifetime assumed when the document does not declare `cache_ttl`.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Top-level metadata document.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MetadataDocument {
    /// Metadata format version.
    #[serde(default)]
    pub version: Option<String>,

    /// Seconds the document may be cached after it was fetched.
    #[serde(default)]
    pub cache_ttl: Option<u64>,

    /// Federation members.
    #[serde(default)]
    pub entities: Vec<EntityRecord>,
}

/// One federation member.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct EntityRecord {
    /// Unique identifier of the entity.
    pub entity_id: String,

    /// Human readable organization name.
    #[serde(default)]
    pub organization: Option<String>,

    /// Certificate authorities that issue the entity's certificates.
    #[serde(default)]
    pub issuers: Vec<IssuerRecord>,

    /// Servers operated by the entity.
    #[serde(default)]
    pub servers: Vec<ServerRecord>,
}

/// A trusted issuer of an entity.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct IssuerRecord {
    /// PEM-encoded X.509 certificate.
    pub x509certificate: String,
}

/// A server endpoint of an entity.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerRecord {
    /// Free form description.
    #[serde(default)]
    pub description: Option<String>,

    /// Base URI the request path is appended to.
    pub base_uri: String,

    /// Public keys the server may present.
    #[serde(default)]
    pub pins: Vec<PinRecord>,

    /// Tags used to select among the entity's servers.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A public key pin as published in metadata.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PinRecord {
    /// Digest algorithm, e.g. `sha256`.
    pub alg: String,

    /// Base64 digest of the SubjectPublicKeyInfo.
    pub digest: String,
}

impl MetadataDocument {
    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the bytes are not a valid document.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Returns the declared cache lifetime, or [`DEFAULT_CACHE_TTL`].
    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl.map_or(DEFAULT_CACHE_TTL, Duration::from_secs)
    }

    /// Finds an entity by exact identifier.
    pub fn entity(&self, entity_id: &str) -> Option<&EntityRecord> {
        self.entities.iter().find(|e| e.entity_id == entity_id)
    }
}

impl ServerRecord {
    /// Returns `true` if the server carries every requested tag.
    pub fn has_tags(&self, tags: &[String]) -> bool {
        tags.iter().all(|t| self.tags.contains(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "version": "1.0.0",
        "cache_ttl": 600,
        "entities": [
            {
                "entity_id": "https://sp.example.org",
                "organization": "Example",
                "issuers": [ { "x509certificate": "PEM" } ],
                "servers": [
                    {
                        "description": "primary",
                        "base_uri": "https://a.example/api",
                        "pins": [ { "alg": "sha256", "digest": "aa==" } ],
                        "tags": [ "sync", "v2" ]
                    }
                ],
                "clients": [ { "pins": [] } ]
            }
        ]
    }"#;

    #[test]
    fn test_parse_document() {
        let doc = MetadataDocument::from_json(DOC.as_bytes()).unwrap();

        assert_eq!(doc.version.as_deref(), Some("1.0.0"));
        assert_eq!(doc.cache_ttl(), Duration::from_secs(600));

        let entity = doc.entity("https://sp.example.org").unwrap();
        assert_eq!(entity.issuers.len(), 1);
        assert_eq!(entity.servers[0].base_uri, "https://a.example/api");
        assert_eq!(entity.servers[0].pins[0].digest, "aa==");
    }

    #[test]
    fn test_entity_lookup_is_exact() {
        let doc = MetadataDocument::from_json(DOC.as_bytes()).unwrap();

        assert!(doc.entity("https://sp.example.org/").is_none());
        assert!(doc.entity("sp.example.org").is_none());
    }

    #[test]
    fn test_default_cache_ttl() {
        let doc = MetadataDocument::from_json(br#"{ "entities": [] }"#).unwrap();
        assert_eq!(doc.cache_ttl(), DEFAULT_CACHE_TTL);
    }

    #[test]
    fn test_server_has_tags() {
        let doc = MetadataDocument::from_json(DOC.as_bytes()).unwrap();
        let server = &doc.entities[0].servers[0];

        assert!(server.has_tags(&[]));
        assert!(server.has_tags(&["v2".into()]));
        assert!(server.has_tags(&["v2".into(), "sync".into()]));
        assert!(!server.has_tags(&["v2".into(), "v3".into()]));
        assert!(!server.has_tags(&[String::new()]));
    }

    #[test]
    fn test_missing_base_uri_is_an_error() {
        let json = r#"{ "entities": [ { "entity_id": "x", "servers": [ { "tags": [] } ] } ] }"#;
        assert!(MetadataDocument::from_json(json.as_bytes()).is_err());
    }
}
