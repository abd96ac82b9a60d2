#![allow(dead_code)]

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// `openssl x509 -pubkey -noout -in server.pem | openssl pkey -pubin -outform der | openssl dgst -sha256 -binary | base64`
pub const SERVER_SPKI_DIGEST: &str = "WhogKZlmv0b8249zljqT+qSdZPQNA8pANV8zxQ79CYg=";

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

pub fn fixture_pem(name: &str) -> String {
    fs::read_to_string(fixture(name)).unwrap()
}

pub fn server(base_uri: &str, digests: &[&str], tags: &[&str]) -> Value {
    let pins: Vec<Value> = digests
        .iter()
        .map(|d| json!({ "alg": "sha256", "digest": d }))
        .collect();
    json!({ "description": base_uri, "base_uri": base_uri, "pins": pins, "tags": tags })
}

pub fn entity(entity_id: &str, issuers: &[&str], servers: Vec<Value>) -> Value {
    let issuers: Vec<Value> = issuers
        .iter()
        .map(|pem| json!({ "x509certificate": pem }))
        .collect();
    json!({
        "entity_id": entity_id,
        "organization": "Test Org",
        "issuers": issuers,
        "servers": servers,
        "clients": []
    })
}

pub fn write_metadata(dir: &Path, entities: Vec<Value>) -> PathBuf {
    let doc = json!({ "version": "1.0.0", "cache_ttl": 3600, "entities": entities });
    let path = dir.join("metadata.json");
    fs::write(&path, serde_json::to_vec_pretty(&doc).unwrap()).unwrap();
    path
}
