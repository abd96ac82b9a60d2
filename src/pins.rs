//! Public key pins.
//!
//! A pin is the SHA-256 digest of a certificate's DER-encoded SubjectPublicKeyInfo, base64
//! encoded and written as `sha256//<digest>`. Several pins are combined into one blob separated
//! by `;`, the form accepted by curl-style pinned public key options.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sha2::{Digest, Sha256};
use x509_parser::prelude::{FromDer, X509Certificate};

/// Separator between pins in a combined pin blob.
pub const PIN_SEPARATOR: &str = ";";

/// Prefix of a SHA-256 public key pin.
pub const SHA256_PIN_PREFIX: &str = "sha256//";

/// An error that can arise parsing a pin blob or checking a certificate against it.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum PinError {
    /// A pin entry is not of the form `sha256//<base64 digest>`.
    #[error("unsupported public key pin format: {0:?}")]
    UnsupportedFormat(String),

    /// The certificate presented by the peer could not be parsed.
    #[error("failed parsing peer certificate: {0}")]
    CertParse(String),

    /// The peer's public key matches none of the pins.
    #[error("public key sha256//{actual} does not match any pinned public key")]
    Mismatch {
        /// Pin computed from the presented certificate.
        actual: String,
    },
}

/// Combines pins into the single blob the transport expects, preserving order.
///
/// An empty list yields an empty string, which means "no pin enforcement".
///
/// # Examples
///
/// ```
/// use fedtls::combine_pins;
///
/// assert_eq!(combine_pins::<&str>(&[]), "");
/// assert_eq!(combine_pins(&["p1", "p2"]), "p1;p2");
/// ```
pub fn combine_pins<S: AsRef<str>>(pins: &[S]) -> String {
    pins.iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(PIN_SEPARATOR)
}

/// Formats a base64 SHA-256 digest as a pin entry.
pub fn sha256_pin(digest: &str) -> String {
    format!("{SHA256_PIN_PREFIX}{digest}")
}

/// Computes the base64 SHA-256 digest of the SubjectPublicKeyInfo of a DER-encoded certificate.
///
/// # Errors
///
/// Returns [`PinError::CertParse`] if the bytes are not an X.509 certificate.
pub fn spki_sha256_digest(cert_der: &[u8]) -> Result<String, PinError> {
    let (_, cert) =
        X509Certificate::from_der(cert_der).map_err(|e| PinError::CertParse(e.to_string()))?;

    let digest = Sha256::digest(cert.public_key().raw);
    Ok(STANDARD.encode(digest))
}

/// The set of pins a server's public key is checked against.
///
/// An empty set disables the check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinSet {
    digests: Vec<String>,
}

impl PinSet {
    /// Parses a combined pin blob.
    ///
    /// # Errors
    ///
    /// Returns [`PinError::UnsupportedFormat`] for any entry that is not `sha256//<digest>`
    /// with a non-empty digest.
    pub fn parse(blob: &str) -> Result<Self, PinError> {
        if blob.is_empty() {
            return Ok(Self::default());
        }

        let digests = blob
            .split(PIN_SEPARATOR)
            .map(|entry| match entry.strip_prefix(SHA256_PIN_PREFIX) {
                Some(digest) if !digest.is_empty() => Ok(digest.to_owned()),
                _ => Err(PinError::UnsupportedFormat(entry.to_owned())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { digests })
    }

    /// Returns `true` if no pins are configured.
    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }

    /// Returns the number of pins.
    pub fn len(&self) -> usize {
        self.digests.len()
    }

    /// Checks a DER-encoded certificate's public key against the pins.
    ///
    /// Always succeeds for an empty set.
    ///
    /// # Errors
    ///
    /// Returns [`PinError::Mismatch`] if the key matches no pin, or [`PinError::CertParse`] if the
    /// certificate cannot be parsed.
    pub fn verify(&self, cert_der: &[u8]) -> Result<(), PinError> {
        if self.is_empty() {
            return Ok(());
        }

        let actual = spki_sha256_digest(cert_der)?;
        if self.digests.iter().any(|d| *d == actual) {
            Ok(())
        } else {
            Err(PinError::Mismatch { actual })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use x509_parser::pem::parse_x509_pem;

    const SERVER_PEM: &[u8] = include_bytes!("../tests/fixtures/server.pem");
    const CLIENT_PEM: &[u8] = include_bytes!("../tests/fixtures/client.pem");

    // openssl x509 -pubkey -noout | openssl pkey -pubin -outform der | openssl dgst -sha256 -binary | base64
    const SERVER_SPKI_DIGEST: &str = "WhogKZlmv0b8249zljqT+qSdZPQNA8pANV8zxQ79CYg=";

    fn der(pem: &[u8]) -> Vec<u8> {
        parse_x509_pem(pem).unwrap().1.contents
    }

    #[test]
    fn test_combine_pins_empty() {
        assert_eq!(combine_pins::<String>(&[]), "");
    }

    #[test]
    fn test_combine_pins_single() {
        assert_eq!(combine_pins(&["p1"]), "p1");
    }

    #[test]
    fn test_combine_pins_preserves_order() {
        assert_eq!(combine_pins(&["p1", "p2"]), "p1;p2");
        assert_eq!(combine_pins(&["p2", "p1"]), "p2;p1");
    }

    #[test]
    fn test_spki_digest_matches_openssl() {
        assert_eq!(spki_sha256_digest(&der(SERVER_PEM)).unwrap(), SERVER_SPKI_DIGEST);
    }

    #[test]
    fn test_spki_digest_of_garbage() {
        assert!(matches!(
            spki_sha256_digest(b"not a certificate"),
            Err(PinError::CertParse(_))
        ));
    }

    #[test]
    fn test_pin_set_parse_empty_disables_check() {
        let pins = PinSet::parse("").unwrap();

        assert!(pins.is_empty());
        pins.verify(b"never parsed").unwrap();
    }

    #[test]
    fn test_pin_set_parse_multiple() {
        let blob = combine_pins(&[sha256_pin("aa=="), sha256_pin("bb==")]);
        let pins = PinSet::parse(&blob).unwrap();

        assert_eq!(pins.len(), 2);
    }

    #[test]
    fn test_pin_set_parse_rejects_unknown_format() {
        assert_eq!(
            PinSet::parse("aa==").unwrap_err(),
            PinError::UnsupportedFormat("aa==".into())
        );
        assert_eq!(
            PinSet::parse("sha256//aa==;").unwrap_err(),
            PinError::UnsupportedFormat(String::new())
        );
        assert_eq!(
            PinSet::parse("sha256//").unwrap_err(),
            PinError::UnsupportedFormat("sha256//".into())
        );
    }

    #[test]
    fn test_pin_set_verify_match_any() {
        let blob = combine_pins(&[sha256_pin("aa=="), sha256_pin(SERVER_SPKI_DIGEST)]);
        let pins = PinSet::parse(&blob).unwrap();

        pins.verify(&der(SERVER_PEM)).unwrap();
    }

    #[test]
    fn test_pin_set_verify_mismatch() {
        let pins = PinSet::parse(&sha256_pin(SERVER_SPKI_DIGEST)).unwrap();

        let err = pins.verify(&der(CLIENT_PEM)).unwrap_err();
        assert!(matches!(err, PinError::Mismatch { .. }));
    }
}
