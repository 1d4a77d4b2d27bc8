use std::fmt;
use std::fs;
use std::ops::Deref;
use std::path::Path;

use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

use super::signature::{sign_content, verify_content, Signature, SignatureError};

/// PEM tag for PKCS#1 ("traditional OpenSSL") private keys
pub const PKCS1_PRIVATE_KEY_TAG: &str = "RSA PRIVATE KEY";
/// PEM tag for PKCS#8 private keys
pub const PKCS8_PRIVATE_KEY_TAG: &str = "PRIVATE KEY";
/// PEM tag for encrypted PKCS#8 private keys, which we refuse to load
pub const ENCRYPTED_PRIVATE_KEY_TAG: &str = "ENCRYPTED PRIVATE KEY";
/// PEM tag for SubjectPublicKeyInfo public keys
pub const SPKI_PUBLIC_KEY_TAG: &str = "PUBLIC KEY";
/// PEM tag for PKCS#1 public keys
pub const PKCS1_PUBLIC_KEY_TAG: &str = "RSA PUBLIC KEY";

/// Errors that can occur during key operations
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("key error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// RSA public key used to check content and certificate signatures
///
/// Usually extracted from a certificate (see
/// [`Certificate::public_key`](super::Certificate::public_key)) rather than
/// loaded on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey(RsaPublicKey);

impl Deref for PublicKey {
    type Target = RsaPublicKey;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<RsaPublicKey> for PublicKey {
    fn from(key: RsaPublicKey) -> Self {
        PublicKey(key)
    }
}

impl From<PublicKey> for RsaPublicKey {
    fn from(key: PublicKey) -> Self {
        key.0
    }
}

impl PublicKey {
    /// Parse a public key from PEM, either SPKI (`PUBLIC KEY`) or PKCS#1
    /// (`RSA PUBLIC KEY`)
    pub fn from_pem(pem_str: &str) -> Result<Self, KeyError> {
        let pem = pem::parse(pem_str).map_err(|e| anyhow::anyhow!("failed to parse PEM: {}", e))?;

        let key = match pem.tag() {
            SPKI_PUBLIC_KEY_TAG => RsaPublicKey::from_public_key_der(pem.contents())
                .map_err(|e| anyhow::anyhow!("invalid SPKI public key: {}", e))?,
            PKCS1_PUBLIC_KEY_TAG => RsaPublicKey::from_pkcs1_der(pem.contents())
                .map_err(|e| anyhow::anyhow!("invalid PKCS#1 public key: {}", e))?,
            other => {
                return Err(anyhow::anyhow!(
                    "invalid PEM tag, expected {} or {}, got {}",
                    SPKI_PUBLIC_KEY_TAG,
                    PKCS1_PUBLIC_KEY_TAG,
                    other
                )
                .into())
            }
        };
        Ok(Self(key))
    }

    /// Encode the public key as SPKI PEM
    pub fn to_pem(&self) -> Result<String, KeyError> {
        let der = self
            .0
            .to_public_key_der()
            .map_err(|e| anyhow::anyhow!("failed to encode public key: {}", e))?;
        Ok(pem::encode(&pem::Pem::new(SPKI_PUBLIC_KEY_TAG, der.as_bytes())))
    }

    /// Size of the modulus in bits
    pub fn bits(&self) -> usize {
        self.0.n().bits()
    }

    /// Hex SHA-256 over the SPKI DER encoding, for logs and diagnostics
    pub fn fingerprint(&self) -> String {
        match self.0.to_public_key_der() {
            Ok(der) => hex::encode(Sha256::digest(der.as_bytes())),
            Err(_) => "unknown".to_string(),
        }
    }

    /// Verify a content signature made by the matching [`SecretKey`].
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::Mismatch`] if the signature does not match.
    pub fn verify(
        &self,
        content: impl AsRef<[u8]>,
        signature: &Signature,
    ) -> Result<(), SignatureError> {
        verify_content(content, signature, &self.0)
    }

    /// Verify a base64-encoded content signature.
    pub fn verify_base64(
        &self,
        content: impl AsRef<[u8]>,
        signature: &str,
    ) -> Result<(), SignatureError> {
        self.verify(content, &Signature::from_base64(signature)?)
    }
}

/// RSA private key of a submitter
///
/// The key is supplied by the caller (typically issued alongside the
/// submitter certificate by an upstream CA workflow); this crate never
/// generates or persists keys on its own.
///
/// # Examples
///
/// ```ignore
/// let key = SecretKey::load("submitter.key")?;
/// let signature = key.sign(b"content")?;
/// key.public().verify(b"content", &signature)?;
/// ```
#[derive(Clone)]
pub struct SecretKey(RsaPrivateKey);

impl From<RsaPrivateKey> for SecretKey {
    fn from(key: RsaPrivateKey) -> Self {
        Self(key)
    }
}

impl Deref for SecretKey {
    type Target = RsaPrivateKey;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("bits", &self.0.n().bits())
            .finish_non_exhaustive()
    }
}

impl SecretKey {
    /// Parse an unencrypted private key from PEM
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The PEM string is malformed
    /// - The PEM tag is neither `RSA PRIVATE KEY` nor `PRIVATE KEY`
    /// - The key is encrypted
    /// - The DER payload is not an RSA private key
    pub fn from_pem(pem_str: &str) -> Result<Self, KeyError> {
        let pem = pem::parse(pem_str).map_err(|e| anyhow::anyhow!("failed to parse PEM: {}", e))?;

        let key = match pem.tag() {
            PKCS1_PRIVATE_KEY_TAG => RsaPrivateKey::from_pkcs1_der(pem.contents())
                .map_err(|e| anyhow::anyhow!("invalid PKCS#1 private key: {}", e))?,
            PKCS8_PRIVATE_KEY_TAG => RsaPrivateKey::from_pkcs8_der(pem.contents())
                .map_err(|e| anyhow::anyhow!("invalid PKCS#8 private key: {}", e))?,
            ENCRYPTED_PRIVATE_KEY_TAG => {
                return Err(anyhow::anyhow!("encrypted private keys are not supported").into())
            }
            other => {
                return Err(anyhow::anyhow!(
                    "invalid PEM tag, expected {} or {}, got {}",
                    PKCS1_PRIVATE_KEY_TAG,
                    PKCS8_PRIVATE_KEY_TAG,
                    other
                )
                .into())
            }
        };
        Ok(Self(key))
    }

    /// Read and parse a PEM private key file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, KeyError> {
        let pem = fs::read_to_string(path)?;
        Self::from_pem(&pem)
    }

    /// Encode the private key as PKCS#1 PEM (`RSA PRIVATE KEY`)
    pub fn to_pem(&self) -> Result<String, KeyError> {
        let der = self
            .0
            .to_pkcs1_der()
            .map_err(|e| anyhow::anyhow!("failed to encode private key: {}", e))?;
        Ok(pem::encode(&pem::Pem::new(PKCS1_PRIVATE_KEY_TAG, der.as_bytes())))
    }

    /// Derive the public key from this secret key
    pub fn public(&self) -> PublicKey {
        PublicKey(self.0.to_public_key())
    }

    /// Sign content with RSASSA-PSS (SHA-256, MGF1-SHA-256, maximum salt).
    pub fn sign(&self, content: impl AsRef<[u8]>) -> Result<Signature, SignatureError> {
        sign_content(content, &self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use rsa::pkcs8::{EncodePrivateKey, LineEnding};

    use crate::testkit;

    #[test]
    fn test_pem_serialization() {
        let secret_key = SecretKey::from(testkit::submitter_key().clone());

        let pem = secret_key.to_pem().unwrap();
        assert!(pem.contains("BEGIN RSA PRIVATE KEY"));
        let recovered = SecretKey::from_pem(&pem).unwrap();
        assert_eq!(recovered.public(), secret_key.public());
    }

    #[test]
    fn test_pkcs8_pem() {
        let pem = testkit::submitter_key()
            .to_pkcs8_pem(LineEnding::LF)
            .unwrap();
        let recovered = SecretKey::from_pem(&pem).unwrap();
        assert_eq!(recovered.public().bits(), 1024);
    }

    #[test]
    fn test_rejects_other_tags() {
        let pem = pem::encode(&pem::Pem::new(ENCRYPTED_PRIVATE_KEY_TAG, vec![0u8; 16]));
        assert!(SecretKey::from_pem(&pem).is_err());

        let pem = pem::encode(&pem::Pem::new("CERTIFICATE", vec![0u8; 16]));
        assert!(SecretKey::from_pem(&pem).is_err());

        assert!(SecretKey::from_pem("not a pem").is_err());
    }

    #[test]
    fn test_public_key_pem() {
        let public = SecretKey::from(testkit::submitter_key().clone()).public();
        let pem = public.to_pem().unwrap();
        assert_eq!(PublicKey::from_pem(&pem).unwrap(), public);
        assert_eq!(public.fingerprint().len(), 64);
    }

    #[test]
    fn test_sign_and_verify() {
        let secret_key = SecretKey::from(testkit::submitter_key().clone());
        let public_key = secret_key.public();
        let message = b"hello, world!";

        let signature = secret_key.sign(message).unwrap();
        assert!(public_key.verify(message, &signature).is_ok());
        assert!(public_key
            .verify_base64(message, &signature.to_base64())
            .is_ok());

        // Verify fails with wrong message
        assert!(public_key.verify(b"hello, world?", &signature).is_err());

        // Verify fails with wrong key
        let other_key = SecretKey::from(testkit::root_key().clone()).public();
        assert!(other_key.verify(message, &signature).is_err());

        // Malformed base64 is reported separately from a mismatch
        assert!(matches!(
            public_key.verify_base64(message, "%%%"),
            Err(SignatureError::Base64(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submitter.key");
        let secret_key = SecretKey::from(testkit::submitter_key().clone());
        fs::write(&path, secret_key.to_pem().unwrap()).unwrap();

        let loaded = SecretKey::load(&path).unwrap();
        assert_eq!(loaded.public(), secret_key.public());
        assert!(matches!(
            SecretKey::load(dir.path().join("missing.key")),
            Err(KeyError::Io(_))
        ));
    }
}
