//! Content signatures using RSASSA-PSS
//!
//! Content (file bytes, folder names) is signed with:
//! - **Hash**: SHA-256
//! - **Mask generation**: MGF1 with SHA-256
//! - **Salt length**: the maximum the key allows (`emLen - hLen - 2`)
//!
//! The salt is random, so signing the same content twice yields two different
//! signatures. Both verify; only verification equivalence is guaranteed.

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rand_core::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{Pss, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

/// Size of a SHA-256 digest in bytes
pub const CONTENT_HASH_SIZE: usize = 32;

/// Errors that can occur while signing or verifying content
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("signature is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("signature is not a base64 string but {0}")]
    NotText(&'static str),
    #[error("signature does not match content")]
    Mismatch,
    #[error("failed to sign content: {0}")]
    Signing(rsa::Error),
}

/// A detached RSASSA-PSS signature over some content
///
/// Signatures travel as raw bytes between in-process calls and as
/// standard, padded base64 when embedded in JSON.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature(Vec<u8>);

impl Signature {
    /// Decode a signature from base64 text
    pub fn from_base64(encoded: &str) -> Result<Self, SignatureError> {
        Ok(Self(BASE64.decode(encoded.as_bytes())?))
    }

    /// Encode the signature as base64 text
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for Signature {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<u8>> for Signature {
    fn from(bytes: Vec<u8>) -> Self {
        Signature(bytes)
    }
}

impl From<&[u8]> for Signature {
    fn from(bytes: &[u8]) -> Self {
        Signature(bytes.to_vec())
    }
}

impl FromStr for Signature {
    type Err = SignatureError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base64(s)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_base64())
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::from_base64(&encoded).map_err(serde::de::Error::custom)
    }
}

/// Largest PSS salt the key's modulus can carry alongside a SHA-256 digest
pub(crate) fn max_salt_len(key: &impl PublicKeyParts) -> usize {
    let em_bits = key.n().bits().saturating_sub(1);
    let em_len = em_bits.div_ceil(8);
    em_len.saturating_sub(CONTENT_HASH_SIZE + 2)
}

fn content_padding(key: &impl PublicKeyParts) -> Pss {
    Pss::new_with_salt::<Sha256>(max_salt_len(key))
}

/// Sign arbitrary content. Text is signed as its UTF-8 bytes.
pub fn sign_content(
    content: impl AsRef<[u8]>,
    signing_key: &RsaPrivateKey,
) -> Result<Signature, SignatureError> {
    let digest = Sha256::digest(content.as_ref());
    signing_key
        .sign_with_rng(&mut OsRng, content_padding(signing_key), &digest)
        .map(Signature)
        .map_err(SignatureError::Signing)
}

/// Verify a signature over arbitrary content.
///
/// # Errors
///
/// Returns [`SignatureError::Mismatch`] if the signature was not produced
/// over `content` by the private half of `public_key`.
pub fn verify_content(
    content: impl AsRef<[u8]>,
    signature: &Signature,
    public_key: &RsaPublicKey,
) -> Result<(), SignatureError> {
    let digest = Sha256::digest(content.as_ref());
    public_key
        .verify(content_padding(public_key), &digest, signature.as_bytes())
        .map_err(|_| SignatureError::Mismatch)
}
