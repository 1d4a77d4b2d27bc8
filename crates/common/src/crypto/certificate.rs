//! X.509 certificates and single-hop issuer validation
//!
//! A [`Certificate`] is checked against exactly one issuer public key: the
//! issuer's PKCS#1 v1.5 signature over the to-be-signed bytes, using the hash
//! declared by the certificate itself. Validity dates, revocation, key usage
//! and longer chains are not considered.

use std::fmt;
use std::fs;
use std::path::Path;

use const_oid::db::rfc5912::{
    SHA_224_WITH_RSA_ENCRYPTION, SHA_256_WITH_RSA_ENCRYPTION, SHA_384_WITH_RSA_ENCRYPTION,
    SHA_512_WITH_RSA_ENCRYPTION,
};
use const_oid::ObjectIdentifier;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use x509_cert::der::{Decode, Encode};

use super::keys::PublicKey;

/// PEM tag for X.509 certificates
pub const CERTIFICATE_PEM_TAG: &str = "CERTIFICATE";

/// Errors that can occur while loading or validating a certificate
#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    #[error("failed to parse PEM: {0}")]
    Pem(#[from] pem::PemError),
    #[error("invalid PEM tag, expected CERTIFICATE, got {0}")]
    UnexpectedTag(String),
    #[error("invalid certificate encoding: {0}")]
    Der(#[from] x509_cert::der::Error),
    #[error("unsupported certificate signature algorithm: {0}")]
    UnsupportedAlgorithm(ObjectIdentifier),
    #[error("certificate signature is not a whole number of bytes")]
    MalformedSignature,
    #[error("certificate public key is not a usable RSA key: {0}")]
    PublicKey(String),
    #[error("certificate was not issued by the given key")]
    Mismatch,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

const RSA_SIGNATURE_ALGORITHMS: [(ObjectIdentifier, HashAlgorithm); 4] = [
    (SHA_224_WITH_RSA_ENCRYPTION, HashAlgorithm::Sha224),
    (SHA_256_WITH_RSA_ENCRYPTION, HashAlgorithm::Sha256),
    (SHA_384_WITH_RSA_ENCRYPTION, HashAlgorithm::Sha384),
    (SHA_512_WITH_RSA_ENCRYPTION, HashAlgorithm::Sha512),
];

/// Hash algorithm an issuer declared for its certificate signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Map an RSA PKCS#1 v1.5 signature algorithm OID to its hash
    pub fn from_signature_oid(oid: &ObjectIdentifier) -> Option<Self> {
        RSA_SIGNATURE_ALGORITHMS
            .iter()
            .find(|(known, _)| known == oid)
            .map(|(_, hash)| *hash)
    }

    fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha224 => Sha224::digest(data).to_vec(),
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha384 => Sha384::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    fn padding(&self) -> Pkcs1v15Sign {
        match self {
            Self::Sha224 => Pkcs1v15Sign::new::<Sha224>(),
            Self::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
            Self::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
            Self::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sha224 => "SHA-224",
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
        };
        f.write_str(name)
    }
}

/// A parsed X.509 certificate together with the PEM it was loaded from
///
/// The original PEM is kept so the certificate can be embedded in signed
/// directories byte for byte.
#[derive(Debug, Clone)]
pub struct Certificate {
    inner: x509_cert::Certificate,
    pem: Vec<u8>,
}

impl Certificate {
    /// Parse a PEM-encoded certificate
    pub fn from_pem(data: impl AsRef<[u8]>) -> Result<Self, CertificateError> {
        let data = data.as_ref();
        let pem = pem::parse(data)?;
        if pem.tag() != CERTIFICATE_PEM_TAG {
            return Err(CertificateError::UnexpectedTag(pem.tag().to_string()));
        }
        let inner = x509_cert::Certificate::from_der(pem.contents())?;
        Ok(Self {
            inner,
            pem: data.to_vec(),
        })
    }

    /// Read and parse a PEM certificate file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CertificateError> {
        let data = fs::read(path)?;
        Self::from_pem(data)
    }

    /// The PEM bytes this certificate was parsed from
    pub fn pem_bytes(&self) -> &[u8] {
        &self.pem
    }

    /// The parsed certificate structure
    pub fn inner(&self) -> &x509_cert::Certificate {
        &self.inner
    }

    /// Subject distinguished name, RFC 4514 style
    pub fn subject(&self) -> String {
        self.inner.tbs_certificate.subject.to_string()
    }

    /// Issuer distinguished name, RFC 4514 style
    pub fn issuer(&self) -> String {
        self.inner.tbs_certificate.issuer.to_string()
    }

    /// The DER bytes of the `tbsCertificate`, i.e. what the issuer signed.
    ///
    /// Parsing only accepts canonical DER, so re-encoding the parsed
    /// structure reproduces the signed bytes exactly.
    pub fn to_be_signed_bytes(&self) -> Result<Vec<u8>, CertificateError> {
        Ok(self.inner.tbs_certificate.to_der()?)
    }

    /// The issuer's raw signature bytes
    pub fn signature_bytes(&self) -> Result<&[u8], CertificateError> {
        self.inner
            .signature
            .as_bytes()
            .ok_or(CertificateError::MalformedSignature)
    }

    /// OID of the signature algorithm declared by the issuer
    pub fn signature_algorithm(&self) -> &ObjectIdentifier {
        &self.inner.signature_algorithm.oid
    }

    /// Hash algorithm declared by the issuer for its signature
    pub fn hash_algorithm(&self) -> Result<HashAlgorithm, CertificateError> {
        let oid = self.signature_algorithm();
        HashAlgorithm::from_signature_oid(oid)
            .ok_or(CertificateError::UnsupportedAlgorithm(*oid))
    }

    /// Extract the subject's RSA public key
    pub fn public_key(&self) -> Result<PublicKey, CertificateError> {
        let spki = self
            .inner
            .tbs_certificate
            .subject_public_key_info
            .to_der()?;
        let key = RsaPublicKey::from_public_key_der(&spki)
            .map_err(|e| CertificateError::PublicKey(e.to_string()))?;
        Ok(key.into())
    }

    /// Hex SHA-256 over the DER encoding of the whole certificate
    pub fn fingerprint(&self) -> Result<String, CertificateError> {
        Ok(hex::encode(Sha256::digest(self.inner.to_der()?)))
    }

    /// Check that this certificate was signed by `issuer_key`.
    ///
    /// Uses PKCS#1 v1.5 padding with the hash the certificate declares.
    ///
    /// # Errors
    ///
    /// - [`CertificateError::UnsupportedAlgorithm`] for non RSA-SHA2 signatures
    /// - [`CertificateError::MalformedSignature`] for a signature with unused bits
    /// - [`CertificateError::Mismatch`] if `issuer_key` did not produce the signature
    pub fn verify_issued_by(&self, issuer_key: &PublicKey) -> Result<(), CertificateError> {
        let hash = self.hash_algorithm()?;
        let tbs = self.to_be_signed_bytes()?;
        let signature = self.signature_bytes()?;
        RsaPublicKey::verify(issuer_key, hash.padding(), &hash.digest(&tbs), signature)
            .map_err(|_| CertificateError::Mismatch)
    }
}
