//! Test fixtures: RSA keys and certificates issued by a throwaway root
//!
//! Key generation and certificate issuance belong to an upstream CA workflow,
//! so none of this is part of the library proper. The fixtures only depend on
//! external crates, which lets integration tests pull this file in with
//! `#[path]` as well.
//!
//! - `root`: self-signed trust anchor, `CN=root`
//! - `submitter`: `CN=submitter`, issued by `root`
//! - `rogue`: claims to be `CN=submitter` issued by `CN=root`, but was signed
//!   by an unrelated key
#![allow(dead_code)]

use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use const_oid::db::rfc5912::{SHA_256_WITH_RSA_ENCRYPTION, SHA_384_WITH_RSA_ENCRYPTION};
use const_oid::ObjectIdentifier;
use rand_core::OsRng;
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::pkcs8::EncodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256, Sha384};
use x509_cert::certificate::{Certificate, TbsCertificate, Version};
use x509_cert::der::asn1::BitString;
use x509_cert::der::{Any, Decode, Encode};
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::time::Validity;

/// Small keys keep generation fast; PSS still has room for a 94 byte salt.
pub const TEST_KEY_BITS: usize = 1024;

const DER_NULL: [u8; 2] = [0x05, 0x00];
const VALIDITY: Duration = Duration::from_secs(24 * 60 * 60);

/// Hash the issuer declares for a test certificate
#[derive(Debug, Clone, Copy)]
pub enum IssuerHash {
    Sha256,
    Sha384,
}

impl IssuerHash {
    fn oid(&self) -> ObjectIdentifier {
        match self {
            Self::Sha256 => SHA_256_WITH_RSA_ENCRYPTION,
            Self::Sha384 => SHA_384_WITH_RSA_ENCRYPTION,
        }
    }

    fn sign(&self, key: &RsaPrivateKey, data: &[u8]) -> Vec<u8> {
        let result = match self {
            Self::Sha256 => key.sign(Pkcs1v15Sign::new::<Sha256>(), &Sha256::digest(data)),
            Self::Sha384 => key.sign(Pkcs1v15Sign::new::<Sha384>(), &Sha384::digest(data)),
        };
        result.expect("pkcs1v15 signing")
    }
}

struct Fixtures {
    root_key: RsaPrivateKey,
    submitter_key: RsaPrivateKey,
    rogue_key: RsaPrivateKey,
    root_cert_pem: String,
    submitter_cert_pem: String,
    rogue_cert_pem: String,
}

fn fixtures() -> &'static Fixtures {
    static FIXTURES: OnceLock<Fixtures> = OnceLock::new();
    FIXTURES.get_or_init(|| {
        let root_key = generate_key();
        let submitter_key = generate_key();
        let rogue_key = generate_key();

        let root_cert_pem = issue_cert_pem(
            "CN=root",
            &root_key.to_public_key(),
            "CN=root",
            &root_key,
            IssuerHash::Sha256,
        );
        let submitter_cert_pem = issue_cert_pem(
            "CN=submitter",
            &submitter_key.to_public_key(),
            "CN=root",
            &root_key,
            IssuerHash::Sha256,
        );
        let rogue_cert_pem = issue_cert_pem(
            "CN=submitter",
            &submitter_key.to_public_key(),
            "CN=root",
            &rogue_key,
            IssuerHash::Sha256,
        );

        Fixtures {
            root_key,
            submitter_key,
            rogue_key,
            root_cert_pem,
            submitter_cert_pem,
            rogue_cert_pem,
        }
    })
}

/// Generate a fresh RSA key of [`TEST_KEY_BITS`]
pub fn generate_key() -> RsaPrivateKey {
    RsaPrivateKey::new(&mut OsRng, TEST_KEY_BITS).expect("rsa key generation")
}

pub fn root_key() -> &'static RsaPrivateKey {
    &fixtures().root_key
}

pub fn submitter_key() -> &'static RsaPrivateKey {
    &fixtures().submitter_key
}

pub fn rogue_key() -> &'static RsaPrivateKey {
    &fixtures().rogue_key
}

pub fn root_cert_pem() -> &'static str {
    &fixtures().root_cert_pem
}

pub fn submitter_cert_pem() -> &'static str {
    &fixtures().submitter_cert_pem
}

pub fn rogue_cert_pem() -> &'static str {
    &fixtures().rogue_cert_pem
}

/// PKCS#1 PEM of the submitter's private key
pub fn submitter_key_pem() -> String {
    submitter_key()
        .to_pkcs1_pem(rsa::pkcs8::LineEnding::LF)
        .expect("pkcs1 pem")
        .to_string()
}

/// Issue a certificate for `subject_key`, signed PKCS#1 v1.5 by `issuer_key`
pub fn issue_cert_pem(
    subject: &str,
    subject_key: &RsaPublicKey,
    issuer: &str,
    issuer_key: &RsaPrivateKey,
    hash: IssuerHash,
) -> String {
    let algorithm = AlgorithmIdentifierOwned {
        oid: hash.oid(),
        parameters: Some(Any::from_der(&DER_NULL).expect("der null")),
    };
    let spki = subject_key.to_public_key_der().expect("spki der");

    let tbs_certificate = TbsCertificate {
        version: Version::V3,
        serial_number: SerialNumber::new(&[0x01]).expect("serial number"),
        signature: algorithm.clone(),
        issuer: Name::from_str(issuer).expect("issuer name"),
        validity: Validity::from_now(VALIDITY).expect("validity"),
        subject: Name::from_str(subject).expect("subject name"),
        subject_public_key_info: SubjectPublicKeyInfoOwned::from_der(spki.as_bytes())
            .expect("spki"),
        issuer_unique_id: None,
        subject_unique_id: None,
        extensions: None,
    };

    let tbs_der = tbs_certificate.to_der().expect("tbs der");
    let signature = hash.sign(issuer_key, &tbs_der);

    let certificate = Certificate {
        tbs_certificate,
        signature_algorithm: algorithm,
        signature: BitString::from_bytes(&signature).expect("signature bit string"),
    };
    let der = certificate.to_der().expect("certificate der");
    pem::encode(&pem::Pem::new("CERTIFICATE", der))
}
