//! Cryptographic primitives for treeseal
//!
//! This module provides the two primitives the sealing protocol is built on:
//!
//! - **Content signing**: RSASSA-PSS (SHA-256, MGF1-SHA-256, maximum salt) over
//!   arbitrary bytes, see [`SecretKey::sign`] and [`PublicKey::verify`]
//! - **Certificate validation**: single-hop check that a [`Certificate`] was
//!   issued by a given public key, see [`Certificate::verify_issued_by`]
//!
//! # Trust Model
//!
//! ## Submitters
//! A submitter holds an RSA private key and a certificate for its public key.
//! The submitter signs content with the private key and ships the certificate
//! next to the signatures.
//!
//! ## Roots
//! A verifier holds a trusted root certificate. A submitter certificate is
//! accepted when the root's key produced its PKCS#1 v1.5 signature, using the
//! hash the certificate declares. Content signatures are then checked against
//! the submitter certificate's key.
//!
//! Key generation, certificate issuance, revocation and rotation happen
//! upstream and are out of scope here.

mod certificate;
mod keys;
mod signature;

pub use certificate::{Certificate, CertificateError, HashAlgorithm, CERTIFICATE_PEM_TAG};
pub use keys::{KeyError, PublicKey, SecretKey};
pub use signature::{sign_content, verify_content, Signature, SignatureError};
