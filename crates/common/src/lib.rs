/**
 * Cryptographic types and operations.
 *  - RSA submitter keys and content signatures
 *  - X.509 certificates and issuer checks
 */
pub mod crypto;
/**
 * Sealing directory trees: per-directory
 *  signature manifests, the tree signer and
 *  verifier, and the flat single-directory signer.
 */
pub mod seal;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

#[cfg(test)]
pub(crate) mod testkit;

pub mod prelude {
    pub use crate::crypto::{Certificate, PublicKey, SecretKey, Signature};
    pub use crate::seal::{
        sign_all, sign_folders, verify_folder_signature, FolderSigner, FolderVerifier, SealError,
        VerifyError, VerifyMode,
    };
    pub use crate::version::build_info;
}
