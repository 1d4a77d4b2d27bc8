//! Sealing directory trees
//!
//! A sealed directory carries two reserved files next to its content:
//!
//! - **[`SIGNATURE_FILE_NAME`]**: a [`SignatureManifest`], JSON mapping each
//!   immediate child name to a base64 signature
//! - **[`SUBMITTER_CERT_FILE_NAME`]**: the PEM certificate of the key that
//!   produced those signatures
//!
//! # Layout
//!
//! ```text
//! root/                      .__treeseal_sig.json  { "a.txt": sig(bytes of a.txt),
//!  ├── a.txt                                          "conf":  sig("conf") }
//!  └── conf/                 .__treeseal_submitter.crt
//!       └── b.yaml           conf/.__treeseal_sig.json  { "b.yaml": sig(bytes of b.yaml) }
//! ```
//!
//! Files are signed over their bytes, subfolders over their *name*. A
//! subfolder's content is covered by its own manifest once the walk reaches
//! it. Files and folders share one namespace per manifest.
//!
//! # Signing and verifying
//!
//! - [`FolderSigner`] walks the tree top-down with a global visit budget:
//!   once that many directories are sealed the walk stops, and everything not
//!   yet reached stays unsealed. Any failure is fatal.
//! - [`FolderVerifier`] walks the whole tree. In [`VerifyMode::Lenient`] a
//!   directory without a readable manifest or certificate is skipped; any
//!   other failure (untrusted certificate, bad signature, I/O) fails the whole
//!   tree. [`VerifyMode::Strict`] also fails on missing manifests and on
//!   unsigned or vanished entries.
//! - [`sign_all`] signs the files of a single directory in memory.
//!
//! Sibling order is not part of the protocol; listings are sorted by name
//! only to make walks reproducible.

mod flat;
mod manifest;
mod signer;
mod verifier;
mod walk;

pub use flat::sign_all;
pub use manifest::{ManifestError, SignatureManifest};
pub use signer::{sign_folders, FolderSigner, SealError, SignReport};
pub use verifier::{
    verify_folder_signature, DirectoryOutcome, FolderVerifier, SkipReason, VerifyError,
    VerifyMode, VerifyReport,
};

/// Reserved name of the per-directory signature manifest
pub const SIGNATURE_FILE_NAME: &str = ".__treeseal_sig.json";
/// Reserved name of the embedded submitter certificate
pub const SUBMITTER_CERT_FILE_NAME: &str = ".__treeseal_submitter.crt";

/// Whether `name` is one of the files the sealing protocol writes itself
pub fn is_reserved_name(name: &str) -> bool {
    name == SIGNATURE_FILE_NAME || name == SUBMITTER_CERT_FILE_NAME
}
