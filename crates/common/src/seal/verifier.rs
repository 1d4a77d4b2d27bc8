use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::crypto::{Certificate, CertificateError, PublicKey, SignatureError};

use super::manifest::{ManifestError, SignatureManifest};
use super::walk::{Listing, TreeWalk, WalkError};
use super::{is_reserved_name, SUBMITTER_CERT_FILE_NAME};

/// How strictly a tree is checked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VerifyMode {
    /// Directories without a readable manifest or certificate are skipped,
    /// and entries without a recorded signature are accepted.
    ///
    /// Anyone able to delete a directory's manifest can therefore exempt
    /// that directory from verification.
    #[default]
    Lenient,
    /// Every directory must carry a manifest and certificate, every entry
    /// must be signed, and every signed entry must still exist.
    Strict,
}

/// Why a directory was not independently verified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    ManifestMissing,
    ManifestUnreadable(String),
    CertificateMissing,
    CertificateUnreadable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ManifestMissing => write!(f, "no signature manifest"),
            Self::ManifestUnreadable(e) => write!(f, "unreadable signature manifest: {}", e),
            Self::CertificateMissing => write!(f, "no submitter certificate"),
            Self::CertificateUnreadable(e) => write!(f, "unreadable submitter certificate: {}", e),
        }
    }
}

/// What happened to a single directory during verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryOutcome {
    /// Certificate trusted and every recorded signature checked out
    Verified { entries_checked: usize },
    /// Not verified, and not a failure either
    Skipped(SkipReason),
}

/// Reasons a tree fails verification. The first one ends the walk.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("root certificate error: {0}")]
    RootCertificate(#[source] CertificateError),
    #[error("submitter certificate in {} is not trusted: {source}", dir.display())]
    UntrustedCertificate {
        dir: PathBuf,
        #[source]
        source: CertificateError,
    },
    #[error("signature mismatch for {}", path.display())]
    BadSignature { path: PathBuf },
    #[error("malformed signature for {}: {source}", path.display())]
    MalformedSignature {
        path: PathBuf,
        #[source]
        source: SignatureError,
    },
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("entry name is not valid UTF-8: {}", .0.display())]
    NonUtf8Name(PathBuf),
    #[error("manifest {} is not a JSON object", path.display())]
    MalformedManifest { path: PathBuf },
    #[error("{} is not sealed: {reason}", dir.display())]
    MissingManifest { dir: PathBuf, reason: SkipReason },
    #[error("no signature recorded for {}", path.display())]
    Unsigned { path: PathBuf },
    #[error("signed entry {} no longer exists", path.display())]
    MissingEntry { path: PathBuf },
}

impl From<WalkError> for VerifyError {
    fn from(e: WalkError) -> Self {
        match e {
            WalkError::Io { path, source } => VerifyError::Io { path, source },
            WalkError::NonUtf8Name(path) => VerifyError::NonUtf8Name(path),
        }
    }
}

/// Summary of a successful verification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// Directories whose certificate and signatures were checked
    pub verified: Vec<PathBuf>,
    /// Directories accepted without checking, with the reason
    pub skipped: Vec<(PathBuf, SkipReason)>,
    /// Signatures checked across all verified directories
    pub entries_checked: usize,
}

impl VerifyReport {
    fn record(&mut self, dir: PathBuf, outcome: DirectoryOutcome) {
        match outcome {
            DirectoryOutcome::Verified { entries_checked } => {
                self.entries_checked += entries_checked;
                self.verified.push(dir);
            }
            DirectoryOutcome::Skipped(reason) => self.skipped.push((dir, reason)),
        }
    }
}

/// Checks sealed directory trees against a trusted root certificate
///
/// For each directory the embedded submitter certificate must have been
/// issued by the root, and each recorded signature must match the file bytes
/// or folder name it covers. See [`VerifyMode`] for how missing pieces are
/// treated.
#[derive(Debug, Clone)]
pub struct FolderVerifier {
    root: Certificate,
    root_key: PublicKey,
    mode: VerifyMode,
}

impl FolderVerifier {
    /// Create a verifier trusting `root`
    pub fn new(root: Certificate) -> Result<Self, VerifyError> {
        let root_key = root.public_key().map_err(VerifyError::RootCertificate)?;
        Ok(Self {
            root,
            root_key,
            mode: VerifyMode::default(),
        })
    }

    /// Create a verifier trusting the PEM certificate at `path`
    pub fn from_root_cert_file(path: impl AsRef<Path>) -> Result<Self, VerifyError> {
        let root = Certificate::load(path).map_err(VerifyError::RootCertificate)?;
        Self::new(root)
    }

    pub fn with_mode(mut self, mode: VerifyMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> VerifyMode {
        self.mode
    }

    pub fn root(&self) -> &Certificate {
        &self.root
    }

    /// Verify the tree rooted at `src`, stopping at the first failure.
    pub fn verify(&self, src: impl AsRef<Path>) -> Result<VerifyReport, VerifyError> {
        let src = src.as_ref();
        tracing::debug!(
            "Verifying {} against {} ({:?})",
            src.display(),
            self.root.subject(),
            self.mode
        );

        let mut report = VerifyReport::default();
        for visit in TreeWalk::new(src) {
            let visit = visit?;
            let outcome = self.verify_directory(&visit.dir, &visit.listing)?;
            report.record(visit.dir, outcome);
        }

        tracing::info!(
            "Verified {}: {} directories checked, {} skipped, {} signatures",
            src.display(),
            report.verified.len(),
            report.skipped.len(),
            report.entries_checked
        );
        Ok(report)
    }

    /// Verify the tree rooted at `src`, reducing the outcome to a boolean
    pub fn is_valid(&self, src: impl AsRef<Path>) -> bool {
        match self.verify(src) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Verification failed: {}", e);
                false
            }
        }
    }

    fn verify_directory(
        &self,
        dir: &Path,
        listing: &Listing,
    ) -> Result<DirectoryOutcome, VerifyError> {
        let (manifest, certificate, public_key) = match load_seal(dir)? {
            Seal::Present {
                manifest,
                certificate,
                public_key,
            } => (manifest, certificate, public_key),
            Seal::Absent(reason) => {
                if self.mode == VerifyMode::Strict {
                    return Err(VerifyError::MissingManifest {
                        dir: dir.to_path_buf(),
                        reason,
                    });
                }
                tracing::warn!("Skipping {}: {}", dir.display(), reason);
                return Ok(DirectoryOutcome::Skipped(reason));
            }
        };

        certificate
            .verify_issued_by(&self.root_key)
            .map_err(|source| VerifyError::UntrustedCertificate {
                dir: dir.to_path_buf(),
                source,
            })?;

        let mut entries_checked = 0;

        for name in listing.files.iter().filter(|name| !is_reserved_name(name)) {
            let path = dir.join(name);
            if self.check_entry(&manifest, &public_key, &path, name, || {
                fs::read(&path).map_err(|source| VerifyError::Io {
                    path: path.clone(),
                    source,
                })
            })? {
                entries_checked += 1;
            }
        }

        for folder in &listing.folders {
            let path = dir.join(&folder.name);
            if self.check_entry(&manifest, &public_key, &path, &folder.name, || {
                Ok(folder.name.clone().into_bytes())
            })? {
                entries_checked += 1;
            }
        }

        if self.mode == VerifyMode::Strict {
            if let Some(name) = manifest.names().find(|name| !listing.contains(name)) {
                return Err(VerifyError::MissingEntry {
                    path: dir.join(name),
                });
            }
        }

        tracing::debug!(
            "Verified {} ({} signatures, signed by {})",
            dir.display(),
            entries_checked,
            certificate.subject()
        );
        Ok(DirectoryOutcome::Verified { entries_checked })
    }

    /// Check one entry's recorded signature. Returns whether one was checked.
    fn check_entry(
        &self,
        manifest: &SignatureManifest,
        public_key: &PublicKey,
        path: &Path,
        name: &str,
        content: impl FnOnce() -> Result<Vec<u8>, VerifyError>,
    ) -> Result<bool, VerifyError> {
        let signature = match manifest.signature(name) {
            Some(signature) => signature.map_err(|source| VerifyError::MalformedSignature {
                path: path.to_path_buf(),
                source,
            })?,
            None if self.mode == VerifyMode::Strict => {
                return Err(VerifyError::Unsigned {
                    path: path.to_path_buf(),
                })
            }
            None => return Ok(false),
        };

        public_key
            .verify(content()?, &signature)
            .map_err(|_| VerifyError::BadSignature {
                path: path.to_path_buf(),
            })?;
        Ok(true)
    }
}

/// A directory's manifest and submitter certificate, or why it has none
enum Seal {
    Present {
        manifest: SignatureManifest,
        certificate: Certificate,
        public_key: PublicKey,
    },
    Absent(SkipReason),
}

/// Load a directory's seal. Missing or unparsable files make it absent;
/// a manifest that parses as JSON but is not an object is a failure.
fn load_seal(dir: &Path) -> Result<Seal, VerifyError> {
    let manifest = match SignatureManifest::load(dir) {
        Ok(manifest) => manifest,
        Err(ManifestError::NotAnObject { path }) => {
            return Err(VerifyError::MalformedManifest { path })
        }
        Err(e) if e.is_not_found() => return Ok(Seal::Absent(SkipReason::ManifestMissing)),
        Err(e) => return Ok(Seal::Absent(SkipReason::ManifestUnreadable(e.to_string()))),
    };

    let cert_path = dir.join(SUBMITTER_CERT_FILE_NAME);
    let certificate = match Certificate::load(&cert_path) {
        Ok(certificate) => certificate,
        Err(CertificateError::Io(ref io)) if io.kind() == io::ErrorKind::NotFound => {
            return Ok(Seal::Absent(SkipReason::CertificateMissing))
        }
        Err(e) => return Ok(Seal::Absent(SkipReason::CertificateUnreadable(e.to_string()))),
    };
    let public_key = match certificate.public_key() {
        Ok(public_key) => public_key,
        Err(e) => return Ok(Seal::Absent(SkipReason::CertificateUnreadable(e.to_string()))),
    };

    Ok(Seal::Present {
        manifest,
        certificate,
        public_key,
    })
}

/// Verify the tree at `src_folder` against the root certificate at
/// `root_cert_path`, in lenient mode.
///
/// Returns `false` on any failure, including an unreadable root certificate;
/// the reason is logged.
pub fn verify_folder_signature(
    src_folder: impl AsRef<Path>,
    root_cert_path: impl AsRef<Path>,
) -> bool {
    match FolderVerifier::from_root_cert_file(root_cert_path) {
        Ok(verifier) => verifier.is_valid(src_folder),
        Err(e) => {
            tracing::warn!("Verification failed: {}", e);
            false
        }
    }
}
