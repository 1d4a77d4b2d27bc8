use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::crypto::{Certificate, CertificateError, KeyError, SecretKey, SignatureError};

use super::manifest::{ManifestError, SignatureManifest};
use super::walk::{Listing, TreeWalk, WalkError};
use super::{is_reserved_name, SUBMITTER_CERT_FILE_NAME};

/// Errors that abort signing. Nothing is ever skipped on the signing side.
#[derive(Debug, thiserror::Error)]
pub enum SealError {
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("entry name is not valid UTF-8: {}", .0.display())]
    NonUtf8Name(PathBuf),
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),
    #[error("submitter certificate error: {0}")]
    Certificate(#[from] CertificateError),
    #[error("signing key error: {0}")]
    Key(#[from] KeyError),
    #[error("signature error: {0}")]
    Signature(#[from] SignatureError),
    #[error("submitter certificate does not belong to the signing key")]
    KeyMismatch,
}

impl From<WalkError> for SealError {
    fn from(e: WalkError) -> Self {
        match e {
            WalkError::Io { path, source } => SealError::Io { path, source },
            WalkError::NonUtf8Name(path) => SealError::NonUtf8Name(path),
        }
    }
}

/// Summary of a signing run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignReport {
    /// Directories that received a manifest and certificate
    pub directories: Vec<PathBuf>,
    /// Files and subfolder names signed across all directories
    pub entries_signed: usize,
    /// True when the visit budget stopped the walk before the tree was covered
    pub budget_exhausted: bool,
}

/// Seals a directory tree with a submitter key and certificate
///
/// Every visited directory gets a [`SignatureManifest`] over its immediate
/// children plus a copy of the submitter certificate. Directories are visited
/// top-down; the optional visit budget counts directories globally, not per
/// branch, so a small budget can cover one branch deeply and leave its
/// siblings untouched.
///
/// # Examples
///
/// ```ignore
/// let key = SecretKey::load("submitter.key")?;
/// let signer = FolderSigner::from_cert_file(key, "submitter.crt")?.with_max_visits(10);
/// let report = signer.sign("workspace/")?;
/// ```
#[derive(Debug, Clone)]
pub struct FolderSigner {
    key: SecretKey,
    certificate: Certificate,
    max_visits: Option<usize>,
}

impl FolderSigner {
    /// Create a signer, checking that `certificate` is for `key`
    pub fn new(key: SecretKey, certificate: Certificate) -> Result<Self, SealError> {
        if certificate.public_key()? != key.public() {
            return Err(SealError::KeyMismatch);
        }
        Ok(Self {
            key,
            certificate,
            max_visits: None,
        })
    }

    /// Create a signer from a PEM certificate on disk
    pub fn from_cert_file(key: SecretKey, cert_path: impl AsRef<Path>) -> Result<Self, SealError> {
        Self::new(key, Certificate::load(cert_path)?)
    }

    /// Stop after this many directories have been sealed.
    ///
    /// The root is always sealed, so `0` behaves like `1`.
    pub fn with_max_visits(mut self, max_visits: usize) -> Self {
        self.max_visits = Some(max_visits);
        self
    }

    pub fn max_visits(&self) -> Option<usize> {
        self.max_visits
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// Seal the tree rooted at `root`.
    ///
    /// Overwrites existing manifests and certificates. The first failure
    /// aborts the run; directories sealed before it keep their files.
    pub fn sign(&self, root: impl AsRef<Path>) -> Result<SignReport, SealError> {
        let root = root.as_ref();
        tracing::info!(
            "Sealing {} as {} (budget: {:?})",
            root.display(),
            self.certificate.subject(),
            self.max_visits
        );

        let mut report = SignReport::default();
        let mut walk = TreeWalk::new(root);
        while let Some(visit) = walk.next() {
            let visit = visit?;
            report.entries_signed += self.sign_directory(&visit.dir, &visit.listing)?;
            report.directories.push(visit.dir);

            if self
                .max_visits
                .is_some_and(|max| report.directories.len() >= max)
            {
                report.budget_exhausted = walk.has_pending();
                break;
            }
        }

        tracing::info!(
            "Sealed {} directories ({} entries){}",
            report.directories.len(),
            report.entries_signed,
            if report.budget_exhausted {
                ", visit budget exhausted"
            } else {
                ""
            }
        );
        Ok(report)
    }

    fn sign_directory(&self, dir: &Path, listing: &Listing) -> Result<usize, SealError> {
        let mut manifest = SignatureManifest::new();

        for name in listing.files.iter().filter(|name| !is_reserved_name(name)) {
            let path = dir.join(name);
            let content = fs::read(&path).map_err(|source| SealError::Io {
                path: path.clone(),
                source,
            })?;
            manifest.insert(name.as_str(), &self.key.sign(&content)?);
        }

        // only the name; the folder's content gets its own manifest
        for folder in &listing.folders {
            manifest.insert(folder.name.as_str(), &self.key.sign(&folder.name)?);
        }

        manifest.save(dir)?;

        let cert_path = dir.join(SUBMITTER_CERT_FILE_NAME);
        fs::write(&cert_path, self.certificate.pem_bytes()).map_err(|source| SealError::Io {
            path: cert_path,
            source,
        })?;

        tracing::debug!("Sealed {} ({} entries)", dir.display(), manifest.len());
        Ok(manifest.len())
    }
}

/// Seal `folder` with `key`, embedding the certificate at `cert_path`.
///
/// `max_visits` of `None` walks the whole tree.
pub fn sign_folders(
    folder: impl AsRef<Path>,
    key: &SecretKey,
    cert_path: impl AsRef<Path>,
    max_visits: Option<usize>,
) -> Result<SignReport, SealError> {
    let mut signer = FolderSigner::from_cert_file(key.clone(), cert_path)?;
    signer.max_visits = max_visits;
    signer.sign(folder)
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::seal::SIGNATURE_FILE_NAME;
    use crate::testkit;

    fn signer() -> FolderSigner {
        FolderSigner::new(
            SecretKey::from(testkit::submitter_key().clone()),
            Certificate::from_pem(testkit::submitter_cert_pem()).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_certificate_for_other_key() {
        let result = FolderSigner::new(
            SecretKey::from(testkit::rogue_key().clone()),
            Certificate::from_pem(testkit::submitter_cert_pem()).unwrap(),
        );
        assert!(matches!(result, Err(SealError::KeyMismatch)));
    }

    #[test]
    fn test_sign_directory_contents() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::write(root.join("a.txt"), b"alpha").unwrap();
        fs::create_dir(root.join("sub")).unwrap();

        let report = signer().sign(root).unwrap();
        assert_eq!(report.directories.len(), 2);
        assert_eq!(report.entries_signed, 2);
        assert!(!report.budget_exhausted);

        let manifest = SignatureManifest::load(root).unwrap();
        let names: Vec<_> = manifest.names().collect();
        assert_eq!(names, vec!["a.txt", "sub"]);

        let public = SecretKey::from(testkit::submitter_key().clone()).public();
        let sig = manifest.signature("a.txt").unwrap().unwrap();
        assert!(public.verify(b"alpha", &sig).is_ok());
        let sig = manifest.signature("sub").unwrap().unwrap();
        assert!(public.verify("sub", &sig).is_ok());

        let embedded = fs::read(root.join(SUBMITTER_CERT_FILE_NAME)).unwrap();
        assert_eq!(embedded, testkit::submitter_cert_pem().as_bytes());

        // an empty subfolder still gets an (empty) manifest
        assert!(SignatureManifest::load(&root.join("sub")).unwrap().is_empty());
    }

    #[test]
    fn test_resigning_skips_reserved_files() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::write(root.join("a.txt"), b"alpha").unwrap();

        signer().sign(root).unwrap();
        signer().sign(root).unwrap();

        let manifest = SignatureManifest::load(root).unwrap();
        assert_eq!(manifest.len(), 1);
        assert!(manifest.recorded(SIGNATURE_FILE_NAME).is_none());
        assert!(manifest.recorded(SUBMITTER_CERT_FILE_NAME).is_none());
    }

    #[test]
    fn test_zero_budget_still_signs_root() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::create_dir(root.join("sub")).unwrap();

        let report = signer().with_max_visits(0).sign(root).unwrap();
        assert_eq!(report.directories, vec![root.to_path_buf()]);
        assert!(report.budget_exhausted);
        assert!(!root.join("sub").join(SIGNATURE_FILE_NAME).exists());
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let temp = tempfile::tempdir().unwrap();
        let result = signer().sign(temp.path().join("missing"));
        assert!(matches!(result, Err(SealError::Io { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_is_fatal() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        // a dangling symlink lists as a file but cannot be read
        std::os::unix::fs::symlink(root.join("nowhere"), root.join("dangling")).unwrap();

        let result = signer().sign(root);
        assert!(matches!(result, Err(SealError::Io { path, .. }) if path == root.join("dangling")));
        assert!(!root.join(SIGNATURE_FILE_NAME).exists());
    }
}
