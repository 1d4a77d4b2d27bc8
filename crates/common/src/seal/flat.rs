use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::crypto::{SecretKey, Signature};

use super::signer::SealError;

/// Sign the regular files directly inside `dir`, without writing anything.
///
/// Symlinks are followed; subfolders and anything that is not a regular file
/// are ignored. No name is reserved here, so a manifest left by a previous
/// seal is signed like any other file.
pub fn sign_all(
    dir: impl AsRef<Path>,
    key: &SecretKey,
) -> Result<BTreeMap<String, Signature>, SealError> {
    let dir = dir.as_ref();
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| SealError::Io { path, source }
    };

    let mut signatures = BTreeMap::new();
    for entry in fs::read_dir(dir).map_err(io_err(dir))? {
        let entry = entry.map_err(io_err(dir))?;
        let path = entry.path();
        if !fs::metadata(&path).is_ok_and(|m| m.is_file()) {
            continue;
        }

        let name = entry
            .file_name()
            .into_string()
            .map_err(|_| SealError::NonUtf8Name(path.clone()))?;
        let content = fs::read(&path).map_err(io_err(&path))?;
        signatures.insert(name, key.sign(&content)?);
    }

    tracing::debug!("Signed {} files in {}", signatures.len(), dir.display());
    Ok(signatures)
}
