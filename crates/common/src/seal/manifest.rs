//! # Signature manifest
//!
//! One manifest per sealed directory, stored as [`SIGNATURE_FILE_NAME`]. It
//! maps the name of every immediate child to a base64 signature:
//!
//! ```json
//! { "config.yaml": "kTq3...==", "scripts": "Zx0b...==" }
//! ```
//!
//! File names and folder names live in the same map, so a file and a folder
//! with the same name would collide on one key.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::crypto::{Signature, SignatureError};

use super::SIGNATURE_FILE_NAME;

/// Errors that can occur while reading or writing a manifest
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid manifest at {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("manifest at {} is JSON but not an object", path.display())]
    NotAnObject { path: PathBuf },
}

impl ManifestError {
    /// Whether the manifest simply does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// Entry name to base64 signature, for the immediate children of one directory
///
/// Entries are kept as raw JSON values so one corrupt entry does not hide
/// the others: `null` and `""` read as unsigned, any other non-string value
/// is a malformed signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureManifest(BTreeMap<String, Value>);

impl SignatureManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the manifest file inside `dir`
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(SIGNATURE_FILE_NAME)
    }

    /// Record the signature for `name`, replacing any previous one
    pub fn insert(&mut self, name: impl Into<String>, signature: &Signature) {
        self.0.insert(name.into(), Value::String(signature.to_base64()));
    }

    /// The recorded base64 signature for `name`, if it is a non-empty string
    pub fn recorded(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .and_then(Value::as_str)
            .filter(|encoded| !encoded.is_empty())
    }

    /// The decoded signature for `name`.
    ///
    /// `None` when nothing is recorded, or the entry is `null` or `""`.
    pub fn signature(&self, name: &str) -> Option<Result<Signature, SignatureError>> {
        match self.0.get(name)? {
            Value::Null => None,
            Value::String(encoded) if encoded.is_empty() => None,
            Value::String(encoded) => Some(Signature::from_base64(encoded)),
            other => Some(Err(SignatureError::NotText(json_type(other)))),
        }
    }

    /// All entry names, including unsigned ones
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Read the manifest stored in `dir`
    pub fn load(dir: &Path) -> Result<Self, ManifestError> {
        let path = Self::path_in(dir);
        let data = fs::read(&path).map_err(|source| ManifestError::Io {
            path: path.clone(),
            source,
        })?;
        let value: Value =
            serde_json::from_slice(&data).map_err(|source| ManifestError::Json {
                path: path.clone(),
                source,
            })?;
        match value {
            Value::Object(entries) => Ok(Self(entries.into_iter().collect())),
            _ => Err(ManifestError::NotAnObject { path }),
        }
    }

    /// Write the manifest into `dir`, overwriting any existing one
    pub fn save(&self, dir: &Path) -> Result<PathBuf, ManifestError> {
        let path = Self::path_in(dir);
        let data = serde_json::to_vec_pretty(self).map_err(|source| ManifestError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, data).map_err(|source| ManifestError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

impl FromIterator<(String, Signature)> for SignatureManifest {
    fn from_iter<I: IntoIterator<Item = (String, Signature)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, signature)| (name, Value::String(signature.to_base64())))
                .collect(),
        )
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
