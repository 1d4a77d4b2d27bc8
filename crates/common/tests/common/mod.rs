//! Shared test utilities for sealing integration tests
#![allow(dead_code)]

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use ::common::crypto::{Certificate, SecretKey};
use ::common::seal::{FolderSigner, FolderVerifier, VerifyMode};
use tempfile::TempDir;

#[path = "../../src/testkit/mod.rs"]
pub mod testkit;

/// A scratch tree plus the PEM files a user would keep outside of it
pub struct Env {
    pub tree: PathBuf,
    pub key_path: PathBuf,
    pub cert_path: PathBuf,
    pub root_cert_path: PathBuf,
    _temp: TempDir,
}

/// Set up an empty tree and write the submitter key, submitter certificate
/// and root certificate next to it
pub fn setup_test_env() -> Env {
    let temp = TempDir::new().unwrap();
    let tree = temp.path().join("tree");
    let pki = temp.path().join("pki");
    fs::create_dir_all(&tree).unwrap();
    fs::create_dir_all(&pki).unwrap();

    let key_path = pki.join("submitter.key");
    let cert_path = pki.join("submitter.crt");
    let root_cert_path = pki.join("root.crt");
    fs::write(&key_path, testkit::submitter_key_pem()).unwrap();
    fs::write(&cert_path, testkit::submitter_cert_pem()).unwrap();
    fs::write(&root_cert_path, testkit::root_cert_pem()).unwrap();

    Env {
        tree,
        key_path,
        cert_path,
        root_cert_path,
        _temp: temp,
    }
}

/// Write `content` at `rel` below `root`, creating parents
pub fn write_file(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Populate `root` with files at several depths and an empty folder:
///
/// ```text
/// README.md
/// config/app.yaml
/// config/env/prod.yaml
/// scripts/run.sh
/// empty/
/// ```
pub fn populate(root: &Path) {
    write_file(root, "README.md", b"# sealed\n");
    write_file(root, "config/app.yaml", b"name: app\n");
    write_file(root, "config/env/prod.yaml", b"replicas: 3\n");
    write_file(root, "scripts/run.sh", b"#!/bin/sh\nexec app\n");
    fs::create_dir_all(root.join("empty")).unwrap();
}

pub fn submitter_key() -> SecretKey {
    SecretKey::from(testkit::submitter_key().clone())
}

pub fn signer() -> FolderSigner {
    FolderSigner::new(
        submitter_key(),
        Certificate::from_pem(testkit::submitter_cert_pem()).unwrap(),
    )
    .unwrap()
}

pub fn verifier(mode: VerifyMode) -> FolderVerifier {
    FolderVerifier::new(Certificate::from_pem(testkit::root_cert_pem()).unwrap())
        .unwrap()
        .with_mode(mode)
}

/// Directories below `root` (inclusive) containing `file_name`, relative to `root`
pub fn dirs_containing(root: &Path, file_name: &str) -> BTreeSet<PathBuf> {
    let mut found = BTreeSet::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        if dir.join(file_name).exists() {
            found.insert(dir.strip_prefix(root).unwrap().to_path_buf());
        }
        for entry in fs::read_dir(&dir).unwrap() {
            let entry = entry.unwrap();
            if entry.file_type().unwrap().is_dir() {
                stack.push(entry.path());
            }
        }
    }
    found
}

/// Build a set of relative paths from string literals
pub fn paths(items: &[&str]) -> BTreeSet<PathBuf> {
    items.iter().map(PathBuf::from).collect()
}
