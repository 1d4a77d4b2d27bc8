use std::path::PathBuf;

use clap::Args;

use common::seal::{FolderVerifier, VerifyError, VerifyMode};
use treeseal::state::StateError;

use crate::cli::op::resolve_path;

#[derive(Args, Debug, Clone)]
pub struct Verify {
    /// Root of the sealed tree
    pub dir: PathBuf,

    /// Trusted root certificate (PEM); overrides root_cert_path in config
    #[arg(long)]
    pub root_cert: Option<PathBuf>,

    /// Fail on unsealed directories, unsigned entries and vanished entries
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum VerifyOpError {
    #[error("config error: {0}")]
    State(#[from] StateError),
    #[error("no root certificate: pass --root-cert or set root_cert_path in config")]
    NoRootCertificate,
    #[error("verification failed: {0}")]
    Failed(#[from] VerifyError),
}

impl crate::cli::op::Op for Verify {
    type Error = VerifyOpError;
    type Output = String;

    fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = ctx.config()?;
        let root_cert_path = resolve_path(self.root_cert.as_ref(), config.root_cert_path.as_ref())
            .ok_or(VerifyOpError::NoRootCertificate)?;
        let mode = if self.strict || config.strict {
            VerifyMode::Strict
        } else {
            VerifyMode::Lenient
        };

        let report = FolderVerifier::from_root_cert_file(&root_cert_path)?
            .with_mode(mode)
            .verify(&self.dir)?;

        let mut lines = vec!["verified".to_string()];
        for (dir, reason) in &report.skipped {
            lines.push(format!("  skipped {}: {}", dir.display(), reason));
        }
        Ok(lines.join("\n"))
    }
}
