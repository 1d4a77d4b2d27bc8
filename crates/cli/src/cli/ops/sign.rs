use std::path::PathBuf;

use clap::Args;

use common::crypto::{KeyError, SecretKey};
use common::seal::{sign_folders, SealError};
use treeseal::state::StateError;

use crate::cli::op::resolve_path;

#[derive(Args, Debug, Clone)]
pub struct Sign {
    /// Root of the tree to seal
    pub dir: PathBuf,

    /// Submitter private key (PEM); overrides key_path in config
    #[arg(long)]
    pub key: Option<PathBuf>,

    /// Submitter certificate (PEM); overrides cert_path in config
    #[arg(long)]
    pub cert: Option<PathBuf>,

    /// Maximum number of directories to seal; overrides max_visits in config
    #[arg(long)]
    pub max_visits: Option<usize>,
}

#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error("config error: {0}")]
    State(#[from] StateError),
    #[error("no submitter key: pass --key or set key_path in config")]
    NoKey,
    #[error("no submitter certificate: pass --cert or set cert_path in config")]
    NoCertificate,
    #[error("failed to load key {}: {source}", path.display())]
    Key {
        path: PathBuf,
        #[source]
        source: KeyError,
    },
    #[error("signing failed: {0}")]
    Seal(#[from] SealError),
}

impl crate::cli::op::Op for Sign {
    type Error = SignError;
    type Output = String;

    fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = ctx.config()?;
        let key_path =
            resolve_path(self.key.as_ref(), config.key_path.as_ref()).ok_or(SignError::NoKey)?;
        let cert_path = resolve_path(self.cert.as_ref(), config.cert_path.as_ref())
            .ok_or(SignError::NoCertificate)?;
        let max_visits = self.max_visits.or(config.max_visits);

        let key = SecretKey::load(&key_path).map_err(|source| SignError::Key {
            path: key_path.clone(),
            source,
        })?;
        let report = sign_folders(&self.dir, &key, &cert_path, max_visits)?;

        let mut output = format!(
            "sealed {} directories ({} entries) under {}",
            report.directories.len(),
            report.entries_signed,
            self.dir.display()
        );
        if report.budget_exhausted {
            output.push_str("\nvisit budget exhausted; directories beyond it were left unsealed");
        }
        Ok(output)
    }
}
