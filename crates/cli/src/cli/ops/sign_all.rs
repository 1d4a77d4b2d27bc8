use std::path::PathBuf;

use clap::Args;

use common::crypto::{KeyError, SecretKey};
use common::seal::{sign_all, SealError};
use treeseal::state::StateError;

use crate::cli::op::resolve_path;

#[derive(Args, Debug, Clone)]
pub struct SignAll {
    /// Directory whose files to sign
    pub dir: PathBuf,

    /// Submitter private key (PEM); overrides key_path in config
    #[arg(long)]
    pub key: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum SignAllError {
    #[error("config error: {0}")]
    State(#[from] StateError),
    #[error("no submitter key: pass --key or set key_path in config")]
    NoKey,
    #[error("failed to load key {}: {source}", path.display())]
    Key {
        path: PathBuf,
        #[source]
        source: KeyError,
    },
    #[error("signing failed: {0}")]
    Seal(#[from] SealError),
    #[error("failed to encode signatures: {0}")]
    Json(#[from] serde_json::Error),
}

impl crate::cli::op::Op for SignAll {
    type Error = SignAllError;
    type Output = String;

    fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = ctx.config()?;
        let key_path =
            resolve_path(self.key.as_ref(), config.key_path.as_ref()).ok_or(SignAllError::NoKey)?;
        let key = SecretKey::load(&key_path).map_err(|source| SignAllError::Key {
            path: key_path.clone(),
            source,
        })?;

        let signatures = sign_all(&self.dir, &key)?;
        Ok(serde_json::to_string_pretty(&signatures)?)
    }
}
