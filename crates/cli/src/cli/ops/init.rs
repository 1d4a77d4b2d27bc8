use std::path::PathBuf;

use clap::Args;

use treeseal::state::{AppConfig, AppState};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Default submitter private key (PEM)
    #[arg(long)]
    pub key: Option<PathBuf>,

    /// Default submitter certificate (PEM)
    #[arg(long)]
    pub cert: Option<PathBuf>,

    /// Default trusted root certificate (PEM)
    #[arg(long)]
    pub root_cert: Option<PathBuf>,

    /// Default maximum number of directories to seal
    #[arg(long)]
    pub max_visits: Option<usize>,

    /// Verify in strict mode by default
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] treeseal::state::StateError),
}

fn describe(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => "(not set)".to_string(),
    }
}

impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = AppConfig {
            key_path: self.key.clone(),
            cert_path: self.cert.clone(),
            root_cert_path: self.root_cert.clone(),
            max_visits: self.max_visits,
            strict: self.strict,
        };

        let state = AppState::init(ctx.config_path.clone(), config)?;

        let max_visits = match state.config.max_visits {
            Some(max) => max.to_string(),
            None => "unbounded".to_string(),
        };

        let output = format!(
            "Initialized treeseal directory at: {}\n\
             - Config: {}\n\
             - Key: {}\n\
             - Certificate: {}\n\
             - Root certificate: {}\n\
             - Max visits: {}\n\
             - Strict: {}",
            state.treeseal_dir.display(),
            state.config_path.display(),
            describe(&state.config.key_path),
            describe(&state.config.cert_path),
            describe(&state.config.root_cert_path),
            max_visits,
            state.config.strict
        );

        Ok(output)
    }
}
