//! Per-invocation state shared by every command.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use truetrace_chain::{ChainLog, Validator};
use truetrace_cli::config_bridge;
use truetrace_config::{Config, ResolvedConfig};
use truetrace_crypto::KeyPair;

use crate::formatter::OutputFormat;

/// Resolved configuration plus the directory relative paths resolve from.
pub(crate) struct Context {
    pub(crate) resolved: ResolvedConfig,
    pub(crate) base: PathBuf,
    pub(crate) format: OutputFormat,
}

impl Context {
    pub(crate) fn config(&self) -> &Config {
        &self.resolved.config
    }

    pub(crate) fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    pub(crate) fn chain_path(&self) -> PathBuf {
        self.config().chain_path(&self.base)
    }

    pub(crate) fn private_key_path(&self) -> PathBuf {
        self.config().private_key_path(&self.base)
    }

    pub(crate) fn public_key_path(&self) -> PathBuf {
        self.config().public_key_path(&self.base)
    }

    pub(crate) fn validator(&self) -> Validator {
        config_bridge::to_validator(self.config())
    }

    /// Chain log for read-only commands.
    pub(crate) fn chain_log(&self) -> ChainLog {
        config_bridge::to_chain_log(self.config(), &self.base)
    }

    /// The configured signing key. A missing key is an error, never a
    /// prompt to generate one.
    pub(crate) fn signing_key(&self) -> anyhow::Result<KeyPair> {
        let path = self.private_key_path();
        KeyPair::load(&path).with_context(|| {
            format!(
                "cannot sign without a key at {}; run `truetrace keys generate`",
                display(&path)
            )
        })
    }

    /// Chain log that signs appended events with the configured key.
    pub(crate) fn signed_chain_log(&self) -> anyhow::Result<ChainLog> {
        Ok(self.chain_log().with_signer(Box::new(self.signing_key()?)))
    }
}

pub(crate) fn display(path: &Path) -> String {
    path.display().to_string()
}
