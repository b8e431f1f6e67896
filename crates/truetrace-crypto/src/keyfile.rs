//! Raw key files.
//!
//! The private key file holds the 32-byte seed and nothing else. The public
//! key file holds the 32-byte verifying key. Secret files are created with
//! `O_EXCL` and mode 0o600 on Unix, and symlinks are never followed when
//! reading them.

use std::io::Write;
use std::path::Path;

use zeroize::Zeroizing;

use crate::error::{CryptoError, CryptoResult};
use crate::keypair::{KeyPair, PublicKey};

impl KeyPair {
    /// Load the signing key at `path`.
    ///
    /// A missing key is an error. Nothing is generated here.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyUnavailable`] if the file is missing,
    /// unreadable or a symlink, and [`CryptoError::WrongLength`] if it does
    /// not hold exactly 32 bytes.
    pub fn load(path: impl AsRef<Path>) -> CryptoResult<Self> {
        let path = path.as_ref();
        let seed = read_secret(path).map_err(|reason| CryptoError::KeyUnavailable {
            path: path.to_path_buf(),
            reason,
        })?;
        Self::from_seed(&seed)
    }

    /// Write the seed to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyFile`] if the file exists and `overwrite`
    /// is false, or if it cannot be written.
    pub fn save(&self, path: impl AsRef<Path>, overwrite: bool) -> CryptoResult<()> {
        let path = path.as_ref();
        let io = |source| CryptoError::KeyFile {
            path: path.to_path_buf(),
            source,
        };

        ensure_parent(path).map_err(io)?;
        if overwrite && path.exists() {
            std::fs::remove_file(path).map_err(io)?;
        }
        let mut file = create_secret_file(path).map_err(io)?;
        file.write_all(&self.seed()[..]).map_err(io)?;
        file.sync_all().map_err(io)
    }
}

impl PublicKey {
    /// Write the raw key to `path`, replacing any previous file.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyFile`] if the file cannot be written.
    pub fn write_to(&self, path: impl AsRef<Path>) -> CryptoResult<()> {
        let path = path.as_ref();
        ensure_parent(path)
            .and_then(|()| std::fs::write(path, self.as_bytes()))
            .map_err(|source| CryptoError::KeyFile {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Read a raw public key file.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyFile`] if it cannot be read and
    /// [`CryptoError::WrongLength`] unless it holds 32 bytes.
    pub fn read_from(path: impl AsRef<Path>) -> CryptoResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| CryptoError::KeyFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_slice(&bytes)
    }
}

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

fn create_secret_file(path: &Path) -> std::io::Result<std::fs::File> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

// Reasons are strings so the caller picks the error variant.
fn read_secret(path: &Path) -> Result<Zeroizing<Vec<u8>>, String> {
    let meta = std::fs::symlink_metadata(path).map_err(|e| e.to_string())?;
    if meta.file_type().is_symlink() {
        return Err("refusing to read key file: path is a symlink".into());
    }
    std::fs::read(path)
        .map(Zeroizing::new)
        .map_err(|e| e.to_string())
}
