//! Content addressing
//!
//! Identifiers are `algorithm:hexdigest` strings. `docID` hashes the
//! canonical URL, `contentHash` hashes the raw Markdown bytes. Both are pure
//! functions of their input under a fixed algorithm, so re-running
//! normalization on identical input reproduces identical identifiers.
//!
//! ```
//! use rag_markdown_normalizer::hash::{content_address, DigestHasher, HashAlgorithm};
//!
//! let id = content_address(&DigestHasher, HashAlgorithm::Sha256, b"abc").unwrap();
//! assert_eq!(
//!     id,
//!     "sha256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
//! );
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Sha256,
    Blake3,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Blake3 => "blake3",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            "blake3" => Ok(HashAlgorithm::Blake3),
            other => Err(HashError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashError {
    #[error("unsupported hash algorithm '{0}'")]
    UnsupportedAlgorithm(String),

    #[error("hash provider failed: {0}")]
    Provider(String),
}

/// Hash provider seam
///
/// Implementations must be deterministic and safe to share across worker
/// threads. The returned string is the lowercase hex digest only.
pub trait HashProvider: Send + Sync {
    fn hash(&self, bytes: &[u8], algorithm: HashAlgorithm) -> Result<String, HashError>;
}

/// Default provider backed by `sha2` and `blake3`
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestHasher;

impl HashProvider for DigestHasher {
    fn hash(&self, bytes: &[u8], algorithm: HashAlgorithm) -> Result<String, HashError> {
        let digest = match algorithm {
            HashAlgorithm::Sha256 => hex::encode(Sha256::digest(bytes)),
            HashAlgorithm::Blake3 => blake3::hash(bytes).to_hex().to_string(),
        };
        Ok(digest)
    }
}

/// `algorithm:hexdigest` identifier for `bytes`
pub fn content_address(
    provider: &dyn HashProvider,
    algorithm: HashAlgorithm,
    bytes: &[u8],
) -> Result<String, HashError> {
    let digest = provider.hash(bytes, algorithm)?;
    Ok(format!("{algorithm}:{digest}"))
}
