//! Hashing utilities for content-addressed graph definitions.
//!
//! This module provides:
//! - `ObjectHash`: a `sha256:`-prefixed digest identifying one marshalled op
//! - `Hashable`: digest of a value's canonical JSON form
//! - `hash_bytes()`: arbitrary byte hashing

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub type HashError = serde_json::Error;

/// Prefix carried by every digest produced here.
pub const DIGEST_ALGORITHM: &str = "sha256";

/// A content-addressed hash identifying a unique object.
///
/// The hash is the SHA-256 of the JSON-serialized value, so two values with
/// the same serialized form always share a digest. Maps that take part in
/// hashing must therefore serialize in a deterministic order.
///
/// # Format
///
/// `"sha256:"` followed by 64 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectHash(pub String);

impl ObjectHash {
  /// The hex part without the algorithm prefix.
  pub fn hex(&self) -> &str {
    self.0.split_once(':').map(|(_, hex)| hex).unwrap_or(&self.0)
  }
}

impl std::fmt::Display for ObjectHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

pub trait Hashable: Serialize {
  fn compute_hash(&self) -> Result<ObjectHash, HashError> {
    let serialized = serde_json::to_vec(self)?;
    Ok(hash_bytes(&serialized))
  }
}

/// Hash arbitrary bytes.
pub fn hash_bytes(data: &[u8]) -> ObjectHash {
  let mut hasher = Sha256::new();
  hasher.update(data);
  ObjectHash(format!("{}:{}", DIGEST_ALGORITHM, hex::encode(hasher.finalize())))
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;

  use super::*;

  #[derive(Serialize)]
  struct Sample {
    name: String,
    env: BTreeMap<String, String>,
  }

  impl Hashable for Sample {}

  fn sample() -> Sample {
    Sample {
      name: "foo".to_string(),
      env: BTreeMap::from([("A".to_string(), "1".to_string()), ("B".to_string(), "2".to_string())]),
    }
  }

  #[test]
  fn hash_is_deterministic() {
    assert_eq!(sample().compute_hash().unwrap(), sample().compute_hash().unwrap());
  }

  #[test]
  fn hash_changes_with_content() {
    let mut other = sample();
    other.name = "bar".to_string();
    assert_ne!(sample().compute_hash().unwrap(), other.compute_hash().unwrap());
  }

  #[test]
  fn digest_has_algorithm_prefix() {
    let hash = hash_bytes(b"hello world");
    assert!(hash.0.starts_with("sha256:"));
    assert_eq!(hash.hex().len(), 64);
    assert_eq!(
      hash.hex(),
      "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
    );
  }
}
