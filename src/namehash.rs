//! ENS-style name normalization and hashing.
//!
//! Names are normalized with the IDNA UTS-46 lookup profile (Unicode
//! mapping, non-strict domain-name check, non-transitional) before hashing.
//! The namehash folds the dotted labels right to left over keccak-256,
//! seeded with 32 zero bytes; the empty name hashes to the seed itself.
//!
//! The profile is an immutable value owned by the client and threaded
//! through, not a process-wide singleton.

use alloy::primitives::{keccak256, B256};
use idna::uts46::{AsciiDenyList, Hyphens, Uts46};

use crate::error::Web3Error;

/// IDNA lookup-profile normalizer. Constructed once per client.
pub struct Normalizer {
    uts46: Uts46,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self { uts46: Uts46::new() }
    }

    /// Normalize a name for hashing.
    ///
    /// A leading `.` stripped by the profile is restored, so namehash
    /// recursion over relative names stays well-defined.
    pub fn normalize(&self, input: &str) -> Result<String, Web3Error> {
        let (normalized, result) =
            self.uts46
                .to_unicode(input.as_bytes(), AsciiDenyList::EMPTY, Hyphens::Allow);
        if result.is_err() {
            return Err(Web3Error::bad_request(format!("invalid domain name: {input}")));
        }
        let mut output = normalized.into_owned();
        if input.starts_with('.') && !output.starts_with('.') {
            output.insert(0, '.');
        }
        Ok(output)
    }

    /// keccak-256 of a single normalized label.
    pub fn label_hash(&self, label: &str) -> Result<B256, Web3Error> {
        let normalized = self.normalize(label)?;
        Ok(keccak256(normalized.as_bytes()))
    }

    /// The recursive ENS namehash of a dotted name.
    pub fn namehash(&self, name: &str) -> Result<B256, Web3Error> {
        if name.is_empty() {
            return Ok(B256::ZERO);
        }
        let normalized = self.normalize(name)?;
        let mut node = B256::ZERO;
        for label in normalized.rsplit('.') {
            node = hash_label_into(node, label);
        }
        Ok(node)
    }
}

fn hash_label_into(node: B256, label: &str) -> B256 {
    let label_hash = keccak256(label.as_bytes());
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(node.as_slice());
    data[32..].copy_from_slice(label_hash.as_slice());
    keccak256(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::hex;

    #[test]
    fn namehash_empty() {
        let normalizer = Normalizer::new();
        assert_eq!(normalizer.namehash("").unwrap(), B256::ZERO);
    }

    #[test]
    fn namehash_eth() {
        let normalizer = Normalizer::new();
        assert_eq!(
            hex::encode(normalizer.namehash("eth").unwrap()),
            "93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae"
        );
    }

    #[test]
    fn namehash_vitalik_eth() {
        let normalizer = Normalizer::new();
        assert_eq!(
            hex::encode(normalizer.namehash("vitalik.eth").unwrap()),
            "ee6c4522aab0003e8d14cd40a6af439055fd2577951148c14b6cea9a53475835"
        );
    }

    #[test]
    fn namehash_recursion() {
        // namehash(a.b.c) == keccak256(namehash(b.c) || labelhash(a))
        let normalizer = Normalizer::new();
        let full = normalizer.namehash("sub.example.eth").unwrap();
        let parent = normalizer.namehash("example.eth").unwrap();
        let label = normalizer.label_hash("sub").unwrap();

        let mut data = [0u8; 64];
        data[..32].copy_from_slice(parent.as_slice());
        data[32..].copy_from_slice(label.as_slice());
        assert_eq!(full, keccak256(data));
    }

    #[test]
    fn normalize_case_folds() {
        let normalizer = Normalizer::new();
        assert_eq!(normalizer.normalize("ViTaLiK.eth").unwrap(), "vitalik.eth");
    }

    #[test]
    fn normalize_preserves_leading_dot() {
        let normalizer = Normalizer::new();
        let out = normalizer.normalize(".eth").unwrap();
        assert!(out.starts_with('.'), "leading dot must survive: {out:?}");
        assert!(!normalizer.normalize("eth").unwrap().starts_with('.'));
    }

    #[test]
    fn case_insensitive_namehash() {
        let normalizer = Normalizer::new();
        assert_eq!(
            normalizer.namehash("Vitalik.ETH").unwrap(),
            normalizer.namehash("vitalik.eth").unwrap()
        );
    }
}
