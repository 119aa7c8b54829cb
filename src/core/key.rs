//! Cache key derivation for (question, context) pairs

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Hex-encoded SHA-256 of a (question, context) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for an exact question and context.
    ///
    /// Each string is length-prefixed before hashing, so moving characters
    /// between question and context always changes the key. No case or
    /// whitespace normalisation is applied.
    pub fn encode(question: &str, context: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((question.len() as u64).to_le_bytes());
        hasher.update(question.as_bytes());
        hasher.update((context.len() as u64).to_le_bytes());
        hasher.update(context.as_bytes());
        CacheKey(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_deterministic() {
        let k1 = CacheKey::encode("What is Rust?", "doc text");
        let k2 = CacheKey::encode("What is Rust?", "doc text");
        assert_eq!(k1, k2);
        assert_eq!(k1.as_str().len(), 64);
    }

    #[test]
    fn test_key_context_aware() {
        let k1 = CacheKey::encode("q", "context A");
        let k2 = CacheKey::encode("q", "context B");
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_key_whitespace_and_case_sensitive() {
        let base = CacheKey::encode("hello", "");
        assert_ne!(base, CacheKey::encode("hello ", ""));
        assert_ne!(base, CacheKey::encode("Hello", ""));
        assert_ne!(base, CacheKey::encode("hello", " "));
    }

    #[test]
    fn test_key_no_separator_collision() {
        let k1 = CacheKey::encode("a|b", "");
        let k2 = CacheKey::encode("a", "|b");
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_key_serializes_as_plain_string() {
        let key = CacheKey::encode("q", "c");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!("\"{}\"", key));
    }
}
