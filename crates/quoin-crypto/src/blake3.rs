//! Domain-separated BLAKE3 hashing for the Quoin protocol.
//!
//! Every hash in Quoin is bound to a registered context string so that a
//! digest produced for one purpose can never collide with a digest produced
//! for another. Unregistered context strings are a protocol violation.
//!
//! ## Modes
//!
//! - [`hash`] — Pure hashing: content addressing, test fixtures
//! - [`derive_key`] — Key derivation bound to a context string
//! - [`keyed_hash`] — Keyed MAC/PRF over a derived key
//!
//! The oracle's commitment digest is [`vote_commitment`]: the protocol's
//! security rests only on the pre-image resistance of this function, so any
//! collision-resistant hash could be substituted behind the oracle's
//! hasher capability.

use quoin_types::{Account, Digest, LevelIndex, Nonce};

/// Registered BLAKE3 context strings for the Quoin protocol.
/// Using an unregistered context string is a protocol violation.
pub mod contexts {
    /// Vote commitments: `H(account, level, salt)` hidden until reveal.
    pub const VOTE_COMMITMENT: &str = "Quoin v1 vote-commitment";
    /// Audit-log chaining (reserved for external indexers).
    pub const AUDIT_RECORD: &str = "Quoin v1 audit-record";

    /// All registered context strings. Used for validation.
    pub const ALL_CONTEXTS: &[&str] = &[VOTE_COMMITMENT, AUDIT_RECORD];
}

/// Compute the BLAKE3 hash of the input data.
pub fn hash(data: &[u8]) -> [u8; 32] {
    *::blake3::hash(data).as_bytes()
}

/// Derive a key using BLAKE3's built-in key derivation mode.
///
/// The context string must be one of the registered strings in [`contexts`].
pub fn derive_key(context: &str, key_material: &[u8]) -> [u8; 32] {
    let mut hasher = ::blake3::Hasher::new_derive_key(context);
    hasher.update(key_material);
    *hasher.finalize().as_bytes()
}

/// Compute a keyed BLAKE3 hash (MAC/PRF).
///
/// The key must be exactly 32 bytes, typically derived via [`derive_key`].
pub fn keyed_hash(key: &[u8; 32], message: &[u8]) -> [u8; 32] {
    *::blake3::keyed_hash(key, message).as_bytes()
}

/// Verify that a context string is registered in the Quoin protocol.
pub fn is_registered_context(context: &str) -> bool {
    contexts::ALL_CONTEXTS.contains(&context)
}

/// Encode multiple dynamic fields using length-prefixed encoding.
///
/// Inputs are encoded as `LE32(len(field1)) || field1 || LE32(len(field2))
/// || field2 || ...` so that field boundaries are unambiguous.
pub fn encode_multi_field(fields: &[&[u8]]) -> Vec<u8> {
    let total_len: usize = fields.iter().map(|f| 4 + f.len()).sum();
    let mut output = Vec::with_capacity(total_len);
    for field in fields {
        output.extend_from_slice(&(field.len() as u32).to_le_bytes());
        output.extend_from_slice(field);
    }
    output
}

/// Compute the vote-commitment digest `H(account, level, salt)`.
///
/// This is the reference commitment scheme for the oracle's commit-reveal
/// protocol: the voter publishes this digest during the commit window and
/// discloses `(level, salt)` during the reveal window.
pub fn vote_commitment(account: &Account, level: LevelIndex, salt: Nonce) -> Digest {
    let encoded = encode_multi_field(&[
        account.as_slice(),
        &level.to_le_bytes(),
        &salt.to_le_bytes(),
    ]);
    derive_key(contexts::VOTE_COMMITMENT, &encoded)
}
