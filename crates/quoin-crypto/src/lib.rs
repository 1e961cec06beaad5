//! # quoin-crypto
//!
//! Domain-separated hashing for the Quoin protocol.
//!
//! ## Modules
//!
//! - [`blake3`] — BLAKE3 with mandatory context-string domain separation,
//!   including the vote-commitment digest used by the oracle.

pub mod blake3;
