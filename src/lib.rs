#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(
    clippy::mod_module_files,
    clippy::unwrap_used,
    missing_docs,
    rust_2018_idioms,
    unused_lifetimes,
    unused_qualifications
)]

//! ## Usage
//!
//! Signing and verifying with a key that never leaves its holder:
//!
#![cfg_attr(feature = "software", doc = "```")]
#![cfg_attr(not(feature = "software"), doc = "```ignore")]
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use p256_opaque::{Algorithm, HashAlgorithm, OpaqueKey, SoftwareKey};
//!
//! // A secure element would implement `KeyHolder` over its driver; the
//! // software holder stands in for it here.
//! let holder = SoftwareKey::from_secret_bytes(&[7u8; 32])?;
//! let key = OpaqueKey::new(holder);
//! assert!(key.can_do(Algorithm::Ecdsa));
//!
//! let prehash = [0xab; 32]; // SHA-256 digest of the message
//! let sig = key.sign_prehashed(HashAlgorithm::Sha256, &prehash)?;
//! key.verify_prehashed(HashAlgorithm::Sha256, &prehash, sig.as_bytes())?;
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#[cfg(feature = "alloc")]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "alloc")]
pub mod context;
pub mod ecdsa;
pub mod holder;
#[cfg(feature = "software")]
pub mod software;

pub use crate::{
    ecdsa::{OpaqueKey, Signature},
    holder::{HolderError, KeyHolder, KeyId, KeyStore, StoreError},
};

#[cfg(feature = "alloc")]
pub use crate::context::{KeyCapabilities, KeyContext, SetupError};

#[cfg(feature = "software")]
pub use crate::software::SoftwareKey;

#[cfg(all(feature = "software", feature = "alloc"))]
pub use crate::software::SoftwareKeyStore;

use core::fmt::{self, Display};

/// Size in bytes of a serialized P-256 field element, and equally of a
/// SHA-256 digest.
pub const FIELD_SIZE: usize = 32;

/// Serialized P-256 field element: a big-endian integer of [`FIELD_SIZE`]
/// bytes. Also the prehash type accepted for signing and verification.
pub type FieldBytes = [u8; FIELD_SIZE];

/// Public-key algorithm families understood by the generic key layer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Algorithm {
    /// RSA signatures.
    Rsa,
    /// Elliptic Curve Digital Signature Algorithm.
    Ecdsa,
    /// Ed25519 signatures.
    Ed25519,
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Algorithm::Rsa => "RSA",
            Algorithm::Ecdsa => "ECDSA",
            Algorithm::Ed25519 => "Ed25519",
        })
    }
}

/// Digest algorithms a caller may name when signing or verifying.
///
/// Opaque P-256 keys accept [`HashAlgorithm::Sha256`] only; every other
/// tag is rejected before the key holder is contacted.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum HashAlgorithm {
    /// SHA-224.
    Sha224,
    /// SHA-256.
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
}

impl Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HashAlgorithm::Sha224 => "SHA-224",
            HashAlgorithm::Sha256 => "SHA-256",
            HashAlgorithm::Sha384 => "SHA-384",
            HashAlgorithm::Sha512 => "SHA-512",
        })
    }
}
