//! Contracts for the external key store and the key holders it vends.
//!
//! The crate performs no elliptic-curve arithmetic of its own: every
//! cryptographic operation is delegated through [`KeyHolder`] to whatever
//! owns the protected key material — typically a secure element or other
//! hardware key store, or the software fallback behind the `software`
//! feature. [`KeyStore`] is the resolution seam: it turns a [`KeyId`] into
//! an owned holder bound to one physical key.
//!
//! Calls into a holder are synchronous and may block on hardware I/O. No
//! locking is provided here; one physical holder supports one transaction
//! at a time, and serializing access is the caller's responsibility.

use crate::{FieldBytes, ecdsa::Signature};
use core::fmt::{self, Display};

/// Identifier of a key slot within an external key store.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct KeyId(pub u16);

impl Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key slot {}", self.0)
    }
}

/// Opaque status code reported by an external key holder.
///
/// Holder-defined codes are carried through for diagnostics but never
/// interpreted beyond pass/fail: any status a holder reports as an error
/// is treated as an unconditional failure of the operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct HolderError {
    code: u16,
}

impl HolderError {
    /// Wrap a holder-defined status code.
    pub const fn new(code: u16) -> Self {
        Self { code }
    }

    /// The holder-defined status code.
    pub const fn code(&self) -> u16 {
        self.code
    }
}

impl Display for HolderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key holder status {:#06x}", self.code)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HolderError {}

/// Errors resolving a key identifier against a [`KeyStore`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StoreError {
    /// The key store could not be reached.
    Unavailable,
    /// The identifier does not name a key in this store.
    NotFound,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreError::Unavailable => "key store unavailable",
            StoreError::NotFound => "key not found in key store",
        })
    }
}

#[cfg(feature = "std")]
impl std::error::Error for StoreError {}

/// A key held by an external party, operated on without ever exposing the
/// private scalar.
///
/// Implementations wrap one protected P-256 key and perform the raw ECDSA
/// primitives on the digest the caller supplies. Both operations speak the
/// holder's fixed-width wire form, a 64-byte `R || S` [`Signature`];
/// translating to and from the DER interchange encoding is the caller's
/// concern (see [`OpaqueKey`]).
///
/// A holder value is an exclusively owned handle: it is bound to one
/// physical key when resolved from a [`KeyStore`] and released exactly
/// once when dropped.
///
/// [`OpaqueKey`]: crate::ecdsa::OpaqueKey
pub trait KeyHolder {
    /// Sign a 32-byte message digest, returning the raw `(R, S)` pair.
    ///
    /// Failures are not transient at this layer and are never retried.
    fn raw_sign(&self, prehash: &FieldBytes) -> Result<Signature, HolderError>;

    /// Verify a raw `(R, S)` signature over a 32-byte message digest.
    ///
    /// Returns `Ok(true)` when the signature matches, `Ok(false)` when it
    /// does not, and `Err` only for holder faults unrelated to the
    /// signature's validity.
    fn raw_verify(&self, signature: &Signature, prehash: &FieldBytes) -> Result<bool, HolderError>;
}

/// Resolves key identifiers to owned [`KeyHolder`] handles.
///
/// A store is obtained once during system initialization and passed
/// explicitly wherever keys are bound; there is no process-wide singleton.
pub trait KeyStore {
    /// Holder kind this store vends.
    type Key: KeyHolder;

    /// Resolve `id` to a holder bound to that key.
    fn resolve(&self, id: KeyId) -> Result<Self::Key, StoreError>;
}
