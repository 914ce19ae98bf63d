//! Generic key context and the opaque-key registry binding.
//!
//! [`KeyContext`] is the slot a generic public-key layer dispatches
//! through: it holds one installed key behind the object-safe
//! [`KeyCapabilities`] interface and knows nothing about where the key
//! material lives. [`KeyContext::bind_opaque_key`] is the one place the
//! external key store and the generic dispatch layer meet — it resolves a
//! [`KeyId`] to a holder, wraps it in an [`OpaqueKey`] adapter, and
//! installs the adapter. No cryptography happens here.

use crate::{
    Algorithm, FieldBytes, HashAlgorithm,
    ecdsa::{self, OpaqueKey, der},
    holder::{KeyHolder, KeyId, KeyStore, StoreError},
};
use alloc::boxed::Box;
use core::fmt::{self, Debug, Display};

/// Capability interface a generic key layer dispatches through.
///
/// One concrete type implements this per key-holder kind; the
/// implementation is selected when the key is bound and never changes
/// afterwards. Dropping the trait object releases the underlying key
/// handle.
pub trait KeyCapabilities {
    /// Algorithm family this key belongs to.
    fn algorithm(&self) -> Algorithm;

    /// Whether this key can perform the given algorithm family.
    fn can_do(&self, algorithm: Algorithm) -> bool;

    /// Sign a message digest, producing a DER interchange signature.
    fn sign(
        &self,
        hash_algorithm: HashAlgorithm,
        prehash: &FieldBytes,
    ) -> Result<der::Signature, ecdsa::Error>;

    /// Verify a DER interchange signature over a message digest.
    fn verify(
        &self,
        hash_algorithm: HashAlgorithm,
        prehash: &FieldBytes,
        signature: &[u8],
    ) -> Result<(), ecdsa::Error>;
}

impl<H: KeyHolder> KeyCapabilities for OpaqueKey<H> {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Ecdsa
    }

    fn can_do(&self, algorithm: Algorithm) -> bool {
        OpaqueKey::can_do(self, algorithm)
    }

    fn sign(
        &self,
        hash_algorithm: HashAlgorithm,
        prehash: &FieldBytes,
    ) -> Result<der::Signature, ecdsa::Error> {
        self.sign_prehashed(hash_algorithm, prehash)
    }

    fn verify(
        &self,
        hash_algorithm: HashAlgorithm,
        prehash: &FieldBytes,
        signature: &[u8],
    ) -> Result<(), ecdsa::Error> {
        self.verify_prehashed(hash_algorithm, prehash, signature)
    }
}

/// Errors binding a key into a [`KeyContext`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SetupError {
    /// The key store could not be reached.
    KeyStoreUnavailable,
    /// The key identifier does not resolve to a key.
    KeyNotFound,
    /// The context already holds a key.
    InvalidContext,
}

impl Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SetupError::KeyStoreUnavailable => "key store unavailable",
            SetupError::KeyNotFound => "key identifier not found in key store",
            SetupError::InvalidContext => "key context already bound",
        })
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SetupError {}

impl From<StoreError> for SetupError {
    fn from(err: StoreError) -> SetupError {
        match err {
            StoreError::Unavailable => SetupError::KeyStoreUnavailable,
            StoreError::NotFound => SetupError::KeyNotFound,
        }
    }
}

/// Generic public-key context: a write-once slot for one installed key.
///
/// A context starts unbound; binding installs a capability object which
/// stays in place until [`KeyContext::release`]. Rebinding a live context
/// is refused rather than silently replacing the installed key, since the
/// installed adapter exclusively owns its key handle.
#[derive(Default)]
pub struct KeyContext {
    key: Option<Box<dyn KeyCapabilities>>,
}

impl KeyContext {
    /// Create an unbound context.
    pub const fn new() -> Self {
        Self { key: None }
    }

    /// Whether a key is installed.
    pub fn is_bound(&self) -> bool {
        self.key.is_some()
    }

    /// Borrow the installed capability object, if any.
    pub fn key(&self) -> Option<&dyn KeyCapabilities> {
        self.key.as_deref()
    }

    /// Algorithm family of the installed key, if any.
    pub fn algorithm(&self) -> Option<Algorithm> {
        self.key().map(KeyCapabilities::algorithm)
    }

    /// Whether the installed key can perform the given algorithm family.
    ///
    /// Answers `false` for an unbound context.
    pub fn can_do(&self, algorithm: Algorithm) -> bool {
        self.key().is_some_and(|key| key.can_do(algorithm))
    }

    /// Resolve `id` against `store` and install an [`OpaqueKey`] adapter
    /// over the resolved holder.
    ///
    /// Fails with [`SetupError::KeyStoreUnavailable`] or
    /// [`SetupError::KeyNotFound`] when resolution fails, and with
    /// [`SetupError::InvalidContext`] when the context already holds a
    /// key.
    pub fn bind_opaque_key<S>(&mut self, store: &S, id: KeyId) -> Result<(), SetupError>
    where
        S: KeyStore,
        S::Key: 'static,
    {
        if self.key.is_some() {
            return Err(SetupError::InvalidContext);
        }

        let holder = store.resolve(id)?;
        self.key = Some(Box::new(OpaqueKey::new(holder)));
        Ok(())
    }

    /// Release the installed key, returning the context to unbound.
    ///
    /// Dropping the capability object destroys the underlying key handle;
    /// releasing an unbound context is a no-op.
    pub fn release(&mut self) {
        self.key = None;
    }
}

impl Debug for KeyContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyContext")
            .field("algorithm", &self.algorithm())
            .finish_non_exhaustive()
    }
}
