//! Software key holders backed by the [`p256`] crate.
//!
//! Stands in for a hardware key holder during development and testing,
//! and doubles as a software fallback where no secure element is present.
//! The key material lives in process memory; everything above the
//! [`KeyHolder`] seam treats it exactly like an opaque hardware key.

use crate::{
    FieldBytes,
    ecdsa::Signature,
    holder::{HolderError, KeyHolder},
};
use core::fmt::{self, Debug};
use p256::ecdsa::{Signature as EcSignature, SigningKey, VerifyingKey};
use signature::hazmat::{PrehashSigner, PrehashVerifier};

#[cfg(feature = "alloc")]
use crate::holder::{KeyId, KeyStore, StoreError};
#[cfg(feature = "alloc")]
use alloc::collections::BTreeMap;

/// Status code reported when the software signer fails.
const STATUS_SIGN_FAULT: u16 = 0x0001;

/// A software P-256 key usable wherever a [`KeyHolder`] is expected.
#[derive(Clone)]
pub struct SoftwareKey {
    signing_key: SigningKey,
}

impl SoftwareKey {
    /// Construct a key from a big-endian secret scalar.
    ///
    /// Fails when the bytes are zero or not a canonical scalar.
    pub fn from_secret_bytes(bytes: &FieldBytes) -> signature::Result<Self> {
        SigningKey::from_slice(bytes).map(|signing_key| Self { signing_key })
    }

    /// Public half of this key.
    pub fn verifying_key(&self) -> &VerifyingKey {
        self.signing_key.verifying_key()
    }
}

impl KeyHolder for SoftwareKey {
    fn raw_sign(&self, prehash: &FieldBytes) -> Result<Signature, HolderError> {
        let sig: EcSignature = self
            .signing_key
            .sign_prehash(prehash)
            .map_err(|_| HolderError::new(STATUS_SIGN_FAULT))?;

        let (r, s) = sig.split_bytes();
        Ok(Signature::from_components(&r.into(), &s.into()))
    }

    fn raw_verify(&self, signature: &Signature, prehash: &FieldBytes) -> Result<bool, HolderError> {
        // A component that is zero or not a canonical scalar can never
        // verify; report mismatch rather than a fault.
        let Ok(sig) = EcSignature::from_slice(&signature.to_bytes()) else {
            return Ok(false);
        };

        Ok(self
            .verifying_key()
            .verify_prehash(prehash, &sig)
            .is_ok())
    }
}

impl Debug for SoftwareKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftwareKey")
            .field("verifying_key", self.verifying_key())
            .finish_non_exhaustive()
    }
}

/// In-memory [`KeyStore`] of software keys, for tests and development.
///
/// Resolution hands out an independent clone of the stored key, so every
/// resolved handle is exclusively owned by its adapter.
#[cfg(feature = "alloc")]
#[derive(Clone, Debug, Default)]
pub struct SoftwareKeyStore {
    keys: BTreeMap<KeyId, SoftwareKey>,
}

#[cfg(feature = "alloc")]
impl SoftwareKeyStore {
    /// Create an empty store.
    pub const fn new() -> Self {
        Self {
            keys: BTreeMap::new(),
        }
    }

    /// Install `key` under `id`, replacing any previous key there.
    pub fn insert(&mut self, id: KeyId, key: SoftwareKey) {
        self.keys.insert(id, key);
    }
}

#[cfg(feature = "alloc")]
impl KeyStore for SoftwareKeyStore {
    type Key = SoftwareKey;

    fn resolve(&self, id: KeyId) -> Result<SoftwareKey, StoreError> {
        self.keys.get(&id).cloned().ok_or(StoreError::NotFound)
    }
}
