//! Opaque-key adapter: ECDSA over a key handle held by an external party.

use super::{Error, Signature, der};
use crate::{Algorithm, FieldBytes, HashAlgorithm, holder::KeyHolder};
use core::fmt::{self, Debug};
use sha2::{Digest, Sha256};
use signature::{
    DigestSigner, DigestVerifier, Signer, Verifier,
    hazmat::{PrehashSigner, PrehashVerifier, RandomizedPrehashSigner},
    rand_core::CryptoRngCore,
};

/// ECDSA/P-256 key whose private material lives with an external
/// [`KeyHolder`].
///
/// The adapter owns its key handle exclusively: it is bound at
/// construction and released exactly once when the adapter is dropped (or
/// via [`OpaqueKey::release`]). Sign and verify delegate the curve
/// operations to the holder and translate between the holder's raw
/// fixed-width signature form and the DER interchange form.
///
/// Only ECDSA with SHA-256 is performed; any other algorithm or digest tag
/// is rejected with [`Error::UnsupportedAlgorithm`] before the holder is
/// contacted.
///
/// ## Usage
///
/// The [`signature`] crate defines the traits which are the primary API
/// for signing and verifying:
///
/// - [`Signer`] / [`Verifier`]: operate on a message, digesting it with
///   SHA-256 first
/// - [`PrehashSigner`] / [`PrehashVerifier`]: operate on the raw output
///   bytes of a message digest
///
/// Calls block until the holder answers; a holder performing hardware I/O
/// blocks the caller for the duration.
#[derive(Clone)]
pub struct OpaqueKey<H> {
    /// Bound key handle.
    holder: H,
}

impl<H: KeyHolder> OpaqueKey<H> {
    /// Bind an adapter to a key handle, taking ownership of it.
    pub fn new(holder: H) -> Self {
        Self { holder }
    }

    /// Borrow the bound key handle.
    pub fn holder(&self) -> &H {
        &self.holder
    }

    /// Whether this key can perform the given algorithm family.
    ///
    /// Pure query; true only for ECDSA.
    pub fn can_do(&self, algorithm: Algorithm) -> bool {
        algorithm == Algorithm::Ecdsa
    }

    /// Sign a message digest, returning the signature in the DER
    /// interchange form.
    pub fn sign_prehashed(
        &self,
        hash_algorithm: HashAlgorithm,
        prehash: &FieldBytes,
    ) -> Result<der::Signature, Error> {
        self.sign_raw(hash_algorithm, prehash).map(|sig| sig.to_der())
    }

    /// Sign a message digest, returning the signature in the holder's raw
    /// fixed-width form.
    pub fn sign_raw(
        &self,
        hash_algorithm: HashAlgorithm,
        prehash: &FieldBytes,
    ) -> Result<Signature, Error> {
        check_hash_algorithm(hash_algorithm)?;
        self.holder.raw_sign(prehash).map_err(Error::SignerFault)
    }

    /// Verify a DER-encoded signature over a message digest.
    ///
    /// All-or-nothing: a malformed encoding, a holder fault, or a mismatch
    /// each reject the signature with a distinct error.
    pub fn verify_prehashed(
        &self,
        hash_algorithm: HashAlgorithm,
        prehash: &FieldBytes,
        signature: &[u8],
    ) -> Result<(), Error> {
        check_hash_algorithm(hash_algorithm)?;
        let sig = der::Signature::from_bytes(signature).map_err(Error::InvalidSignatureFormat)?;
        self.verify_raw(hash_algorithm, prehash, &Signature::from(&sig))
    }

    /// Verify a raw fixed-width signature over a message digest.
    pub fn verify_raw(
        &self,
        hash_algorithm: HashAlgorithm,
        prehash: &FieldBytes,
        signature: &Signature,
    ) -> Result<(), Error> {
        check_hash_algorithm(hash_algorithm)?;
        match self.holder.raw_verify(signature, prehash) {
            Ok(true) => Ok(()),
            Ok(false) => Err(Error::VerificationFailed),
            Err(status) => Err(Error::VerifierFault(status)),
        }
    }

    /// Release the bound key handle.
    ///
    /// Equivalent to dropping the adapter; ownership makes releasing twice
    /// unrepresentable.
    pub fn release(self) {}
}

//
// `*Signer` trait impls
//

impl<H: KeyHolder> PrehashSigner<der::Signature> for OpaqueKey<H> {
    fn sign_prehash(&self, prehash: &[u8]) -> signature::Result<der::Signature> {
        let prehash = prehash.try_into().map_err(|_| signature::Error::new())?;
        self.sign_prehashed(HashAlgorithm::Sha256, prehash)
            .map_err(Into::into)
    }
}

impl<H: KeyHolder> PrehashSigner<Signature> for OpaqueKey<H> {
    fn sign_prehash(&self, prehash: &[u8]) -> signature::Result<Signature> {
        let prehash = prehash.try_into().map_err(|_| signature::Error::new())?;
        self.sign_raw(HashAlgorithm::Sha256, prehash)
            .map_err(Into::into)
    }
}

impl<H: KeyHolder> RandomizedPrehashSigner<der::Signature> for OpaqueKey<H> {
    fn sign_prehash_with_rng(
        &self,
        _rng: &mut impl CryptoRngCore,
        prehash: &[u8],
    ) -> signature::Result<der::Signature> {
        // Part of the uniform signing contract; holders draw their own
        // entropy, so the randomness source goes unused.
        self.sign_prehash(prehash)
    }
}

impl<H: KeyHolder> Signer<der::Signature> for OpaqueKey<H> {
    fn try_sign(&self, msg: &[u8]) -> signature::Result<der::Signature> {
        let prehash: FieldBytes = Sha256::digest(msg).into();
        self.sign_prehashed(HashAlgorithm::Sha256, &prehash)
            .map_err(Into::into)
    }
}

impl<H: KeyHolder> DigestSigner<Sha256, der::Signature> for OpaqueKey<H> {
    fn try_sign_digest(&self, digest: Sha256) -> signature::Result<der::Signature> {
        let prehash: FieldBytes = digest.finalize().into();
        self.sign_prehashed(HashAlgorithm::Sha256, &prehash)
            .map_err(Into::into)
    }
}

//
// `*Verifier` trait impls
//

impl<H: KeyHolder> PrehashVerifier<der::Signature> for OpaqueKey<H> {
    fn verify_prehash(&self, prehash: &[u8], signature: &der::Signature) -> signature::Result<()> {
        let prehash = prehash.try_into().map_err(|_| signature::Error::new())?;
        self.verify_raw(HashAlgorithm::Sha256, prehash, &Signature::from(signature))
            .map_err(Into::into)
    }
}

impl<H: KeyHolder> PrehashVerifier<Signature> for OpaqueKey<H> {
    fn verify_prehash(&self, prehash: &[u8], signature: &Signature) -> signature::Result<()> {
        let prehash = prehash.try_into().map_err(|_| signature::Error::new())?;
        self.verify_raw(HashAlgorithm::Sha256, prehash, signature)
            .map_err(Into::into)
    }
}

impl<H: KeyHolder> Verifier<der::Signature> for OpaqueKey<H> {
    fn verify(&self, msg: &[u8], signature: &der::Signature) -> signature::Result<()> {
        let prehash: FieldBytes = Sha256::digest(msg).into();
        self.verify_raw(HashAlgorithm::Sha256, &prehash, &Signature::from(signature))
            .map_err(Into::into)
    }
}

impl<H: KeyHolder> DigestVerifier<Sha256, der::Signature> for OpaqueKey<H> {
    fn verify_digest(&self, digest: Sha256, signature: &der::Signature) -> signature::Result<()> {
        let prehash: FieldBytes = digest.finalize().into();
        self.verify_raw(HashAlgorithm::Sha256, &prehash, &Signature::from(signature))
            .map_err(Into::into)
    }
}

//
// Other trait impls
//

impl<H> Debug for OpaqueKey<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpaqueKey").finish_non_exhaustive()
    }
}

/// Opaque P-256 keys sign SHA-256 digests only.
fn check_hash_algorithm(hash_algorithm: HashAlgorithm) -> Result<(), Error> {
    if hash_algorithm == HashAlgorithm::Sha256 {
        Ok(())
    } else {
        Err(Error::UnsupportedAlgorithm)
    }
}

#[cfg(test)]
mod tests {
    use super::OpaqueKey;
    use crate::{
        Algorithm, FieldBytes, HashAlgorithm,
        ecdsa::{Error, Signature},
        holder::{HolderError, KeyHolder},
    };
    use core::cell::Cell;

    /// Holder that answers every operation and counts how often it is
    /// reached.
    struct CountingHolder {
        calls: Cell<usize>,
    }

    impl CountingHolder {
        fn new() -> Self {
            Self {
                calls: Cell::new(0),
            }
        }
    }

    impl KeyHolder for CountingHolder {
        fn raw_sign(&self, _prehash: &FieldBytes) -> Result<Signature, HolderError> {
            self.calls.set(self.calls.get() + 1);
            Ok(Signature::from_components(&[1; 32], &[2; 32]))
        }

        fn raw_verify(
            &self,
            _signature: &Signature,
            _prehash: &FieldBytes,
        ) -> Result<bool, HolderError> {
            self.calls.set(self.calls.get() + 1);
            Ok(true)
        }
    }

    #[test]
    fn can_do_gates_on_ecdsa() {
        let key = OpaqueKey::new(CountingHolder::new());
        assert!(key.can_do(Algorithm::Ecdsa));
        assert!(!key.can_do(Algorithm::Rsa));
        assert!(!key.can_do(Algorithm::Ed25519));
    }

    #[test]
    fn wrong_hash_rejected_before_holder_call() {
        let key = OpaqueKey::new(CountingHolder::new());
        let prehash = [0u8; 32];

        for alg in [
            HashAlgorithm::Sha224,
            HashAlgorithm::Sha384,
            HashAlgorithm::Sha512,
        ] {
            assert_eq!(
                key.sign_prehashed(alg, &prehash).unwrap_err(),
                Error::UnsupportedAlgorithm
            );
            assert_eq!(
                key.verify_raw(alg, &prehash, &Signature::from_components(&[1; 32], &[2; 32]))
                    .unwrap_err(),
                Error::UnsupportedAlgorithm
            );
        }

        assert_eq!(key.holder().calls.get(), 0);
    }

    #[test]
    fn holder_faults_pass_through() {
        struct FaultyHolder;

        impl KeyHolder for FaultyHolder {
            fn raw_sign(&self, _prehash: &FieldBytes) -> Result<Signature, HolderError> {
                Err(HolderError::new(0x00e7))
            }

            fn raw_verify(
                &self,
                _signature: &Signature,
                _prehash: &FieldBytes,
            ) -> Result<bool, HolderError> {
                Err(HolderError::new(0x00f4))
            }
        }

        let key = OpaqueKey::new(FaultyHolder);
        let prehash = [0u8; 32];
        let sig = Signature::from_components(&[1; 32], &[2; 32]);

        assert_eq!(
            key.sign_prehashed(HashAlgorithm::Sha256, &prehash)
                .unwrap_err(),
            Error::SignerFault(HolderError::new(0x00e7))
        );
        assert_eq!(
            key.verify_raw(HashAlgorithm::Sha256, &prehash, &sig)
                .unwrap_err(),
            Error::VerifierFault(HolderError::new(0x00f4))
        );
    }

    #[test]
    fn malformed_der_rejected_before_holder_call() {
        let key = OpaqueKey::new(CountingHolder::new());
        let err = key
            .verify_prehashed(HashAlgorithm::Sha256, &[0u8; 32], &[0x30, 0x02, 0x02, 0x00])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSignatureFormat(_)));
        assert_eq!(key.holder().calls.get(), 0);
    }
}
