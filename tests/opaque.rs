//! End-to-end opaque-key signing, verification, and context binding.

use hex_literal::hex;
use p256_opaque::{
    Algorithm, HashAlgorithm, KeyContext, KeyId, OpaqueKey, SetupError, SoftwareKey,
    SoftwareKeyStore,
    ecdsa::signature::{
        DigestSigner, Signer, Verifier,
        hazmat::{PrehashSigner, PrehashVerifier, RandomizedPrehashSigner},
    },
    holder::{KeyStore, StoreError},
};
use rand_core::OsRng;
use sha2::{Digest, Sha256};

/// RFC 6979 appendix A.2.5 P-256 secret key.
const SECRET: [u8; 32] = hex!("c9afa9d845ba75166b5c215767b1d6934e50c3db36e89b127b8a622b120f6721");

const MSG: &[u8] = b"sample";

fn software_key() -> SoftwareKey {
    SoftwareKey::from_secret_bytes(&SECRET).unwrap()
}

fn opaque_key() -> OpaqueKey<SoftwareKey> {
    OpaqueKey::new(software_key())
}

fn prehash() -> [u8; 32] {
    Sha256::digest(MSG).into()
}

#[test]
fn sign_and_verify_round_trip() {
    let key = opaque_key();
    let prehash = prehash();

    let sig = key.sign_prehashed(HashAlgorithm::Sha256, &prehash).unwrap();
    key.verify_prehashed(HashAlgorithm::Sha256, &prehash, sig.as_bytes())
        .unwrap();
}

#[test]
fn signature_verifies_under_reference_stack() {
    let key = opaque_key();
    let prehash = prehash();
    let sig = key.sign_prehashed(HashAlgorithm::Sha256, &prehash).unwrap();

    // The DER bytes cross the trust boundary: the reference decoder must
    // accept them as-is.
    let reference = p256::ecdsa::Signature::from_der(sig.as_bytes()).unwrap();

    key.holder()
        .verifying_key()
        .verify_prehash(&prehash, &reference)
        .unwrap();
}

#[test]
fn reference_signature_verifies_through_adapter() {
    let signing_key = p256::ecdsa::SigningKey::from_slice(&SECRET).unwrap();
    let prehash = prehash();

    let reference: p256::ecdsa::Signature = signing_key.sign_prehash(&prehash).unwrap();

    let key = opaque_key();
    key.verify_prehashed(HashAlgorithm::Sha256, &prehash, reference.to_der().as_bytes())
        .unwrap();
}

#[test]
fn tampered_signature_rejected() {
    let key = opaque_key();
    let prehash = prehash();
    let sig = key.sign_prehashed(HashAlgorithm::Sha256, &prehash).unwrap();

    let mut bytes = [0u8; 72];
    let len = sig.as_bytes().len();
    bytes[..len].copy_from_slice(sig.as_bytes());
    // Flip one bit in the middle of the r magnitude; the encoding stays
    // well-formed, so rejection has to come from the holder.
    bytes[10] ^= 0x01;

    assert_eq!(
        key.verify_prehashed(HashAlgorithm::Sha256, &prehash, &bytes[..len])
            .unwrap_err(),
        p256_opaque::ecdsa::Error::VerificationFailed
    );
}

#[test]
fn wrong_digest_never_verifies() {
    let key = opaque_key();
    let prehash = prehash();
    let sig = key.sign_prehashed(HashAlgorithm::Sha256, &prehash).unwrap();

    let other: [u8; 32] = Sha256::digest(b"other message").into();
    assert_eq!(
        key.verify_prehashed(HashAlgorithm::Sha256, &other, sig.as_bytes())
            .unwrap_err(),
        p256_opaque::ecdsa::Error::VerificationFailed
    );
}

#[test]
fn signature_trait_surface() {
    let key = opaque_key();

    let by_message: p256_opaque::ecdsa::der::Signature = key.try_sign(MSG).unwrap();
    key.verify(MSG, &by_message).unwrap();

    let by_digest: p256_opaque::ecdsa::der::Signature =
        key.try_sign_digest(Sha256::new_with_prefix(MSG)).unwrap();
    key.verify(MSG, &by_digest).unwrap();

    let by_prehash: p256_opaque::ecdsa::der::Signature = key.sign_prehash(&prehash()).unwrap();
    key.verify_prehash(&prehash(), &by_prehash).unwrap();

    // Uniform randomized contract; the entropy goes unused.
    let randomized: p256_opaque::ecdsa::der::Signature = key
        .sign_prehash_with_rng(&mut OsRng, &prehash())
        .unwrap();
    key.verify_prehash(&prehash(), &randomized).unwrap();

    // Raw fixed-width form via the same traits.
    let raw: p256_opaque::Signature = key.sign_prehash(&prehash()).unwrap();
    key.verify_prehash(&prehash(), &raw).unwrap();
}

#[test]
fn prehash_length_enforced_by_traits() {
    let key = opaque_key();
    let result: p256_opaque::ecdsa::signature::Result<p256_opaque::ecdsa::der::Signature> =
        key.sign_prehash(&[0u8; 20]);
    assert!(result.is_err());
}

#[test]
fn context_binds_signs_and_verifies() {
    let mut store = SoftwareKeyStore::new();
    store.insert(KeyId(1), software_key());

    let mut ctx = KeyContext::new();
    assert!(!ctx.is_bound());
    assert!(!ctx.can_do(Algorithm::Ecdsa));
    assert_eq!(ctx.algorithm(), None);

    ctx.bind_opaque_key(&store, KeyId(1)).unwrap();
    assert!(ctx.is_bound());
    assert!(ctx.can_do(Algorithm::Ecdsa));
    assert!(!ctx.can_do(Algorithm::Rsa));
    assert_eq!(ctx.algorithm(), Some(Algorithm::Ecdsa));

    let key = ctx.key().unwrap();
    let prehash = prehash();
    let sig = key.sign(HashAlgorithm::Sha256, &prehash).unwrap();
    key.verify(HashAlgorithm::Sha256, &prehash, sig.as_bytes())
        .unwrap();
}

#[test]
fn context_rejects_rebinding_until_released() {
    let mut store = SoftwareKeyStore::new();
    store.insert(KeyId(1), software_key());

    let mut ctx = KeyContext::new();
    ctx.bind_opaque_key(&store, KeyId(1)).unwrap();
    assert_eq!(
        ctx.bind_opaque_key(&store, KeyId(1)).unwrap_err(),
        SetupError::InvalidContext
    );

    ctx.release();
    assert!(!ctx.is_bound());
    ctx.bind_opaque_key(&store, KeyId(1)).unwrap();
}

#[test]
fn unknown_key_id_reported() {
    let store = SoftwareKeyStore::new();
    let mut ctx = KeyContext::new();
    assert_eq!(
        ctx.bind_opaque_key(&store, KeyId(7)).unwrap_err(),
        SetupError::KeyNotFound
    );
    assert!(!ctx.is_bound());
}

#[test]
fn unreachable_store_reported() {
    /// Store whose backing device never answers.
    struct OfflineStore;

    impl KeyStore for OfflineStore {
        type Key = SoftwareKey;

        fn resolve(&self, _id: KeyId) -> Result<SoftwareKey, StoreError> {
            Err(StoreError::Unavailable)
        }
    }

    let mut ctx = KeyContext::new();
    assert_eq!(
        ctx.bind_opaque_key(&OfflineStore, KeyId(1)).unwrap_err(),
        SetupError::KeyStoreUnavailable
    );
}
