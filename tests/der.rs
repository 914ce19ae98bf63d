//! DER codec properties and interchange interop.

use p256_opaque::ecdsa::{Signature, der};
use proptest::prelude::*;

prop_compose! {
    fn raw_signature()(r in any::<[u8; 32]>(), s in any::<[u8; 32]>()) -> Signature {
        Signature::from_components(&r, &s)
    }
}

proptest! {
    #[test]
    fn round_trip(raw in raw_signature()) {
        let encoded = raw.to_der();
        let decoded = Signature::from_der(encoded.as_bytes()).unwrap();
        prop_assert_eq!(decoded, raw);
    }

    #[test]
    fn encoding_is_minimal(raw in raw_signature()) {
        let encoded = raw.to_der();

        // Re-encoding the decoded value reproduces the bytes, so no
        // non-canonical form survives a round trip.
        let decoded = Signature::from_der(encoded.as_bytes()).unwrap();
        let reencoded = decoded.to_der();
        prop_assert_eq!(reencoded.as_bytes(), encoded.as_bytes());

        prop_assert!(encoded.len() <= der::Signature::MAX_LEN);
    }

    #[test]
    fn truncation_rejected(raw in raw_signature(), cut in 1usize..8) {
        let encoded = raw.to_der();
        let truncated = &encoded.as_bytes()[..encoded.len() - cut.min(encoded.len())];
        prop_assert!(Signature::from_der(truncated).is_err());
    }

    #[test]
    fn standard_decoder_accepts_our_encoding(raw in raw_signature()) {
        // The reference decoder's handling of a zero component is its own
        // affair; interop only matters for signatures a holder can emit.
        prop_assume!(raw.r_bytes() != &[0u8; 32] && raw.s_bytes() != &[0u8; 32]);

        let encoded = raw.to_der();
        let reference = p256::ecdsa::DerSignature::from_bytes(encoded.as_bytes()).unwrap();
        prop_assert_eq!(reference.as_bytes(), encoded.as_bytes());
    }
}

/// Interchange form produced here must be byte-exact with the encoding the
/// reference ECDSA stack produces for the same (R, S) pair.
#[test]
fn byte_exact_with_reference_encoder() {
    let r = [0x7fu8; 32];
    let mut s = [0x33u8; 32];
    s[0] = 0x00;

    let ours = Signature::from_components(&r, &s).to_der();

    let mut raw = [0u8; 64];
    raw[..32].copy_from_slice(&r);
    raw[32..].copy_from_slice(&s);
    let reference = p256::ecdsa::Signature::from_slice(&raw).unwrap().to_der();

    assert_eq!(ours.as_bytes(), reference.as_bytes());
}

#[test]
fn standard_encoding_decodes_to_original_components() {
    let r = [0xe1u8; 32];
    let s = [0x19u8; 32];

    let mut raw = [0u8; 64];
    raw[..32].copy_from_slice(&r);
    raw[32..].copy_from_slice(&s);
    let reference = p256::ecdsa::Signature::from_slice(&raw).unwrap().to_der();

    let decoded = Signature::from_der(reference.as_bytes()).unwrap();
    assert_eq!(decoded.r_bytes(), &r);
    assert_eq!(decoded.s_bytes(), &s);
}
