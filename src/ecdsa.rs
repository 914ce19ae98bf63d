//! ECDSA/P-256 signatures and the opaque-key adapter.
//!
//! Two signature representations cross this module:
//!
//! - [`Signature`]: the fixed-width raw form, a 64-byte `R || S` pair as
//!   produced and consumed by hardware key holders.
//! - [`der::Signature`]: the variable-length ASN.1 DER interchange form
//!   used by protocols on the other side of the trust boundary.
//!
//! [`OpaqueKey`] bridges the two: it delegates the elliptic-curve
//! operations to a [`KeyHolder`](crate::holder::KeyHolder) and converts
//! between the raw and DER forms on the way through.
//!
//! ## Conversion example
//!
//! ```
//! use p256_opaque::ecdsa::Signature;
//!
//! let raw = Signature::from_components(&[1u8; 32], &[2u8; 32]);
//! let encoded = raw.to_der();
//! assert_eq!(Signature::from_der(encoded.as_bytes())?, raw);
//! # Ok::<(), p256_opaque::ecdsa::der::Error>(())
//! ```

pub mod der;
mod opaque;

pub use self::opaque::OpaqueKey;
pub use signature;

use crate::{FIELD_SIZE, FieldBytes, holder::HolderError};
use core::fmt::{self, Debug, Display};

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

/// ECDSA/P-256 signature serialized in its raw fixed-width form.
pub type SignatureBytes = [u8; Signature::BYTE_SIZE];

/// ECDSA/P-256 signature in raw fixed-width form: `R || S`, each component
/// a 32-byte big-endian unsigned integer.
///
/// This is the wire form spoken by hardware key holders. It carries no
/// scalar semantics of its own — range and validity checks belong to the
/// holder performing the curve operations. Leading zero bytes within a
/// component are preserved; they matter once the value is re-encoded in
/// the signed DER interchange form.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct Signature {
    r: FieldBytes,
    s: FieldBytes,
}

impl Signature {
    /// Size of a raw encoded signature in bytes.
    pub const BYTE_SIZE: usize = FIELD_SIZE * 2;

    /// Parse a signature from a raw byte array.
    pub fn from_bytes(bytes: &SignatureBytes) -> Self {
        let (r, s) = bytes.split_at(FIELD_SIZE);
        let mut sig = Self {
            r: FieldBytes::default(),
            s: FieldBytes::default(),
        };
        sig.r.copy_from_slice(r);
        sig.s.copy_from_slice(s);
        sig
    }

    /// Parse a signature from a raw byte slice, which must be exactly
    /// [`Signature::BYTE_SIZE`] bytes long.
    pub fn from_slice(bytes: &[u8]) -> signature::Result<Self> {
        SignatureBytes::try_from(bytes)
            .map(|bytes| Self::from_bytes(&bytes))
            .map_err(|_| signature::Error::new())
    }

    /// Assemble a signature from its big-endian `r` and `s` components.
    pub fn from_components(r: &FieldBytes, s: &FieldBytes) -> Self {
        Self { r: *r, s: *s }
    }

    /// Parse a signature from the DER interchange encoding.
    pub fn from_der(bytes: &[u8]) -> Result<Self, der::Error> {
        der::Signature::from_bytes(bytes).map(|sig| Self::from(&sig))
    }

    /// Serialize this signature as its raw byte form.
    pub fn to_bytes(&self) -> SignatureBytes {
        let mut ret = [0; Self::BYTE_SIZE];
        let (r, s) = ret.split_at_mut(FIELD_SIZE);
        r.copy_from_slice(&self.r);
        s.copy_from_slice(&self.s);
        ret
    }

    /// Encode this signature in the DER interchange form.
    pub fn to_der(&self) -> der::Signature {
        der::Signature::from_components(&self.r, &self.s)
    }

    /// Bytes of the `R` component.
    pub fn r_bytes(&self) -> &FieldBytes {
        &self.r
    }

    /// Bytes of the `S` component.
    pub fn s_bytes(&self) -> &FieldBytes {
        &self.s
    }

    /// Convert this signature into a byte vector.
    #[cfg(feature = "alloc")]
    pub fn to_vec(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }
}

impl Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p256_opaque::ecdsa::Signature(")?;

        for byte in self.to_bytes() {
            write!(f, "{:02X}", byte)?;
        }

        write!(f, ")")
    }
}

impl From<Signature> for SignatureBytes {
    fn from(signature: Signature) -> SignatureBytes {
        signature.to_bytes()
    }
}

impl From<&Signature> for SignatureBytes {
    fn from(signature: &Signature) -> SignatureBytes {
        signature.to_bytes()
    }
}

impl signature::SignatureEncoding for Signature {
    type Repr = SignatureBytes;

    fn to_bytes(&self) -> Self::Repr {
        self.into()
    }

    fn encoded_len(&self) -> usize {
        Self::BYTE_SIZE
    }
}

impl TryFrom<&[u8]> for Signature {
    type Error = signature::Error;

    fn try_from(bytes: &[u8]) -> signature::Result<Signature> {
        Self::from_slice(bytes)
    }
}

/// Errors raised by the opaque-key adapter.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// The requested signature or hash algorithm is not one this key can
    /// perform. Raised before the key holder is contacted.
    UnsupportedAlgorithm,
    /// The key holder reported a fault while signing.
    SignerFault(HolderError),
    /// The signature bytes are not a well-formed DER encoding.
    InvalidSignatureFormat(der::Error),
    /// The key holder processed the signature and found it does not match.
    VerificationFailed,
    /// The key holder reported a fault unrelated to the signature's
    /// validity while verifying.
    VerifierFault(HolderError),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnsupportedAlgorithm => f.write_str("unsupported signature or hash algorithm"),
            Error::SignerFault(status) => write!(f, "signing fault: {status}"),
            Error::InvalidSignatureFormat(err) => write!(f, "invalid signature encoding: {err}"),
            Error::VerificationFailed => f.write_str("signature verification failed"),
            Error::VerifierFault(status) => write!(f, "verification fault: {status}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::SignerFault(status) | Error::VerifierFault(status) => Some(status),
            Error::InvalidSignatureFormat(err) => Some(err),
            _ => None,
        }
    }
}

impl From<Error> for signature::Error {
    #[cfg(feature = "std")]
    fn from(err: Error) -> Self {
        signature::Error::from_source(err)
    }

    #[cfg(not(feature = "std"))]
    fn from(_err: Error) -> Self {
        signature::Error::new()
    }
}
