//! ASN.1 DER interchange encoding for ECDSA/P-256 signatures.
//!
//! The interchange form is `SEQUENCE { INTEGER r, INTEGER s }` in
//! distinguished encoding: each integer is the minimal big-endian encoding
//! of its value, prefixed with one zero byte when the most significant bit
//! of the minimal form is set (the sign-safety rule for non-negative
//! values under two's-complement encoding).
//!
//! Signature parsing is an attacker-reachable boundary, so the
//! tag-length-value layer is implemented here with exhaustive bounds
//! checks rather than delegated: the outer length must exactly span the
//! input, every field is validated for tag, length form, minimality, and
//! sign before use, and nothing is written to an output until the whole
//! encoding has been accepted.

use crate::{FIELD_SIZE, FieldBytes};
use core::{
    fmt::{self, Debug, Display},
    ops::Range,
};

#[cfg(feature = "alloc")]
use alloc::{boxed::Box, vec::Vec};

/// `INTEGER` tag octet.
const INTEGER_TAG: u8 = 0x02;

/// Constructed `SEQUENCE` tag octet.
const SEQUENCE_TAG: u8 = 0x30;

/// Errors converting between the raw and DER signature forms.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// The output buffer is smaller than the encoded signature.
    EncodingOverflow,
    /// The declared sequence length exceeds the input.
    LengthMismatch,
    /// A tag, length octet, or integer body is missing or invalid.
    MalformedField,
    /// An integer component's magnitude exceeds the P-256 field size.
    FieldTooLarge,
    /// Bytes remain after the encoded signature.
    TrailingData,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Error::EncodingOverflow => "output buffer too small for encoded signature",
            Error::LengthMismatch => "declared signature length exceeds input",
            Error::MalformedField => "malformed or truncated signature field",
            Error::FieldTooLarge => "signature component exceeds the field size",
            Error::TrailingData => "trailing bytes after encoded signature",
        })
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

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

/// ECDSA/P-256 signature in the ASN.1 DER interchange form.
///
/// Holds the encoding in an internal buffer of [`Signature::MAX_LEN`]
/// bytes together with the positions of the two integer magnitudes. A
/// value of this type always contains a fully validated encoding:
/// [`Signature::from_bytes`] rejects anything malformed, truncated,
/// non-minimal, or oversized before a value is constructed.
#[derive(Clone)]
pub struct Signature {
    /// DER-encoded signature data.
    bytes: [u8; Self::MAX_LEN],

    /// Range of the `r` magnitude within the encoding.
    r_range: Range<usize>,

    /// Range of the `s` magnitude within the encoding.
    s_range: Range<usize>,
}

#[allow(clippy::len_without_is_empty)]
impl Signature {
    /// Maximum length of a DER-encoded P-256 signature: two integers of up
    /// to [`FIELD_SIZE`] magnitude bytes plus a sign byte and a two-byte
    /// header each, inside a two-byte sequence header.
    pub const MAX_LEN: usize = 2 * (FIELD_SIZE + 3) + 2;

    /// Parse a signature from DER-encoded bytes.
    ///
    /// The input must contain exactly one encoded signature: the declared
    /// sequence length must span the remainder of the input and both
    /// integers must consume the sequence body in full.
    pub fn from_bytes(input: &[u8]) -> Result<Self, Error> {
        if input.len() < 2 {
            return Err(Error::MalformedField);
        }

        if input[0] != SEQUENCE_TAG {
            return Err(Error::MalformedField);
        }

        // A P-256 signature body is at most 70 bytes, so the distinguished
        // encoding always uses the short length form.
        let declared = input[1];
        if declared & 0x80 != 0 {
            return Err(Error::MalformedField);
        }

        let body_len = input.len() - 2;
        if usize::from(declared) > body_len {
            return Err(Error::LengthMismatch);
        }
        if usize::from(declared) < body_len {
            return Err(Error::TrailingData);
        }

        let mut pos = 2;
        let r_range = read_integer(input, &mut pos)?;
        let s_range = read_integer(input, &mut pos)?;

        if pos != input.len() {
            return Err(Error::TrailingData);
        }

        let mut bytes = [0u8; Self::MAX_LEN];
        bytes[..input.len()].copy_from_slice(input);

        Ok(Self {
            bytes,
            r_range,
            s_range,
        })
    }

    /// Encode a signature from its big-endian `r` and `s` components.
    ///
    /// Infallible: the internal buffer is sized to the worst case, two
    /// full-width magnitudes each carrying a sign byte.
    pub fn from_components(r: &FieldBytes, s: &FieldBytes) -> Self {
        let r_mag = trim_leading_zeroes(r);
        let s_mag = trim_leading_zeroes(s);
        let body_len = integer_len(r_mag) + integer_len(s_mag);

        let mut bytes = [0u8; Self::MAX_LEN];
        bytes[0] = SEQUENCE_TAG;
        bytes[1] = body_len as u8;

        let mut pos = 2;
        let r_range = write_integer(&mut bytes, &mut pos, r_mag);
        let s_range = write_integer(&mut bytes, &mut pos, s_mag);
        debug_assert_eq!(pos, body_len + 2);

        Self {
            bytes,
            r_range,
            s_range,
        }
    }

    /// Borrow the encoded signature as a byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len()]
    }

    /// Length of the encoded signature in bytes.
    pub fn len(&self) -> usize {
        self.s_range.end
    }

    /// Copy the encoded signature into `buf`, returning the written
    /// prefix.
    ///
    /// Fails with [`Error::EncodingOverflow`] when `buf` is shorter than
    /// the encoding.
    pub fn encode_to_slice<'a>(&self, buf: &'a mut [u8]) -> Result<&'a [u8], Error> {
        let out = buf
            .get_mut(..self.len())
            .ok_or(Error::EncodingOverflow)?;
        out.copy_from_slice(self.as_bytes());
        Ok(out)
    }

    /// Serialize this signature as a byte vector.
    #[cfg(feature = "alloc")]
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    /// Magnitude of the `r` component, minimally encoded.
    pub(crate) fn r(&self) -> &[u8] {
        &self.bytes[self.r_range.clone()]
    }

    /// Magnitude of the `s` component, minimally encoded.
    pub(crate) fn s(&self) -> &[u8] {
        &self.bytes[self.s_range.clone()]
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p256_opaque::ecdsa::der::Signature(")?;

        for &byte in self.as_bytes() {
            write!(f, "{byte:02X}")?;
        }

        write!(f, ")")
    }
}

impl Eq for Signature {}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl From<&super::Signature> for Signature {
    fn from(sig: &super::Signature) -> Signature {
        sig.to_der()
    }
}

impl From<super::Signature> for Signature {
    fn from(sig: super::Signature) -> Signature {
        sig.to_der()
    }
}

impl From<&Signature> for super::Signature {
    fn from(sig: &Signature) -> super::Signature {
        let mut r = FieldBytes::default();
        let mut s = FieldBytes::default();

        // Magnitudes are at most FIELD_SIZE bytes once parsed; write them
        // right-aligned, zero-padding on the left.
        r[FIELD_SIZE - sig.r().len()..].copy_from_slice(sig.r());
        s[FIELD_SIZE - sig.s().len()..].copy_from_slice(sig.s());

        super::Signature::from_components(&r, &s)
    }
}

impl From<Signature> for super::Signature {
    fn from(sig: Signature) -> super::Signature {
        super::Signature::from(&sig)
    }
}

impl TryFrom<&[u8]> for Signature {
    type Error = signature::Error;

    fn try_from(input: &[u8]) -> signature::Result<Self> {
        Self::from_bytes(input).map_err(Into::into)
    }
}

#[cfg(feature = "alloc")]
impl From<Signature> for Box<[u8]> {
    fn from(signature: Signature) -> Box<[u8]> {
        signature.to_vec().into_boxed_slice()
    }
}

#[cfg(feature = "alloc")]
impl signature::SignatureEncoding for Signature {
    type Repr = Box<[u8]>;

    fn to_bytes(&self) -> Self::Repr {
        self.clone().into()
    }

    fn encoded_len(&self) -> usize {
        self.len()
    }
}

/// Strip leading zero bytes from a big-endian magnitude.
///
/// The result is empty for a zero value; the integer writer emits the
/// single canonical `00` body in that case.
fn trim_leading_zeroes(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

/// Encoded length of one `INTEGER`, header included.
fn integer_len(magnitude: &[u8]) -> usize {
    if magnitude.is_empty() {
        // Zero encodes as the single body byte `00`.
        3
    } else {
        2 + magnitude.len() + usize::from(magnitude[0] & 0x80 != 0)
    }
}

/// Write one `INTEGER` at `pos`, returning the range of the magnitude
/// bytes within `out`.
fn write_integer(out: &mut [u8], pos: &mut usize, magnitude: &[u8]) -> Range<usize> {
    out[*pos] = INTEGER_TAG;

    if magnitude.is_empty() {
        out[*pos + 1] = 1;
        out[*pos + 2] = 0x00;
        *pos += 3;
        return *pos - 1..*pos;
    }

    let pad = magnitude[0] & 0x80 != 0;
    out[*pos + 1] = (magnitude.len() + usize::from(pad)) as u8;
    *pos += 2;

    if pad {
        out[*pos] = 0x00;
        *pos += 1;
    }

    out[*pos..*pos + magnitude.len()].copy_from_slice(magnitude);
    *pos += magnitude.len();
    *pos - magnitude.len()..*pos
}

/// Read one `INTEGER` at `pos`, returning the range of the magnitude
/// bytes within `input` with any sign byte stripped.
fn read_integer(input: &[u8], pos: &mut usize) -> Result<Range<usize>, Error> {
    let tag = *input.get(*pos).ok_or(Error::MalformedField)?;
    if tag != INTEGER_TAG {
        return Err(Error::MalformedField);
    }

    let len = *input.get(*pos + 1).ok_or(Error::MalformedField)?;
    if len == 0 || len & 0x80 != 0 {
        return Err(Error::MalformedField);
    }

    let start = *pos + 2;
    let body = input
        .get(start..start + usize::from(len))
        .ok_or(Error::MalformedField)?;

    // Signature integers are non-negative.
    if body[0] & 0x80 != 0 {
        return Err(Error::MalformedField);
    }

    // A leading zero byte is only valid as the sign byte of a magnitude
    // whose top bit is set; anything else is non-minimal.
    let magnitude = if body[0] == 0x00 && body.len() > 1 {
        if body[1] & 0x80 == 0 {
            return Err(Error::MalformedField);
        }
        &body[1..]
    } else {
        body
    };

    if magnitude.len() > FIELD_SIZE {
        return Err(Error::FieldTooLarge);
    }

    *pos = start + usize::from(len);
    Ok(*pos - magnitude.len()..*pos)
}
