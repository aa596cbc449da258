//! Self-describing variable-length values ("varlena").
//!
//! ## Format
//!
//! A varlena is a header followed by the payload bytes. Two header forms are
//! understood:
//!
//! ```text
//! full:  [4-byte LE word: total_len << 2 (low bits 00)][payload...]
//! short: [1 byte: (total_len << 1) | 1][payload...]
//! ```
//!
//! `total_len` always includes the header itself. The short form covers
//! payloads up to 126 bytes. Values built by [`Varlena::encode`] always use
//! the full form; [`Varlena::from_raw`] accepts either, and readers never need
//! to know which one they hold.
//!
//! A value is immutable once constructed and never aliases caller memory:
//! every constructor copies into a freshly allocated buffer.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

use pgfn_error::{PgFnError, Result};

/// Size of the full (4-byte) header.
pub const VARHDRSZ: usize = 4;

/// Size of the short (1-byte) header.
pub const VARHDRSZ_SHORT: usize = 1;

/// Largest total size (header included) expressible in a short header.
pub const VARATT_SHORT_MAX: usize = 0x7F;

/// Largest total size (header included) of any varlena.
pub const MAX_VARLENA_SIZE: usize = 0x3FFF_FFFF;

/// Which header form a [`Varlena`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderKind {
    /// 1-byte header.
    Short,
    /// 4-byte header.
    Full,
}

impl HeaderKind {
    /// Header size in bytes.
    pub const fn size(self) -> usize {
        match self {
            Self::Short => VARHDRSZ_SHORT,
            Self::Full => VARHDRSZ,
        }
    }
}

/// An owned, length-prefixed byte buffer.
///
/// Equality and hashing look at the payload only, so the same bytes compare
/// equal regardless of header form.
#[derive(Clone, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Varlena {
    raw: Vec<u8>,
}

impl Varlena {
    /// Encode `payload` into a new value with a full header.
    pub fn encode(payload: &[u8]) -> Result<Self> {
        let total = checked_total(payload.len(), VARHDRSZ)?;
        let mut raw = Vec::with_capacity(total);
        raw.extend_from_slice(&full_header(total));
        raw.extend_from_slice(payload);
        Ok(Self { raw })
    }

    /// Encode a UTF-8 string.
    pub fn from_text(s: &str) -> Result<Self> {
        Self::encode(s.as_bytes())
    }

    /// An empty value (full header, no payload).
    pub fn empty() -> Self {
        Self {
            raw: full_header(VARHDRSZ).to_vec(),
        }
    }

    /// Adopt an already-encoded buffer, validating its header.
    ///
    /// Both header forms are accepted. The declared total length must match
    /// the buffer length exactly. Compressed and external (TOAST pointer)
    /// headers are rejected.
    pub fn from_raw(raw: Vec<u8>) -> Result<Self> {
        let Some(&first) = raw.first() else {
            return Err(malformed("empty buffer"));
        };

        let declared = if first & 0x01 == 0x01 {
            if first == 0x01 {
                return Err(malformed("external TOAST pointers are not supported"));
            }
            usize::from(first >> 1)
        } else {
            if first & 0x03 == 0x02 {
                return Err(malformed("compressed values are not supported"));
            }
            let Some(header) = raw.get(..VARHDRSZ) else {
                let detail = format!("truncated 4-byte header: {} byte(s)", raw.len());
                return Err(malformed(detail));
            };
            let word = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
            let declared = (word >> 2) as usize;
            if declared < VARHDRSZ {
                return Err(malformed(format!(
                    "declared length {declared} is smaller than the header"
                )));
            }
            declared
        };

        if declared != raw.len() {
            return Err(malformed(format!(
                "declared length {declared} does not match buffer length {}",
                raw.len()
            )));
        }
        Ok(Self { raw })
    }

    /// The header form of this value.
    pub fn header_kind(&self) -> HeaderKind {
        if self.raw[0] & 0x01 == 0x01 {
            HeaderKind::Short
        } else {
            HeaderKind::Full
        }
    }

    /// Payload bytes, whatever the header form.
    pub fn payload(&self) -> &[u8] {
        &self.raw[self.header_kind().size()..]
    }

    /// Alias for [`payload`](Self::payload), named after the codec operation.
    pub fn decode(&self) -> &[u8] {
        self.payload()
    }

    /// Payload length in bytes (header excluded).
    pub fn len(&self) -> usize {
        self.raw.len() - self.header_kind().size()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total encoded size, header included.
    pub fn total_size(&self) -> usize {
        self.raw.len()
    }

    /// The encoded bytes, header included.
    pub fn as_raw(&self) -> &[u8] {
        &self.raw
    }

    /// Consume the value, returning the encoded bytes.
    pub fn into_raw(self) -> Vec<u8> {
        self.raw
    }

    /// A copy using the 1-byte header when the payload fits, otherwise the
    /// full header.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_short_form(&self) -> Self {
        let payload = self.payload();
        let total = payload.len() + VARHDRSZ_SHORT;
        if total > VARATT_SHORT_MAX {
            return self.to_full_form();
        }
        let mut raw = Vec::with_capacity(total);
        raw.push(((total as u8) << 1) | 0x01);
        raw.extend_from_slice(payload);
        Self { raw }
    }

    /// A copy using the 4-byte header.
    #[must_use]
    pub fn to_full_form(&self) -> Self {
        let payload = self.payload();
        let total = payload.len() + VARHDRSZ;
        let mut raw = Vec::with_capacity(total);
        raw.extend_from_slice(&full_header(total));
        raw.extend_from_slice(payload);
        Self { raw }
    }

    /// Concatenate two values into a new one: `payload(a) || payload(b)`.
    pub fn concat(a: &Self, b: &Self) -> Result<Self> {
        let (left, right) = (a.payload(), b.payload());
        let payload_len = left
            .len()
            .checked_add(right.len())
            .ok_or(PgFnError::TooBig {
                requested: usize::MAX,
                max: MAX_VARLENA_SIZE,
            })?;
        let total = checked_total(payload_len, VARHDRSZ)?;
        let mut raw = Vec::with_capacity(total);
        raw.extend_from_slice(&full_header(total));
        raw.extend_from_slice(left);
        raw.extend_from_slice(right);
        Ok(Self { raw })
    }

    /// The payload as UTF-8, if it is valid.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(self.payload()).ok()
    }

    /// The payload as text, replacing invalid UTF-8 sequences.
    pub fn to_text_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.payload())
    }
}

fn checked_total(payload_len: usize, header: usize) -> Result<usize> {
    match payload_len.checked_add(header) {
        Some(total) if total <= MAX_VARLENA_SIZE => Ok(total),
        _ => Err(PgFnError::TooBig {
            requested: payload_len,
            max: MAX_VARLENA_SIZE - header,
        }),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn full_header(total: usize) -> [u8; VARHDRSZ] {
    // total <= MAX_VARLENA_SIZE, so the shifted word fits in 32 bits.
    ((total as u32) << 2).to_le_bytes()
}

fn malformed(detail: impl Into<String>) -> PgFnError {
    PgFnError::MalformedVarlena {
        detail: detail.into(),
    }
}

impl PartialEq for Varlena {
    fn eq(&self, other: &Self) -> bool {
        self.payload() == other.payload()
    }
}

impl Eq for Varlena {}

impl Hash for Varlena {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.payload().hash(state);
    }
}

impl fmt::Debug for Varlena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Varlena")
            .field("header", &self.header_kind())
            .field("len", &self.len())
            .field("payload", &self.to_text_lossy())
            .finish()
    }
}

impl TryFrom<Vec<u8>> for Varlena {
    type Error = PgFnError;

    fn try_from(raw: Vec<u8>) -> Result<Self> {
        Self::from_raw(raw)
    }
}

impl From<Varlena> for Vec<u8> {
    fn from(v: Varlena) -> Self {
        v.raw
    }
}

impl TryFrom<&str> for Varlena {
    type Error = PgFnError;

    fn try_from(s: &str) -> Result<Self> {
        Self::from_text(s)
    }
}

impl TryFrom<&[u8]> for Varlena {
    type Error = PgFnError;

    fn try_from(b: &[u8]) -> Result<Self> {
        Self::encode(b)
    }
}
