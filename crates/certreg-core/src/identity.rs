//! # Identifier Newtypes
//!
//! [`CertificateId`] names a certificate; [`Identity`] names a caller. Both
//! are fixed-width byte strings rendered as `0x`-prefixed lowercase hex, and
//! both are distinct types so one can never be passed where the other is
//! expected.
//!
//! Parsing is strict: the only accepted form is an optional `0x`/`0X` prefix
//! followed by exactly the right number of hex digits.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::digest::ContentDigest;
use crate::error::ValidationError;

/// Decode `N` bytes of hex after stripping an optional `0x`.
pub(crate) fn decode_prefixed_hex<const N: usize>(input: &str) -> Result<[u8; N], String> {
    let body = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    if body.len() != N * 2 {
        return Err(format!(
            "expected {} hex characters, got {}",
            N * 2,
            body.len()
        ));
    }
    if !body.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err("contains non-hex characters".to_string());
    }
    let mut out = [0u8; N];
    for (i, chunk) in body.as_bytes().chunks(2).enumerate() {
        // Both bytes are ASCII hex digits, checked above.
        let hi = (chunk[0] as char).to_digit(16).unwrap_or(0) as u8;
        let lo = (chunk[1] as char).to_digit(16).unwrap_or(0) as u8;
        out[i] = (hi << 4) | lo;
    }
    Ok(out)
}

fn write_prefixed_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    f.write_str("0x")?;
    for b in bytes {
        write!(f, "{b:02x}")?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CertificateId
// ---------------------------------------------------------------------------

/// Opaque 32-byte certificate identifier.
///
/// Derived at issuance from a content digest; never chosen by the caller.
/// Renders as `0x` followed by 64 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CertificateId([u8; 32]);

impl CertificateId {
    /// Build an id from a content digest.
    pub fn from_digest(digest: &ContentDigest) -> Self {
        Self(*digest.as_bytes())
    }

    /// Wrap raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw 32 bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse a textual id.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MalformedId`] if the input is not `0x` plus
    /// 64 hex characters (the prefix is optional).
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        decode_prefixed_hex::<32>(input.trim())
            .map(Self)
            .map_err(|reason| ValidationError::MalformedId {
                input: input.to_string(),
                reason,
            })
    }
}

impl fmt::Display for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_prefixed_hex(f, &self.0)
    }
}

impl fmt::Debug for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CertificateId({self})")
    }
}

impl FromStr for CertificateId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for CertificateId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CertificateId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A caller principal: the first 20 bytes of SHA-256 over an Ed25519
/// public key. Renders as `0x` followed by 40 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity([u8; 20]);

impl Identity {
    /// Derive the identity that owns a raw Ed25519 public key.
    pub fn from_public_key_bytes(key: &[u8; 32]) -> Self {
        let hash = Sha256::digest(key);
        let mut out = [0u8; 20];
        out.copy_from_slice(&hash[..20]);
        Self(out)
    }

    /// Wrap raw bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// The raw 20 bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Parse a textual identity.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidIdentity`] unless the input is an
    /// optional `0x` plus 40 hex characters.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        decode_prefixed_hex::<20>(input.trim())
            .map(Self)
            .map_err(|_| ValidationError::InvalidIdentity(input.to_string()))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_prefixed_hex(f, &self.0)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({self})")
    }
}

impl FromStr for Identity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn any_32_bytes_round_trip(bytes in any::<[u8; 32]>()) {
            let id = CertificateId::from_bytes(bytes);
            prop_assert_eq!(CertificateId::parse(&id.to_string()).unwrap(), id);
        }

        #[test]
        fn wrong_length_hex_is_malformed(s in "[0-9a-f]{0,128}") {
            prop_assume!(s.len() != 64);
            let input = format!("0x{s}");
            let rejected = matches!(
                CertificateId::parse(&input),
                Err(ValidationError::MalformedId { .. })
            );
            prop_assert!(rejected);
        }

        #[test]
        fn parse_never_panics(s in "\\PC{0,80}") {
            let _ = CertificateId::parse(&s);
            let _ = Identity::parse(&s);
        }
    }
}
