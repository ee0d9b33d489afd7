//! # Ed25519 Signing and Verification
//!
//! Every mutating registry operation arrives as a transaction signed by the
//! caller's Ed25519 key. The registry derives the caller's [`Identity`] from
//! the signer's public key, so possession of the key is what authorizes a
//! caller.
//!
//! ## Invariants
//!
//! - Signing input is `&CanonicalBytes`; raw bytes cannot be signed.
//! - `Ed25519KeyPair` does not implement `Serialize`, and its `Debug` output
//!   is redacted. The seed leaves the type only through
//!   [`Ed25519KeyPair::seed_hex`], which returns a zeroizing buffer.
//! - Public keys and signatures serialize as lowercase hex strings.

use certreg_core::{CanonicalBytes, Identity};
use ed25519_dalek::Signer;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// An Ed25519 public key (32 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ed25519PublicKey([u8; 32]);

/// An Ed25519 signature (64 bytes).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Ed25519Signature([u8; 64]);

/// An Ed25519 key pair held by a signing agent.
pub struct Ed25519KeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

// ---------------------------------------------------------------------------
// Ed25519PublicKey
// ---------------------------------------------------------------------------

impl Ed25519PublicKey {
    /// Wrap raw 32 bytes. Curve validity is checked at verification time.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw 32-byte key.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The caller identity this key speaks for.
    pub fn identity(&self) -> Identity {
        Identity::from_public_key_bytes(&self.0)
    }

    /// Lowercase hex, no prefix.
    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }

    /// Parse 64 hex characters (an optional `0x` prefix is tolerated).
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        decode_fixed::<32>(hex)
            .map(Self)
            .map_err(CryptoError::InvalidPublicKey)
    }

    fn to_verifying_key(self) -> Result<ed25519_dalek::VerifyingKey, CryptoError> {
        ed25519_dalek::VerifyingKey::from_bytes(&self.0)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
    }
}

impl Serialize for Ed25519PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Ed25519PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519PublicKey({}...)", to_hex(&self.0[..4]))
    }
}

impl std::fmt::Display for Ed25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Ed25519Signature
// ---------------------------------------------------------------------------

impl Ed25519Signature {
    /// Wrap raw 64 bytes.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// The raw 64-byte signature.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Lowercase hex, no prefix.
    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }

    /// Parse 128 hex characters.
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        decode_fixed::<64>(hex)
            .map(Self)
            .map_err(CryptoError::InvalidSignature)
    }
}

impl Serialize for Ed25519Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Ed25519Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519Signature({}...)", to_hex(&self.0[..4]))
    }
}

// ---------------------------------------------------------------------------
// Ed25519KeyPair
// ---------------------------------------------------------------------------

impl Ed25519KeyPair {
    /// Generate a fresh key pair from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut csprng = rand_core::OsRng;
        Self {
            signing_key: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    /// Deterministic key pair from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(seed),
        }
    }

    /// Load a key pair from a 64-character hex seed, as written by
    /// [`Ed25519KeyPair::seed_hex`].
    pub fn from_seed_hex(hex: &str) -> Result<Self, CryptoError> {
        let seed = Zeroizing::new(decode_fixed::<32>(hex).map_err(CryptoError::InvalidSeed)?);
        Ok(Self::from_seed(&seed))
    }

    /// Export the seed as hex for a key file. The buffer is wiped on drop.
    pub fn seed_hex(&self) -> Zeroizing<String> {
        let seed = Zeroizing::new(self.signing_key.to_bytes());
        Zeroizing::new(to_hex(seed.as_ref()))
    }

    /// The public half.
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// The caller identity of this key pair.
    pub fn identity(&self) -> Identity {
        self.public_key().identity()
    }

    /// Sign canonical bytes.
    pub fn sign(&self, data: &CanonicalBytes) -> Ed25519Signature {
        Ed25519Signature(self.signing_key.sign(data.as_bytes()).to_bytes())
    }
}

impl std::fmt::Debug for Ed25519KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519KeyPair(<private>)")
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Verify `signature` over `data` against `public_key`.
///
/// Uses strict verification, which rejects small-order keys and
/// non-canonical signature encodings.
pub fn verify_with_public_key(
    data: &CanonicalBytes,
    signature: &Ed25519Signature,
    public_key: &Ed25519PublicKey,
) -> Result<(), CryptoError> {
    let vk = public_key.to_verifying_key()?;
    let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    vk.verify_strict(data.as_bytes(), &sig)
        .map_err(|e| CryptoError::VerificationFailed(e.to_string()))
}

// ---------------------------------------------------------------------------
// Hex utilities (no external hex crate dependency)
// ---------------------------------------------------------------------------

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn decode_fixed<const N: usize>(hex: &str) -> Result<[u8; N], String> {
    let hex = hex.trim();
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    if hex.len() != N * 2 {
        return Err(format!("expected {} hex chars, got {}", N * 2, hex.len()));
    }
    if !hex.is_ascii() {
        return Err("non-ASCII input".to_string());
    }
    let mut out = [0u8; N];
    for (i, slot) in out.iter_mut().enumerate() {
        let pos = i * 2;
        *slot = u8::from_str_radix(&hex[pos..pos + 2], 16)
            .map_err(|e| format!("invalid hex at position {pos}: {e}"))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(msg: &str) -> CanonicalBytes {
        CanonicalBytes::new(&serde_json::json!({"op": "issue", "msg": msg})).unwrap()
    }

    #[test]
    fn sign_and_verify() {
        let kp = Ed25519KeyPair::generate();
        let data = payload("hello");
        let sig = kp.sign(&data);
        verify_with_public_key(&data, &sig, &kp.public_key()).unwrap();
    }

    #[test]
    fn wrong_key_fails() {
        let kp1 = Ed25519KeyPair::generate();
        let kp2 = Ed25519KeyPair::generate();
        let data = payload("hello");
        let sig = kp1.sign(&data);
        assert!(matches!(
            verify_with_public_key(&data, &sig, &kp2.public_key()),
            Err(CryptoError::VerificationFailed(_))
        ));
    }

    #[test]
    fn tampered_message_fails() {
        let kp = Ed25519KeyPair::generate();
        let sig = kp.sign(&payload("original"));
        assert!(verify_with_public_key(&payload("tampered"), &sig, &kp.public_key()).is_err());
    }

    #[test]
    fn arbitrary_key_bytes_rejected() {
        let data = payload("x");
        let kp = Ed25519KeyPair::generate();
        let sig = kp.sign(&data);
        let mut bad = [0u8; 32];
        bad[0] = 2;
        let result = verify_with_public_key(&data, &sig, &Ed25519PublicKey::from_bytes(bad));
        assert!(result.is_err());
    }

    #[test]
    fn seed_is_deterministic() {
        let kp1 = Ed25519KeyPair::from_seed(&[42u8; 32]);
        let kp2 = Ed25519KeyPair::from_seed(&[42u8; 32]);
        assert_eq!(kp1.public_key(), kp2.public_key());
        assert_eq!(kp1.identity(), kp2.identity());
        let data = payload("det");
        assert_eq!(kp1.sign(&data), kp2.sign(&data));
    }

    #[test]
    fn seed_hex_round_trip() {
        let kp = Ed25519KeyPair::generate();
        let hex = kp.seed_hex();
        assert_eq!(hex.len(), 64);
        let back = Ed25519KeyPair::from_seed_hex(&hex).unwrap();
        assert_eq!(back.public_key(), kp.public_key());
    }

    #[test]
    fn seed_hex_survives_key_file() {
        let kp = Ed25519KeyPair::generate();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("caller.key");
        std::fs::write(&path, format!("{}\n", kp.seed_hex().as_str())).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let back = Ed25519KeyPair::from_seed_hex(&text).unwrap();
        assert_eq!(back.identity(), kp.identity());
    }

    #[test]
    fn bad_seed_rejected() {
        assert!(matches!(
            Ed25519KeyPair::from_seed_hex("abcd"),
            Err(CryptoError::InvalidSeed(_))
        ));
    }

    #[test]
    fn identity_matches_core_derivation() {
        let kp = Ed25519KeyPair::from_seed(&[1u8; 32]);
        let pk = kp.public_key();
        assert_eq!(kp.identity(), Identity::from_public_key_bytes(pk.as_bytes()));
    }

    #[test]
    fn public_key_serde_is_hex_string() {
        let pk = Ed25519KeyPair::generate().public_key();
        let json = serde_json::to_string(&pk).unwrap();
        assert_eq!(json.len(), 64 + 2);
        let back: Ed25519PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(pk, back);
    }

    #[test]
    fn signature_serde_is_hex_string() {
        let sig = Ed25519KeyPair::generate().sign(&payload("s"));
        let json = serde_json::to_string(&sig).unwrap();
        assert_eq!(json.len(), 128 + 2);
        let back: Ed25519Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(sig, back);
    }

    #[test]
    fn malformed_hex_rejected() {
        assert!(Ed25519PublicKey::from_hex("not-hex").is_err());
        assert!(Ed25519PublicKey::from_hex(&"zz".repeat(32)).is_err());
        assert!(Ed25519Signature::from_hex("aabb").is_err());
    }

    #[test]
    fn debug_output_is_redacted() {
        let kp = Ed25519KeyPair::generate();
        assert_eq!(format!("{kp:?}"), "Ed25519KeyPair(<private>)");
        let pk = format!("{:?}", kp.public_key());
        assert!(pk.starts_with("Ed25519PublicKey(") && pk.ends_with("...)"));
    }
}
