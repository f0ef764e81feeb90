//! Golden test vectors for the envelope wire formats.
//!
//! Each vector fixes every random input (key or password, salt, nonce) and
//! records the exact base64 blob a conforming sealer produces. A browser
//! client using WebCrypto with the same inputs yields the same text.

use burnlink_envelope::{
    EnvelopeNonce, MasterKey, MasterKeyEnvelope, PasswordEnvelope, Result, Salt,
};

/// The nonce shared by every vector: bytes `01..=0c`.
pub const VECTOR_NONCE: [u8; 12] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];

/// The salt used by password vectors: bytes `10..=1f`.
pub const VECTOR_SALT: [u8; 16] = [
    0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x1b, 0x1c, 0x1d, 0x1e,
    0x1f,
];

/// The master key used by master vectors.
pub const VECTOR_MASTER_KEY: [u8; 32] = [0x42; 32];

/// How the vector's key is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorKey {
    /// [`VECTOR_MASTER_KEY`].
    Master,
    /// PBKDF2 over this password with [`VECTOR_SALT`].
    Password(&'static str),
}

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Key source.
    pub key: VectorKey,
    /// Plaintext bytes.
    pub plaintext: &'static [u8],
    /// Expected packed blob (standard base64).
    pub expected_blob: &'static str,
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "master envelope with hello plaintext",
            key: VectorKey::Master,
            plaintext: b"hello",
            expected_blob: "AQIDBAUGBwgJCgsM3Z9KICIrw9jJFDqRYMWAeOYQc2np",
        },
        GoldenVector {
            name: "master envelope with empty plaintext",
            key: VectorKey::Master,
            plaintext: b"",
            expected_blob: "AQIDBAUGBwgJCgsMnJoE8IEzfD20ALIxgZjLaw==",
        },
        GoldenVector {
            name: "password envelope with secret plaintext",
            key: VectorKey::Password("pw123"),
            plaintext: b"secret",
            expected_blob: "EBESExQVFhcYGRobHB0eHwECAwQFBgcICQoLDJBPiA3myRZ12XOmYJlMZYgib7PaoY8=",
        },
    ]
}

/// The PBKDF2-HMAC-SHA256 key for `"pw123"` under [`VECTOR_SALT`], hex.
pub const VECTOR_PASSWORD_KEY_HEX: &str =
    "da6f5666ca1eb8cfec2b3b85bd6801879f3a474f50bf45271b94940abdfde843";

/// Seal a vector's plaintext with its fixed inputs.
pub fn seal_vector(vector: &GoldenVector) -> Result<String> {
    let nonce = EnvelopeNonce::from_bytes(VECTOR_NONCE);
    match vector.key {
        VectorKey::Master => {
            let key = MasterKey::from_slice(&VECTOR_MASTER_KEY)?;
            Ok(MasterKeyEnvelope::seal_with_nonce(vector.plaintext, &key, nonce)?.encode())
        }
        VectorKey::Password(password) => {
            let salt = Salt::from_bytes(VECTOR_SALT);
            Ok(PasswordEnvelope::seal_with(vector.plaintext, password, salt, nonce)?.encode())
        }
    }
}

/// Open a vector's expected blob with its fixed key.
pub fn open_vector(vector: &GoldenVector) -> Result<Vec<u8>> {
    match vector.key {
        VectorKey::Master => {
            let key = MasterKey::from_slice(&VECTOR_MASTER_KEY)?;
            MasterKeyEnvelope::decode(vector.expected_blob)?.open(&key)
        }
        VectorKey::Password(password) => {
            PasswordEnvelope::decode(vector.expected_blob)?.open(password)
        }
    }
}

/// Verify all golden vectors: `(name, matches, produced blob)`.
///
/// Call this to verify your implementation matches the reference.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| match seal_vector(v) {
            Ok(blob) => (v.name.to_string(), blob == v.expected_blob, blob),
            Err(e) => (v.name.to_string(), false, e.to_string()),
        })
        .collect()
}
