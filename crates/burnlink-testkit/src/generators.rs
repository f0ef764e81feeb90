//! Proptest generators for property-based testing.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use proptest::prelude::*;

use burnlink_core::{CapabilityToken, LookupHash, SecretPayload, TOKEN_BYTES};

/// Generate a well-formed capability token.
pub fn token() -> impl Strategy<Value = CapabilityToken> {
    any::<[u8; TOKEN_BYTES]>().prop_map(|bytes| CapabilityToken::from_random_bytes(&bytes))
}

/// Generate a random LookupHash.
pub fn lookup_hash() -> impl Strategy<Value = LookupHash> {
    any::<[u8; 32]>().prop_map(LookupHash::from_bytes)
}

/// Generate plaintext bytes of specified max length.
pub fn plaintext(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a non-blank password.
pub fn password() -> impl Strategy<Value = String> {
    "[ -~]{0,31}[!-~]"
}

/// Generate strings that are never valid tokens: wrong length, or the
/// right length with a character outside the base64url alphabet.
pub fn malformed_token() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z0-9_-]{0,42}",
        "[A-Za-z0-9_-]{44,64}",
        ("[A-Za-z0-9_-]{42}", "[+/=. !]").prop_map(|(body, bad)| format!("{}{}", body, bad)),
    ]
}

/// Generate a small image with a valid JPEG or PNG signature.
pub fn image() -> impl Strategy<Value = Vec<u8>> {
    let header = prop_oneof![
        Just(vec![0xffu8, 0xd8, 0xff, 0xe0]),
        Just(vec![0x89u8, 0x50, 0x4e, 0x47]),
    ];
    (header, plaintext(64)).prop_map(|(mut header, body)| {
        header.extend(body);
        header
    })
}

/// Generate a text-plus-images payload within the default limits.
pub fn payload() -> impl Strategy<Value = SecretPayload> {
    (".{0,64}", prop::collection::vec(image(), 0..4)).prop_map(|(text, images)| SecretPayload {
        text,
        images: images.iter().map(|i| STANDARD.encode(i)).collect(),
    })
}

/// Encode raw bytes the way a token is encoded, without the length check.
pub fn encode_token_text(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}
