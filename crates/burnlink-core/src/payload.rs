//! The structured secret carried inside an envelope.
//!
//! Browser clients seal a JSON document `{"text": ..., "images": [...]}`
//! where each image is a base64 JPEG or PNG with metadata already
//! stripped. The server only ever sees this document encrypted; these
//! helpers exist for clients built on this crate and for validating what
//! a reader decrypts.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::validation::Limits;

/// Image formats accepted as attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// JPEG, signature `FF D8`.
    Jpeg,
    /// PNG, signature `89 50`.
    Png,
}

impl ImageKind {
    /// Sniff the format from leading bytes.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0xff, 0xd8, ..] => Some(Self::Jpeg),
            [0x89, 0x50, ..] => Some(Self::Png),
            _ => None,
        }
    }

    /// MIME type for the format.
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// Text plus optional image attachments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretPayload {
    /// Message text.
    #[serde(default)]
    pub text: String,
    /// Base64-encoded images.
    #[serde(default)]
    pub images: Vec<String>,
}

impl SecretPayload {
    /// A text-only payload.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            images: Vec::new(),
        }
    }

    /// Attach raw image bytes, encoding them as base64.
    pub fn with_image(mut self, bytes: &[u8]) -> Self {
        self.images.push(STANDARD.encode(bytes));
        self
    }

    /// Check attachment count, size and format.
    pub fn validate(&self, limits: &Limits) -> Result<()> {
        if self.images.len() > limits.max_attachments {
            return Err(CoreError::InvalidPayload(format!(
                "at most {} images allowed, got {}",
                limits.max_attachments,
                self.images.len()
            )));
        }
        for (index, image) in self.images.iter().enumerate() {
            let bytes = STANDARD
                .decode(image)
                .map_err(|_| CoreError::InvalidPayload(format!("image {} is not base64", index)))?;
            if bytes.len() > limits.max_attachment_bytes {
                return Err(CoreError::InvalidPayload(format!(
                    "image {} exceeds {} bytes",
                    index, limits.max_attachment_bytes
                )));
            }
            if ImageKind::detect(&bytes).is_none() {
                return Err(CoreError::InvalidPayload(format!(
                    "image {} is neither JPEG nor PNG",
                    index
                )));
            }
        }
        Ok(())
    }

    /// Decode every attachment into raw bytes and its format.
    ///
    /// Undecodable or unrecognised entries are skipped.
    pub fn decoded_images(&self) -> Vec<(ImageKind, Vec<u8>)> {
        self.images
            .iter()
            .filter_map(|image| STANDARD.decode(image).ok())
            .filter_map(|bytes| ImageKind::detect(&bytes).map(|kind| (kind, bytes)))
            .collect()
    }

    /// Serialize to the JSON document that gets encrypted.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| CoreError::InvalidPayload(e.to_string()))
    }

    /// Parse a decrypted JSON document.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| CoreError::InvalidPayload(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JPEG: &[u8] = &[0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10];
    const PNG: &[u8] = &[0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a];

    #[test]
    fn test_detect() {
        assert_eq!(ImageKind::detect(JPEG), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::detect(PNG), Some(ImageKind::Png));
        assert_eq!(ImageKind::detect(b"GIF89a"), None);
        assert_eq!(ImageKind::detect(&[0xff]), None);
    }

    #[test]
    fn test_matches_browser_document() {
        let payload = SecretPayload::text("hi").with_image(PNG);
        let json = String::from_utf8(payload.to_bytes().unwrap()).unwrap();
        assert_eq!(json, r#"{"text":"hi","images":["iVBORw0K"]}"#);

        let parsed = SecretPayload::from_bytes(json.as_bytes()).unwrap();
        assert_eq!(parsed, payload);
    }

    #[test]
    fn test_missing_fields_default() {
        let parsed = SecretPayload::from_bytes(br#"{"text":"only text"}"#).unwrap();
        assert!(parsed.images.is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_images() {
        let limits = Limits::default();
        let ok = SecretPayload::text("t").with_image(JPEG).with_image(PNG);
        assert!(ok.validate(&limits).is_ok());

        let gif = SecretPayload::text("t").with_image(b"GIF89a");
        assert!(gif.validate(&limits).is_err());

        let garbage = SecretPayload {
            text: String::new(),
            images: vec!["not base64!".into()],
        };
        assert!(garbage.validate(&limits).is_err());
    }

    #[test]
    fn test_validate_count_and_size() {
        let limits = Limits {
            max_attachments: 2,
            max_attachment_bytes: 8,
            ..Limits::default()
        };
        let too_many = SecretPayload::text("t")
            .with_image(JPEG)
            .with_image(JPEG)
            .with_image(JPEG);
        assert!(too_many.validate(&limits).is_err());

        let mut big = JPEG.to_vec();
        big.extend_from_slice(&[0u8; 16]);
        let too_big = SecretPayload::text("t").with_image(&big);
        assert!(too_big.validate(&limits).is_err());
    }

    #[test]
    fn test_decoded_images_skips_unknown() {
        let payload = SecretPayload::text("t").with_image(JPEG).with_image(b"nope");
        let images = payload.decoded_images();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].0, ImageKind::Jpeg);
        assert_eq!(images[0].1, JPEG);
    }
}
