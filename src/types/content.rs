//! Dynamic content pushed to the print buffer.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;

/// Content type string for text with an optional image.
pub const TEXT_AND_IMAGE: &str = "text+image";

/// Text and optional image sent with `SetDynamicData`.
///
/// Serializes as `{"message": ..., "image": <base64>, "image_format": <ext>}`;
/// the image fields are left out when no image is attached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DynamicContent {
    /// Text to print.
    pub message: String,
    /// Image bytes encoded as standard Base64.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Image format tag (file extension without the dot).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_format: Option<String>,
}

impl DynamicContent {
    /// Creates text-only content.
    #[must_use]
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            image: None,
            image_format: None,
        }
    }

    /// Attaches an image. The bytes are treated as opaque and Base64 encoded.
    ///
    /// `format` is a file extension such as `png` or `.jpg`; leading and
    /// trailing dots are stripped.
    #[must_use]
    pub fn with_image(mut self, bytes: &[u8], format: &str) -> Self {
        self.image = Some(STANDARD.encode(bytes));
        self.image_format = Some(format.trim_matches('.').to_owned());
        self
    }

    /// Returns true if an image is attached.
    #[must_use]
    pub const fn has_image(&self) -> bool {
        self.image.is_some()
    }
}
