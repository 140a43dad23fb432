//! Scannable receipt codes.
//!
//! Receipts carry a QR code pointing at their public URL. The encoder sits behind a trait
//! so the API can be tested with a stub, and so an encoder failure never blocks a receipt.

use crate::errors::{Error, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use qrcode::{QrCode, render::svg};

/// Turns text into an embeddable image.
pub trait QrEncoder: Send + Sync {
    /// Encodes `content` and returns a `data:` URI for the image.
    fn encode(&self, content: &str) -> Result<String>;
}

/// Renders QR codes as SVG data URIs.
#[derive(Debug, Clone, Copy)]
pub struct SvgQrEncoder {
    /// Minimum width and height of the rendered image in pixels
    pub min_size: u32,
}

impl Default for SvgQrEncoder {
    fn default() -> Self {
        Self { min_size: 200 }
    }
}

impl QrEncoder for SvgQrEncoder {
    fn encode(&self, content: &str) -> Result<String> {
        let code = QrCode::new(content.as_bytes()).map_err(|e| Error::QrCode {
            message: e.to_string(),
        })?;

        let image = code
            .render::<svg::Color<'_>>()
            .min_dimensions(self.min_size, self.min_size)
            .build();

        Ok(format!(
            "data:image/svg+xml;base64,{}",
            STANDARD.encode(image.as_bytes())
        ))
    }
}

/// Encodes `content`, logging and swallowing failures.
pub fn encode_or_log(encoder: &dyn QrEncoder, content: &str) -> Option<String> {
    match encoder.encode(content) {
        Ok(uri) => Some(uri),
        Err(e) => {
            tracing::warn!("Receipt code generation failed, continuing without it: {e}");
            None
        }
    }
}
