//! Upload validation before analysis.

use std::time::Duration;

use image::GenericImageView;

use crate::config::LimitsConfig;
use crate::error::{AnalysisError, AnalysisResult};

/// An upload that passed validation and decoded successfully.
#[derive(Debug, Clone)]
pub struct CheckedImage {
    /// The raw bytes as received
    pub bytes: Vec<u8>,

    /// Sniffed format name ("jpeg", "png", "gif", "webp")
    pub format: &'static str,

    /// Decoded width in pixels
    pub width: u32,

    /// Decoded height in pixels
    pub height: u32,
}

impl CheckedImage {
    /// MIME type for the sniffed format.
    pub fn mime_type(&self) -> String {
        format!("image/{}", self.format)
    }
}

/// Validates uploaded image bytes.
#[derive(Debug, Clone)]
pub struct ImageValidator {
    limits: LimitsConfig,
}

impl ImageValidator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Validate and decode an upload.
    ///
    /// Checks:
    /// - Bytes are non-empty and within the size limit
    /// - Magic bytes match an accepted image format
    /// - The image decodes and its dimensions are within limits
    ///
    /// Decoding runs on a blocking thread with a deadline so a malformed
    /// upload cannot stall the request path.
    pub async fn check(&self, bytes: Vec<u8>) -> AnalysisResult<CheckedImage> {
        if bytes.is_empty() {
            return Err(AnalysisError::EmptyImage);
        }

        let max_bytes = self.limits.max_upload_mb * 1024 * 1024;
        if bytes.len() as u64 > max_bytes {
            return Err(AnalysisError::FileTooLarge {
                size_mb: bytes.len() as u64 / (1024 * 1024),
                max_mb: self.limits.max_upload_mb,
            });
        }

        let format = Self::sniff_format(&bytes)?;

        let timeout = Duration::from_millis(self.limits.decode_timeout_ms);
        let decode_task = tokio::task::spawn_blocking(move || {
            let img = image::load_from_memory(&bytes)
                .map_err(|e| AnalysisError::Decode(e.to_string()))?;
            let (width, height) = img.dimensions();
            Ok::<_, AnalysisError>((bytes, width, height))
        });

        let (bytes, width, height) = match tokio::time::timeout(timeout, decode_task).await {
            Ok(Ok(result)) => result?,
            Ok(Err(join_err)) => {
                return Err(AnalysisError::Decode(format!(
                    "Decode task failed: {}",
                    join_err
                )))
            }
            Err(_) => {
                return Err(AnalysisError::Decode(format!(
                    "Decode timed out after {}ms",
                    self.limits.decode_timeout_ms
                )))
            }
        };

        if width > self.limits.max_image_dimension || height > self.limits.max_image_dimension {
            return Err(AnalysisError::ImageTooLarge {
                width,
                height,
                max_dim: self.limits.max_image_dimension,
            });
        }

        Ok(CheckedImage {
            bytes,
            format,
            width,
            height,
        })
    }

    /// Identify the image format from its magic bytes.
    ///
    /// Only the formats the analysis pipeline accepts are returned;
    /// recognizable but unaccepted formats are rejected by name so the
    /// caller sees what was actually uploaded.
    fn sniff_format(bytes: &[u8]) -> AnalysisResult<&'static str> {
        if bytes.len() < 4 {
            return Err(AnalysisError::UnsupportedFormat(
                "file too small to identify".to_string(),
            ));
        }

        // JPEG: FF D8 FF
        if bytes[0] == 0xFF && bytes[1] == 0xD8 && bytes[2] == 0xFF {
            return Ok("jpeg");
        }

        // PNG: 89 50 4E 47
        if bytes[0] == 0x89 && bytes[1] == b'P' && bytes[2] == b'N' && bytes[3] == b'G' {
            return Ok("png");
        }

        // GIF: GIF8
        if bytes[0] == b'G' && bytes[1] == b'I' && bytes[2] == b'F' && bytes[3] == b'8' {
            return Ok("gif");
        }

        // WebP: RIFF....WEBP
        if bytes[0] == b'R' && bytes[1] == b'I' && bytes[2] == b'F' && bytes[3] == b'F' {
            if bytes.len() >= 12
                && bytes[8] == b'W'
                && bytes[9] == b'E'
                && bytes[10] == b'B'
                && bytes[11] == b'P'
            {
                return Ok("webp");
            }
            return Err(AnalysisError::UnsupportedFormat("riff container".to_string()));
        }

        // Recognize common formats the pipeline does not accept, so the
        // error names them instead of calling them unrecognized.
        if bytes[0] == b'B' && bytes[1] == b'M' {
            return Err(AnalysisError::UnsupportedFormat("bmp".to_string()));
        }
        let is_tiff_le =
            bytes[0] == b'I' && bytes[1] == b'I' && bytes[2] == 0x2A && bytes[3] == 0x00;
        let is_tiff_be =
            bytes[0] == b'M' && bytes[1] == b'M' && bytes[2] == 0x00 && bytes[3] == 0x2A;
        if is_tiff_le || is_tiff_be {
            return Err(AnalysisError::UnsupportedFormat("tiff".to_string()));
        }

        Err(AnalysisError::UnsupportedFormat(
            "unrecognized header".to_string(),
        ))
    }
}

/// Encode a small in-memory test image. Shared by unit tests across modules.
#[cfg(test)]
pub(crate) fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::new_rgb8(width, height);
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}
