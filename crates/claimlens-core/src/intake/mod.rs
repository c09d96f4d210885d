//! Image intake: validation, decoding, capture metadata, and fetching.
//!
//! Everything that happens to an uploaded photo before it reaches a vision
//! provider lives here. The validator is the single entry point for byte
//! checks; discovery and the remote fetcher feed it from the CLI and the
//! `image_url` form field respectively.

mod discovery;
mod metadata;
mod remote;
pub(crate) mod validate;

pub use discovery::{discover, is_supported};
pub use metadata::CaptureExtractor;
pub use remote::ImageFetcher;
pub use validate::{CheckedImage, ImageValidator};

/// Number of hash characters used for report identifiers.
const REPORT_ID_LEN: usize = 12;

/// Derive a stable report identifier from image content.
///
/// The same photo always maps to the same identifier, making duplicate
/// submissions recognizable in logs and stored output.
pub fn report_id(bytes: &[u8]) -> String {
    let hash = blake3::hash(bytes);
    hash.to_hex()[..REPORT_ID_LEN].to_string()
}
