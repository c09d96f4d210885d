//! EXIF capture metadata extraction from uploaded images.

use exif::{In, Reader, Tag, Value};
use std::io::Cursor;

use crate::types::CaptureInfo;

/// Extracts capture time, camera model, and GPS position from image bytes.
pub struct CaptureExtractor;

impl CaptureExtractor {
    /// Extract capture info from in-memory image bytes.
    ///
    /// Returns `None` if the image has no EXIF data or if extraction fails.
    /// Fields that cannot be read are left `None` rather than failing the
    /// whole extraction.
    pub fn extract(bytes: &[u8]) -> Option<CaptureInfo> {
        let mut cursor = Cursor::new(bytes);
        let exif = Reader::new().read_from_container(&mut cursor).ok()?;

        let info = CaptureInfo {
            captured_at: Self::get_datetime(&exif),
            camera_make: Self::get_string(&exif, Tag::Make),
            camera_model: Self::get_string(&exif, Tag::Model),
            gps_latitude: Self::get_gps_coord(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef),
            gps_longitude: Self::get_gps_coord(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef),
        };

        // Only return if we have at least some data
        if info.captured_at.is_some()
            || info.camera_make.is_some()
            || info.camera_model.is_some()
            || info.gps_latitude.is_some()
            || info.gps_longitude.is_some()
        {
            Some(info)
        } else {
            None
        }
    }

    /// Get a string field from EXIF data.
    fn get_string(exif: &exif::Exif, tag: Tag) -> Option<String> {
        exif.get_field(tag, In::PRIMARY).map(|f| {
            let s = f.display_value().to_string();
            // Clean up the string (remove quotes if present)
            s.trim_matches('"').to_string()
        })
    }

    /// Get the capture datetime, preferring DateTimeOriginal over DateTime.
    fn get_datetime(exif: &exif::Exif) -> Option<String> {
        exif.get_field(Tag::DateTimeOriginal, In::PRIMARY)
            .or_else(|| exif.get_field(Tag::DateTime, In::PRIMARY))
            .map(|f| {
                let s = f.display_value().to_string();
                s.trim_matches('"').to_string()
            })
    }

    /// Get GPS coordinate, converting from degrees/minutes/seconds to decimal.
    fn get_gps_coord(exif: &exif::Exif, coord_tag: Tag, ref_tag: Tag) -> Option<f64> {
        let coord = exif.get_field(coord_tag, In::PRIMARY)?;
        let reference = exif.get_field(ref_tag, In::PRIMARY)?;

        let degrees = Self::parse_gps_rationals(&coord.value)?;
        let ref_str = reference.display_value().to_string();

        // Apply sign based on reference (N/S for lat, E/W for lon)
        let sign = if ref_str.contains('S') || ref_str.contains('W') {
            -1.0
        } else {
            1.0
        };

        Some(sign * degrees)
    }

    /// Parse GPS rationals (degrees, minutes, seconds) to decimal degrees.
    fn parse_gps_rationals(value: &Value) -> Option<f64> {
        match value {
            Value::Rational(rationals) if rationals.len() >= 3 => {
                let degrees = rationals[0].to_f64();
                let minutes = rationals[1].to_f64();
                let seconds = rationals[2].to_f64();
                Some(degrees + minutes / 60.0 + seconds / 3600.0)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::validate::png_fixture;

    #[test]
    fn test_extract_absent_from_plain_png() {
        // A freshly encoded PNG carries no EXIF container
        assert!(CaptureExtractor::extract(&png_fixture(4, 4)).is_none());
    }

    #[test]
    fn test_extract_tolerates_garbage_bytes() {
        assert!(CaptureExtractor::extract(b"definitely not an image").is_none());
        assert!(CaptureExtractor::extract(&[]).is_none());
    }

    #[test]
    fn test_parse_gps_rationals_requires_three_values() {
        let two = Value::Rational(vec![exif::Rational { num: 35, denom: 1 }; 2]);
        assert!(CaptureExtractor::parse_gps_rationals(&two).is_none());

        let dms = Value::Rational(vec![
            exif::Rational { num: 35, denom: 1 },
            exif::Rational { num: 30, denom: 1 },
            exif::Rational { num: 0, denom: 1 },
        ]);
        let decimal = CaptureExtractor::parse_gps_rationals(&dms).unwrap();
        assert!((decimal - 35.5).abs() < 1e-9);
    }
}
