//! Core data types for vehicle damage analysis.
//!
//! These types describe a single analysis request and the normalized
//! report assembled from a provider's free-form markdown response.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AnalysisError;

/// The vision engine backing an analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    OpenAi,
    Gemini,
}

impl Engine {
    /// Display label used in rendered reports.
    pub fn label(&self) -> &'static str {
        match self {
            Engine::OpenAi => "OpenAI",
            Engine::Gemini => "Google Gemini",
        }
    }
}

impl FromStr for Engine {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Engine::OpenAi),
            "gemini" => Ok(Engine::Gemini),
            other => Err(AnalysisError::UnknownEngine(other.to_string())),
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::OpenAi => write!(f, "openai"),
            Engine::Gemini => write!(f, "gemini"),
        }
    }
}

/// Language the report fields are rendered in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportLanguage {
    #[default]
    English,
    Persian,
}

impl FromStr for ReportLanguage {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "english" | "en" => Ok(ReportLanguage::English),
            "persian" | "farsi" | "fa" => Ok(ReportLanguage::Persian),
            other => Err(AnalysisError::UnknownLanguage(other.to_string())),
        }
    }
}

impl fmt::Display for ReportLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportLanguage::English => write!(f, "english"),
            ReportLanguage::Persian => write!(f, "persian"),
        }
    }
}

/// Damage severity as stated by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Minor,
    Moderate,
    Severe,
}

impl Severity {
    /// Parse a severity word from a damage bullet.
    ///
    /// Accepts English and Persian spellings, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "minor" | "جزئی" => Some(Severity::Minor),
            "moderate" | "متوسط" => Some(Severity::Moderate),
            "severe" | "شدید" => Some(Severity::Severe),
            _ => None,
        }
    }

    /// Localized severity label.
    pub fn label(&self, language: ReportLanguage) -> &'static str {
        match (self, language) {
            (Severity::Minor, ReportLanguage::English) => "minor",
            (Severity::Moderate, ReportLanguage::English) => "moderate",
            (Severity::Severe, ReportLanguage::English) => "severe",
            (Severity::Minor, ReportLanguage::Persian) => "جزئی",
            (Severity::Moderate, ReportLanguage::Persian) => "متوسط",
            (Severity::Severe, ReportLanguage::Persian) => "شدید",
        }
    }

    /// Recommended action: severe damage calls for replacement, the rest for repair.
    pub fn action(&self) -> RecommendedAction {
        match self {
            Severity::Severe => RecommendedAction::Replace,
            _ => RecommendedAction::Repair,
        }
    }

    /// Localized per-part cost band.
    pub fn cost_band(&self, language: ReportLanguage) -> &'static str {
        match (self, language) {
            (Severity::Minor, ReportLanguage::English) => "$200-$600",
            (Severity::Moderate, ReportLanguage::English) => "$600-$2,000",
            (Severity::Severe, ReportLanguage::English) => "$2,000-$6,000",
            (Severity::Minor, ReportLanguage::Persian) => "1-2 میلیون تومان",
            (Severity::Moderate, ReportLanguage::Persian) => "3-5 میلیون تومان",
            (Severity::Severe, ReportLanguage::Persian) => "6-10 میلیون تومان",
        }
    }
}

/// What the shop should do with a damaged part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendedAction {
    Repair,
    Replace,
}

impl RecommendedAction {
    /// Localized action label.
    pub fn label(&self, language: ReportLanguage) -> &'static str {
        match (self, language) {
            (RecommendedAction::Repair, ReportLanguage::English) => "repair",
            (RecommendedAction::Replace, ReportLanguage::English) => "replace",
            (RecommendedAction::Repair, ReportLanguage::Persian) => "تعمیر",
            (RecommendedAction::Replace, ReportLanguage::Persian) => "تعویض",
        }
    }
}

/// Drivability verdict derived from the "safe to drive" line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyStatus {
    Safe,
    Unsafe,
}

impl SafetyStatus {
    /// Localized safety label.
    pub fn label(&self, language: ReportLanguage) -> &'static str {
        match (self, language) {
            (SafetyStatus::Safe, ReportLanguage::English) => "safe",
            (SafetyStatus::Unsafe, ReportLanguage::English) => "unsafe",
            (SafetyStatus::Safe, ReportLanguage::Persian) => "ایمن",
            (SafetyStatus::Unsafe, ReportLanguage::Persian) => "غیر ایمن",
        }
    }
}

/// One damaged part in the report.
///
/// `part` and `damage_type` are verbatim from the model; `severity`,
/// `action`, and `cost` are rendered in the report language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageItem {
    /// The damaged part (e.g., "Front bumper")
    pub part: String,

    /// Kind of damage (e.g., "dent", "scratch")
    #[serde(rename = "type")]
    pub damage_type: String,

    /// Localized severity label
    pub severity: String,

    /// Localized recommended action
    pub action: String,

    /// Localized cost band
    pub cost: String,
}

/// Vehicle identification extracted from the response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub plate: Option<String>,
}

impl VehicleInfo {
    /// True when no identification field was found.
    pub fn is_empty(&self) -> bool {
        self.make.is_none() && self.model.is_none() && self.year.is_none() && self.plate.is_none()
    }
}

/// EXIF capture info carried along as claim evidence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureInfo {
    /// When the photo was taken
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<String>,

    /// Camera manufacturer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_make: Option<String>,

    /// Camera model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_model: Option<String>,

    /// GPS latitude (decimal degrees)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps_latitude: Option<f64>,

    /// GPS longitude (decimal degrees)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps_longitude: Option<f64>,
}

/// The normalized damage report returned to the caller.
///
/// `content` always carries the provider's raw markdown, so nothing is
/// lost when the structured parse finds little or nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamageReport {
    /// Hex prefix of the BLAKE3 hash of the image bytes
    pub report_id: String,

    /// Report creation time ("YYYY-MM-DD HH:MM", local)
    pub timestamp: String,

    /// Engine display label ("OpenAI" / "Google Gemini")
    pub engine: String,

    /// Model identifier reported by the provider
    pub model: String,

    /// Language the report fields are rendered in
    pub language: ReportLanguage,

    /// Vehicle identification
    pub vehicle: VehicleInfo,

    /// Damaged parts with localized severity, action, and cost
    pub damages: Vec<DamageItem>,

    /// Total repair cost estimate, verbatim from the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<String>,

    /// Repair timeline estimate, verbatim from the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repair_time: Option<String>,

    /// Localized drivability label
    pub safety_status: String,

    /// Raw markdown response from the provider
    pub content: String,

    /// EXIF capture info from the uploaded photo, if present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture: Option<CaptureInfo>,

    /// Provider round-trip latency in milliseconds
    pub latency_ms: u64,

    /// Tokens used by the provider call, if reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_parse_known_values() {
        assert_eq!("openai".parse::<Engine>().unwrap(), Engine::OpenAi);
        assert_eq!("gemini".parse::<Engine>().unwrap(), Engine::Gemini);
        assert_eq!("OpenAI".parse::<Engine>().unwrap(), Engine::OpenAi);
        assert_eq!(" Gemini ".parse::<Engine>().unwrap(), Engine::Gemini);
    }

    #[test]
    fn test_engine_parse_rejects_unknown() {
        let err = "claude".parse::<Engine>().unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownEngine(_)));
        assert!(err.to_string().contains("claude"));
    }

    #[test]
    fn test_engine_labels() {
        assert_eq!(Engine::OpenAi.label(), "OpenAI");
        assert_eq!(Engine::Gemini.label(), "Google Gemini");
    }

    #[test]
    fn test_language_parse() {
        assert_eq!(
            "english".parse::<ReportLanguage>().unwrap(),
            ReportLanguage::English
        );
        assert_eq!(
            "Persian".parse::<ReportLanguage>().unwrap(),
            ReportLanguage::Persian
        );
        assert_eq!(
            "fa".parse::<ReportLanguage>().unwrap(),
            ReportLanguage::Persian
        );
        assert!("klingon".parse::<ReportLanguage>().is_err());
    }

    #[test]
    fn test_severity_parse_english_and_persian() {
        assert_eq!(Severity::parse("minor"), Some(Severity::Minor));
        assert_eq!(Severity::parse("Moderate"), Some(Severity::Moderate));
        assert_eq!(Severity::parse("SEVERE"), Some(Severity::Severe));
        assert_eq!(Severity::parse("جزئی"), Some(Severity::Minor));
        assert_eq!(Severity::parse("متوسط"), Some(Severity::Moderate));
        assert_eq!(Severity::parse("شدید"), Some(Severity::Severe));
        assert_eq!(Severity::parse("catastrophic"), None);
    }

    #[test]
    fn test_severity_action_rule() {
        assert_eq!(Severity::Minor.action(), RecommendedAction::Repair);
        assert_eq!(Severity::Moderate.action(), RecommendedAction::Repair);
        assert_eq!(Severity::Severe.action(), RecommendedAction::Replace);
    }

    #[test]
    fn test_persian_localization_tables() {
        let fa = ReportLanguage::Persian;
        assert_eq!(Severity::Minor.label(fa), "جزئی");
        assert_eq!(Severity::Minor.cost_band(fa), "1-2 میلیون تومان");
        assert_eq!(Severity::Severe.cost_band(fa), "6-10 میلیون تومان");
        assert_eq!(RecommendedAction::Replace.label(fa), "تعویض");
        assert_eq!(RecommendedAction::Repair.label(fa), "تعمیر");
        assert_eq!(SafetyStatus::Safe.label(fa), "ایمن");
        assert_eq!(SafetyStatus::Unsafe.label(fa), "غیر ایمن");
    }

    #[test]
    fn test_damage_item_serializes_type_key() {
        let item = DamageItem {
            part: "Front bumper".to_string(),
            damage_type: "dent".to_string(),
            severity: "minor".to_string(),
            action: "repair".to_string(),
            cost: "$200-$600".to_string(),
        };
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"type\":\"dent\""));
        assert!(!json.contains("damage_type"));

        let parsed: DamageItem = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.damage_type, "dent");
    }

    #[test]
    fn test_vehicle_info_skips_missing_fields() {
        let vehicle = VehicleInfo {
            make: Some("Toyota".to_string()),
            ..Default::default()
        };
        assert!(!vehicle.is_empty());
        let json = serde_json::to_string(&vehicle).unwrap();
        assert!(json.contains("Toyota"));
        assert!(!json.contains("plate"));

        assert!(VehicleInfo::default().is_empty());
    }

    #[test]
    fn test_report_language_serde_lowercase() {
        let json = serde_json::to_string(&ReportLanguage::Persian).unwrap();
        assert_eq!(json, "\"persian\"");
        let parsed: ReportLanguage = serde_json::from_str("\"english\"").unwrap();
        assert_eq!(parsed, ReportLanguage::English);
    }
}
