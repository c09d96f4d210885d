//! Structured report extraction from provider markdown.
//!
//! Providers answer with a markdown report following the five-section
//! skeleton the prompt pins down. This module pulls the structured fields
//! back out of that text. Extraction is best-effort and total: a response
//! that matches nothing yields empty fields, never an error, and the raw
//! text always survives in `DamageReport::content`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{DamageItem, ReportLanguage, SafetyStatus, Severity, VehicleInfo};

static VEHICLE_SECTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)###\s*1\.\s*Vehicle\s*Identification\s*\n(.*?)(?:\n###|\z)").unwrap()
});

static DAMAGE_SECTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)###\s*2\.\s*Damage\s*Assessment\s*\n(.*?)(?:\n###|\z)").unwrap()
});

// One bullet per damaged part: "- <part> (<damage type>) - <severity>".
// Severity words are matched in both languages in case the model answers
// a Persian request fully in Persian despite the prompt.
static DAMAGE_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)-\s*(.+?)\s*\((.+?)\)\s*-\s*(minor|moderate|severe|جزئی|متوسط|شدید)")
        .unwrap()
});

// Key-line patterns capture the rest of the line only. The whitespace
// class deliberately excludes newlines so an empty value stays empty
// instead of swallowing the next line.
static MAKE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:make|manufacturer):[ \t]*([^\n]*)").unwrap());

static MODEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)model:[ \t]*([^\n]*)").unwrap());

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)year:[ \t]*([^\n]*)").unwrap());

static PLATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:license plate|plate):[ \t]*([^\n]*)").unwrap());

static TOTAL_COST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:total estimated repair cost|total cost):[ \t]*([^\n]*)").unwrap()
});

static REPAIR_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:estimated repair timeline|repair time):[ \t]*([^\n]*)").unwrap()
});

static SAFE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:safe to drive|safe):\s*yes").unwrap());

/// The structured fields recovered from one response.
#[derive(Debug, Clone)]
pub struct ParsedAnalysis {
    pub vehicle: VehicleInfo,
    pub damages: Vec<DamageItem>,
    pub total_cost: Option<String>,
    pub repair_time: Option<String>,
    pub safety: SafetyStatus,
}

/// Extract structured fields from a provider's markdown response.
///
/// Absent the "safe to drive" line the vehicle is reported unsafe; a
/// damage report that does not positively clear the vehicle should not
/// read as safe.
pub fn parse(content: &str, language: ReportLanguage) -> ParsedAnalysis {
    let vehicle = VEHICLE_SECTION
        .captures(content)
        .map(|section| parse_vehicle(&section[1]))
        .unwrap_or_default();

    let damages = DAMAGE_SECTION
        .captures(content)
        .map(|section| parse_damages(&section[1], language))
        .unwrap_or_default();

    let safety = if SAFE.is_match(content) {
        SafetyStatus::Safe
    } else {
        SafetyStatus::Unsafe
    };

    ParsedAnalysis {
        vehicle,
        damages,
        total_cost: extract_value(&TOTAL_COST, content),
        repair_time: extract_value(&REPAIR_TIME, content),
        safety,
    }
}

fn parse_vehicle(section: &str) -> VehicleInfo {
    VehicleInfo {
        make: extract_value(&MAKE, section),
        model: extract_value(&MODEL, section),
        year: extract_value(&YEAR, section),
        plate: extract_value(&PLATE, section),
    }
}

fn parse_damages(section: &str, language: ReportLanguage) -> Vec<DamageItem> {
    let mut damages = Vec::new();
    for captures in DAMAGE_ITEM.captures_iter(section) {
        let Some(severity) = Severity::parse(&captures[3]) else {
            continue;
        };
        damages.push(DamageItem {
            part: captures[1].trim().to_string(),
            damage_type: captures[2].trim().to_string(),
            severity: severity.label(language).to_string(),
            action: severity.action().label(language).to_string(),
            cost: severity.cost_band(language).to_string(),
        });
    }
    damages
}

/// Apply a key-line regex and clean the captured value.
///
/// Strips whitespace and markdown bold markers; a placeholder or empty
/// value counts as absent.
fn extract_value(pattern: &Regex, text: &str) -> Option<String> {
    let raw = pattern.captures(text)?.get(1)?.as_str();
    let cleaned = raw.trim().trim_matches('*').trim();
    if cleaned.is_empty() || cleaned == "---" {
        None
    } else {
        Some(cleaned.to_string())
    }
}
