//! The damage assessment prompt shared by all providers.
//!
//! The prompt pins the response to a fixed section skeleton so the report
//! parser can extract structured fields from it. Keys, headings, and
//! severity words stay in English even for Persian reports; only the prose
//! changes language.

use crate::types::ReportLanguage;

const SKELETON: &str = "\
As a certified automotive damage assessor, examine the photo and produce a \
detailed report in markdown with exactly these sections:

### 1. Vehicle Identification
Make: <manufacturer>
Model: <model>
Year: <year>
License Plate: <plate, or omit the line if unreadable>

### 2. Damage Assessment
One bullet per damaged area, each formatted exactly as:
- <part> (<damage type>) - <severity>
where <severity> is one of: minor, moderate, severe.

### 3. Repair Recommendations
Recommended repairs, parts to replace, and workshop notes.

### 4. Cost Estimation
Itemized costs, ending with the lines:
Total estimated repair cost: <amount>
Estimated repair timeline: <duration>

### 5. Safety Analysis
Whether the vehicle is currently drivable, ending with the line:
Safe to drive: yes or no

Use professional terminology.";

const PERSIAN_INSTRUCTION: &str = "\
Write all descriptive text in Persian (Farsi). Keep the section headings, \
the field keys (Make, Model, Year, License Plate, Total estimated repair \
cost, Estimated repair timeline, Safe to drive), the damage bullet format, \
and the severity words (minor, moderate, severe) in English exactly as \
specified above.";

/// Build the assessment prompt for the requested report language.
pub fn assessment_prompt(language: ReportLanguage) -> String {
    match language {
        ReportLanguage::English => SKELETON.to_string(),
        ReportLanguage::Persian => format!("{}\n\n{}", SKELETON, PERSIAN_INSTRUCTION),
    }
}
