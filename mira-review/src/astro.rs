//! Normalization of the structured astrology payloads
//!
//! Chart payloads arrive in two shapes:
//! - an array of twelve `{"value": {"sign_name": .., "planet": [{"value": ..}]}}` entries
//! - an object `{"houses": {"house_1": {"sign": .., "planets": [..]}, ..}}`
//!
//! Anything else, and any house entry that does not fit, yields empty houses.

use mira_common::db::Session;
use serde::Serialize;
use serde_json::{Map, Value};

pub const HOUSE_COUNT: usize = 12;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct House {
    pub sign: Option<String>,
    pub planets: Vec<String>,
}

impl House {
    pub fn is_empty(&self) -> bool {
        self.sign.is_none() && self.planets.is_empty()
    }
}

/// Twelve houses; index 0 is the first house (ascendant)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HouseChart {
    pub houses: [House; HOUSE_COUNT],
}

impl HouseChart {
    /// House by 1-based number
    pub fn house(&self, number: usize) -> Option<&House> {
        number.checked_sub(1).and_then(|i| self.houses.get(i))
    }
}

/// Parse either supported chart shape
pub fn parse_chart(value: &Value) -> HouseChart {
    let mut chart = HouseChart::default();
    match value {
        Value::Array(entries) => {
            for (slot, entry) in chart.houses.iter_mut().zip(entries) {
                *slot = house_from_array_entry(entry);
            }
        }
        Value::Object(map) => {
            if let Some(Value::Object(houses)) = map.get("houses") {
                for (number, slot) in chart.houses.iter_mut().enumerate() {
                    if let Some(entry) = house_entry(houses, number + 1) {
                        *slot = house_from_object_entry(entry);
                    }
                }
            }
        }
        _ => {}
    }
    chart
}

/// Chart payload of a session: the structured column, else raw text that parses as JSON
pub fn session_chart(session: &Session) -> Option<HouseChart> {
    let value = match &session.kundli_json {
        Some(value) => value.clone(),
        None => {
            let text = session.kundli.trim();
            if !(text.starts_with('[') || text.starts_with('{')) {
                return None;
            }
            serde_json::from_str(text).ok()?
        }
    };
    Some(parse_chart(&value))
}

fn house_entry(houses: &Map<String, Value>, number: usize) -> Option<&Value> {
    houses
        .get(&format!("house_{}", number))
        .or_else(|| houses.get(&number.to_string()))
}

fn house_from_array_entry(entry: &Value) -> House {
    let value = entry.get("value").unwrap_or(entry);
    let sign = non_empty_str(value.get("sign_name").or_else(|| value.get("sign")));
    let planets = value
        .get("planet")
        .or_else(|| value.get("planets"))
        .map(planet_names)
        .unwrap_or_default();
    House { sign, planets }
}

fn house_from_object_entry(entry: &Value) -> House {
    let sign = non_empty_str(entry.get("sign").or_else(|| entry.get("sign_name")));
    let planets = entry
        .get("planets")
        .or_else(|| entry.get("planet"))
        .map(planet_names)
        .unwrap_or_default();
    House { sign, planets }
}

fn planet_names(value: &Value) -> Vec<String> {
    let Value::Array(items) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(name) => Some(name.as_str()),
            Value::Object(_) => item.get("value").and_then(Value::as_str),
            _ => None,
        })
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Two-letter chart label for a planet
pub fn planet_abbreviation(name: &str) -> String {
    let upper = name.trim().to_uppercase();
    let abbr = match upper.as_str() {
        "SUN" => "SU",
        "MOON" => "MO",
        "MARS" => "MA",
        "MERCURY" => "ME",
        "JUPITER" => "JU",
        "VENUS" => "VE",
        "SATURN" => "SA",
        "RAHU" => "RA",
        "KETU" => "KE",
        other => return other.chars().take(2).collect(),
    };
    abbr.to_string()
}

/// Three-letter chart label for a sign
pub fn sign_abbreviation(name: &str) -> String {
    name.trim().chars().take(3).collect::<String>().to_uppercase()
}

/// Timing periods, each decoded JSON when the flat field holds JSON, else text
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodInfo {
    pub major: Option<Value>,
    pub minor: Option<Value>,
    pub sub_minor: Option<Value>,
    pub payload: Option<Value>,
}

pub fn parse_periods(session: &Session) -> PeriodInfo {
    PeriodInfo {
        major: flat_field(&session.major_dasha),
        minor: flat_field(&session.minor_dasha),
        sub_minor: flat_field(&session.sub_minor_dasha),
        payload: session.dasha_json.clone(),
    }
}

fn flat_field(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(value) = serde_json::from_str(trimmed) {
            return Some(value);
        }
    }
    Some(Value::String(trimmed.to_string()))
}

/// Afflictions reported for every session, in display order
pub const DOSHA_KINDS: [&str; 8] = [
    "manglik_dosha",
    "pitra_dosha",
    "kaal_sarp_dosha",
    "shani_dosha",
    "rahu_dosha",
    "ketu_dosha",
    "guru_chandal_dosha",
    "angarak_dosha",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
}

impl Severity {
    /// Severity implied by free text; presence without a grade counts as medium
    pub fn from_text(text: &str) -> Self {
        let lower = text.to_lowercase();
        let any = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        if any(&["severe", "high", "strong", "major", "intense", "extreme"]) {
            Severity::High
        } else if any(&["moderate", "medium", "partial", "mild", "yes", "present", "found", "detected"]) {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// Whether free text reports an affliction as present
pub fn dosha_present_in_text(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    if lower.is_empty() || lower == "n/a" {
        return false;
    }

    const ABSENT: [&str; 7] = ["no", "absent", "false", "not found", "clear", "not present", "nil"];
    let absent = ABSENT.iter().any(|word| {
        lower == *word || lower.starts_with(&format!("{} ", word)) || lower.ends_with(&format!(" {}", word))
    });
    if absent {
        return false;
    }

    const PRESENT: [&str; 12] = [
        "yes", "present", "true", "found", "detected", "partial", "mild", "moderate", "severe", "high", "low",
        "medium",
    ];
    if PRESENT.iter().any(|word| lower.contains(word)) {
        return true;
    }

    // Anything more than a short negative reads as a description of the affliction
    lower.chars().count() > 3 && lower != "none"
}

/// One affliction as shown in the detail view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoshaDetail {
    pub kind: &'static str,
    pub present: bool,
    pub severity: Severity,
    pub description: String,
    pub remedies: Vec<String>,
    pub planets: Vec<String>,
    pub houses: Vec<String>,
}

impl DoshaDetail {
    fn absent(kind: &'static str) -> Self {
        Self::flagged(kind, false)
    }

    fn flagged(kind: &'static str, present: bool) -> Self {
        Self {
            kind,
            present,
            severity: if present { Severity::Medium } else { Severity::Low },
            description: String::new(),
            remedies: Vec::new(),
            planets: Vec::new(),
            houses: Vec::new(),
        }
    }

    fn from_text(kind: &'static str, text: &str) -> Self {
        Self {
            present: dosha_present_in_text(text),
            severity: Severity::from_text(text),
            description: text.trim().to_string(),
            ..Self::absent(kind)
        }
    }

    fn from_object(kind: &'static str, map: &Map<String, Value>) -> Self {
        let description = map.get("description").and_then(Value::as_str).unwrap_or("").trim().to_string();
        let present = match map.get("present") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(text)) => dosha_present_in_text(text),
            _ => false,
        };
        let severity = match map.get("severity").and_then(Value::as_str) {
            Some(text) => Severity::from_text(text),
            None if present => Severity::Medium,
            None => Severity::Low,
        };

        Self {
            kind,
            present,
            severity,
            description,
            remedies: text_list(map.get("remedies")),
            planets: text_list(map.get("planets")),
            houses: text_list(map.get("houses")),
        }
    }
}

/// Strings and numbers of a JSON array, as text
fn text_list(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items.iter().filter_map(scalar_text).collect()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.trim().to_string()).filter(|t| !t.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Details of every known affliction
///
/// Payload entries may be booleans, free text or objects, keyed by the full
/// name (`manglik_dosha`) or the short one (`manglik`). Manglik and pitra fall
/// back to the session flags when the payload is silent.
pub fn parse_doshas(session: &Session) -> Vec<DoshaDetail> {
    let payload = match &session.dosha_json {
        Some(Value::Object(map)) => Some(map),
        _ => None,
    };

    DOSHA_KINDS
        .iter()
        .map(|&kind| {
            let short = kind.trim_end_matches("_dosha");
            let entry = payload.and_then(|map| map.get(kind).or_else(|| map.get(short)));
            match entry {
                Some(Value::Bool(present)) => DoshaDetail::flagged(kind, *present),
                Some(Value::String(text)) => DoshaDetail::from_text(kind, text),
                Some(Value::Object(map)) => DoshaDetail::from_object(kind, map),
                _ => match kind {
                    "manglik_dosha" => DoshaDetail::flagged(kind, session.manglik_dosha),
                    "pitra_dosha" => DoshaDetail::flagged(kind, session.pitra_dosha),
                    _ => DoshaDetail::absent(kind),
                },
            }
        })
        .collect()
}

/// Affliction flags, per-affliction details and the raw payload
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AfflictionInfo {
    pub manglik: bool,
    pub pitra: bool,
    pub doshas: Vec<DoshaDetail>,
    pub payload: Option<Value>,
}

pub fn parse_afflictions(session: &Session) -> AfflictionInfo {
    AfflictionInfo {
        manglik: session.manglik_dosha,
        pitra: session.pitra_dosha,
        doshas: parse_doshas(session),
        payload: session.dosha_json.clone(),
    }
}

/// Birth-star details from the summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BirthStar {
    pub nakshatra: Option<String>,
    pub nakshatra_lord: Option<String>,
    pub charan: Option<String>,
    pub varna: Option<String>,
    pub paya: Option<String>,
    pub gan: Option<String>,
    pub tatva: Option<String>,
    pub name_alphabet: Option<String>,
}

/// Sign, ascendant and calendar details from the summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SignInfo {
    pub sign: Option<String>,
    pub sign_lord: Option<String>,
    pub ascendant: Option<String>,
    pub ascendant_lord: Option<String>,
    pub tithi: Option<String>,
    pub karan: Option<String>,
    pub yog: Option<String>,
    pub yunja: Option<String>,
}

/// Compatibility and numerology details from the summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchingInfo {
    pub vashya: Option<String>,
    pub yoni: Option<String>,
    pub nadi: Option<String>,
    pub moon_sign: Option<String>,
    pub birth_number: Option<String>,
    pub life_path_number: Option<String>,
    pub lucky_number: Option<String>,
    pub lucky_color: Option<String>,
    pub lucky_day: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummaryDetails {
    pub birth_star: BirthStar,
    pub sign: SignInfo,
    pub matching: MatchingInfo,
}

/// Structured reading of a summary cell that holds a JSON object
///
/// Free-text summaries yield `None`. The upstream data misspells a few keys
/// (`naksahtra`, `naksahtralord`, `signlord`); both spellings are read.
pub fn parse_summary(text: &str) -> Option<SummaryDetails> {
    let trimmed = text.trim();
    if !trimmed.starts_with('{') {
        return None;
    }
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) else {
        return None;
    };
    let field = |keys: &[&str]| keys.iter().find_map(|k| map.get(*k).and_then(scalar_text));

    Some(SummaryDetails {
        birth_star: BirthStar {
            nakshatra: field(&["naksahtra", "nakshatra"]),
            nakshatra_lord: field(&["naksahtralord", "nakshatra_lord"]),
            charan: field(&["charan"]),
            varna: field(&["varna"]),
            paya: field(&["paya"]),
            gan: field(&["gan"]),
            tatva: field(&["tatva"]),
            name_alphabet: field(&["name_alphabet"]),
        },
        sign: SignInfo {
            sign: field(&["sign"]),
            sign_lord: field(&["signlord", "sign_lord"]),
            ascendant: field(&["ascendant"]),
            ascendant_lord: field(&["ascendant_lord"]),
            tithi: field(&["tithi"]),
            karan: field(&["karan"]),
            yog: field(&["yog"]),
            yunja: field(&["yunja"]),
        },
        matching: MatchingInfo {
            vashya: field(&["vashya"]),
            yoni: field(&["yoni"]),
            nadi: field(&["nadi"]),
            moon_sign: field(&["moon_sign"]),
            birth_number: field(&["birth_number"]),
            life_path_number: field(&["life_path_number"]),
            lucky_number: field(&["lucky_number"]),
            lucky_color: field(&["lucky_color"]),
            lucky_day: field(&["lucky_day"]),
        },
    })
}

/// Everything the detail view shows about a session's astrology
#[derive(Debug, Clone, Serialize)]
pub struct AstroDetails {
    pub chart: Option<HouseChart>,
    pub periods: PeriodInfo,
    pub afflictions: AfflictionInfo,
    pub summary: Option<SummaryDetails>,
}

pub fn astro_details(session: &Session) -> AstroDetails {
    AstroDetails {
        chart: session_chart(session),
        periods: parse_periods(session),
        afflictions: parse_afflictions(session),
        summary: parse_summary(&session.summary),
    }
}
