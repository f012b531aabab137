//! Record normalization and derived fields
//!
//! Pure transforms from a raw [`ProviderRecord`] to the row set the storage
//! layer writes. No I/O, no clock access: "today" is a parameter so the
//! derived experience value is deterministic under test.
//!
//! Malformed upstream data never fails a record here; it degrades (a bad
//! enumeration date yields no experience value, a missing credential yields
//! no title).

use chrono::NaiveDate;

use super::models::{Address, ProviderRecord};

/// Placeholder upstream sends when a provider has no name prefix
const NO_PREFIX_SENTINEL: &str = "--";

/// Status code marking an active enumeration
const ACTIVE_STATUS: &str = "A";

/// Purpose prefix distinguishing secondary practice addresses from the
/// record's primary address block
const PRACTICE_PURPOSE_PREFIX: &str = "PRACTICE_";

/// Token policy for credential cleanup
///
/// Kept as an explicit rule set so the tokenizer is testable apart from any
/// particular policy: which characters are stripped, which tokens get
/// promoted to the front, and how tokens are rejoined.
pub struct CredentialRules {
    /// Characters removed before tokenization
    pub strip: &'static [char],
    /// Predicate choosing the token promoted to the front, first match wins
    pub promote: fn(&str) -> bool,
    /// Separator used to rejoin tokens
    pub joiner: &'static str,
}

/// Heuristic for a professional-degree abbreviation: 3-4 uppercase letters
/// (DDS, DMD, PHD, ...). Two-letter credentials like MD stay in place.
fn is_degree_token(token: &str) -> bool {
    (3..=4).contains(&token.len()) && token.bytes().all(|b| b.is_ascii_uppercase())
}

/// The rule set applied to every ingested credential
pub const CREDENTIAL_RULES: CredentialRules = CredentialRules {
    strip: &['.'],
    promote: is_degree_token,
    joiner: ", ",
};

/// A provider record after normalization, ready for storage
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedProvider {
    pub npi: String,
    pub npi_type: String,
    pub full_name: String,
    /// Normalized credential string, e.g. "DDS, MS"
    pub title: Option<String>,
    pub country: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub gender: Option<String>,
    /// Upstream creation/update timestamps, epoch milliseconds
    pub nppes_created_at: Option<i64>,
    pub nppes_updated_at: Option<i64>,
    pub sole_proprietor: bool,
    /// Whole years since enumeration; None when the date is unusable
    pub years_experience: Option<i32>,
    pub is_active: bool,
    pub specialties: Vec<SpecialtyRow>,
    pub insurance_plans: Vec<InsuranceRow>,
    pub locations: Vec<LocationRow>,
}

/// One row for the specialties table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialtyRow {
    pub specialty: String,
    pub state: Option<String>,
    pub license: Option<String>,
    pub is_primary: bool,
    pub code: Option<String>,
}

/// One row for the insurance_plans table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsuranceRow {
    pub insurance: Option<String>,
    pub identifier: Option<String>,
}

/// One row for the locations table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationRow {
    pub address: String,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub purpose: String,
    pub postal_code: Option<String>,
}

/// Normalize one raw record
///
/// `today` anchors the years-of-experience derivation; callers pass the
/// current date.
pub fn normalize_record(record: ProviderRecord, today: NaiveDate) -> NormalizedProvider {
    let full_name = compose_full_name(&record);
    let title = record
        .basic
        .credential
        .as_deref()
        .and_then(normalize_credential);
    let country = record
        .addresses
        .first()
        .map(|a| a.country_name.clone())
        .filter(|c| !c.is_empty());
    let years_experience =
        years_experience(record.basic.enumeration_date.as_deref(), today);

    let specialties = record
        .taxonomies
        .iter()
        .map(|t| SpecialtyRow {
            specialty: t
                .desc
                .clone()
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| "N/A".to_string()),
            state: t.state.clone(),
            license: t.license.clone(),
            is_primary: t.is_primary,
            code: t.code.clone(),
        })
        .collect();

    let insurance_plans = record
        .identifiers
        .iter()
        .map(|id| InsuranceRow {
            // Issuer when present, otherwise the identifier-type description
            insurance: id
                .issuer
                .clone()
                .filter(|s| !s.is_empty())
                .or_else(|| id.desc.clone()),
            identifier: id.identifier.clone(),
        })
        .collect();

    // Primary addresses first, then practice addresses with a tagged purpose;
    // storage relies on this being the complete location set.
    let mut locations: Vec<LocationRow> = record
        .addresses
        .iter()
        .map(|a| location_row(a, a.address_purpose.clone()))
        .collect();
    locations.extend(record.practice_locations.iter().map(|a| {
        location_row(a, format!("{}{}", PRACTICE_PURPOSE_PREFIX, a.address_purpose))
    }));

    NormalizedProvider {
        npi: record.number,
        npi_type: record.enumeration_type,
        full_name,
        title,
        country,
        first_name: record.basic.first_name,
        last_name: record.basic.last_name,
        gender: record.basic.gender,
        nppes_created_at: record.created_epoch,
        nppes_updated_at: record.last_updated_epoch,
        sole_proprietor: record.basic.sole_proprietor.as_deref() == Some("YES"),
        years_experience,
        is_active: record.basic.status.as_deref() == Some(ACTIVE_STATUS),
        specialties,
        insurance_plans,
        locations,
    }
}

/// Normalize a raw credential string with the standard rule set
///
/// Uppercase, strip periods, tokenize on commas/whitespace, drop repeated
/// tokens (first occurrence wins), promote the first degree-pattern token to
/// the front, rejoin. Empty input yields None.
pub fn normalize_credential(raw: &str) -> Option<String> {
    normalize_credential_with(&CREDENTIAL_RULES, raw)
}

/// Credential cleanup driven by an explicit [`CredentialRules`]
pub fn normalize_credential_with(rules: &CredentialRules, raw: &str) -> Option<String> {
    let cleaned: String = raw
        .to_uppercase()
        .chars()
        .filter(|c| !rules.strip.contains(c))
        .collect();

    let mut tokens: Vec<&str> = Vec::new();
    for token in cleaned.split(|c: char| c == ',' || c.is_whitespace()) {
        if !token.is_empty() && !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    if tokens.is_empty() {
        return None;
    }

    if let Some(pos) = tokens.iter().position(|t| (rules.promote)(t)) {
        let promoted = tokens.remove(pos);
        tokens.insert(0, promoted);
    }

    Some(tokens.join(rules.joiner))
}

/// Compose the display name: prefix + first + optional middle + last
///
/// An explicit prefix wins unless it is the "--" placeholder; without one,
/// any taxonomy entry forces a "Dr. " prefix. The taxonomy check overriding
/// even the explicit placeholder is observed upstream-facing behavior and is
/// preserved as-is.
fn compose_full_name(record: &ProviderRecord) -> String {
    let basic = &record.basic;
    let prefix = match basic.name_prefix.as_deref() {
        Some(p) if !p.is_empty() && p != NO_PREFIX_SENTINEL => format!("{} ", p),
        _ if !record.taxonomies.is_empty() => "Dr. ".to_string(),
        _ => String::new(),
    };
    let middle = match basic.middle_name.as_deref() {
        Some(m) if !m.is_empty() => format!("{} ", m),
        _ => String::new(),
    };
    format!(
        "{}{} {}{}",
        prefix, basic.first_name, middle, basic.last_name
    )
}

/// Whole years between the enumeration date and `today`, using 365.25-day
/// years, floored. Unparseable or absent dates yield None.
fn years_experience(enumeration_date: Option<&str>, today: NaiveDate) -> Option<i32> {
    let date = NaiveDate::parse_from_str(enumeration_date?, "%Y-%m-%d").ok()?;
    let days = (today - date).num_days();
    Some((days as f64 / 365.25).floor() as i32)
}

fn location_row(address: &Address, purpose: String) -> LocationRow {
    let line = match address.address_2.as_deref() {
        Some(second) if !second.is_empty() => {
            format!("{}, {}", address.address_1, second)
        }
        _ => address.address_1.clone(),
    };
    LocationRow {
        address: line,
        city: address.city.clone(),
        state: address.state.clone(),
        phone: address.telephone_number.clone(),
        purpose,
        postal_code: address.postal_code.clone(),
    }
}
