//! NPPES search response models
//!
//! Serde models for the v2.1 search endpoint. Upstream is loose with types:
//! the NPI arrives as a JSON number, epoch timestamps arrive as numbers or
//! strings depending on record age, and almost any field can be absent.
//! Deserializers here tolerate all of that; semantic cleanup happens later in
//! [`super::normalize`].

use serde::{Deserialize, Deserializer};

/// One page of the NPPES search endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub result_count: u32,
    #[serde(default)]
    pub results: Vec<ProviderRecord>,
}

/// A raw provider record as returned by upstream
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderRecord {
    /// The provider's NPI (upstream sends a JSON number)
    #[serde(deserialize_with = "de_string_or_number")]
    pub number: String,
    /// Enumeration type, "NPI-1" for individual providers
    #[serde(default)]
    pub enumeration_type: String,
    /// Upstream record creation, epoch milliseconds
    #[serde(default, deserialize_with = "de_opt_epoch")]
    pub created_epoch: Option<i64>,
    /// Upstream record update, epoch milliseconds
    #[serde(default, deserialize_with = "de_opt_epoch")]
    pub last_updated_epoch: Option<i64>,
    pub basic: BasicInfo,
    #[serde(default)]
    pub addresses: Vec<Address>,
    /// Secondary practice addresses, a separate block upstream
    #[serde(default, rename = "practiceLocations")]
    pub practice_locations: Vec<Address>,
    #[serde(default)]
    pub taxonomies: Vec<Taxonomy>,
    #[serde(default)]
    pub identifiers: Vec<InsuranceIdentifier>,
}

/// Demographic block of a provider record
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BasicInfo {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: String,
    /// May be the literal placeholder "--" meaning "no prefix"
    #[serde(default)]
    pub name_prefix: Option<String>,
    #[serde(default)]
    pub credential: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    /// Upstream serves "YES"/"NO"
    #[serde(default)]
    pub sole_proprietor: Option<String>,
    /// "A" marks an active enumeration
    #[serde(default)]
    pub status: Option<String>,
    /// Date the NPI was assigned, "YYYY-MM-DD"
    #[serde(default)]
    pub enumeration_date: Option<String>,
}

/// A mailing, location or practice address
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub address_purpose: String,
    #[serde(default)]
    pub address_1: String,
    #[serde(default)]
    pub address_2: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country_name: String,
    #[serde(default)]
    pub telephone_number: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
}

/// A taxonomy (practice specialty) entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Taxonomy {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, rename = "primary")]
    pub is_primary: bool,
}

/// An "other identifier" entry; for individual providers these are almost
/// always payer enrollment identifiers
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InsuranceIdentifier {
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string_or_number")]
    pub identifier: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    String(String),
}

/// Accept a JSON number or string, yielding its string form
fn de_string_or_number<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Ok(match NumberOrString::deserialize(de)? {
        NumberOrString::Number(n) => n.to_string(),
        NumberOrString::String(s) => s,
    })
}

/// Optional variant of [`de_string_or_number`]
fn de_opt_string_or_number<'de, D: Deserializer<'de>>(
    de: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<NumberOrString>::deserialize(de)?.map(|v| match v {
        NumberOrString::Number(n) => n.to_string(),
        NumberOrString::String(s) => s,
    }))
}

/// Accept an epoch value serialized as number or numeric string
fn de_opt_epoch<'de, D: Deserializer<'de>>(de: D) -> Result<Option<i64>, D::Error> {
    Ok(Option::<NumberOrString>::deserialize(de)?.and_then(|v| match v {
        NumberOrString::Number(n) => Some(n),
        NumberOrString::String(s) => s.trim().parse().ok(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_record() -> serde_json::Value {
        json!({
            "number": 1234567893u64,
            "enumeration_type": "NPI-1",
            "created_epoch": "1117584000000",
            "last_updated_epoch": 1183228800000u64,
            "basic": {
                "first_name": "JANE",
                "last_name": "DOE",
                "credential": "M.D.",
                "gender": "F",
                "sole_proprietor": "NO",
                "status": "A",
                "enumeration_date": "2005-06-01",
                "name_prefix": "--"
            },
            "addresses": [{
                "address_purpose": "LOCATION",
                "address_1": "1 MAIN ST",
                "city": "SPRINGFIELD",
                "state": "IL",
                "country_name": "United States",
                "telephone_number": "555-0100",
                "postal_code": "627011234"
            }],
            "taxonomies": [{
                "code": "207Q00000X",
                "desc": "Family Medicine",
                "license": "12345",
                "state": "IL",
                "primary": true
            }],
            "identifiers": [{
                "issuer": "MEDICAID",
                "desc": "Other",
                "identifier": 998877
            }]
        })
    }

    #[test]
    fn deserializes_a_full_record() {
        let record: ProviderRecord = serde_json::from_value(sample_record()).unwrap();
        assert_eq!(record.number, "1234567893");
        assert_eq!(record.enumeration_type, "NPI-1");
        assert_eq!(record.created_epoch, Some(1117584000000));
        assert_eq!(record.last_updated_epoch, Some(1183228800000));
        assert_eq!(record.basic.first_name, "JANE");
        assert_eq!(record.basic.name_prefix.as_deref(), Some("--"));
        assert_eq!(record.addresses.len(), 1);
        assert!(record.taxonomies[0].is_primary);
        assert_eq!(record.identifiers[0].identifier.as_deref(), Some("998877"));
        assert!(record.practice_locations.is_empty());
    }

    #[test]
    fn missing_results_key_means_empty_page() {
        let page: SearchResponse = serde_json::from_value(json!({
            "Errors": [{"description": "invalid state"}]
        }))
        .unwrap();
        assert_eq!(page.result_count, 0);
        assert!(page.results.is_empty());
    }

    #[test]
    fn epoch_garbage_degrades_to_none() {
        let mut value = sample_record();
        value["created_epoch"] = json!("not-a-number");
        let record: ProviderRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.created_epoch, None);
    }

    #[test]
    fn minimal_record_deserializes() {
        let record: ProviderRecord = serde_json::from_value(json!({
            "number": "1999999992",
            "basic": {}
        }))
        .unwrap();
        assert_eq!(record.number, "1999999992");
        assert!(record.basic.enumeration_date.is_none());
        assert!(record.addresses.is_empty());
    }
}
