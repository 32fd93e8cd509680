use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_CURRENCY: &str = "USD";

/// One supplier listing read off a marketplace results page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedRecord {
    pub supplier_name: String,
    pub product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_time_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certifications: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specifications: Option<BTreeMap<String, String>>,
}

impl ScrapedRecord {
    pub fn new(supplier_name: &str, product_name: &str) -> Self {
        Self {
            supplier_name: supplier_name.trim().to_string(),
            product_name: product_name.trim().to_string(),
            product_url: None,
            image_url: None,
            price: None,
            currency: DEFAULT_CURRENCY.to_string(),
            moq: None,
            lead_time_days: None,
            certifications: None,
            location: None,
            description: None,
            specifications: None,
        }
    }
}

/// Upper-case ISO code for a currency as it appears on a listing.
pub fn normalize_currency(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return DEFAULT_CURRENCY.to_string();
    };
    match raw.to_ascii_uppercase().as_str() {
        "$" | "US$" | "USD" | "US DOLLAR" => "USD".into(),
        "€" | "EUR" | "EURO" => "EUR".into(),
        "¥" | "CNY" | "RMB" => "CNY".into(),
        "£" | "GBP" => "GBP".into(),
        code if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) => code.to_string(),
        _ => DEFAULT_CURRENCY.to_string(),
    }
}

/// First number in a JSON value: a plain number, or the first numeric run in a
/// string like `"US$1,200.50 - 3,000"`.
pub fn lenient_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => first_number(s),
        _ => None,
    }
}

pub fn lenient_days(value: &Value) -> Option<u32> {
    lenient_number(value).filter(|n| *n >= 0.0).map(|n| n.round() as u32)
}

pub fn lenient_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Accepts either an array of strings or a single comma-separated string.
pub fn lenient_list(value: &Value) -> Option<Vec<String>> {
    let items: Vec<String> = match value {
        Value::Array(items) => items.iter().filter_map(lenient_string).collect(),
        Value::String(s) => s.split(',').map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect(),
        _ => return None,
    };
    if items.is_empty() { None } else { Some(items) }
}

pub fn lenient_map(value: &Value) -> Option<BTreeMap<String, String>> {
    let map: BTreeMap<String, String> = value
        .as_object()?
        .iter()
        .filter_map(|(k, v)| lenient_string(v).map(|v| (k.clone(), v)))
        .collect();
    if map.is_empty() { None } else { Some(map) }
}

fn first_number(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .filter(|c| *c != ',')
        .collect();
    digits.trim_end_matches('.').parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_serializes_camel_case_and_skips_empty() {
        let mut record = ScrapedRecord::new(" Acme Fasteners ", "M8 hex bolt");
        record.lead_time_days = Some(15);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["supplierName"], "Acme Fasteners");
        assert_eq!(json["leadTimeDays"], 15);
        assert_eq!(json["currency"], "USD");
        assert!(json.get("price").is_none());
    }

    #[test]
    fn test_lenient_number() {
        assert_eq!(lenient_number(&json!(2.5)), Some(2.5));
        assert_eq!(lenient_number(&json!("US$1,200.50 - 3,000")), Some(1200.5));
        assert_eq!(lenient_number(&json!("$0.05")), Some(0.05));
        assert_eq!(lenient_number(&json!("negotiable")), None);
        assert_eq!(lenient_number(&Value::Null), None);
    }

    #[test]
    fn test_lenient_days() {
        assert_eq!(lenient_days(&json!("15 days")), Some(15));
        assert_eq!(lenient_days(&json!(7)), Some(7));
    }

    #[test]
    fn test_lenient_list_and_map() {
        assert_eq!(lenient_list(&json!("ISO9001, CE")), Some(vec!["ISO9001".into(), "CE".into()]));
        assert_eq!(lenient_list(&json!([])), None);
        let specs = lenient_map(&json!({"Material": "Steel", "Size": 8, "Empty": null})).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs["Size"], "8");
    }

    #[test]
    fn test_normalize_currency() {
        assert_eq!(normalize_currency(None), "USD");
        assert_eq!(normalize_currency(Some("us$")), "USD");
        assert_eq!(normalize_currency(Some("¥")), "CNY");
        assert_eq!(normalize_currency(Some("eur")), "EUR");
        assert_eq!(normalize_currency(Some("per piece")), "USD");
    }
}
