use serde::Deserialize;
use serde_json::Value;
use crate::models::record::{lenient_days, lenient_list, lenient_map, lenient_number, lenient_string};
use crate::models::{ScrapedRecord, Source, DEFAULT_CURRENCY};
use super::{absolute_url, SourceProfile};

pub struct Alibaba;

/// Either the `{"products": [...]}` object the prompt asks for or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AlibabaPayload {
    Bare(Vec<AlibabaProduct>),
    Wrapped {
        #[serde(default)]
        products: Vec<AlibabaProduct>,
    },
}

impl AlibabaPayload {
    pub fn into_items(self) -> Vec<AlibabaProduct> {
        match self {
            AlibabaPayload::Bare(items) | AlibabaPayload::Wrapped { products: items } => items,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlibabaProduct {
    #[serde(default)]
    pub supplier_name: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub product_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub price: Value,
    #[serde(default)]
    pub moq: Value,
    #[serde(default)]
    pub lead_time: Value,
    #[serde(default)]
    pub certifications: Value,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub specifications: Value,
}

impl SourceProfile for Alibaba {
    type Payload = AlibabaPayload;

    const SOURCE: Source = Source::Alibaba;
    const AGENT_NAME: &'static str = "Alibaba Agent";
    const START_URL: &'static str = "https://www.alibaba.com";

    fn goal(query: &str, max_results: usize) -> String {
        format!(
            "You are on Alibaba.com. Search for \"{query}\" using the main search box and submit the search. \
             Close any cookie banner, sign-in prompt or pop-up that covers the page. \
             Do not sign in, open supplier chats or leave the results page. \
             Once a grid of product listings is on screen, scroll so that at least the first {max_results} \
             listings have been seen, then reply that the results are visible."
        )
    }

    fn extraction_prompt(max_results: usize) -> String {
        format!(
            "Extract up to {max_results} product listings from this Alibaba search results page. \
             Return JSON shaped as {{\"products\": [{{\"supplierName\": string, \"productName\": string, \
             \"productUrl\": string, \"imageUrl\": string, \"price\": string (lowest price shown, e.g. \"US$0.05\"), \
             \"moq\": string (minimum order, e.g. \"1000 pieces\"), \"leadTime\": string, \
             \"certifications\": [string], \"location\": string, \"description\": string, \
             \"specifications\": {{string: string}}}}]}}. Omit fields that are not shown."
        )
    }

    fn into_records(payload: AlibabaPayload) -> Vec<ScrapedRecord> {
        payload
            .into_items()
            .into_iter()
            .filter_map(|p| {
                let supplier = p.supplier_name.filter(|s| !s.trim().is_empty());
                let product = p.product_name.filter(|s| !s.trim().is_empty());
                if supplier.is_none() && product.is_none() {
                    return None;
                }
                let mut record = ScrapedRecord::new(
                    supplier.as_deref().unwrap_or("Unknown supplier"),
                    product.as_deref().unwrap_or("Unnamed product"),
                );
                record.product_url = absolute_url(Self::START_URL, p.product_url);
                record.image_url = absolute_url(Self::START_URL, p.image_url);
                record.price = lenient_number(&p.price);
                // Alibaba shows US dollar prices to international visitors
                record.currency = DEFAULT_CURRENCY.to_string();
                record.moq = lenient_string(&p.moq);
                record.lead_time_days = lenient_days(&p.lead_time);
                record.certifications = lenient_list(&p.certifications);
                record.location = p.location.filter(|s| !s.trim().is_empty());
                record.description = p.description.filter(|s| !s.trim().is_empty());
                record.specifications = lenient_map(&p.specifications);
                Some(record)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_goal_mentions_query_and_cap() {
        let goal = Alibaba::goal("M8 bolt", 7);
        assert!(goal.contains("\"M8 bolt\""));
        assert!(goal.contains("first 7"));
    }

    #[test]
    fn test_into_records_normalizes() {
        let payload: AlibabaPayload = serde_json::from_value(json!({
            "products": [
                {
                    "supplierName": "Ningbo Fasteners Co.",
                    "productName": "M8 Hex Bolt DIN933",
                    "productUrl": "//www.alibaba.com/product-detail/1.html",
                    "price": "US$0.02-0.05",
                    "moq": "10000 pieces",
                    "leadTime": "15 days",
                    "certifications": "ISO9001, CE",
                    "specifications": {"Material": "Carbon steel"}
                },
                {"description": "banner ad"}
            ]
        })).unwrap();

        let records = Alibaba::into_records(payload);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.supplier_name, "Ningbo Fasteners Co.");
        assert_eq!(r.product_url.as_deref(), Some("https://www.alibaba.com/product-detail/1.html"));
        assert_eq!(r.price, Some(0.02));
        assert_eq!(r.currency, "USD");
        assert_eq!(r.moq.as_deref(), Some("10000 pieces"));
        assert_eq!(r.lead_time_days, Some(15));
        assert_eq!(r.certifications.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_missing_products_key_is_empty() {
        let payload: AlibabaPayload = serde_json::from_value(json!({})).unwrap();
        assert!(Alibaba::into_records(payload).is_empty());
    }

    #[test]
    fn test_bare_array_accepted() {
        let payload: AlibabaPayload = serde_json::from_value(json!([
            {"supplierName": "Ningbo Fasteners Co.", "productName": "M8 bolt"},
            {"supplierName": "Jiaxing Hardware", "productName": "M8 nut"}
        ])).unwrap();
        let records = Alibaba::into_records(payload);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].product_name, "M8 nut");
    }
}
