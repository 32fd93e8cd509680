use serde::Deserialize;
use serde_json::Value;
use crate::models::record::{lenient_days, lenient_list, lenient_map, lenient_number, lenient_string};
use crate::models::{normalize_currency, ScrapedRecord, Source};
use super::{absolute_url, SourceProfile};

pub struct MadeInChina;

/// Either the `{"listings": [...]}` object the prompt asks for or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MadeInChinaPayload {
    Bare(Vec<MadeInChinaListing>),
    Wrapped {
        #[serde(default)]
        listings: Vec<MadeInChinaListing>,
    },
}

impl MadeInChinaPayload {
    pub fn into_items(self) -> Vec<MadeInChinaListing> {
        match self {
            MadeInChinaPayload::Bare(items) | MadeInChinaPayload::Wrapped { listings: items } => items,
        }
    }
}

/// Listing as the extraction prompt names it; differs from Alibaba's shape.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MadeInChinaListing {
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub price: Value,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub min_order: Value,
    #[serde(default)]
    pub delivery_days: Value,
    #[serde(default)]
    pub certificates: Value,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub attributes: Value,
}

impl SourceProfile for MadeInChina {
    type Payload = MadeInChinaPayload;

    const SOURCE: Source = Source::MadeInChina;
    const AGENT_NAME: &'static str = "Made-in-China Agent";
    const START_URL: &'static str = "https://www.made-in-china.com";

    fn goal(query: &str, max_results: usize) -> String {
        format!(
            "You are on Made-in-China.com. Make sure the search box is set to search products, \
             type \"{query}\" and submit. Dismiss any overlay that hides the listings. \
             Do not sign in or send inquiries. When product results are visible and you have scrolled \
             past the first {max_results} listings, say you are done."
        )
    }

    fn extraction_prompt(max_results: usize) -> String {
        format!(
            "Read up to {max_results} product listings from this Made-in-China search results page. \
             Return JSON shaped as {{\"listings\": [{{\"company\": string, \"title\": string, \"link\": string, \
             \"image\": string, \"price\": number (lowest unit price), \"currency\": string (ISO code or symbol as shown), \
             \"minOrder\": string, \"deliveryDays\": number, \"certificates\": [string], \"origin\": string, \
             \"summary\": string, \"attributes\": {{string: string}}}}]}}. Leave out anything not on the page."
        )
    }

    fn into_records(payload: MadeInChinaPayload) -> Vec<ScrapedRecord> {
        payload
            .into_items()
            .into_iter()
            .filter_map(|l| {
                let company = l.company.filter(|s| !s.trim().is_empty());
                let title = l.title.filter(|s| !s.trim().is_empty());
                if company.is_none() && title.is_none() {
                    return None;
                }
                let mut record = ScrapedRecord::new(
                    company.as_deref().unwrap_or("Unknown supplier"),
                    title.as_deref().unwrap_or("Unnamed product"),
                );
                record.product_url = absolute_url(Self::START_URL, l.link);
                record.image_url = absolute_url(Self::START_URL, l.image);
                record.price = lenient_number(&l.price);
                record.currency = normalize_currency(l.currency.as_deref());
                record.moq = lenient_string(&l.min_order);
                record.lead_time_days = lenient_days(&l.delivery_days);
                record.certifications = lenient_list(&l.certificates);
                record.location = l.origin.filter(|s| !s.trim().is_empty());
                record.description = l.summary.filter(|s| !s.trim().is_empty());
                record.specifications = lenient_map(&l.attributes);
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
    fn test_currency_from_listing_defaults_to_usd() {
        let payload: MadeInChinaPayload = serde_json::from_value(json!({
            "listings": [
                {"company": "Handan Bolts", "title": "M8 bolt", "price": 0.03, "currency": "€"},
                {"company": "Yongnian Hardware", "title": "M8 carriage bolt", "price": "0.04"}
            ]
        })).unwrap();

        let records = MadeInChina::into_records(payload);
        assert_eq!(records[0].currency, "EUR");
        assert_eq!(records[1].currency, "USD");
        assert_eq!(records[1].price, Some(0.04));
    }

    #[test]
    fn test_into_records_maps_fields() {
        let payload: MadeInChinaPayload = serde_json::from_value(json!({
            "listings": [{
                "company": "Handan Bolts",
                "title": "Hex bolt",
                "link": "/product/abc.html",
                "minOrder": "5000 Pieces",
                "deliveryDays": 20,
                "certificates": ["ISO 9001"],
                "origin": "Hebei, China",
                "attributes": {"Grade": "8.8"}
            }]
        })).unwrap();

        let r = &MadeInChina::into_records(payload)[0];
        assert_eq!(r.product_url.as_deref(), Some("https://www.made-in-china.com/product/abc.html"));
        assert_eq!(r.moq.as_deref(), Some("5000 Pieces"));
        assert_eq!(r.lead_time_days, Some(20));
        assert_eq!(r.location.as_deref(), Some("Hebei, China"));
        assert_eq!(r.specifications.as_ref().unwrap()["Grade"], "8.8");
    }

    #[test]
    fn test_goal_mentions_query() {
        assert!(MadeInChina::goal("M8 bolt", 5).contains("\"M8 bolt\""));
    }

    #[test]
    fn test_bare_array_accepted() {
        let payload: MadeInChinaPayload = serde_json::from_value(json!([
            {"company": "Handan Bolts", "title": "M8 bolt", "currency": "CNY"}
        ])).unwrap();
        let records = MadeInChina::into_records(payload);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].currency, "CNY");
        assert!(MadeInChina::into_records(serde_json::from_value(json!([])).unwrap()).is_empty());
    }
}
