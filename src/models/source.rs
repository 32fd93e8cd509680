use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::errors::ScoutError;

/// Marketplaces a job can search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Alibaba,
    MadeInChina,
}

impl Source {
    pub const ALL: [Source; 2] = [Source::Alibaba, Source::MadeInChina];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Alibaba => "alibaba",
            Source::MadeInChina => "made_in_china",
        }
    }

    /// Parse source names in order, dropping duplicates. An empty list is rejected.
    pub fn parse_list(raw: &[String]) -> Result<Vec<Source>, ScoutError> {
        let mut sources = Vec::with_capacity(raw.len());
        for name in raw {
            let source: Source = name.parse()?;
            if !sources.contains(&source) {
                sources.push(source);
            }
        }
        if sources.is_empty() {
            return Err(ScoutError::InvalidRequest("at least one source is required".into()));
        }
        Ok(sources)
    }
}

impl FromStr for Source {
    type Err = ScoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "alibaba" | "source_a" => Ok(Source::Alibaba),
            "made_in_china" | "madeinchina" | "source_b" => Ok(Source::MadeInChina),
            other => Err(ScoutError::InvalidRequest(format!(
                "unknown source '{}' (expected one of: alibaba, made_in_china)",
                other
            ))),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names_and_aliases() {
        assert_eq!("alibaba".parse::<Source>().unwrap(), Source::Alibaba);
        assert_eq!("source_a".parse::<Source>().unwrap(), Source::Alibaba);
        assert_eq!("Made-In-China".parse::<Source>().unwrap(), Source::MadeInChina);
        assert_eq!("source_b".parse::<Source>().unwrap(), Source::MadeInChina);
        assert!("ebay".parse::<Source>().is_err());
    }

    #[test]
    fn test_parse_list_dedupes_and_rejects_empty() {
        let list = Source::parse_list(&["source_a".into(), "alibaba".into(), "source_b".into()]).unwrap();
        assert_eq!(list, vec![Source::Alibaba, Source::MadeInChina]);
        assert!(Source::parse_list(&[]).is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for source in Source::ALL {
            assert_eq!(source.to_string().parse::<Source>().unwrap(), source);
        }
    }
}
