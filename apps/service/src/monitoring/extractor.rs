//! Turns page text into an [`Observation`].
//!
//! Extraction rules are configuration: any page layout is supported by
//! supplying a different pair of patterns.

use regex::Regex;

use super::types::Observation;
use crate::config::Monitor;
use crate::error::ExtractError;

/// Pure mapping from page text to observed fields
///
/// A rule that finds nothing yields `None` for its field. Only a match that
/// cannot be read as the field's type is an error.
pub trait Extractor: Send + Sync {
    fn extract(&self, body: &str) -> Result<Observation, ExtractError>;
}

/// Extractor driven by two regular expressions
///
/// The first capture group of each pattern holds the value.
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    stock: Regex,
    price: Regex,
}

impl PatternExtractor {
    pub fn new(stock_pattern: &str, price_pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self { stock: Regex::new(stock_pattern)?, price: Regex::new(price_pattern)? })
    }

    pub fn from_settings(settings: &Monitor) -> Result<Self, regex::Error> {
        Self::new(&settings.stock_pattern, &settings.price_pattern)
    }
}

fn first_capture<'a>(pattern: &Regex, body: &'a str) -> Option<&'a str> {
    pattern.captures(body).and_then(|caps| caps.get(1)).map(|m| m.as_str().trim())
}

fn parse_stock(raw: &str) -> Result<u64, ExtractError> {
    raw.parse().map_err(|_| ExtractError::InvalidStock(raw.to_string()))
}

fn parse_price(raw: &str) -> Result<f64, ExtractError> {
    match raw.parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => Ok(price),
        _ => Err(ExtractError::InvalidPrice(raw.to_string())),
    }
}

impl Extractor for PatternExtractor {
    fn extract(&self, body: &str) -> Result<Observation, ExtractError> {
        let stock = first_capture(&self.stock, body).map(parse_stock).transpose()?;
        let price = first_capture(&self.price, body).map(parse_price).transpose()?;
        Ok(Observation::new(stock, price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn default_extractor() -> PatternExtractor {
        PatternExtractor::from_settings(&Config::default().monitor).unwrap()
    }

    #[test]
    fn test_extracts_both_fields() {
        let body = r#"<div class="stock">库存(12)</div><span>¥ 29.90</span>"#;
        let observation = default_extractor().extract(body).unwrap();

        assert_eq!(observation, Observation::new(Some(12), Some(29.9)));
    }

    #[test]
    fn test_zero_stock_is_not_absent() {
        let observation = default_extractor().extract("库存(0) ¥10.00").unwrap();

        assert_eq!(observation.stock, Some(0));
        assert!(!observation.is_empty());
    }

    #[test]
    fn test_missing_fields_are_none() {
        let extractor = default_extractor();

        let only_price = extractor.extract("sold out ¥10.00").unwrap();
        assert_eq!(only_price, Observation::new(None, Some(10.0)));

        let nothing = extractor.extract("<html>maintenance</html>").unwrap();
        assert!(nothing.is_empty());
    }

    #[test]
    fn test_first_match_wins() {
        let observation = default_extractor().extract("库存(3) 库存(7) ¥1.50 ¥2.50").unwrap();

        assert_eq!(observation, Observation::new(Some(3), Some(1.5)));
    }

    #[test]
    fn test_custom_patterns() {
        let extractor =
            PatternExtractor::new(r#""available":\s*(\d+)"#, r#""price":\s*"([\d.]+)""#).unwrap();
        let observation = extractor.extract(r#"{"available": 4, "price": "7.25"}"#).unwrap();

        assert_eq!(observation, Observation::new(Some(4), Some(7.25)));
    }

    #[test]
    fn test_unparsable_capture_is_error() {
        let extractor = PatternExtractor::new(r"stock=(\d+)", r"price=(\S+)").unwrap();

        let overflow = extractor.extract("stock=99999999999999999999999 price=1.0");
        assert_eq!(
            overflow,
            Err(ExtractError::InvalidStock("99999999999999999999999".into()))
        );

        let garbage = extractor.extract("stock=1 price=abc");
        assert_eq!(garbage, Err(ExtractError::InvalidPrice("abc".into())));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        assert!(PatternExtractor::new(r"(\d+", r"(\d+)").is_err());
    }
}
