use serde_json::Value;

use super::GoldPriceError;

pub const GRAMS_PER_TROY_OUNCE: f64 = 31.1034768;

const PER_GRAM_24K_FIELD: &str = "price_gram_24k";
const PER_TROY_OUNCE_FIELD: &str = "price";

/// The accepted shapes of a spot-price response, classified once per fetch.
#[derive(Clone, Debug, PartialEq)]
pub enum GoldQuote {
    PerGram24k(f64),
    PerTroyOunce(f64),
    Rejected(String),
}

impl GoldQuote {
    /// Prefers the per-gram field, then the per-ounce field. Either must be
    /// a finite JSON number to count.
    pub fn classify(body: &Value) -> Self {
        if let Some(per_gram) = finite_number(body, PER_GRAM_24K_FIELD) {
            return Self::PerGram24k(per_gram);
        }
        if let Some(per_ounce) = finite_number(body, PER_TROY_OUNCE_FIELD) {
            return Self::PerTroyOunce(per_ounce);
        }
        Self::Rejected(format!(
            "response carries neither a numeric `{PER_GRAM_24K_FIELD}` nor `{PER_TROY_OUNCE_FIELD}`"
        ))
    }

    pub fn price_per_gram(&self) -> Result<f64, GoldPriceError> {
        match self {
            Self::PerGram24k(price) => Ok(*price),
            Self::PerTroyOunce(price) => Ok(price / GRAMS_PER_TROY_OUNCE),
            Self::Rejected(reason) => Err(GoldPriceError::UnexpectedShape(reason.clone())),
        }
    }
}

fn finite_number(body: &Value, field: &str) -> Option<f64> {
    body.get(field).and_then(Value::as_f64).filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{GoldPriceError, GoldQuote, GRAMS_PER_TROY_OUNCE};

    #[test]
    fn per_gram_field_wins_when_both_are_present() {
        let quote = GoldQuote::classify(&json!({ "price_gram_24k": 71.25, "price": 2216.0 }));

        assert_eq!(quote, GoldQuote::PerGram24k(71.25));
        assert_eq!(quote.price_per_gram(), Ok(71.25));
    }

    #[test]
    fn ounce_price_is_converted_to_grams() {
        let quote = GoldQuote::classify(&json!({ "price": GRAMS_PER_TROY_OUNCE * 70.0 }));

        assert!(matches!(quote, GoldQuote::PerTroyOunce(_)));
        let per_gram = quote.price_per_gram().expect("per gram");
        assert!((per_gram - 70.0).abs() < 1e-9);
    }

    #[test]
    fn non_numeric_per_gram_falls_through_to_ounce_price() {
        let quote = GoldQuote::classify(&json!({ "price_gram_24k": "71.25", "price": 3110.34768 }));

        assert!(matches!(quote, GoldQuote::PerTroyOunce(_)));
    }

    #[test]
    fn unexpected_shapes_are_rejected() {
        for body in [json!({}), json!({ "price": null }), json!([1, 2]), json!("oops")] {
            let quote = GoldQuote::classify(&body);
            assert!(matches!(quote, GoldQuote::Rejected(_)), "{body} should be rejected");
            assert!(matches!(quote.price_per_gram(), Err(GoldPriceError::UnexpectedShape(_))));
        }
    }
}
