use serde::{Deserialize, Serialize};

use crate::domain::product::EnrichedProduct;

/// Optional inclusive range constraints for the product list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterBounds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_popularity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_popularity: Option<f64>,
}

impl FilterBounds {
    /// Builds bounds from raw query values; unparseable values are unset.
    pub fn from_query(
        min_price: Option<&str>,
        max_price: Option<&str>,
        min_popularity: Option<&str>,
        max_popularity: Option<&str>,
    ) -> Self {
        Self {
            min_price: parse_bound(min_price),
            max_price: parse_bound(max_price),
            min_popularity: parse_bound(min_popularity),
            max_popularity: parse_bound(max_popularity),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, product: &EnrichedProduct) -> bool {
        within(product.price, self.min_price, self.max_price)
            && within(product.record.popularity_score, self.min_popularity, self.max_popularity)
    }
}

pub fn parse_bound(raw: Option<&str>) -> Option<f64> {
    raw.map(str::trim)
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

pub fn filter_products(
    products: Vec<EnrichedProduct>,
    bounds: &FilterBounds,
) -> Vec<EnrichedProduct> {
    if bounds.is_unbounded() {
        return products;
    }
    products.into_iter().filter(|product| bounds.matches(product)).collect()
}

fn within(value: f64, min: Option<f64>, max: Option<f64>) -> bool {
    min.map_or(true, |min| value >= min) && max.map_or(true, |max| value <= max)
}

#[cfg(test)]
mod tests {
    use crate::domain::product::{EnrichedProduct, ProductImages, ProductRecord};

    use super::{filter_products, parse_bound, FilterBounds};

    fn product(name: &str, price: f64, popularity_score: f64) -> EnrichedProduct {
        EnrichedProduct {
            record: ProductRecord {
                name: name.to_string(),
                popularity_score,
                weight: 1.0,
                images: ProductImages {
                    yellow: "y.jpg".to_string(),
                    rose: "r.jpg".to_string(),
                    white: "w.jpg".to_string(),
                },
            },
            price,
            star_rating: 0.0,
            gold_price: 65.5,
        }
    }

    fn names(products: &[EnrichedProduct]) -> Vec<&str> {
        products.iter().map(|product| product.record.name.as_str()).collect()
    }

    fn catalog() -> Vec<EnrichedProduct> {
        vec![product("low", 100.0, 0.2), product("mid", 200.0, 0.5), product("high", 300.0, 0.9)]
    }

    #[test]
    fn price_window_keeps_only_products_inside_it() {
        let bounds = FilterBounds {
            min_price: Some(150.0),
            max_price: Some(250.0),
            ..FilterBounds::default()
        };

        assert_eq!(names(&filter_products(catalog(), &bounds)), ["mid"]);
    }

    #[test]
    fn bounds_are_inclusive() {
        let bounds = FilterBounds {
            min_price: Some(100.0),
            max_price: Some(200.0),
            min_popularity: Some(0.2),
            max_popularity: Some(0.5),
        };

        assert_eq!(names(&filter_products(catalog(), &bounds)), ["low", "mid"]);
    }

    #[test]
    fn popularity_bounds_apply_to_the_raw_score() {
        let bounds = FilterBounds { min_popularity: Some(0.6), ..FilterBounds::default() };

        assert_eq!(names(&filter_products(catalog(), &bounds)), ["high"]);
    }

    #[test]
    fn no_bounds_returns_everything_in_order() {
        let all = filter_products(catalog(), &FilterBounds::default());
        assert_eq!(names(&all), ["low", "mid", "high"]);
    }

    #[test]
    fn malformed_bounds_impose_no_constraint() {
        let bounds = FilterBounds::from_query(Some("abc"), Some(""), Some("NaN"), Some(" 0.5 "));

        assert_eq!(bounds.min_price, None);
        assert_eq!(bounds.max_price, None);
        assert_eq!(bounds.min_popularity, None);
        assert_eq!(bounds.max_popularity, Some(0.5));
        assert_eq!(names(&filter_products(catalog(), &bounds)), ["low", "mid"]);
    }

    #[test]
    fn parse_bound_rejects_infinities() {
        assert_eq!(parse_bound(Some("inf")), None);
        assert_eq!(parse_bound(Some("-1e400")), None);
        assert_eq!(parse_bound(Some("1e2")), Some(100.0));
        assert_eq!(parse_bound(None), None);
    }

    #[test]
    fn echoed_bounds_omit_unset_sides() {
        let bounds = FilterBounds { min_price: Some(150.0), ..FilterBounds::default() };

        let value = serde_json::to_value(bounds).expect("serialize");
        assert_eq!(value, serde_json::json!({ "minPrice": 150.0 }));
    }

    #[test]
    fn repeated_filtering_is_idempotent() {
        let bounds = FilterBounds { max_price: Some(250.0), ..FilterBounds::default() };

        let first = filter_products(catalog(), &bounds);
        let second = filter_products(first.clone(), &bounds);
        assert_eq!(first, second);
    }
}
