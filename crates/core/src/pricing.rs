use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use crate::domain::product::{EnrichedProduct, ProductRecord};

const PRICE_DECIMAL_PLACES: u32 = 2;
const RATING_DECIMAL_PLACES: u32 = 1;
const MAX_STARS: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

#[derive(Clone, Debug, Error, PartialEq)]
pub enum PricingError {
    #[error("{field} value `{value}` cannot be used for pricing")]
    Unrepresentable { field: &'static str, value: f64 },
    #[error("price for popularity {popularity_score}, weight {weight} overflowed")]
    Overflow { popularity_score: f64, weight: f64 },
}

/// `(popularity + 1) * weight * gold_price`, rounded half-up to cents.
pub fn compute_price(
    popularity_score: f64,
    weight: f64,
    gold_price: f64,
) -> Result<f64, PricingError> {
    let popularity = to_decimal("popularityScore", popularity_score)?;
    let weight_dec = to_decimal("weight", weight)?;
    let gold = to_decimal("goldPrice", gold_price)?;

    let overflow = || PricingError::Overflow { popularity_score, weight };
    let premium = popularity.checked_add(Decimal::ONE).ok_or_else(overflow)?;
    let raw = premium
        .checked_mul(weight_dec)
        .and_then(|value| value.checked_mul(gold))
        .ok_or_else(overflow)?;

    round_to_f64(raw, PRICE_DECIMAL_PLACES).ok_or_else(overflow)
}

/// Maps a [0, 1] popularity score onto a [0, 5] star scale at one decimal.
/// Out-of-domain scores are clamped to the scale bounds.
pub fn compute_star_rating(popularity_score: f64) -> Result<f64, PricingError> {
    let popularity = to_decimal("popularityScore", popularity_score)?;
    let stars = popularity
        .checked_mul(MAX_STARS)
        .ok_or(PricingError::Unrepresentable { field: "popularityScore", value: popularity_score })?
        .clamp(Decimal::ZERO, MAX_STARS);

    round_to_f64(stars, RATING_DECIMAL_PLACES)
        .ok_or(PricingError::Unrepresentable { field: "popularityScore", value: popularity_score })
}

pub fn enrich(record: &ProductRecord, gold_price: f64) -> Result<EnrichedProduct, PricingError> {
    let price = compute_price(record.popularity_score, record.weight, gold_price)?;
    let star_rating = compute_star_rating(record.popularity_score)?;

    Ok(EnrichedProduct { record: record.clone(), price, star_rating, gold_price })
}

pub fn enrich_all(
    records: &[ProductRecord],
    gold_price: f64,
) -> Result<Vec<EnrichedProduct>, PricingError> {
    records.iter().map(|record| enrich(record, gold_price)).collect()
}

fn to_decimal(field: &'static str, value: f64) -> Result<Decimal, PricingError> {
    if !value.is_finite() {
        return Err(PricingError::Unrepresentable { field, value });
    }
    Decimal::from_f64(value).ok_or(PricingError::Unrepresentable { field, value })
}

fn round_to_f64(value: Decimal, places: u32) -> Option<f64> {
    value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero).to_f64()
}
