use clap::Args;
use goldleaf_core::config::{AppConfig, LoadOptions};
use goldleaf_core::{enrich_all, filter_products, EnrichedProduct, FilterBounds, JsonFileCatalog};
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Debug, Clone, Default, Args)]
pub struct CatalogArgs {
    #[arg(long, help = "Gold price per gram to price with (defaults to the configured fallback)")]
    pub gold_price: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub min_price: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub max_price: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub min_popularity: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub max_popularity: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CatalogDocument {
    success: bool,
    data: Vec<EnrichedProduct>,
    gold_price: f64,
    count: usize,
    filters: FilterBounds,
}

pub fn run(args: &CatalogArgs) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "catalog",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let gold_price = args.gold_price.unwrap_or(config.gold.fallback_price_per_gram);
    if !gold_price.is_finite() || gold_price < 0.0 {
        return CommandResult::failure(
            "catalog",
            "invalid_argument",
            format!("--gold-price must be a finite, non-negative number (got {gold_price})"),
            2,
        );
    }

    let catalog = match JsonFileCatalog::new(&config.catalog.path).try_load() {
        Ok(catalog) => catalog,
        Err(error) => return CommandResult::failure("catalog", "catalog_load", error.to_string(), 4),
    };

    let enriched = match enrich_all(catalog.products(), gold_price) {
        Ok(enriched) => enriched,
        Err(error) => return CommandResult::failure("catalog", "pricing", error.to_string(), 5),
    };

    let bounds = FilterBounds::from_query(
        args.min_price.as_deref(),
        args.max_price.as_deref(),
        args.min_popularity.as_deref(),
        args.max_popularity.as_deref(),
    );
    let data = filter_products(enriched, &bounds);

    CommandResult::document(
        "catalog",
        &CatalogDocument { success: true, count: data.len(), data, gold_price, filters: bounds },
    )
}
