pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod gold;
pub mod pricing;

pub use catalog::filter::{filter_products, parse_bound, FilterBounds};
pub use catalog::{Catalog, CatalogError, JsonFileCatalog};
pub use domain::product::{Color, EnrichedProduct, ProductImages, ProductRecord, RecordIssue};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use gold::{
    GoldPriceError, GoldPriceProvider, GoldPriceResolver, GoldQuote, PriceSource,
    ResolvedGoldPrice,
};
pub use pricing::{compute_price, compute_star_rating, enrich, enrich_all, PricingError};
