//! Product catalog JSON API.
//!
//! - `GET /api/products`          enriched catalog, optionally filtered by
//!   `minPrice`, `maxPrice`, `minPopularity`, `maxPopularity`
//! - `GET /api/products/{index}`  one enriched product by catalog position
//! - `GET /api/gold-price`        current per-gram gold price

use std::sync::Arc;

use axum::{
    extract::{rejection::PathRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use goldleaf_core::{
    enrich, enrich_all, filter_products, ApplicationError, Catalog, EnrichedProduct, FilterBounds,
    GoldPriceProvider, GoldPriceResolver, InterfaceError, JsonFileCatalog,
};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

pub type SharedResolver = Arc<GoldPriceResolver<Arc<dyn GoldPriceProvider>>>;

#[derive(Clone)]
pub struct ApiState {
    catalog: JsonFileCatalog,
    resolver: SharedResolver,
    currency: String,
}

impl ApiState {
    pub fn new(
        catalog: JsonFileCatalog,
        resolver: SharedResolver,
        currency: impl Into<String>,
    ) -> Self {
        Self { catalog, resolver, currency: currency.into() }
    }
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Filter parameters read leniently: the first occurrence of each key wins
/// and unknown keys are ignored.
#[derive(Debug, Default)]
pub struct ProductListQuery {
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub min_popularity: Option<String>,
    pub max_popularity: Option<String>,
}

impl ProductListQuery {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "minPrice" => &mut query.min_price,
                "maxPrice" => &mut query.max_price,
                "minPopularity" => &mut query.min_popularity,
                "maxPopularity" => &mut query.max_popularity,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }

    fn bounds(&self) -> FilterBounds {
        FilterBounds::from_query(
            self.min_price.as_deref(),
            self.max_price.as_deref(),
            self.min_popularity.as_deref(),
            self.max_popularity.as_deref(),
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListResponse {
    pub success: bool,
    pub data: Vec<EnrichedProduct>,
    pub gold_price: f64,
    pub count: usize,
    pub filters: FilterBounds,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub success: bool,
    pub data: EnrichedProduct,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoldPriceResponse {
    pub success: bool,
    pub gold_price: f64,
    pub currency: String,
    pub unit: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    /// `context` is the client-facing message for unexpected failures.
    fn new(error: ApplicationError, correlation_id: &str, context: &str) -> Self {
        match error.into_interface(correlation_id) {
            InterfaceError::NotFound { message, .. } => Self {
                status: StatusCode::NOT_FOUND,
                body: ErrorBody { success: false, message, error: None },
            },
            InterfaceError::Internal { message, correlation_id } => {
                error!(
                    event_name = "api.request.failed",
                    correlation_id = %correlation_id,
                    error = %message,
                    "{context}"
                );
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: ErrorBody {
                        success: false,
                        message: context.to_string(),
                        error: Some(message),
                    },
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/products", get(list_products))
        .route("/api/products/{index}", get(get_product))
        .route("/api/gold-price", get(gold_price))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn list_products(
    State(state): State<ApiState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let correlation_id = correlation_id();
    let query = ProductListQuery::from_pairs(pairs);
    let fail =
        |error: ApplicationError| ApiError::new(error, &correlation_id, "Error fetching products");

    let catalog = load_catalog(&state).await.map_err(fail)?;
    let gold_price = state.resolver.price_per_gram(&correlation_id).await;
    let bounds = query.bounds();

    let enriched =
        enrich_all(catalog.products(), gold_price).map_err(|error| fail(error.into()))?;
    let data = filter_products(enriched, &bounds);

    info!(
        event_name = "api.products.listed",
        correlation_id = %correlation_id,
        catalog_size = catalog.len(),
        returned = data.len(),
        gold_price,
        "product list served"
    );

    Ok(Json(ProductListResponse {
        success: true,
        count: data.len(),
        data,
        gold_price,
        filters: bounds,
    }))
}

async fn get_product(
    raw_index: Result<Path<String>, PathRejection>,
    State(state): State<ApiState>,
) -> Result<Json<ProductResponse>, ApiError> {
    let correlation_id = correlation_id();
    let fail =
        |error: ApplicationError| ApiError::new(error, &correlation_id, "Error fetching product");

    // An undecodable segment can never name a catalog position.
    let raw_index = match raw_index {
        Ok(Path(raw_index)) => raw_index,
        Err(rejection) => {
            info!(
                event_name = "api.product.not_found",
                correlation_id = %correlation_id,
                rejection = %rejection,
                "product index could not be decoded"
            );
            return Err(fail(ApplicationError::NotFound {
                resource: "Product",
                key: rejection.body_text(),
            }));
        }
    };

    let catalog = load_catalog(&state).await.map_err(fail)?;
    let record = raw_index
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|index| catalog.get(index))
        .ok_or_else(|| {
            info!(
                event_name = "api.product.not_found",
                correlation_id = %correlation_id,
                index = %raw_index,
                catalog_size = catalog.len(),
                "product index outside catalog"
            );
            fail(ApplicationError::NotFound { resource: "Product", key: raw_index.clone() })
        })?;

    let gold_price = state.resolver.price_per_gram(&correlation_id).await;
    let data = enrich(record, gold_price).map_err(|error| fail(error.into()))?;

    Ok(Json(ProductResponse { success: true, data }))
}

async fn gold_price(State(state): State<ApiState>) -> Json<GoldPriceResponse> {
    let correlation_id = correlation_id();
    let gold_price = state.resolver.price_per_gram(&correlation_id).await;

    Json(GoldPriceResponse {
        success: true,
        gold_price,
        currency: state.currency.clone(),
        unit: "per gram",
    })
}

/// Reads the catalog file on the blocking pool.
async fn load_catalog(state: &ApiState) -> Result<Catalog, ApplicationError> {
    let source = state.catalog.clone();
    tokio::task::spawn_blocking(move || source.load())
        .await
        .map_err(|error| ApplicationError::Runtime(format!("catalog load task failed: {error}")))
}

fn correlation_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use goldleaf_core::{GoldPriceError, GoldPriceProvider, GoldPriceResolver, JsonFileCatalog};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::{router, ApiState};

    const CATALOG: &str = r#"[
        {
            "name": "Engagement Ring 1",
            "popularityScore": 0.0,
            "weight": 10.0,
            "images": { "yellow": "r1-y.jpg", "rose": "r1-r.jpg", "white": "r1-w.jpg" }
        },
        {
            "name": "Engagement Ring 2",
            "popularityScore": 1.0,
            "weight": 10.0,
            "images": { "yellow": "r2-y.jpg", "rose": "r2-r.jpg", "white": "r2-w.jpg" }
        },
        {
            "name": "Engagement Ring 3",
            "popularityScore": 0.5,
            "weight": 2.0,
            "images": { "yellow": "r3-y.jpg", "rose": "r3-r.jpg", "white": "r3-w.jpg" }
        }
    ]"#;

    struct StaticProvider(Result<Value, GoldPriceError>);

    #[async_trait]
    impl GoldPriceProvider for StaticProvider {
        async fn fetch_quote(&self) -> Result<Value, GoldPriceError> {
            self.0.clone()
        }
    }

    fn app(catalog_json: Option<&str>, quote: Result<Value, GoldPriceError>) -> (TempDir, Router) {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("products.json");
        if let Some(contents) = catalog_json {
            fs::write(&path, contents).expect("write catalog");
        }
        let provider: Arc<dyn GoldPriceProvider> = Arc::new(StaticProvider(quote));
        let state = ApiState::new(
            JsonFileCatalog::new(path),
            Arc::new(GoldPriceResolver::new(provider)),
            "USD",
        );
        (dir, router(state))
    }

    fn offline_app() -> (TempDir, Router) {
        app(Some(CATALOG), Err(GoldPriceError::MissingCredential))
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    #[tokio::test]
    async fn list_enriches_every_product_with_fallback_gold_price() {
        let (_dir, router) = offline_app();

        let (status, body) = get_json(router, "/api/products").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["goldPrice"], 65.5);
        assert_eq!(body["count"], 3);
        assert_eq!(body["filters"], json!({}));
        assert_eq!(body["data"][0]["price"], 655.0);
        assert_eq!(body["data"][0]["starRating"], 0.0);
        assert_eq!(body["data"][1]["price"], 1310.0);
        assert_eq!(body["data"][1]["starRating"], 5.0);
        assert_eq!(body["data"][2]["price"], 196.5);
        assert_eq!(body["data"][2]["goldPrice"], 65.5);
        assert_eq!(body["data"][2]["images"]["white"], "r3-w.jpg");
    }

    #[tokio::test]
    async fn list_uses_live_price_when_provider_answers() {
        let (_dir, router) = app(Some(CATALOG), Ok(json!({ "price_gram_24k": 100.0 })));

        let (_, body) = get_json(router, "/api/products").await;

        assert_eq!(body["goldPrice"], 100.0);
        assert_eq!(body["data"][0]["price"], 1000.0);
    }

    #[tokio::test]
    async fn list_applies_inclusive_price_window_and_echoes_filters() {
        let (_dir, router) = offline_app();

        let (status, body) =
            get_json(router, "/api/products?minPrice=196.5&maxPrice=700").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        assert_eq!(body["data"][0]["name"], "Engagement Ring 1");
        assert_eq!(body["data"][1]["name"], "Engagement Ring 3");
        assert_eq!(body["filters"], json!({ "minPrice": 196.5, "maxPrice": 700.0 }));
    }

    #[tokio::test]
    async fn list_filters_by_popularity() {
        let (_dir, router) = offline_app();

        let (_, body) =
            get_json(router, "/api/products?minPopularity=0.4&maxPopularity=0.6").await;

        assert_eq!(body["count"], 1);
        assert_eq!(body["data"][0]["name"], "Engagement Ring 3");
    }

    #[tokio::test]
    async fn malformed_filter_values_are_ignored() {
        let (_dir, router) = offline_app();

        let (status, body) =
            get_json(router, "/api/products?minPrice=cheap&maxPopularity=").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 3);
        assert_eq!(body["filters"], json!({}));
    }

    #[tokio::test]
    async fn repeated_filter_keys_use_the_first_value() {
        let (_dir, router) = offline_app();

        let (status, body) =
            get_json(router, "/api/products?minPrice=600&minPrice=2000&sort=price").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        assert_eq!(body["filters"], json!({ "minPrice": 600.0 }));
    }

    #[tokio::test]
    async fn undecodable_query_values_are_ignored() {
        let (_dir, router) = offline_app();

        let (status, body) = get_json(router, "/api/products?maxPrice=%FF%FE").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 3);
        assert_eq!(body["filters"], json!({}));
    }

    #[tokio::test]
    async fn missing_catalog_file_lists_nothing_successfully() {
        let (_dir, router) = app(None, Err(GoldPriceError::Timeout));

        let (status, body) = get_json(router, "/api/products").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["count"], 0);
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn repeated_list_requests_are_identical() {
        let (_dir, router) = offline_app();

        let (_, first) = get_json(router.clone(), "/api/products?maxPrice=700").await;
        let (_, second) = get_json(router, "/api/products?maxPrice=700").await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn unrepresentable_weight_is_an_internal_error() {
        let catalog = r#"[{
            "name": "Vault Bar",
            "popularityScore": 0.5,
            "weight": 1e300,
            "images": { "yellow": "y.jpg", "rose": "r.jpg", "white": "w.jpg" }
        }]"#;
        let (_dir, router) = app(Some(catalog), Err(GoldPriceError::MissingCredential));

        let (status, body) = get_json(router, "/api/products").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Error fetching products");
        assert!(body["error"].as_str().is_some_and(|error| error.contains("weight")));
    }

    #[tokio::test]
    async fn single_product_is_enriched_by_index() {
        let (_dir, router) = offline_app();

        let (status, body) = get_json(router, "/api/products/1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["name"], "Engagement Ring 2");
        assert_eq!(body["data"]["price"], 1310.0);
        assert_eq!(body["data"]["starRating"], 5.0);
    }

    #[tokio::test]
    async fn out_of_range_indexes_are_not_found() {
        for uri in
            ["/api/products/3", "/api/products/-1", "/api/products/ring", "/api/products/%FF"]
        {
            let (_dir, router) = offline_app();

            let (status, body) = get_json(router, uri).await;

            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body, json!({ "success": false, "message": "Product not found" }));
        }
    }

    #[tokio::test]
    async fn gold_price_endpoint_reports_unit_and_currency() {
        let (_dir, router) = app(Some(CATALOG), Ok(json!({ "price": 3110.34768 })));

        let (status, body) = get_json(router, "/api/gold-price").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["currency"], "USD");
        assert_eq!(body["unit"], "per gram");
        let price = body["goldPrice"].as_f64().expect("number");
        assert!((price - 100.0).abs() < 1e-9);
    }
}
