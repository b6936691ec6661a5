use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use goldleaf_core::JsonFileCatalog;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    catalog: JsonFileCatalog,
    provider_credential_configured: bool,
}

impl HealthState {
    pub fn new(catalog: JsonFileCatalog, provider_credential_configured: bool) -> Self {
        Self { catalog, provider_credential_configured }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub catalog: HealthCheck,
    pub gold_price_provider: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

/// Readiness follows the catalog only; a missing provider credential still
/// serves fallback prices.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let catalog = catalog_check(&state.catalog).await;
    let ready = catalog.status == "ready";

    let gold_price_provider = if state.provider_credential_configured {
        HealthCheck { status: "ready", detail: "provider credential configured".to_string() }
    } else {
        HealthCheck {
            status: "degraded",
            detail: "provider credential missing, serving fallback gold price".to_string(),
        }
    };

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "goldleaf-server runtime initialized".to_string(),
        },
        catalog,
        gold_price_provider,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn catalog_check(source: &JsonFileCatalog) -> HealthCheck {
    let source = source.clone();
    let loaded = tokio::task::spawn_blocking(move || source.try_load()).await;

    match loaded {
        Ok(Ok(catalog)) => HealthCheck {
            status: "ready",
            detail: format!("catalog loaded with {} products", catalog.len()),
        },
        Ok(Err(error)) => {
            HealthCheck { status: "degraded", detail: format!("catalog load failed: {error}") }
        }
        Err(error) => HealthCheck {
            status: "degraded",
            detail: format!("catalog check task failed: {error}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use axum::{extract::State, http::StatusCode, Json};
    use goldleaf_core::JsonFileCatalog;
    use tempfile::TempDir;

    use crate::health::{health, HealthState};

    #[tokio::test]
    async fn health_returns_ready_when_catalog_is_readable() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("products.json");
        fs::write(&path, "[]").expect("write catalog");

        let (status, Json(payload)) =
            health(State(HealthState::new(JsonFileCatalog::new(path), true))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.catalog.status, "ready");
        assert_eq!(payload.gold_price_provider.status, "ready");
        assert_eq!(payload.service.status, "ready");
    }

    #[tokio::test]
    async fn missing_credential_is_reported_without_failing_readiness() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("products.json");
        fs::write(&path, "[]").expect("write catalog");

        let (status, Json(payload)) =
            health(State(HealthState::new(JsonFileCatalog::new(path), false))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.gold_price_provider.status, "degraded");
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_catalog_is_missing() {
        let dir = TempDir::new().expect("temp dir");

        let (status, Json(payload)) = health(State(HealthState::new(
            JsonFileCatalog::new(dir.path().join("absent.json")),
            true,
        )))
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.catalog.status, "degraded");
        assert_eq!(payload.service.status, "ready");
    }
}
