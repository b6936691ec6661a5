use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use goldleaf_core::config::{AppConfig, ConfigError, LoadOptions};
use goldleaf_core::{GoldPriceProvider, GoldPriceResolver, JsonFileCatalog};
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{info, warn};

use crate::api::{self, ApiState, SharedResolver};
use crate::goldapi::GoldApiProvider;
use crate::health::{self, HealthState};

pub struct Application {
    pub config: AppConfig,
    pub api_state: ApiState,
    pub health_state: HealthState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("gold price http client could not be built: {0}")]
    HttpClient(#[source] reqwest::Error),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        catalog_path = %config.catalog.path.display(),
        "starting application bootstrap"
    );

    let provider =
        GoldApiProvider::from_config(&config.gold).map_err(BootstrapError::HttpClient)?;
    let credential_configured = config.gold.has_api_key();
    info!(
        event_name = "system.bootstrap.gold_provider",
        correlation_id = "bootstrap",
        endpoint = provider.endpoint(),
        timeout_secs = config.gold.timeout_secs,
        "gold price provider configured"
    );
    if !credential_configured {
        warn!(
            event_name = "system.bootstrap.gold_credential_missing",
            correlation_id = "bootstrap",
            fallback_price_per_gram = config.gold.fallback_price_per_gram,
            "no gold price credential configured; every request will use the fallback price"
        );
    }

    let provider: Arc<dyn GoldPriceProvider> = Arc::new(provider);
    let resolver: SharedResolver = Arc::new(GoldPriceResolver::with_fallback(
        provider,
        config.gold.fallback_price_per_gram,
    ));
    let catalog = JsonFileCatalog::new(config.catalog.path.clone());

    Ok(Application {
        api_state: ApiState::new(catalog.clone(), resolver, config.gold.currency.clone()),
        health_state: HealthState::new(catalog, credential_configured),
        config,
    })
}

impl Application {
    pub fn router(&self) -> Router {
        let router = api::router(self.api_state.clone())
            .merge(health::router(self.health_state.clone()));

        let router = match static_client_dir(&self.config) {
            Some(dir) => {
                info!(
                    event_name = "system.bootstrap.static_client",
                    correlation_id = "bootstrap",
                    static_dir = %dir.display(),
                    "serving built client"
                );
                let index = ServeFile::new(dir.join("index.html"));
                router.fallback_service(ServeDir::new(dir).fallback(index))
            }
            None => router,
        };

        router.layer(CorsLayer::permissive())
    }
}

fn static_client_dir(config: &AppConfig) -> Option<PathBuf> {
    let dir = config.server.static_dir.as_ref()?;
    if dir.join("index.html").is_file() {
        Some(dir.clone())
    } else {
        warn!(
            event_name = "system.bootstrap.static_client_missing",
            correlation_id = "bootstrap",
            static_dir = %dir.display(),
            "static client directory has no index.html; not serving it"
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use goldleaf_core::config::{ConfigOverrides, LoadOptions};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::bootstrap::bootstrap;

    fn options(dir: &TempDir, static_dir: bool) -> LoadOptions {
        let catalog_path = dir.path().join("products.json");
        fs::write(&catalog_path, "[]").expect("write catalog");

        let static_dir = static_dir.then(|| {
            let client = dir.path().join("client");
            fs::create_dir_all(&client).expect("client dir");
            fs::write(client.join("index.html"), "<html>goldleaf</html>").expect("index");
            client
        });

        LoadOptions {
            config_path: Some(dir.path().join("missing.toml")),
            overrides: ConfigOverrides {
                catalog_path: Some(catalog_path),
                static_dir,
                gold_base_url: Some("http://127.0.0.1:9".to_string()),
                gold_timeout_secs: Some(1),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    fn client_route() -> Request<Body> {
        Request::builder().uri("/collections/rings").body(Body::empty()).expect("request")
    }

    #[test]
    fn bootstrap_fails_fast_on_invalid_config() {
        let dir = TempDir::new().expect("temp dir");
        let mut options = options(&dir, false);
        options.overrides.fallback_price_per_gram = Some(f64::NAN);

        let message = match bootstrap(options) {
            Ok(_) => panic!("bootstrap should reject a NaN fallback price"),
            Err(error) => error.to_string(),
        };

        assert!(message.contains("gold.fallback_price_per_gram"));
    }

    #[tokio::test]
    async fn router_serves_api_and_health_with_cors() {
        let dir = TempDir::new().expect("temp dir");
        let app = bootstrap(options(&dir, false)).expect("bootstrap");

        let response = app
            .router()
            .oneshot(
                Request::builder()
                    .uri("/api/products")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));

        let health = app
            .router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(health.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_paths_fall_back_to_client_index() {
        let dir = TempDir::new().expect("temp dir");
        let app = bootstrap(options(&dir, true)).expect("bootstrap");

        let response = app
            .router()
            .oneshot(client_route())
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        assert_eq!(&body[..], b"<html>goldleaf</html>");
    }

    #[tokio::test]
    async fn without_client_build_unknown_paths_are_not_found() {
        let dir = TempDir::new().expect("temp dir");
        let app = bootstrap(options(&dir, false)).expect("bootstrap");

        let response = app
            .router()
            .oneshot(client_route())
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
