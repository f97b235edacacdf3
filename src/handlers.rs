use axum::{
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::auth_guard::{AuthService, DASHBOARD_ROUTE, MSG_LOGIN_OK};
use crate::backend::SharedBackend;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::dashboard::DashboardService;
use crate::errors::AppError;
use crate::models::{
    DashboardQuery, DashboardResponse, LoginRequest, LoginResponse, SimulationRequest,
    ThankYouSummary,
};
use crate::obs::fingerprint;
use crate::quote_form::QuoteService;

/// Maximum accepted request body.
pub const BODY_LIMIT: usize = 64 * 1024;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub quotes: QuoteService,
    pub dashboard: DashboardService,
    pub auth: AuthService,
}

impl AppState {
    /// Wires every component to the same backend.
    pub fn new(config: Config, backend: SharedBackend) -> Result<Self, AppError> {
        let catalog = Catalog::standard(config.plan_selection_mode);
        let dashboard = DashboardService::new(
            backend.clone(),
            catalog,
            config.display_utc_offset_hours,
        )?;

        Ok(Self {
            quotes: QuoteService::new(backend.clone(), catalog),
            auth: AuthService::new(backend),
            dashboard,
            config,
        })
    }
}

/// Extracts the bearer token from the Authorization header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "rust-simulador-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// GET /api/v1/catalog
///
/// Plans, partners and the selection mode the form runs in.
pub async fn get_catalog(State(state): State<Arc<AppState>>) -> Json<Catalog> {
    Json(*state.quotes.catalog())
}

/// POST /api/v1/simulations
///
/// Validates and stores one quote simulation. The response body is the
/// summary shown on the confirmation page.
pub async fn submit_simulation(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SimulationRequest>,
) -> Result<(StatusCode, Json<ThankYouSummary>), AppError> {
    tracing::info!(
        "POST /simulations - contact={}, plans={:?}",
        fingerprint(&request.contato),
        request.planos
    );

    let summary = state.quotes.submit(request).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    tracing::info!("POST /auth/login - email={}", fingerprint(&request.email));

    let session = state.auth.login(&request.email, &request.password).await?;

    Ok(Json(LoginResponse {
        message: MSG_LOGIN_OK.to_string(),
        redirect: DASHBOARD_ROUTE.to_string(),
        session,
    }))
}

/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| AppError::Unauthenticated("missing bearer token".to_string()))?;

    state.auth.logout(token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/admin/dashboard
///
/// Admin-only. Stats cover every simulation; the table honors the
/// `search`, `plano` and `marca` filters.
pub async fn admin_dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardResponse>, AppError> {
    tracing::info!(
        "GET /admin/dashboard - search={} plano={} marca={}",
        query.search.is_some(),
        query.plano.is_some(),
        query.marca.is_some()
    );

    let admin = state
        .auth
        .require_admin(bearer_token(&headers))
        .await?
        .into_result()?;

    let view = state.dashboard.load(&admin, &query).await?;
    Ok(Json(view))
}

/// Routes subject to request limits.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/catalog", get(get_catalog))
        .route("/api/v1/simulations", post(submit_simulation))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/logout", post(logout))
        .route("/api/v1/admin/dashboard", get(admin_dashboard))
}

/// Assembles the full application around a prepared set of API routes.
/// `/health` stays outside whatever layers `api` carries.
pub fn app(state: Arc<AppState>, api: Router<Arc<AppState>>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Application router without rate limiting.
pub fn build_router(state: Arc<AppState>) -> Router {
    app(state, api_routes().layer(RequestBodyLimitLayer::new(BODY_LIMIT)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn test_health() {
        let (status, Json(body)) = health().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }
}
