//! HTTP routes
//!
//! | Method | Path              | Permission          |
//! |--------|-------------------|---------------------|
//! | GET    | `/`               | -                   |
//! | GET    | `/drinks`         | -                   |
//! | GET    | `/drinks-detail`  | `get:drinks-detail` |
//! | POST   | `/drinks`         | `post:drinks`       |
//! | PATCH  | `/drinks/{id}`    | `patch:drinks`      |
//! | DELETE | `/drinks/{id}`    | `delete:drinks`     |
//! | GET    | `/cakes`          | `get:cakes`         |
//! | POST   | `/cakes`          | `post:cakes`        |
//! | PATCH  | `/cakes/{id}`     | `patch:cakes`       |
//! | DELETE | `/cakes/{id}`     | `delete:cakes`      |

use axum::{
    Extension, Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    handler::Handler,
    http::{HeaderValue, Method, header},
    response::IntoResponse,
    routing::{get, patch},
};
use patisserie_auth::{Authorizer, VerifiedClaims, tower::RequirePermissionLayer};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::config::CorsConfig;
use crate::error::{ApiError, ApiResult};
use crate::models::{CakePatch, DrinkPatch, NewCake, NewDrink};
use crate::store::Repository;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    /// Record storage
    pub store: Arc<dyn Repository>,
}

impl AppState {
    /// Wrap a repository
    pub fn new(store: Arc<dyn Repository>) -> Self {
        Self { store }
    }
}

/// Build the CORS layer: `Content-Type` and `Authorization` headers, the five
/// methods the API uses, and either any origin or the configured list
///
/// # Errors
///
/// Returns the first origin that is not a valid header value.
pub fn cors_layer(config: &CorsConfig) -> Result<CorsLayer, String> {
    let layer = CorsLayer::new()
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]);

    if config.allowed_origins.is_empty() {
        return Ok(layer.allow_origin(Any));
    }

    let origins = config
        .allowed_origins
        .iter()
        .map(|origin| HeaderValue::from_str(origin).map_err(|_| origin.clone()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}

/// Assemble the application router
pub fn router(state: AppState, authorizer: &Authorizer, cors: CorsLayer) -> Router {
    let require = |permission: &'static str| {
        RequirePermissionLayer::new(authorizer.clone(), permission)
    };

    Router::new()
        .route("/", get(index))
        .route(
            "/drinks",
            get(list_drinks).post(create_drink.layer(require("post:drinks"))),
        )
        .route(
            "/drinks-detail",
            get(drinks_detail.layer(require("get:drinks-detail"))),
        )
        .route(
            "/drinks/{id}",
            patch(update_drink.layer(require("patch:drinks")))
                .delete(delete_drink.layer(require("delete:drinks"))),
        )
        .route(
            "/cakes",
            get(list_cakes.layer(require("get:cakes")))
                .post(create_cake.layer(require("post:cakes"))),
        )
        .route(
            "/cakes/{id}",
            patch(update_cake.layer(require("patch:cakes")))
                .delete(delete_cake.layer(require("delete:cakes"))),
        )
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn index() -> impl IntoResponse {
    Json(json!({
        "success": true,
        "SampleTest": "The app is running"
    }))
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

async fn list_drinks(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let drinks = state.store.list_drinks().await?;
    let drinks: Vec<_> = drinks.iter().map(|d| d.short()).collect();
    Ok(Json(json!({
        "success": true,
        "drinks": drinks,
    })))
}

async fn drinks_detail(
    State(state): State<AppState>,
    Extension(claims): Extension<VerifiedClaims>,
) -> ApiResult<Json<Value>> {
    debug!(subject = ?claims.sub, "GET /drinks-detail");
    let drinks = state.store.list_drinks().await?;
    let drinks: Vec<_> = drinks.iter().map(|d| d.long()).collect();
    Ok(Json(json!({
        "success": true,
        "drinks": drinks,
    })))
}

async fn create_drink(
    State(state): State<AppState>,
    Extension(claims): Extension<VerifiedClaims>,
    payload: Result<Json<NewDrink>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(drink) = payload?;
    debug!(subject = ?claims.sub, title = %drink.title, "POST /drinks");
    let drink = state.store.insert_drink(drink).await?;
    Ok(Json(json!({
        "success": true,
        "drink": [drink.long()],
    })))
}

async fn update_drink(
    id: Result<Path<u64>, PathRejection>,
    State(state): State<AppState>,
    Extension(claims): Extension<VerifiedClaims>,
    payload: Result<Json<DrinkPatch>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Path(id) = id?;
    let Json(patch) = payload?;
    debug!(subject = ?claims.sub, id, "PATCH /drinks/{{id}}");
    let drink = state.store.update_drink(id, patch).await?;
    Ok(Json(json!({
        "success": true,
        "drinks": [drink.long()],
    })))
}

async fn delete_drink(
    id: Result<Path<u64>, PathRejection>,
    State(state): State<AppState>,
    Extension(claims): Extension<VerifiedClaims>,
) -> ApiResult<Json<Value>> {
    let Path(id) = id?;
    debug!(subject = ?claims.sub, id, "DELETE /drinks/{{id}}");
    state.store.delete_drink(id).await?;
    Ok(Json(json!({
        "success": true,
        "deleted": id,
    })))
}

async fn list_cakes(
    State(state): State<AppState>,
    Extension(claims): Extension<VerifiedClaims>,
) -> ApiResult<Json<Value>> {
    debug!(subject = ?claims.sub, "GET /cakes");
    let cakes = state.store.list_cakes().await?;
    Ok(Json(json!({
        "success": true,
        "cakes": cakes,
    })))
}

async fn create_cake(
    State(state): State<AppState>,
    Extension(claims): Extension<VerifiedClaims>,
    payload: Result<Json<NewCake>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(cake) = payload?;
    debug!(subject = ?claims.sub, name = %cake.name, "POST /cakes");
    let cake = state.store.insert_cake(cake).await?;
    Ok(Json(json!({
        "success": true,
        "cake": [cake],
    })))
}

async fn update_cake(
    id: Result<Path<u64>, PathRejection>,
    State(state): State<AppState>,
    Extension(claims): Extension<VerifiedClaims>,
    payload: Result<Json<CakePatch>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Path(id) = id?;
    let Json(patch) = payload?;
    debug!(subject = ?claims.sub, id, "PATCH /cakes/{{id}}");
    let cake = state.store.update_cake(id, patch).await?;
    Ok(Json(json!({
        "success": true,
        "cakes": [cake],
    })))
}

async fn delete_cake(
    id: Result<Path<u64>, PathRejection>,
    State(state): State<AppState>,
    Extension(claims): Extension<VerifiedClaims>,
) -> ApiResult<Json<Value>> {
    let Path(id) = id?;
    debug!(subject = ?claims.sub, id, "DELETE /cakes/{{id}}");
    state.store.delete_cake(id).await?;
    Ok(Json(json!({
        "success": true,
        "deleted": id,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_any_origin() {
        assert!(cors_layer(&CorsConfig::default()).is_ok());
    }

    #[test]
    fn test_cors_origin_list() {
        let config = CorsConfig {
            allowed_origins: vec!["http://localhost:8100".into()],
        };
        assert!(cors_layer(&config).is_ok());

        let config = CorsConfig {
            allowed_origins: vec!["bad\norigin".into()],
        };
        assert_eq!(cors_layer(&config).unwrap_err(), "bad\norigin");
    }
}
