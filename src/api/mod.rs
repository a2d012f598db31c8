pub mod admin;
pub mod extract;
pub mod health;
pub mod requests;

use std::time::Duration;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;
use utoipa_swagger_ui::SwaggerUi;

use crate::app_state::AppState;
use crate::middleware::auth::{jwt_middleware, require_admin, require_manager};

use self::admin::AdminRequestDoc;
use self::requests::RequestDoc;

/// Merged OpenAPI document for every documented route.
pub fn api_doc() -> utoipa::openapi::OpenApi {
    let mut doc = RequestDoc::openapi().merge_from(AdminRequestDoc::openapi());
    let components = doc.components.get_or_insert_with(Default::default);
    components.add_security_scheme(
        "bearerAuth",
        SecurityScheme::Http(
            HttpBuilder::new()
                .scheme(HttpAuthScheme::Bearer)
                .bearer_format("JWT")
                .build(),
        ),
    );
    doc
}

/// Assemble the full application router.
pub fn app_router(state: AppState) -> Router {
    let doc = api_doc();
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    // Layers run bottom-up: jwt_middleware attaches the actor before the role gate reads it.
    let manager_routes = requests::request_routes()
        .route_layer(from_fn(require_manager))
        .route_layer(from_fn_with_state(state.clone(), jwt_middleware));

    let admin_routes = admin::admin_request_routes()
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.clone(), jwt_middleware));

    Router::new()
        .merge(health::health_routes())
        .merge(manager_routes)
        .merge(admin_routes)
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", doc.clone()))
        .merge(RapiDoc::with_openapi("/api-docs/rapidoc.json", doc).path("/rapidoc"))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
