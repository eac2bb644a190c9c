use axum::http::HeaderValue;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{config::AppConfig, state::AppState};

pub mod equipment;
pub mod health;
pub mod operations;
pub mod vessels;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = cors_layer(&state.config);

    let vessel_routes = Router::new()
        .route(
            "/",
            get(vessels::list_vessels).post(vessels::create_vessel),
        )
        .route("/operation/costs", get(vessels::average_operation_costs))
        .route(
            "/:id",
            get(vessels::get_vessel).delete(vessels::delete_vessel),
        );

    let equipment_routes = Router::new()
        .route(
            "/",
            get(equipment::list_equipment).post(equipment::create_equipment),
        )
        .route("/active", get(equipment::list_active_equipment))
        .route("/status/inactive", put(equipment::deactivate_equipment))
        .route(
            "/operation",
            get(operations::list_operations).post(operations::create_operation),
        )
        .route("/operation/costs", post(operations::total_operation_cost))
        .route(
            "/:id",
            get(equipment::get_equipment).delete(equipment::delete_equipment),
        );

    Router::new()
        .route("/", get(health::health_check))
        .nest("/vessel", vessel_routes)
        .nest("/equipment", equipment_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let allow_origin = match config.cors_allowed_origin.as_ref() {
        Some(origins) => {
            let headers: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .filter_map(|value| match value.parse::<HeaderValue>() {
                    Ok(header) => Some(header),
                    Err(_) => {
                        tracing::warn!(origin = value, "ignoring invalid CORS allowed origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(headers)
        }
        None => AllowOrigin::mirror_request(),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}
