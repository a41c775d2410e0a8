//! buttrest-api - Hypermedia REST API over a hardware-control client
//!
//! This crate provides the HTTP layer that uses the DeviceClient trait to
//! serve devices, sensors and actuators as JSON-LD resources. It is
//! client-agnostic.
//!
//! # Usage
//!
//! ```ignore
//! use buttrest_api::{create_router, AppState};
//! use buttrest_core::MockClient;
//!
//! let state = AppState::new(Arc::new(MockClient::demo("buttrest")));
//! state.startup().await?;
//! let router = create_router(state);
//! ```

pub mod command;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod read;
pub mod registry;
pub mod render;
pub mod state;

pub use error::{ApiError, FieldError, Problem};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use state::{ApiSettings, AppState};

use axum::routing::{get, post};
use axum::Router;
use buttrest_core::links;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the REST API router with the given application state
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health and readiness
        .route("/", get(handlers::health::liveness))
        .route("/healthz", get(handlers::health::liveness))
        .route("/readyz", get(handlers::health::readiness))
        // Discovery
        .route("/scan", post(handlers::scan::rescan))
        // Devices
        .route(links::DEVICES, get(handlers::devices::list_devices))
        .route(links::DEVICE, get(handlers::devices::get_device))
        // Sensors
        .route(links::SENSORS, get(handlers::sensors::list_sensors))
        .route(links::SENSOR, get(handlers::sensors::get_sensor))
        .route(
            links::SENSOR_READING,
            get(handlers::sensors::read_sensor_value),
        )
        // Scalar actuators
        .route(links::ACTUATORS, get(handlers::actuators::list_actuators))
        .route(
            links::ACTUATOR,
            get(handlers::actuators::get_actuator).post(handlers::actuators::command_actuator),
        )
        // Linear actuators
        .route(
            links::LINEAR_ACTUATORS,
            get(handlers::actuators::list_linear_actuators),
        )
        .route(
            links::LINEAR_ACTUATOR,
            get(handlers::actuators::get_linear_actuator)
                .post(handlers::actuators::command_linear_actuator),
        )
        // Rotatory actuators
        .route(
            links::ROTATORY_ACTUATORS,
            get(handlers::actuators::list_rotatory_actuators),
        )
        .route(
            links::ROTATORY_ACTUATOR,
            get(handlers::actuators::get_rotatory_actuator)
                .post(handlers::actuators::command_rotatory_actuator),
        )
        // Everything else answers with the problem envelope
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
