//! Books API
//!
//! CRUD over a catalog of book records kept in a single JSON file.
//!
//! # Modules
//!
//! - `books`: record types, the collection store and catalog operations
//! - `routes`: HTTP handlers
//! - `config`: environment-driven settings

pub mod books;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::health::router())
        .merge(routes::books::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
