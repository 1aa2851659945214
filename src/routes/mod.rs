//! Route modules and API router assembly

pub mod auth;
pub mod cart;
pub mod chatbot;
pub mod orders;
pub mod products;
pub mod wishlist;

use axum::{routing::get, Json, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "giftly-storefront"})) }))
        .nest("/auth", auth::router())
        .nest("/users", auth::user_router())
        .nest("/products", products::router())
        .nest("/cart", cart::router())
        .nest("/wishlist", wishlist::router())
        .nest("/orders", orders::router())
        .nest("/chatbot", chatbot::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
