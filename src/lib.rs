//! Giftly Storefront API
//!
//! Backend for a gift shop storefront.
//!
//! ## Features
//! - Product catalog with filtering, search, and pagination
//! - Per-user shopping cart and wishlist
//! - JWT-authenticated accounts with admin role
//! - Checkout against a dummy payment gateway
//! - AI-assisted gift finder with keyword fallback

use std::sync::Arc;

pub mod auth;
pub mod chat;
pub mod config;
pub mod domain;
pub mod error;
pub mod payment;
pub mod routes;

use crate::chat::GiftFinder;
use crate::config::Config;
use crate::payment::PaymentGateway;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
    pub gateway: PaymentGateway,
    pub gift_finder: GiftFinder,
}

impl AppState {
    pub fn new(db: sqlx::PgPool, config: Config) -> Self {
        let gift_finder = GiftFinder::new(config.gift_model.as_ref());
        Self {
            db,
            config: Arc::new(config),
            gateway: PaymentGateway,
            gift_finder,
        }
    }
}
