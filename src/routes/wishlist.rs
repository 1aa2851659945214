//! Wishlist endpoints
//!
//! Wishlist and cart are independent aggregates. `move-to-cart` is a
//! deliberate two-step sequence: the wishlist write is persisted before the
//! cart write, and there is no rollback if the cart write then fails. The
//! client can retry the (idempotent-by-merge) cart add.

use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use sqlx::types::Json as Jsonb;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::domain::cart::WishItems;
use crate::domain::Product;
use crate::error::ApiError;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_wishlist))
        .route("/add", post(add_to_wishlist))
        .route("/remove/:product_id", delete(remove_from_wishlist))
        .route("/move-to-cart/:product_id", post(move_to_cart))
}

#[derive(Debug, sqlx::FromRow)]
struct WishlistRow {
    items: Jsonb<WishItems>,
}

#[derive(Debug, Serialize)]
pub struct WishlistDoc {
    pub items: WishItems,
}

#[derive(Debug, Serialize)]
pub struct PopulatedWishlist {
    pub items: Vec<WishEntry>,
}

#[derive(Debug, Serialize)]
pub struct WishEntry {
    pub product: Product,
}

async fn load_items(db: &PgPool, user_id: Uuid) -> Result<Option<WishItems>, ApiError> {
    let row = sqlx::query_as::<_, WishlistRow>("SELECT items FROM wishlists WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await?;
    Ok(row.map(|r| r.items.0))
}

async fn save_items(db: &PgPool, user_id: Uuid, items: &WishItems) -> Result<WishItems, ApiError> {
    let row = sqlx::query_as::<_, WishlistRow>(
        "INSERT INTO wishlists (id, user_id, items, created_at, updated_at) VALUES ($1, $2, $3, NOW(), NOW()) \
         ON CONFLICT (user_id) DO UPDATE SET items = EXCLUDED.items, updated_at = NOW() RETURNING items",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(Jsonb(items))
    .fetch_one(db)
    .await?;
    Ok(row.items.0)
}

async fn get_wishlist(State(state): State<AppState>, auth: AuthUser) -> Result<Json<PopulatedWishlist>, ApiError> {
    let items = load_items(&state.db, auth.id).await?.unwrap_or_default();
    let ids: Vec<Uuid> = items.0.iter().map(|l| l.product_id).collect();
    let products = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ANY($1)")
        .bind(&ids)
        .fetch_all(&state.db)
        .await?;
    let items = items
        .0
        .iter()
        .filter_map(|line| {
            let product = products.iter().find(|p| p.id == line.product_id)?.clone();
            Some(WishEntry { product })
        })
        .collect();
    Ok(Json(PopulatedWishlist { items }))
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToWishlistRequest {
    pub product_id: Uuid,
}

async fn add_to_wishlist(State(state): State<AppState>, auth: AuthUser, Json(req): Json<AddToWishlistRequest>) -> Result<Json<WishlistDoc>, ApiError> {
    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products WHERE id = $1")
        .bind(req.product_id)
        .fetch_one(&state.db)
        .await?;
    if exists == 0 {
        return Err(ApiError::NotFound("Product"));
    }

    let mut items = load_items(&state.db, auth.id).await?.unwrap_or_default();
    items.add(req.product_id).map_err(|_| ApiError::DuplicateItem)?;
    let items = save_items(&state.db, auth.id, &items).await?;
    Ok(Json(WishlistDoc { items }))
}

async fn remove_from_wishlist(State(state): State<AppState>, auth: AuthUser, Path(product_id): Path<Uuid>) -> Result<Json<WishlistDoc>, ApiError> {
    let mut items = load_items(&state.db, auth.id).await?.ok_or(ApiError::NotFound("Wishlist"))?;
    items.remove(product_id);
    let items = save_items(&state.db, auth.id, &items).await?;
    Ok(Json(WishlistDoc { items }))
}

async fn move_to_cart(State(state): State<AppState>, auth: AuthUser, Path(product_id): Path<Uuid>) -> Result<Json<serde_json::Value>, ApiError> {
    let mut wish_items = load_items(&state.db, auth.id).await?.ok_or(ApiError::NotFound("Wishlist"))?;
    if !wish_items.contains(product_id) {
        return Err(ApiError::NotFound("Item"));
    }

    // Step one: persist the wishlist removal. From here on the item is
    // gone from the wishlist whether or not the cart write succeeds.
    wish_items.remove(product_id);
    let wish_items = save_items(&state.db, auth.id, &wish_items).await?;

    // Step two: add-or-merge into the cart.
    let mut cart_items = super::cart::load_cart_items(&state.db, auth.id).await?.unwrap_or_default();
    cart_items.add(product_id, 1);
    let cart_items = super::cart::save_cart_items(&state.db, auth.id, &cart_items).await?;

    Ok(Json(json!({
        "wishlist": WishlistDoc { items: wish_items },
        "cart": super::cart::CartDoc { items: cart_items },
    })))
}
