//! Shopping cart endpoints
//!
//! One cart document per user, created lazily on first add. Concurrent
//! edits to the same cart rely on per-row update atomicity only; there is
//! no version check, so two simultaneous adds can lose an increment. That
//! is an accepted property of this CRUD design.

use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::types::Json as Jsonb;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::domain::cart::{LineError, LineItems};
use crate::domain::Product;
use crate::error::ApiError;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart))
        .route("/add", post(add_to_cart))
        .route("/update/:product_id", put(update_quantity))
        .route("/remove/:product_id", delete(remove_from_cart))
        .route("/clear", delete(clear_cart))
}

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    items: Jsonb<LineItems>,
}

/// Cart document as stored: product references plus quantities.
#[derive(Debug, Serialize)]
pub struct CartDoc {
    pub items: LineItems,
}

/// Cart with each line resolved to its full product record.
#[derive(Debug, Serialize)]
pub struct PopulatedCart {
    pub items: Vec<PopulatedLine>,
}

#[derive(Debug, Serialize)]
pub struct PopulatedLine {
    pub product: Product,
    pub quantity: i32,
}

pub(crate) async fn load_cart_items(db: &PgPool, user_id: Uuid) -> Result<Option<LineItems>, ApiError> {
    let row = sqlx::query_as::<_, CartRow>("SELECT items FROM carts WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await?;
    Ok(row.map(|r| r.items.0))
}

pub(crate) async fn save_cart_items(db: &PgPool, user_id: Uuid, items: &LineItems) -> Result<LineItems, ApiError> {
    let row = sqlx::query_as::<_, CartRow>(
        "INSERT INTO carts (id, user_id, items, created_at, updated_at) VALUES ($1, $2, $3, NOW(), NOW()) \
         ON CONFLICT (user_id) DO UPDATE SET items = EXCLUDED.items, updated_at = NOW() RETURNING items",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(Jsonb(items))
    .fetch_one(db)
    .await?;
    Ok(row.items.0)
}

/// Resolves each stored line against the live catalog; lines whose product
/// has since been deleted are omitted.
pub(crate) async fn populate(db: &PgPool, items: &LineItems) -> Result<Vec<PopulatedLine>, ApiError> {
    let ids: Vec<Uuid> = items.0.iter().map(|l| l.product_id).collect();
    let products = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ANY($1)")
        .bind(&ids)
        .fetch_all(db)
        .await?;
    Ok(items
        .0
        .iter()
        .filter_map(|line| {
            let product = products.iter().find(|p| p.id == line.product_id)?.clone();
            Some(PopulatedLine { product, quantity: line.quantity })
        })
        .collect())
}

async fn get_cart(State(state): State<AppState>, auth: AuthUser) -> Result<Json<PopulatedCart>, ApiError> {
    let items = load_cart_items(&state.db, auth.id).await?.unwrap_or_default();
    let items = populate(&state.db, &items).await?;
    Ok(Json(PopulatedCart { items }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

async fn add_to_cart(State(state): State<AppState>, auth: AuthUser, Json(req): Json<AddToCartRequest>) -> Result<Json<CartDoc>, ApiError> {
    if req.quantity < 1 {
        return Err(ApiError::InvalidInput("Quantity must be at least 1".into()));
    }

    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products WHERE id = $1")
        .bind(req.product_id)
        .fetch_one(&state.db)
        .await?;
    if exists == 0 {
        return Err(ApiError::NotFound("Product"));
    }

    let mut items = load_cart_items(&state.db, auth.id).await?.unwrap_or_default();
    items.add(req.product_id, req.quantity);
    let items = save_cart_items(&state.db, auth.id, &items).await?;
    Ok(Json(CartDoc { items }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i32,
}

async fn update_quantity(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(product_id): Path<Uuid>,
    Json(req): Json<UpdateQuantityRequest>,
) -> Result<Json<CartDoc>, ApiError> {
    if req.quantity < 1 {
        return Err(ApiError::InvalidInput("Quantity must be at least 1".into()));
    }

    let mut items = load_cart_items(&state.db, auth.id).await?.ok_or(ApiError::NotFound("Cart"))?;
    items.update_quantity(product_id, req.quantity).map_err(|e| match e {
        LineError::NotFound => ApiError::NotFound("Item"),
        LineError::Duplicate => ApiError::DuplicateItem,
    })?;
    let items = save_cart_items(&state.db, auth.id, &items).await?;
    Ok(Json(CartDoc { items }))
}

async fn remove_from_cart(State(state): State<AppState>, auth: AuthUser, Path(product_id): Path<Uuid>) -> Result<Json<CartDoc>, ApiError> {
    let mut items = load_cart_items(&state.db, auth.id).await?.ok_or(ApiError::NotFound("Cart"))?;
    items.remove(product_id);
    let items = save_cart_items(&state.db, auth.id, &items).await?;
    Ok(Json(CartDoc { items }))
}

async fn clear_cart(State(state): State<AppState>, auth: AuthUser) -> Result<Json<CartDoc>, ApiError> {
    let deleted = sqlx::query("DELETE FROM carts WHERE user_id = $1")
        .bind(auth.id)
        .execute(&state.db)
        .await?;
    if deleted.rows_affected() == 0 {
        return Err(ApiError::NotFound("Cart"));
    }
    Ok(Json(CartDoc { items: LineItems::default() }))
}
