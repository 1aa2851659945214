//! Product catalog: public queries plus admin-only mutations

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::domain::product::{CatalogPage, CatalogQuery, Product};
use crate::error::ApiError;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/featured/featured", get(featured_products))
        .route("/featured/best-selling", get(best_selling_products))
        .route("/:id", get(get_product).put(update_product).delete(delete_product))
        .route("/:id/related", get(related_products))
}

async fn list_products(State(state): State<AppState>, Query(query): Query<CatalogQuery>) -> Result<Json<CatalogPage>, ApiError> {
    // Category and search are bound; the price bucket and sort key expand to
    // fixed SQL fragments chosen by match, never client text.
    let filter = format!(
        "WHERE ($1::text IS NULL OR category = $1) \
         AND ($2::text IS NULL OR name ILIKE $2 OR description ILIKE $2){}",
        query.price_predicate()
    );

    let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM products {filter}"))
        .bind(query.category_filter())
        .bind(query.search_pattern())
        .fetch_one(&state.db)
        .await?;

    let products = sqlx::query_as::<_, Product>(&format!(
        "SELECT * FROM products {filter} ORDER BY {}, created_at DESC LIMIT $3 OFFSET $4",
        query.order_clause()
    ))
    .bind(query.category_filter())
    .bind(query.search_pattern())
    .bind(i64::from(query.limit()))
    .bind(query.offset())
    .fetch_all(&state.db)
    .await?;

    let limit = i64::from(query.limit());
    Ok(Json(CatalogPage {
        products,
        total,
        page: query.page(),
        pages: (total + limit - 1) / limit,
    }))
}

async fn get_product(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Product>, ApiError> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Product"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image: Option<String>,
    pub category: Option<String>,
    pub stock: Option<i32>,
    pub featured: Option<bool>,
    pub best_seller: Option<bool>,
}

impl CreateProductRequest {
    fn check(&self) -> Result<(), ApiError> {
        if self.name.is_empty() {
            return Err(ApiError::InvalidInput("Name is required".into()));
        }
        if self.price < Decimal::ZERO {
            return Err(ApiError::InvalidInput("Price cannot be negative".into()));
        }
        if self.stock.is_some_and(|s| s < 0) {
            return Err(ApiError::InvalidInput("Stock cannot be negative".into()));
        }
        Ok(())
    }
}

async fn create_product(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    req.check()?;
    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO products (id, name, description, price, image, category, stock, featured, best_seller, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW()) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&req.name)
    .bind(req.description.unwrap_or_default())
    .bind(req.price)
    .bind(req.image.unwrap_or_default())
    .bind(req.category.unwrap_or_default())
    .bind(req.stock.unwrap_or(0))
    .bind(req.featured.unwrap_or(false))
    .bind(req.best_seller.unwrap_or(false))
    .fetch_one(&state.db)
    .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub stock: Option<i32>,
    pub featured: Option<bool>,
    pub best_seller: Option<bool>,
}

async fn update_product(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    if req.price.is_some_and(|p| p < Decimal::ZERO) {
        return Err(ApiError::InvalidInput("Price cannot be negative".into()));
    }
    let product = sqlx::query_as::<_, Product>(
        "UPDATE products SET name = COALESCE($2, name), description = COALESCE($3, description), \
         price = COALESCE($4, price), image = COALESCE($5, image), category = COALESCE($6, category), \
         stock = COALESCE($7, stock), featured = COALESCE($8, featured), best_seller = COALESCE($9, best_seller), \
         updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(req.name)
    .bind(req.description)
    .bind(req.price)
    .bind(req.image)
    .bind(req.category)
    .bind(req.stock)
    .bind(req.featured)
    .bind(req.best_seller)
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::NotFound("Product"))?;
    Ok(Json(product))
}

async fn delete_product(State(state): State<AppState>, _admin: AdminUser, Path(id): Path<Uuid>) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    if deleted.rows_affected() == 0 {
        return Err(ApiError::NotFound("Product"));
    }
    Ok(Json(json!({ "message": "Product removed" })))
}

async fn featured_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, ApiError> {
    let products = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE featured = true LIMIT 3")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(products))
}

async fn best_selling_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, ApiError> {
    let products = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE best_seller = true LIMIT 3")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(products))
}

async fn related_products(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Vec<Product>>, ApiError> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(ApiError::NotFound("Product"))?;

    let related = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE category = $1 AND id <> $2 LIMIT 4")
        .bind(&product.category)
        .bind(id)
        .fetch_all(&state.db)
        .await?;
    Ok(Json(related))
}
