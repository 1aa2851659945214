//! Gift finder chat endpoint
//!
//! The only place an upstream failure is recovered instead of surfaced:
//! whatever goes wrong with the model call, the client gets a 200 with
//! keyword-matched products.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::chat::{self, ChatTurn};
use crate::domain::Product;
use crate::error::ApiError;
use crate::AppState;

/// Products returned alongside a chat reply.
const SUGGESTION_COUNT: usize = 3;
/// Fallback result size when the model is unavailable.
const FALLBACK_COUNT: usize = 6;

pub fn router() -> Router<AppState> {
    Router::new().route("/chat", post(chat_handler))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub conversation_history: Vec<ChatTurn>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
    pub products: Vec<Product>,
}

async fn chat_handler(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<(StatusCode, Json<ChatResponse>), ApiError> {
    if req.message.is_empty() {
        return Ok(reject_empty_message());
    }

    let matches = keyword_matches(&state.db, &req.message).await?;

    match state.gift_finder.suggest(&req.message, &req.conversation_history, &matches).await {
        Ok(suggestion) => {
            let mut products = resolve_products(&state.db, &suggestion.product_ids).await?;
            top_up(&mut products, &matches, SUGGESTION_COUNT);
            Ok((
                StatusCode::OK,
                Json(ChatResponse {
                    message: suggestion
                        .reply
                        .unwrap_or_else(|| "Here are some gift recommendations based on your preferences:".to_string()),
                    products,
                }),
            ))
        }
        Err(e) => {
            tracing::warn!(error = %e, "gift model unavailable, serving keyword matches");
            let mut products = fallback_selection(matches);
            if products.is_empty() {
                products = sqlx::query_as::<_, Product>("SELECT * FROM products LIMIT 6")
                    .fetch_all(&state.db)
                    .await?;
            }
            Ok((
                StatusCode::OK,
                Json(ChatResponse {
                    message: "Here are some gift recommendations based on your preferences:".to_string(),
                    products,
                }),
            ))
        }
    }
}

/// A blank message gets a 400 whose body still carries the `products`
/// field, so clients can read the same response shape on every path.
fn reject_empty_message() -> (StatusCode, Json<ChatResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ChatResponse { message: "Please provide a message".to_string(), products: Vec::new() }),
    )
}

/// Products served when the model is unavailable: the keyword matches,
/// capped at the fallback size.
fn fallback_selection(mut matches: Vec<Product>) -> Vec<Product> {
    matches.truncate(FALLBACK_COUNT);
    matches
}

/// Case-insensitive match of the message's keywords over product name,
/// description, and category.
async fn keyword_matches(db: &PgPool, message: &str) -> Result<Vec<Product>, ApiError> {
    let terms = chat::search_terms(message);
    if terms.is_empty() {
        return Ok(Vec::new());
    }
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE name ILIKE ANY($1) OR description ILIKE ANY($1) OR category ILIKE ANY($1) LIMIT 12",
    )
    .bind(&terms)
    .fetch_all(db)
    .await?;
    Ok(products)
}

async fn resolve_products(db: &PgPool, ids: &[Uuid]) -> Result<Vec<Product>, ApiError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let products = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(db)
        .await?;
    Ok(order_by_suggestion(products, ids))
}

/// Puts resolved products back into the order the model suggested them
/// (`ANY($1)` returns rows in storage order) and caps the result.
fn order_by_suggestion(mut products: Vec<Product>, ids: &[Uuid]) -> Vec<Product> {
    products.sort_by_key(|p| ids.iter().position(|id| *id == p.id).unwrap_or(usize::MAX));
    products.truncate(SUGGESTION_COUNT);
    products
}

/// Pads the suggestion list from the keyword matches, skipping products
/// already present.
fn top_up(products: &mut Vec<Product>, matches: &[Product], target: usize) {
    for candidate in matches {
        if products.len() >= target {
            break;
        }
        if products.iter().all(|p| p.id != candidate.id) {
            products.push(candidate.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn product(name: &str) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.into(),
            description: String::new(),
            price: Decimal::new(10, 0),
            image: String::new(),
            category: "gifts".into(),
            stock: 5,
            featured: false,
            best_seller: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_top_up_fills_to_target() {
        let matches = vec![product("a"), product("b"), product("c")];
        let mut products = vec![matches[0].clone()];
        top_up(&mut products, &matches, 3);
        assert_eq!(products.len(), 3);
    }

    #[test]
    fn test_top_up_skips_duplicates() {
        let matches = vec![product("a")];
        let mut products = vec![matches[0].clone()];
        top_up(&mut products, &matches, 3);
        assert_eq!(products.len(), 1);
    }

    #[test]
    fn test_top_up_respects_target() {
        let matches = vec![product("a"), product("b")];
        let mut products = vec![product("x"), product("y"), product("z")];
        top_up(&mut products, &matches, 3);
        assert_eq!(products.len(), 3);
    }

    #[test]
    fn test_fallback_caps_but_stays_non_empty() {
        let matches: Vec<Product> = (0..10).map(|i| product(&format!("p{i}"))).collect();
        let selected = fallback_selection(matches.clone());
        assert_eq!(selected.len(), FALLBACK_COUNT);
        assert_eq!(selected[0].id, matches[0].id);

        let few = fallback_selection(matches[..2].to_vec());
        assert_eq!(few.len(), 2);
        assert!(fallback_selection(Vec::new()).is_empty());
    }

    #[test]
    fn test_empty_message_is_rejected_with_products_field() {
        let (status, Json(body)) = reject_empty_message();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.message, "Please provide a message");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["products"], serde_json::json!([]));
    }

    #[test]
    fn test_resolved_products_follow_suggestion_order() {
        let (a, b, c) = (product("a"), product("b"), product("c"));
        let ids = vec![c.id, a.id, b.id];
        let ordered = order_by_suggestion(vec![a.clone(), b.clone(), c.clone()], &ids);
        assert_eq!(
            ordered.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![c.id, a.id, b.id]
        );
    }

    #[test]
    fn test_resolved_products_are_capped() {
        let all: Vec<Product> = (0..5).map(|i| product(&format!("p{i}"))).collect();
        let ids: Vec<Uuid> = all.iter().map(|p| p.id).collect();
        let ordered = order_by_suggestion(all, &ids);
        assert_eq!(ordered.len(), SUGGESTION_COUNT);
        assert_eq!(ordered.iter().map(|p| p.id).collect::<Vec<_>>(), ids[..3].to_vec());
    }
}
