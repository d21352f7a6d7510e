use axum::{
    extract::{Path, Query, State},
    response::Json,
    Json as RequestJson,
};
use serde::{Deserialize, Serialize};

use crate::api::handlers::{error_response, ApiError, AppState, MessageResponse};
use crate::logic::CartOperations;
use crate::model::{AddToCartRequest, CartItemId, CartItemWithProduct, CartUpdate};
use crate::store::traits::Store;

#[derive(Debug, Deserialize)]
pub struct QuantityQuery {
    pub quantity: i32,
}

/// A quantity update answers with the item, or a message when 0 removed it
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CartUpdateResponse {
    Item(CartItemWithProduct),
    Removed(MessageResponse),
}

const REMOVED_MESSAGE: &str = "Item removed from cart";

pub async fn list_cart_items<S: Store>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<CartItemWithProduct>>, ApiError> {
    CartOperations::list_items(&*state.store)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn add_to_cart<S: Store>(
    State(state): State<AppState<S>>,
    RequestJson(request): RequestJson<AddToCartRequest>,
) -> Result<Json<CartItemWithProduct>, ApiError> {
    CartOperations::add_to_cart(&*state.store, request)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn update_cart_item<S: Store>(
    State(state): State<AppState<S>>,
    Path(item_id): Path<CartItemId>,
    Query(query): Query<QuantityQuery>,
) -> Result<Json<CartUpdateResponse>, ApiError> {
    let response = match CartOperations::update_quantity(&*state.store, item_id, query.quantity)
        .await
        .map_err(error_response)?
    {
        CartUpdate::Updated(item) => CartUpdateResponse::Item(item),
        CartUpdate::Removed(_) => CartUpdateResponse::Removed(MessageResponse::new(REMOVED_MESSAGE)),
    };

    Ok(Json(response))
}

pub async fn remove_from_cart<S: Store>(
    State(state): State<AppState<S>>,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<MessageResponse>, ApiError> {
    CartOperations::remove_from_cart(&*state.store, item_id)
        .await
        .map_err(error_response)?;

    Ok(Json(MessageResponse::new(REMOVED_MESSAGE)))
}
