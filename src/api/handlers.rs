use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, Json},
    Json as RequestJson,
};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::CatalogConfig;
use crate::error::ShopError;
use crate::logic::CatalogOperations;
use crate::model::{NewProduct, Product, ProductId};
use crate::store::traits::Store;

/// Shared handler state: the store plus the catalog policy in force
pub struct AppState<S> {
    pub store: Arc<S>,
    pub catalog: CatalogConfig,
}

impl<S> AppState<S> {
    pub fn new(store: Arc<S>, catalog: CatalogConfig) -> Self {
        Self { store, catalog }
    }
}

// Derive would demand `S: Clone`; only the Arc is cloned.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            catalog: self.catalog,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn status_for(err: &ShopError) -> StatusCode {
    match err {
        ShopError::NotFound(_) => StatusCode::NOT_FOUND,
        ShopError::Conflict(_)
        | ShopError::InsufficientStock { .. }
        | ShopError::InvalidQuantity(_)
        | ShopError::StockOverflow(_)
        | ShopError::Validation(_) => StatusCode::BAD_REQUEST,
        ShopError::ProductInCart(_) => StatusCode::CONFLICT,
        ShopError::Database(_) | ShopError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn error_response(err: ShopError) -> ApiError {
    let status = status_for(&err);
    if err.is_server_error() {
        error!("Request failed: {}", err);
    } else {
        debug!("Request rejected ({}): {}", status, err);
    }
    (status, Json(ErrorResponse::new(&err.to_string())))
}

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse::new("Welcome to the Storefront API"))
}

// Product handlers
pub async fn list_products<S: Store>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    CatalogOperations::list(&*state.store)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn get_product<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>, ApiError> {
    CatalogOperations::get(&*state.store, id)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn create_product<S: Store>(
    State(state): State<AppState<S>>,
    RequestJson(new_product): RequestJson<NewProduct>,
) -> Result<Json<Product>, ApiError> {
    CatalogOperations::create(&*state.store, new_product)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn update_product<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<ProductId>,
    RequestJson(new_product): RequestJson<NewProduct>,
) -> Result<Json<Product>, ApiError> {
    CatalogOperations::update(&*state.store, &state.catalog, id, new_product)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn delete_product<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<ProductId>,
) -> Result<Json<MessageResponse>, ApiError> {
    CatalogOperations::delete(&*state.store, &state.catalog, id)
        .await
        .map_err(error_response)?;

    Ok(Json(MessageResponse::new("Product deleted successfully")))
}

// API Documentation handlers
pub async fn get_api_docs() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Storefront API</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5.9.0/swagger-ui.css" />
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5.9.0/swagger-ui-bundle.js"></script>
    <script>
        window.onload = function() {
            SwaggerUIBundle({ url: '/docs/openapi.json', dom_id: '#swagger-ui' });
        };
    </script>
</body>
</html>
"#,
    )
}

pub async fn get_openapi_spec() -> Json<serde_json::Value> {
    let error = serde_json::json!({ "$ref": "#/components/schemas/Error" });
    let message = serde_json::json!({ "$ref": "#/components/schemas/Message" });
    let product = serde_json::json!({ "$ref": "#/components/schemas/Product" });
    let cart_item = serde_json::json!({ "$ref": "#/components/schemas/CartItem" });
    let id_param = serde_json::json!({
        "name": "id", "in": "path", "required": true, "schema": { "type": "integer" }
    });
    let body = |schema: &serde_json::Value| {
        serde_json::json!({ "content": { "application/json": { "schema": schema } } })
    };
    let reply = |description: &str, schema: &serde_json::Value| {
        serde_json::json!({
            "description": description,
            "content": { "application/json": { "schema": schema } }
        })
    };

    Json(serde_json::json!({
        "openapi": "3.0.3",
        "info": {
            "title": "Storefront API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Product catalog and a shared cart whose quantities are reserved from product stock."
        },
        "paths": {
            "/health": {
                "get": { "summary": "Health check", "responses": { "200": { "description": "Service is up" } } }
            },
            "/products": {
                "get": {
                    "summary": "List products",
                    "responses": { "200": reply("All products", &serde_json::json!({ "type": "array", "items": product })) }
                },
                "post": {
                    "summary": "Create a product",
                    "requestBody": body(&serde_json::json!({ "$ref": "#/components/schemas/NewProduct" })),
                    "responses": {
                        "200": reply("Created product", &product),
                        "400": reply("Duplicate name or invalid input", &error)
                    }
                }
            },
            "/products/{id}": {
                "parameters": [id_param.clone()],
                "get": {
                    "summary": "Get a product",
                    "responses": { "200": reply("The product", &product), "404": reply("Not found", &error) }
                },
                "put": {
                    "summary": "Replace every field of a product",
                    "requestBody": body(&serde_json::json!({ "$ref": "#/components/schemas/NewProduct" })),
                    "responses": {
                        "200": reply("Updated product", &product),
                        "400": reply("Invalid input or duplicate name", &error),
                        "404": reply("Not found", &error)
                    }
                },
                "delete": {
                    "summary": "Delete a product",
                    "responses": {
                        "200": reply("Deleted", &message),
                        "404": reply("Not found", &error),
                        "409": reply("Product is still in the cart", &error)
                    }
                }
            },
            "/cart/items": {
                "get": {
                    "summary": "List cart items with their products",
                    "responses": { "200": reply("Cart contents", &serde_json::json!({ "type": "array", "items": cart_item })) }
                },
                "post": {
                    "summary": "Add a product to the cart, reserving stock",
                    "requestBody": body(&serde_json::json!({ "$ref": "#/components/schemas/AddToCart" })),
                    "responses": {
                        "200": reply("Cart item after the add", &cart_item),
                        "400": reply("Insufficient stock or invalid quantity", &error),
                        "404": reply("Product not found", &error)
                    }
                }
            },
            "/cart/items/{id}": {
                "parameters": [id_param],
                "put": {
                    "summary": "Set a cart item's quantity; 0 removes it",
                    "parameters": [{ "name": "quantity", "in": "query", "required": true, "schema": { "type": "integer" } }],
                    "responses": {
                        "200": reply("Updated cart item, or a message when removed", &serde_json::json!({ "oneOf": [cart_item, message] })),
                        "400": reply("Insufficient stock or invalid quantity", &error),
                        "404": reply("Cart item or product not found", &error)
                    }
                },
                "delete": {
                    "summary": "Remove a cart item, returning its stock",
                    "responses": { "200": reply("Removed", &message), "404": reply("Not found", &error) }
                }
            }
        },
        "components": {
            "schemas": {
                "Product": {
                    "type": "object",
                    "required": ["id", "name", "price", "stock"],
                    "properties": {
                        "id": { "type": "integer" },
                        "name": { "type": "string" },
                        "price": { "type": "number", "minimum": 0 },
                        "description": { "type": "string", "nullable": true },
                        "stock": { "type": "integer", "minimum": 0 }
                    }
                },
                "NewProduct": {
                    "type": "object",
                    "required": ["name", "price", "stock"],
                    "properties": {
                        "name": { "type": "string" },
                        "price": { "type": "number", "minimum": 0 },
                        "description": { "type": "string", "nullable": true },
                        "stock": { "type": "integer", "minimum": 0 }
                    }
                },
                "CartItem": {
                    "type": "object",
                    "required": ["id", "quantity", "product"],
                    "properties": {
                        "id": { "type": "integer" },
                        "quantity": { "type": "integer", "minimum": 1 },
                        "product": product
                    }
                },
                "AddToCart": {
                    "type": "object",
                    "required": ["product_id", "quantity"],
                    "properties": {
                        "product_id": { "type": "integer" },
                        "quantity": { "type": "integer", "minimum": 1 }
                    }
                },
                "Message": {
                    "type": "object",
                    "properties": { "message": { "type": "string" } }
                },
                "Error": {
                    "type": "object",
                    "properties": { "error": { "type": "string" } }
                }
            }
        }
    }))
}
