use axum::{
    routing::{get, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{cart_handlers, handlers, handlers::AppState};
use crate::store::traits::Store;

pub fn create_router<S: Store + 'static>() -> Router<AppState<S>> {
    Router::new()
        .route("/", get(handlers::root))
        // Health check
        .route("/health", get(handlers::health_check))
        // API Documentation
        .route("/docs", get(handlers::get_api_docs))
        .route("/docs/openapi.json", get(handlers::get_openapi_spec))
        // Catalog
        .route(
            "/products",
            get(handlers::list_products::<S>).post(handlers::create_product::<S>),
        )
        .route(
            "/products/:id",
            get(handlers::get_product::<S>)
                .put(handlers::update_product::<S>)
                .delete(handlers::delete_product::<S>),
        )
        // Cart
        .route(
            "/cart/items",
            get(cart_handlers::list_cart_items::<S>).post(cart_handlers::add_to_cart::<S>),
        )
        .route(
            "/cart/items/:id",
            put(cart_handlers::update_cart_item::<S>).delete(cart_handlers::remove_from_cart::<S>),
        )
        .layer(cors_layer())
}

/// The catalog is consumed by a browser client served from another origin
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
