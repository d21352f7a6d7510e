pub mod cart_handlers;
pub mod handlers;
pub mod routes;

pub use cart_handlers::*;
pub use handlers::*;
pub use routes::*;
