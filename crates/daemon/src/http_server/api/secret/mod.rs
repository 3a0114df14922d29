use axum::routing::{get, post};
use axum::Router;

use crate::ServiceState;

pub mod consume;
pub mod create;

// Re-export for convenience
pub use consume::ConsumeRequest;
pub use create::{CreateRequest, CreateResponse};

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/", post(create::handler))
        .route("/:id", get(consume::handler))
        .with_state(state)
}
