use axum::routing::get;
use axum::Router;

use crate::ServiceState;

mod version;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/version", get(version::handler))
        .with_state(state)
}
