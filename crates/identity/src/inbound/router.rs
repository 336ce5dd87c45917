use axum::routing::post;
use axum::Router;

use crate::inbound::http::webhook::receive_webhook;
use crate::inbound::state::IdentityState;

pub fn create_router(state: IdentityState) -> Router {
    Router::new()
        .route("/api/webhooks", post(receive_webhook))
        .with_state(state)
}
