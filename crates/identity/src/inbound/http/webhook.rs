//! Inbound endpoint for auth-provider webhook deliveries.

use app_core::error::AppError;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::domain::event::{self, EventParseError, IdentityEvent};
use crate::inbound::state::IdentityState;

const SVIX_ID: &str = "svix-id";
const SVIX_TIMESTAMP: &str = "svix-timestamp";
const SVIX_SIGNATURE: &str = "svix-signature";

/// Failures surfaced to the provider as plain text, matching the contract
/// its redelivery logic expects.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("missing one or more svix headers")]
    MissingHeaders,

    #[error("signature verification failed")]
    Verification,

    #[error(transparent)]
    MalformedPayload(#[from] EventParseError),

    #[error(transparent)]
    Sync(#[from] AppError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        match self {
            WebhookError::MissingHeaders => {
                (StatusCode::BAD_REQUEST, "Error: Missing Svix headers").into_response()
            },
            WebhookError::Verification => {
                (StatusCode::BAD_REQUEST, "Error: Verification error").into_response()
            },
            WebhookError::MalformedPayload(err) => {
                tracing::warn!("Rejected verified webhook with malformed payload: {err}");
                (StatusCode::BAD_REQUEST, "Error: Malformed payload").into_response()
            },
            WebhookError::Sync(err) => {
                tracing::error!("Webhook synchronization failed: {err}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Error: Internal server error").into_response()
            },
        }
    }
}

/// `POST /api/webhooks` — verifies, decodes, and applies one delivery.
///
/// Every accepted delivery answers `200 "Webhook received"`, including
/// event types this service does not act on.
pub async fn receive_webhook(
    State(state): State<IdentityState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, WebhookError> {
    let (id, timestamp, signature) = svix_headers(&headers).ok_or(WebhookError::MissingHeaders)?;

    state.verifier.verify(id, timestamp, signature, &body).map_err(|err| {
        tracing::warn!(svix_id = id, "Webhook signature rejected: {err}");
        WebhookError::Verification
    })?;

    match event::parse(&body)? {
        IdentityEvent::UserCreated(profile) | IdentityEvent::RoleUpdated(profile) => {
            state.sync.upsert_from_event(profile).await?;
        },
        IdentityEvent::UserDeleted { subject_id } => {
            state.sync.delete_subject(&subject_id).await?;
        },
        IdentityEvent::Ignored(event_type) => {
            tracing::debug!(svix_id = id, event_type = %event_type, "Ignoring unhandled webhook event type");
        },
    }

    Ok((StatusCode::OK, "Webhook received").into_response())
}

fn svix_headers(headers: &HeaderMap) -> Option<(&str, &str, &str)> {
    let id = headers.get(SVIX_ID)?.to_str().ok()?;
    let timestamp = headers.get(SVIX_TIMESTAMP)?.to_str().ok()?;
    let signature = headers.get(SVIX_SIGNATURE)?.to_str().ok()?;
    Some((id, timestamp, signature))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{SystemTime, UNIX_EPOCH};

    use app_core::webhook::SignatureScheme;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::inbound::router::create_router;
    use crate::usecase::sync::MockSyncUseCase;

    const SECRET: &str = "whsec_dGVzdC1zaWduaW5nLXNlY3JldA==";

    fn router_with(sync: MockSyncUseCase) -> axum::Router {
        let verifier = Arc::new(SignatureScheme::new(SECRET).expect("secret"));
        create_router(IdentityState::new(verifier, Arc::new(sync)))
    }

    fn signed_request(body: &str) -> Request<Body> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock before unix epoch")
            .as_secs() as i64;
        let scheme = SignatureScheme::new(SECRET).expect("secret");
        let signature = scheme.sign("msg_1", now, body.as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/webhooks")
            .header("svix-id", "msg_1")
            .header("svix-timestamp", now.to_string())
            .header("svix-signature", signature)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
        String::from_utf8(bytes.to_vec()).expect("utf8 body")
    }

    fn created_body() -> String {
        serde_json::json!({
            "type": "user.created",
            "data": {
                "id": "user_2abc",
                "first_name": "Jane",
                "last_name": "Doe",
                "email_addresses": [{ "email_address": "jane@example.com" }],
                "image_url": "https://img.example.com/jane.png"
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_missing_headers_is_400() {
        let app = router_with(MockSyncUseCase::new());

        let request = Request::builder()
            .method("POST")
            .uri("/api/webhooks")
            .header("svix-id", "msg_1")
            .body(Body::from(created_body()))
            .expect("request");

        let response = app.oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Error: Missing Svix headers");
    }

    #[tokio::test]
    async fn test_bad_signature_is_400_and_never_reaches_the_sync() {
        // No expectations registered: any use case call would panic.
        let app = router_with(MockSyncUseCase::new());

        let mut request = signed_request(&created_body());
        request
            .headers_mut()
            .insert("svix-signature", "v1,AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=".parse().expect("header"));

        let response = app.oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Error: Verification error");
    }

    #[tokio::test]
    async fn test_valid_created_event_is_200() {
        let mut sync = MockSyncUseCase::new();
        sync.expect_upsert_from_event()
            .withf(|profile| profile.subject_id == "user_2abc" && profile.email == "jane@example.com")
            .times(1)
            .returning(|_| Box::pin(async move { Ok(()) }));

        let app = router_with(sync);
        let response = app.oneshot(signed_request(&created_body())).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "Webhook received");
    }

    #[tokio::test]
    async fn test_deleted_event_reaches_delete_path() {
        let mut sync = MockSyncUseCase::new();
        sync.expect_delete_subject()
            .withf(|subject_id| subject_id == "user_2abc")
            .times(1)
            .returning(|_| Box::pin(async move { Ok(()) }));

        let body = serde_json::json!({ "type": "user.deleted", "data": { "id": "user_2abc" } }).to_string();
        let app = router_with(sync);
        let response = app.oneshot(signed_request(&body)).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "Webhook received");
    }

    #[tokio::test]
    async fn test_unhandled_event_type_is_a_200_noop() {
        let body = serde_json::json!({ "type": "session.created", "data": { "id": "sess_1" } }).to_string();
        let app = router_with(MockSyncUseCase::new());

        let response = app.oneshot(signed_request(&body)).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "Webhook received");
    }

    #[tokio::test]
    async fn test_verified_but_malformed_payload_is_400() {
        let body = serde_json::json!({
            "type": "user.created",
            "data": { "id": "user_2abc", "email_addresses": [] }
        })
        .to_string();
        let app = router_with(MockSyncUseCase::new());

        let response = app.oneshot(signed_request(&body)).await.expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Error: Malformed payload");
    }

    #[tokio::test]
    async fn test_sync_failure_is_500() {
        let mut sync = MockSyncUseCase::new();
        sync.expect_upsert_from_event()
            .returning(|_| Box::pin(async move { Err(AppError::Internal) }));

        let app = router_with(sync);
        let response = app.oneshot(signed_request(&created_body())).await.expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Error: Internal server error");
    }
}
