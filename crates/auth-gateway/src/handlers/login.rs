//! Shibboleth SSO callback.
//!
//! The upstream web server protects `/login` with Shibboleth and forwards the
//! authenticated request with the user's attributes as headers. The handler
//! turns the forwarded identity into an authentication session for the room.
//!
//! `GET /login?room=<room>&machineUID=<uid>`
//!
//! | Condition | Status |
//! |-----------|--------|
//! | `room` or `machineUID` missing | 400 |
//! | no `eppn`/`mail` header | 403 |
//! | session created | 200, `{"sessionId": "..."}` |

use crate::authority::ShibbolethAuthority;
use crate::observability::metrics;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Identity attribute headers, in order of preference.
pub const IDENTITY_HEADERS: [&str; 2] = ["eppn", "mail"];

#[derive(Debug, Deserialize)]
pub struct LoginParams {
    room: Option<String>,
    #[serde(rename = "machineUID")]
    machine_uid: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
}

/// Router serving the SSO callback for `authority`.
pub fn login_router(authority: Arc<ShibbolethAuthority>) -> Router {
    Router::new()
        .route("/login", get(login_handler))
        .with_state(authority)
}

fn reject(status: StatusCode, error: &'static str) -> Response {
    (status, Json(ErrorBody { error })).into_response()
}

fn forwarded_identity(headers: &HeaderMap) -> Option<String> {
    IDENTITY_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    })
}

async fn login_handler(
    State(authority): State<Arc<ShibbolethAuthority>>,
    Query(params): Query<LoginParams>,
    headers: HeaderMap,
) -> Response {
    let (Some(room), Some(machine_uid)) = (
        params.room.filter(|r| !r.is_empty()),
        params.machine_uid.filter(|m| !m.is_empty()),
    ) else {
        metrics::record_login("bad_request");
        return reject(StatusCode::BAD_REQUEST, "room and machineUID are required");
    };

    let Some(identity) = forwarded_identity(&headers) else {
        warn!(
            target: "auth_gateway.handlers.login",
            room = %room,
            "Login request without forwarded identity"
        );
        metrics::record_login("no_identity");
        return reject(StatusCode::FORBIDDEN, "no identity forwarded");
    };

    let session = authority.authenticate_user(&machine_uid, &identity, &room);
    info!(
        target: "auth_gateway.handlers.login",
        room = %room,
        "Authentication session created"
    );
    metrics::record_login("success");

    Json(LoginResponse {
        session_id: session.session_id,
    })
    .into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::authority::AuthenticationAuthority;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tower::util::ServiceExt;

    fn authority() -> Arc<ShibbolethAuthority> {
        Arc::new(ShibbolethAuthority::new(
            "https://sso.example.com/login",
            None,
            Duration::from_secs(60),
            false,
        ))
    }

    async fn send(
        authority: Arc<ShibbolethAuthority>,
        uri: &str,
        headers: &[(&str, &str)],
    ) -> Response {
        let mut builder = Request::builder().uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::empty()).expect("Failed to build request");

        login_router(authority)
            .oneshot(request)
            .await
            .expect("Failed to execute request")
    }

    #[tokio::test]
    async fn test_login_creates_session() {
        let authority = authority();
        let response = send(
            Arc::clone(&authority),
            "/login?room=room1&machineUID=machine-1",
            &[("eppn", "alice@example.com")],
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);

        let body = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let login: LoginResponse = serde_json::from_slice(&body).expect("json body");

        let session = authority
            .session(&login.session_id)
            .expect("session should be stored");
        assert_eq!(session.identity, "alice@example.com");
        assert_eq!(session.room, "room1");
        assert_eq!(session.machine_uid, "machine-1");
    }

    #[tokio::test]
    async fn test_login_falls_back_to_mail_header() {
        let authority = authority();
        let response = send(
            Arc::clone(&authority),
            "/login?room=room1&machineUID=machine-1",
            &[("mail", "bob@example.com")],
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_login_missing_params() {
        for uri in ["/login", "/login?room=room1", "/login?machineUID=m&room="] {
            let response = send(authority(), uri, &[("eppn", "alice")]).await;
            assert_eq!(
                response.status(),
                StatusCode::BAD_REQUEST,
                "{uri} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_login_without_identity_forbidden() {
        let response = send(
            authority(),
            "/login?room=room1&machineUID=machine-1",
            &[("eppn", "  ")],
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
