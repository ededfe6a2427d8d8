//! HTTP surface for the adapter.
//!
//! Three routes cover a complete Slack app:
//!
//! - `POST /api/messages` receives Events API deliveries, slash commands,
//!   and interactive payloads,
//! - `GET /install` redirects the browser into Slack's OAuth consent flow,
//! - `GET /install/auth` completes the flow by exchanging the returned code.

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use braze_core::{AdapterError, ApiError, ApiResult};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::adapter::SlackAdapter;

/// Handle to a running adapter server.
///
/// Dropping the handle leaves the server running; use [`shutdown`] to stop
/// it.
///
/// [`shutdown`]: ServeHandle::shutdown
pub struct ServeHandle {
    addr: std::net::SocketAddr,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl ServeHandle {
    /// Returns the address the server is bound to.
    pub fn local_addr(&self) -> std::net::SocketAddr {
        self.addr
    }

    /// Stops the server and waits for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        let _ = self.task.await;
    }
}

/// Builds the adapter's router.
///
/// Exposed separately so applications can mount the routes into a larger
/// axum application instead of using [`serve`].
pub fn router(adapter: Arc<SlackAdapter>) -> Router {
    Router::new()
        .route("/api/messages", post(receive))
        .route("/install", get(install))
        .route("/install/auth", get(install_auth))
        .with_state(adapter)
}

/// Binds `addr` and serves the adapter's routes until shut down.
pub async fn serve(adapter: Arc<SlackAdapter>, addr: &str) -> ApiResult<ServeHandle> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::Transport(format!("failed to bind {addr}: {e}")))?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| ApiError::Transport(e.to_string()))?;

    info!(addr = %local_addr, "Slack adapter listening");

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel();
    let app = router(adapter);

    let task = tokio::spawn(async move {
        let server = axum::serve(listener, app);
        tokio::select! {
            result = server => {
                if let Err(e) = result {
                    error!(error = %e, "Slack adapter server error");
                }
            }
            _ = &mut shutdown_rx => {
                info!("Slack adapter server shutting down");
            }
        }
    });

    Ok(ServeHandle {
        addr: local_addr,
        shutdown_tx,
        task,
    })
}

async fn receive(
    State(adapter): State<Arc<SlackAdapter>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let body = String::from_utf8_lossy(&body);

    match adapter.process_activity(content_type, &body).await {
        Ok(reply) => {
            let status =
                StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, reply.body.unwrap_or_default()).into_response()
        }
        Err(AdapterError::Parse { reason }) => {
            warn!(reason = %reason, "Rejected unparseable inbound request");
            (StatusCode::BAD_REQUEST, "bad request").into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to process inbound request");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
        }
    }
}

async fn install(State(adapter): State<Arc<SlackAdapter>>) -> Response {
    match adapter.get_install_link() {
        Ok(link) => Redirect::temporary(&link).into_response(),
        Err(e) => {
            error!(error = %e, "Install link unavailable");
            (StatusCode::INTERNAL_SERVER_ERROR, "OAuth is not configured").into_response()
        }
    }
}

#[derive(Deserialize)]
struct InstallAuthQuery {
    #[serde(default)]
    code: String,
}

async fn install_auth(
    State(adapter): State<Arc<SlackAdapter>>,
    Query(query): Query<InstallAuthQuery>,
) -> Response {
    if query.code.is_empty() {
        return (StatusCode::BAD_REQUEST, "missing code parameter").into_response();
    }

    match adapter.validate_oauth_code(&query.code).await {
        Ok(access) => {
            info!(
                team = access.team.as_ref().map(|t| t.id.as_str()).unwrap_or("unknown"),
                "Completed OAuth installation"
            );
            (StatusCode::OK, "Success! The bot has been installed.").into_response()
        }
        Err(e) => {
            warn!(error = %e, "OAuth code exchange failed");
            (StatusCode::BAD_REQUEST, "OAuth failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use braze_core::BotHost;
    use tower::ServiceExt;

    fn adapter() -> Arc<SlackAdapter> {
        SlackAdapter::builder()
            .verification_token("vtok")
            .bot_token("xoxb-test")
            .client_id("1.2")
            .client_secret("shh")
            .redirect_uri("https://example.com/install/auth")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn url_verification_round_trips_through_the_router() {
        let adapter = adapter();
        adapter
            .init(BotHost::new(braze_core::handler_fn(|_| {
                Box::pin(async { Ok(()) })
            })))
            .await;

        let response = router(adapter)
            .oneshot(
                Request::post("/api/messages")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"type":"url_verification","token":"vtok","challenge":"chal-9"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"chal-9");
    }

    #[tokio::test]
    async fn bad_bodies_get_400() {
        let response = router(adapter())
            .oneshot(
                Request::post("/api/messages")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn install_redirects_into_oauth() {
        let response = router(adapter())
            .oneshot(Request::get("/install").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("https://slack.com/oauth/v2/authorize?"));
    }

    #[tokio::test]
    async fn install_auth_requires_a_code() {
        let response = router(adapter())
            .oneshot(Request::get("/install/auth").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
