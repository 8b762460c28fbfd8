use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{self, StatusCode, Uri, header},
    response::{IntoResponse, Response as HttpResponse},
};
use common::{ClientSocket, Request, Response, SocketMessage};
use futures_util::{SinkExt, StreamExt};
use runtime::EdgeRouter;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct AppState {
    router: Arc<EdgeRouter>,
}

/// Every request goes to the edge router; axum only does transport.
pub fn app(router: Arc<EdgeRouter>) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { router })
}

pub async fn serve(listener: TcpListener, router: Arc<EdgeRouter>) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Edge listening on http://{}", addr);
    }
    axum::serve(listener, app(router)).await
}

async fn dispatch(
    State(state): State<AppState>,
    upgrade: Option<WebSocketUpgrade>,
    uri: Uri,
) -> HttpResponse {
    let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

    let request = match Request::get(target) {
        Ok(request) => request,
        Err(e) => {
            warn!("Unparseable request target {}: {}", target, e);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match state.router.handle(request).await {
        Ok(response) => into_http(response, upgrade),
        Err(e) => {
            error!("Dispatch failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn into_http(response: Response, upgrade: Option<WebSocketUpgrade>) -> HttpResponse {
    if let Some(client) = response.web_socket {
        return match upgrade {
            Some(upgrade) => upgrade.on_upgrade(move |socket| bridge(socket, client)),
            None => {
                warn!("Socket {} offered to a request without upgrade", client.id());
                StatusCode::UPGRADE_REQUIRED.into_response()
            }
        };
    }

    let mut builder = http::Response::builder().status(response.status);
    if let Some(content_type) = response.content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    if let Some(cache_control) = response.cache_control {
        builder = builder.header(header::CACHE_CONTROL, cache_control);
    }

    builder
        .body(Body::from(response.body))
        .unwrap_or_else(|e| {
            error!("Failed to build response: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
}

/// Pumps frames between the upgraded connection and the in-process client
/// end until either side closes.
async fn bridge(socket: WebSocket, client: ClientSocket) {
    let id = client.id();
    let (to_server, mut from_server) = client.split();
    let (mut sink, mut stream) = socket.split();
    debug!("Socket {} upgraded", id);

    let outbound = async {
        while let Some(message) = from_server.recv().await {
            match message {
                SocketMessage::Text(text) => {
                    if sink.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                SocketMessage::Close => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    };

    let inbound = async {
        while let Some(Ok(message)) = stream.next().await {
            match message {
                Message::Text(text) => {
                    if to_server.send(SocketMessage::Text(text)).is_err() {
                        break;
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
        let _ = to_server.send(SocketMessage::Close);
    };

    tokio::select! {
        _ = outbound => {}
        _ = inbound => {}
    }
    info!("Socket {} disconnected", id);
}
