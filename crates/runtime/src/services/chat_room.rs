use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use common::{Actor, ActorKind, Request, Response, ServerSocket, SocketMessage, WebSocketPair};
use serde::Serialize;
use tokio::time;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::render;

pub const GREETING: &str = "hello from backend!";
pub const DEFAULT_GREETING_DELAY: Duration = Duration::from_secs(3);

#[derive(Serialize)]
struct Greeting<'a> {
    message: &'a str,
}

/// Chat room holding the server ends of every accepted connection.
pub struct ChatRoom {
    sockets: HashMap<Uuid, Arc<ServerSocket>>,
    greeting_delay: Duration,
}

#[async_trait]
impl Actor for ChatRoom {
    fn kind(&self) -> ActorKind {
        ActorKind::ChatRoom
    }

    async fn fetch(&mut self, request: Request) -> Response {
        match request.pathname() {
            "/" => Response::html(render::home_page()),
            "/connect" => self.handle_connect(),
            other => {
                debug!("Chat room has no route for {}", other);
                Response::not_found()
            }
        }
    }
}

impl ChatRoom {
    pub fn new(greeting_delay: Duration) -> Self {
        Self {
            sockets: HashMap::new(),
            greeting_delay,
        }
    }

    /// Number of retained connections that are still open.
    pub fn open_sockets(&self) -> usize {
        self.sockets.values().filter(|s| !s.is_closed()).count()
    }

    fn handle_connect(&mut self) -> Response {
        self.sockets.retain(|_, socket| !socket.is_closed());

        let (client, server) = WebSocketPair::new();
        if let Err(e) = server.accept() {
            error!("Failed to accept socket: {}", e);
            return Response::internal_error();
        }

        let server = Arc::new(server);
        Self::schedule_greeting(Arc::downgrade(&server), self.greeting_delay);

        info!("Socket {} connected ({} open)", server.id(), self.sockets.len() + 1);
        self.sockets.insert(server.id(), server);

        Response::switching_protocols(client)
    }

    /// Pushes the greeting once after `delay`. Holds only a weak reference,
    /// so a dropped or closed socket turns the push into a no-op.
    fn schedule_greeting(socket: Weak<ServerSocket>, delay: Duration) {
        tokio::spawn(async move {
            time::sleep(delay).await;

            let Some(socket) = socket.upgrade() else {
                debug!("Greeting skipped, socket is gone");
                return;
            };

            let payload = match serde_json::to_string(&Greeting { message: GREETING }) {
                Ok(payload) => payload,
                Err(e) => {
                    error!("Failed to encode greeting: {}", e);
                    return;
                }
            };

            if let Err(e) = socket.send(SocketMessage::Text(payload)) {
                debug!("Greeting not delivered: {}", e);
            }
        });
    }
}

impl Default for ChatRoom {
    fn default() -> Self {
        Self::new(DEFAULT_GREETING_DELAY)
    }
}
