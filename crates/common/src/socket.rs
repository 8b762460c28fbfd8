use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketMessage {
    Text(String),
    Close,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SocketError {
    #[error("socket {0} has not been accepted")]
    NotAccepted(Uuid),
    #[error("socket {0} was already accepted")]
    AlreadyAccepted(Uuid),
    #[error("socket {0} is closed")]
    Closed(Uuid),
}

/// Factory for two linked socket endpoints.
pub struct WebSocketPair;

impl WebSocketPair {
    pub fn new() -> (ClientSocket, ServerSocket) {
        let id = Uuid::new_v4();
        let (to_client, from_server) = mpsc::unbounded_channel();
        let (to_server, from_client) = mpsc::unbounded_channel();

        let client = ClientSocket {
            id,
            tx: to_server,
            rx: from_server,
        };
        let server = ServerSocket {
            id,
            tx: to_client,
            inbound: Mutex::new(Some(from_client)),
            accepted: AtomicBool::new(false),
            closed: Arc::new(AtomicBool::new(false)),
        };
        (client, server)
    }
}

/// The end handed back to the caller in an upgrade response.
#[derive(Debug)]
pub struct ClientSocket {
    id: Uuid,
    tx: UnboundedSender<SocketMessage>,
    rx: UnboundedReceiver<SocketMessage>,
}

impl ClientSocket {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn send(&self, message: SocketMessage) -> Result<(), SocketError> {
        self.tx.send(message).map_err(|_| SocketError::Closed(self.id))
    }

    pub async fn recv(&mut self) -> Option<SocketMessage> {
        self.rx.recv().await
    }

    /// Splits into the outbound sender and the inbound receiver so both
    /// directions can be pumped concurrently.
    pub fn split(
        self,
    ) -> (
        UnboundedSender<SocketMessage>,
        UnboundedReceiver<SocketMessage>,
    ) {
        (self.tx, self.rx)
    }
}

/// The end accepted and retained by an actor instance.
#[derive(Debug)]
pub struct ServerSocket {
    id: Uuid,
    tx: UnboundedSender<SocketMessage>,
    inbound: Mutex<Option<UnboundedReceiver<SocketMessage>>>,
    accepted: AtomicBool,
    closed: Arc<AtomicBool>,
}

impl ServerSocket {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Accepts the connection and starts draining messages sent by the
    /// client. Must be called from within a tokio runtime.
    pub fn accept(&self) -> Result<(), SocketError> {
        let inbound = self
            .inbound
            .lock()
            .ok()
            .and_then(|mut slot| slot.take())
            .ok_or(SocketError::AlreadyAccepted(self.id))?;

        self.accepted.store(true, Ordering::Release);
        debug!("Socket {} accepted", self.id);

        tokio::spawn(Self::drain(self.id, inbound, self.closed.clone()));
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.tx.is_closed()
    }

    pub fn send(&self, message: SocketMessage) -> Result<(), SocketError> {
        if !self.accepted.load(Ordering::Acquire) {
            return Err(SocketError::NotAccepted(self.id));
        }
        if self.is_closed() {
            return Err(SocketError::Closed(self.id));
        }
        self.tx.send(message).map_err(|_| SocketError::Closed(self.id))
    }

    async fn drain(
        id: Uuid,
        mut inbound: UnboundedReceiver<SocketMessage>,
        closed: Arc<AtomicBool>,
    ) {
        while let Some(message) = inbound.recv().await {
            match message {
                SocketMessage::Text(text) => debug!("Socket {} received: {}", id, text),
                SocketMessage::Close => break,
            }
        }
        closed.store(true, Ordering::Release);
        info!("Socket {} closed by client", id);
    }
}
