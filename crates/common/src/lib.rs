pub mod actors;
pub mod request;
pub mod logger;
pub mod socket;

pub use actors::{Actor, ActorId, ActorKind, ActorName, ActorNameError};
pub use request::{Request, Response};
pub use socket::{ClientSocket, ServerSocket, SocketError, SocketMessage, WebSocketPair};
pub use ::http::StatusCode;
