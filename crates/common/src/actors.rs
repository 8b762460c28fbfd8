use std::fmt;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

use crate::request::{Request, Response};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorKind {
    Counter,
    ChatRoom,
    VisitCounter,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ActorNameError {
    #[error("actor name must not be empty")]
    Empty,
}

/// Logical, caller-chosen key of a single stateful instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorName(String);

impl ActorName {
    pub fn new(name: impl Into<String>) -> Result<Self, ActorNameError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ActorNameError::Empty);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier of an instance, derived from its name.
///
/// The id is the hex encoded HMAC-SHA256 of the name keyed by the namespace
/// binding, so it is stable across processes and never collides between
/// namespaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorId(String);

impl ActorId {
    pub fn from_name(namespace: &str, name: &ActorName) -> Self {
        let mut mac = HmacSha256::new_from_slice(namespace.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(name.as_str().as_bytes());
        Self(hex::encode(mac.finalize().into_bytes()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The trait every addressable stateful instance implements.
#[async_trait]
pub trait Actor: Send {
    fn kind(&self) -> ActorKind;

    /// Handles one request. Never called concurrently for the same instance,
    /// so implementations mutate `self` without any locking.
    async fn fetch(&mut self, request: Request) -> Response;
}
