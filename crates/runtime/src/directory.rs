use std::collections::HashMap;
use std::sync::Arc;

use common::{Actor, ActorId, ActorKind, ActorName, Request, Response};
use thiserror::Error;
use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const DEFAULT_MAILBOX_CAPACITY: usize = 64;

/// Builds the default state of a fresh instance.
pub type ActorFactory = Box<dyn Fn(&ActorId) -> Box<dyn Actor> + Send + Sync>;

#[derive(Error, Debug)]
pub enum ActorError {
    #[error("mailbox of actor {0} is closed")]
    MailboxClosed(ActorId),
    #[error("actor {0} dropped the request without replying")]
    NoReply(ActorId),
}

struct Envelope {
    request: Request,
    reply: oneshot::Sender<Response>,
}

/// Address of a live instance. All requests funnel through its mailbox into
/// the one task that owns the instance state.
pub struct ActorStub {
    id: ActorId,
    activation_id: Uuid,
    kind: ActorKind,
    mailbox: mpsc::Sender<Envelope>,
}

impl ActorStub {
    pub fn id(&self) -> &ActorId {
        &self.id
    }

    pub fn activation_id(&self) -> Uuid {
        self.activation_id
    }

    pub fn kind(&self) -> ActorKind {
        self.kind
    }

    pub async fn fetch(&self, request: Request) -> Result<Response, ActorError> {
        let (reply, response) = oneshot::channel();

        self.mailbox
            .send(Envelope { request, reply })
            .await
            .map_err(|_| ActorError::MailboxClosed(self.id.clone()))?;

        response
            .await
            .map_err(|_| ActorError::NoReply(self.id.clone()))
    }
}

/// Directory of one actor class: resolves names to ids and ids to the single
/// live instance, constructing it on first use.
pub struct ActorNamespace {
    binding: String,
    mailbox_capacity: usize,
    factory: ActorFactory,
    instances: Mutex<HashMap<ActorId, Arc<ActorStub>>>,
}

impl ActorNamespace {
    pub fn new(binding: impl Into<String>, factory: ActorFactory) -> Self {
        Self {
            binding: binding.into(),
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            factory,
            instances: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = capacity.max(1);
        self
    }

    pub fn id_from_name(&self, name: &ActorName) -> ActorId {
        ActorId::from_name(&self.binding, name)
    }

    /// Returns the live instance for `id`, activating it if needed. An
    /// instance whose task has ended is replaced by a fresh one.
    pub async fn get(&self, id: &ActorId) -> Arc<ActorStub> {
        let mut instances = self.instances.lock().await;

        if let Some(stub) = instances.get(id) {
            if !stub.mailbox.is_closed() {
                return stub.clone();
            }
            warn!("Actor {} in {} is gone, reactivating", id, self.binding);
        }

        let stub = Arc::new(self.activate(id));
        instances.insert(id.clone(), stub.clone());
        stub
    }

    pub async fn len(&self) -> usize {
        self.instances.lock().await.len()
    }

    fn activate(&self, id: &ActorId) -> ActorStub {
        let actor = (self.factory)(id);
        let kind = actor.kind();
        let activation_id = Uuid::new_v4();
        let (mailbox, inbox) = mpsc::channel(self.mailbox_capacity);

        tokio::spawn(Self::run(id.clone(), actor, inbox));
        info!(
            "Activated {:?} actor {} in {} (activation {})",
            kind, id, self.binding, activation_id
        );

        ActorStub {
            id: id.clone(),
            activation_id,
            kind,
            mailbox,
        }
    }

    async fn run(id: ActorId, mut actor: Box<dyn Actor>, mut inbox: mpsc::Receiver<Envelope>) {
        while let Some(Envelope { request, reply }) = inbox.recv().await {
            debug!("Actor {} handling {}", id, request.pathname());
            let response = actor.fetch(request).await;

            if reply.send(response).is_err() {
                debug!("Caller of actor {} went away before the reply", id);
            }
        }
        debug!("Actor {} mailbox closed", id);
    }
}
