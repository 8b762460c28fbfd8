use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use common::ActorName;
use runtime::render::FlatBadge;
use runtime::services::{ChatRoom, CounterService, VISIT_PATH, VisitActor, VisitCounter};
use runtime::{ActorNamespace, EdgeRouter, Endpoint, NameSource};
use storage::db::open_pool;
use storage::{CounterStore, MemoryCounterStore, SqliteCounterStore, StorageError};
use tracing::info;

use crate::config::GatewayConfig;

pub const COUNTER_BINDING: &str = "COUNTER";
pub const COUNTER_NAME: &str = "counter";
pub const CHAT_BINDING: &str = "CHAT";
pub const CHAT_NAME: &str = "CHAT";
pub const VISITS_BINDING: &str = "VISITS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Counter,
    Chat,
    Visits,
    SerializedVisits,
    Hello,
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counter" => Ok(Self::Counter),
            "chat" => Ok(Self::Chat),
            "visits" => Ok(Self::Visits),
            "visits-serialized" => Ok(Self::SerializedVisits),
            "hello" => Ok(Self::Hello),
            other => Err(format!("unknown variant {}", other)),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Counter => "counter",
            Self::Chat => "chat",
            Self::Visits => "visits",
            Self::SerializedVisits => "visits-serialized",
            Self::Hello => "hello",
        };
        f.write_str(name)
    }
}

/// SQLite under `WORKDIR` when configured, memory otherwise.
pub async fn open_store(config: &GatewayConfig) -> Result<Arc<dyn CounterStore>, StorageError> {
    match &config.workdir {
        Some(workdir) => {
            let pool = open_pool(workdir).await?;
            Ok(Arc::new(SqliteCounterStore::new(pool)))
        }
        None => {
            info!("WORKDIR not set, visit counts are kept in memory");
            Ok(Arc::new(MemoryCounterStore::new()))
        }
    }
}

pub fn build_router(config: &GatewayConfig, store: Arc<dyn CounterStore>) -> EdgeRouter {
    let capacity = config.mailbox_capacity;

    match config.variant {
        Variant::Counter => {
            let namespace = ActorNamespace::new(
                COUNTER_BINDING,
                Box::new(|_| Box::new(CounterService::new())),
            )
            .with_mailbox_capacity(capacity);
            EdgeRouter::new(forward_fixed(namespace, COUNTER_NAME))
        }
        Variant::Chat => {
            let delay = config.greeting_delay;
            let namespace = ActorNamespace::new(
                CHAT_BINDING,
                Box::new(move |_| Box::new(ChatRoom::new(delay))),
            )
            .with_mailbox_capacity(capacity);
            EdgeRouter::new(forward_fixed(namespace, CHAT_NAME))
        }
        Variant::Visits => EdgeRouter::new(Endpoint::NotFound)
            .route("/", Endpoint::Home)
            .route(VISIT_PATH, Endpoint::Visit(visit_counter(store))),
        Variant::SerializedVisits => {
            let counter = visit_counter(store);
            let namespace = ActorNamespace::new(
                VISITS_BINDING,
                Box::new(move |_| Box::new(VisitActor::new(counter.clone()))),
            )
            .with_mailbox_capacity(capacity);
            EdgeRouter::new(Endpoint::NotFound)
                .route("/", Endpoint::Home)
                .route(
                    VISIT_PATH,
                    Endpoint::Forward {
                        namespace: Arc::new(namespace),
                        name: NameSource::Query("page"),
                    },
                )
        }
        Variant::Hello => EdgeRouter::new(Endpoint::NotFound).route("/", Endpoint::Home),
    }
}

fn visit_counter(store: Arc<dyn CounterStore>) -> VisitCounter {
    VisitCounter::new(store, Arc::new(FlatBadge::default()))
}

fn forward_fixed(namespace: ActorNamespace, name: &str) -> Endpoint {
    Endpoint::Forward {
        namespace: Arc::new(namespace),
        name: NameSource::Fixed(ActorName::new(name).expect("variant names are not empty")),
    }
}
