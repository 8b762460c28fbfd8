use std::sync::Arc;

use async_trait::async_trait;
use common::{Actor, ActorKind, Request, Response};
use storage::{CounterStore, StorageError};
use thiserror::Error;
use tracing::{debug, error};

use crate::render::BadgeRenderer;

pub const VISIT_PATH: &str = "/visit";
pub const PAGE_PARAM: &str = "page";

#[derive(Error, Debug)]
pub enum VisitError {
    #[error("missing `page` query parameter")]
    MissingPage,
    #[error("stored count for {key} is not a number: {value:?}")]
    Corrupt { key: String, value: String },
    #[error(transparent)]
    Store(#[from] StorageError),
}

/// Visit badge handler reading and writing the counter store directly.
///
/// The read-modify-write is not isolated: two concurrent visits to the same
/// page may both read `n` and both write `n + 1`. Use [`VisitActor`] to
/// serialize visits per page.
#[derive(Clone)]
pub struct VisitCounter {
    store: Arc<dyn CounterStore>,
    badge: Arc<dyn BadgeRenderer>,
}

impl VisitCounter {
    pub fn new(store: Arc<dyn CounterStore>, badge: Arc<dyn BadgeRenderer>) -> Self {
        Self { store, badge }
    }

    pub async fn handle_visit(&self, request: &Request) -> Response {
        match self.record_visit(request).await {
            Ok(count) => Response::svg(self.badge.render(count)),
            Err(VisitError::MissingPage) => {
                debug!("Visit without a page parameter");
                Response::bad_request()
            }
            Err(e) => {
                error!("Visit failed: {}", e);
                Response::internal_error()
            }
        }
    }

    /// Increments and returns the visit count of the request's page.
    pub async fn record_visit(&self, request: &Request) -> Result<u64, VisitError> {
        let page = request
            .search_param(PAGE_PARAM)
            .filter(|page| !page.is_empty())
            .ok_or(VisitError::MissingPage)?;

        let current = match self.store.get(page).await? {
            None => 0,
            Some(value) => value.parse::<u64>().map_err(|_| VisitError::Corrupt {
                key: page.to_string(),
                value,
            })?,
        };

        let next = current.checked_add(1).ok_or_else(|| VisitError::Corrupt {
            key: page.to_string(),
            value: current.to_string(),
        })?;
        self.store.put(page, &next.to_string()).await?;
        Ok(next)
    }
}

/// Single-writer wrapper around [`VisitCounter`], one instance per page.
pub struct VisitActor {
    counter: VisitCounter,
}

impl VisitActor {
    pub fn new(counter: VisitCounter) -> Self {
        Self { counter }
    }
}

#[async_trait]
impl Actor for VisitActor {
    fn kind(&self) -> ActorKind {
        ActorKind::VisitCounter
    }

    async fn fetch(&mut self, request: Request) -> Response {
        match request.pathname() {
            VISIT_PATH => self.counter.handle_visit(&request).await,
            _ => Response::not_found(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::FlatBadge;
    use common::StatusCode;
    use mockall::mock;
    use storage::MemoryCounterStore;
    use tokio::sync::Barrier;

    mock! {
        pub Store {}

        #[async_trait]
        impl CounterStore for Store {
            async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
            async fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;
        }
    }

    /// Lets every caller read before anyone writes.
    struct LockstepStore {
        inner: MemoryCounterStore,
        barrier: Barrier,
    }

    #[async_trait]
    impl CounterStore for LockstepStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            let value = self.inner.get(key).await;
            self.barrier.wait().await;
            value
        }

        async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.inner.put(key, value).await
        }
    }

    fn counter(store: Arc<dyn CounterStore>) -> VisitCounter {
        VisitCounter::new(store, Arc::new(FlatBadge::default()))
    }

    fn visit(page: &str) -> Request {
        Request::get(&format!("/visit?page={}", page)).unwrap()
    }

    #[tokio::test]
    async fn missing_page_is_rejected_without_store_access() {
        let mut store = MockStore::new();
        store.expect_get().times(0);
        store.expect_put().times(0);
        let counter = counter(Arc::new(store));

        for target in ["/visit", "/visit?page=", "/visit?other=foo"] {
            let response = counter.handle_visit(&Request::get(target).unwrap()).await;
            assert_eq!(response.status, StatusCode::BAD_REQUEST);
            assert!(response.body.is_empty());
        }
    }

    #[tokio::test]
    async fn first_visit_writes_one() {
        let mut store = MockStore::new();
        store
            .expect_get()
            .withf(|key| key.to_string() == "foo")
            .times(1)
            .returning(|_| Ok(None));
        store
            .expect_put()
            .withf(|key, value| key.to_string() == "foo" && value.to_string() == "1")
            .times(1)
            .returning(|_, _| Ok(()));

        let response = counter(Arc::new(store)).handle_visit(&visit("foo")).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.content_type, Some("image/svg+xml"));
        assert!(response.body.contains(">1</text>"));
    }

    #[tokio::test]
    async fn sequential_visits_count_up() {
        let store = MemoryCounterStore::new();
        let counter = counter(Arc::new(store.clone()));

        assert_eq!(counter.record_visit(&visit("foo")).await.unwrap(), 1);
        assert_eq!(counter.record_visit(&visit("foo")).await.unwrap(), 2);
        assert_eq!(counter.record_visit(&visit("bar")).await.unwrap(), 1);
        assert_eq!(store.get("foo").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn concurrent_visits_lose_an_update() {
        let store = Arc::new(LockstepStore {
            inner: MemoryCounterStore::new(),
            barrier: Barrier::new(2),
        });
        let counter = counter(store.clone());

        let (first, second) = (visit("foo"), visit("foo"));
        let (a, b) = tokio::join!(
            counter.record_visit(&first),
            counter.record_visit(&second)
        );

        // Both read 0 before either wrote: the second write clobbers the first.
        assert_eq!(a.unwrap(), 1);
        assert_eq!(b.unwrap(), 1);
        assert_eq!(store.inner.get("foo").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn corrupt_value_is_not_overwritten() {
        let mut store = MockStore::new();
        store
            .expect_get()
            .returning(|_| Ok(Some("many".to_string())));
        store.expect_put().times(0);
        let counter = counter(Arc::new(store));

        let err = counter.record_visit(&visit("foo")).await.unwrap_err();
        assert!(matches!(err, VisitError::Corrupt { ref value, .. } if value == "many"));

        let response = counter.handle_visit(&visit("foo")).await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn saturated_count_is_not_overwritten() {
        let mut store = MockStore::new();
        store
            .expect_get()
            .returning(|_| Ok(Some(u64::MAX.to_string())));
        store.expect_put().times(0);
        let counter = counter(Arc::new(store));

        let err = counter.record_visit(&visit("foo")).await.unwrap_err();
        assert!(
            matches!(err, VisitError::Corrupt { ref value, .. } if *value == u64::MAX.to_string())
        );

        let response = counter.handle_visit(&visit("foo")).await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn store_failure_becomes_internal_error() {
        let mut store = MockStore::new();
        store.expect_get().returning(|_| {
            Err(StorageError::Io(std::io::Error::other("disk gone")))
        });
        let counter = counter(Arc::new(store));

        let response = counter.handle_visit(&visit("foo")).await;

        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn actor_only_serves_visit_path() {
        let mut actor = VisitActor::new(counter(Arc::new(MemoryCounterStore::new())));

        let response = actor.fetch(Request::get("/").unwrap()).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);

        let response = actor.fetch(visit("foo")).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.cache_control, Some("no-cache"));
    }
}
