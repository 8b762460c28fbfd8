use async_trait::async_trait;
use common::{Actor, ActorKind, Request, Response};
use tracing::debug;

/// In-memory counter. Decrements are not floored, so the value may go
/// negative.
#[derive(Debug, Default)]
pub struct CounterService {
    value: i64,
}

#[async_trait]
impl Actor for CounterService {
    fn kind(&self) -> ActorKind {
        ActorKind::Counter
    }

    async fn fetch(&mut self, request: Request) -> Response {
        match request.pathname() {
            "/" => {}
            "/+" => self.value += 1,
            "/-" => self.value -= 1,
            other => {
                debug!("Counter has no route for {}", other);
                return Response::not_found();
            }
        }
        Response::text(self.value.to_string())
    }
}

impl CounterService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> i64 {
        self.value
    }
}
