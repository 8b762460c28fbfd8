use std::collections::HashMap;
use std::sync::Arc;

use common::{ActorName, Request, Response};
use tracing::debug;

use crate::directory::{ActorError, ActorNamespace};
use crate::render;
use crate::services::VisitCounter;

/// Where the name of the target actor comes from.
pub enum NameSource {
    Fixed(ActorName),
    /// Taken from a query parameter; a missing or empty value is a bad
    /// request.
    Query(&'static str),
}

pub enum Endpoint {
    Home,
    Visit(VisitCounter),
    /// Hands the whole request to the named actor, whose own router
    /// interprets the path.
    Forward {
        namespace: Arc<ActorNamespace>,
        name: NameSource,
    },
    NotFound,
}

/// Top-level dispatch on exact pathnames with a fallback endpoint.
pub struct EdgeRouter {
    routes: HashMap<String, Endpoint>,
    fallback: Endpoint,
}

impl EdgeRouter {
    pub fn new(fallback: Endpoint) -> Self {
        Self {
            routes: HashMap::new(),
            fallback,
        }
    }

    pub fn route(mut self, path: impl Into<String>, endpoint: Endpoint) -> Self {
        self.routes.insert(path.into(), endpoint);
        self
    }

    pub async fn handle(&self, request: Request) -> Result<Response, ActorError> {
        let endpoint = self
            .routes
            .get(request.pathname())
            .unwrap_or(&self.fallback);

        match endpoint {
            Endpoint::Home => Ok(Response::html(render::home_page())),
            Endpoint::Visit(counter) => Ok(counter.handle_visit(&request).await),
            Endpoint::Forward { namespace, name } => {
                let name = match Self::resolve_name(name, &request) {
                    Some(name) => name,
                    None => return Ok(Response::bad_request()),
                };
                let id = namespace.id_from_name(&name);
                let stub = namespace.get(&id).await;
                stub.fetch(request).await
            }
            Endpoint::NotFound => {
                debug!("No route for {}", request.pathname());
                Ok(Response::not_found())
            }
        }
    }

    fn resolve_name(source: &NameSource, request: &Request) -> Option<ActorName> {
        match source {
            NameSource::Fixed(name) => Some(name.clone()),
            NameSource::Query(param) => request
                .search_param(param)
                .and_then(|value| ActorName::new(value).ok()),
        }
    }
}
