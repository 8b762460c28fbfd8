pub mod directory;
pub mod render;
pub mod router;
pub mod services;

pub use directory::{ActorError, ActorFactory, ActorNamespace, ActorStub};
pub use router::{EdgeRouter, Endpoint, NameSource};
