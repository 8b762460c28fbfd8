pub mod chat_room;
pub mod counter_service;
pub mod visit_service;

pub use chat_room::ChatRoom;
pub use counter_service::CounterService;
pub use visit_service::{VISIT_PATH, VisitActor, VisitCounter, VisitError};
