pub mod counter_repo;

pub use counter_repo::SqliteCounterStore;
