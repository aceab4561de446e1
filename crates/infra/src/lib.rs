//! `taskdesk-infra` — store contracts and their implementations.
//!
//! The identity store and task store are the system's only collaborators with
//! state. Both come in an in-memory flavor (tests/dev) and a Postgres flavor.

pub mod store;

pub use store::{StoreError, TaskFilter, TaskStore, UserStore};
pub use store::in_memory::{InMemoryTaskStore, InMemoryUserStore};
pub use store::postgres::{PgTaskStore, PgUserStore, ensure_schema};
