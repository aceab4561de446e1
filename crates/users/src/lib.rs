//! `taskdesk-users` — user identity records and their mutation semantics.

pub mod user;

pub use user::{NewUser, User, UserSummary, UserUpdate};
