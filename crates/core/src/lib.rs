//! `taskdesk-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult, FieldError, ValidationErrors};
pub use id::{TaskId, UserId};
