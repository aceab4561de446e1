//! `taskdesk-auth` — authentication/authorization primitives.
//!
//! This crate is intentionally decoupled from HTTP and storage: password
//! hashing, token issue/verify, and the requester identity model live here;
//! the task-level access policy lives with the task domain.

pub mod claims;
pub mod password;
pub mod requester;
pub mod roles;
pub mod tokens;

pub use claims::{AccessClaims, TokenValidationError, validate_claims};
pub use password::{BcryptPasswordHasher, PasswordError, PasswordHasher};
pub use requester::Requester;
pub use roles::Role;
pub use tokens::{Hs256TokenCodec, TokenError, TokenVerifier};
