use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// One-way hash + compare primitive for password credentials.
///
/// The stored hash is opaque to the rest of the system and is never
/// serialized out of the identity store.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, PasswordError>;
    fn compare(&self, plaintext: &str, hash: &str) -> bool;
}

/// bcrypt-backed hasher.
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    pub const DEFAULT_COST: u32 = 10;

    pub fn new() -> Self {
        Self {
            cost: Self::DEFAULT_COST,
        }
    }

    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher for BcryptPasswordHasher {
    fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        bcrypt::hash(plaintext, self.cost).map_err(|e| PasswordError::Hash(e.to_string()))
    }

    fn compare(&self, plaintext: &str, hash: &str) -> bool {
        bcrypt::verify(plaintext, hash).unwrap_or(false)
    }
}
