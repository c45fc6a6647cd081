//! Repository traits
//!
//! Capability interfaces over the persistence layer. Every invariant
//! (email uniqueness, owner existence, ownership on delete) must be enforced
//! by the implementation atomically, since many request tasks share one store.

use async_trait::async_trait;

use crate::{NewTransaction, Result, Transaction, TransactionId, User, UserId};

/// User persistence
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user with an already-hashed password
    ///
    /// Fails with `MtError::DuplicateEmail` when the email is taken.
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<UserId>;

    /// Look up a user by exact (case-sensitive) email
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Look up a user by ID
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>>;
}

/// Transaction persistence
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Insert a transaction
    ///
    /// Fails with `MtError::UserNotFound` when the owner does not exist.
    async fn create_transaction(&self, tx: &NewTransaction) -> Result<TransactionId>;

    /// Get a transaction by ID
    async fn find_transaction(&self, id: TransactionId) -> Result<Option<Transaction>>;

    /// Delete a transaction if and only if it belongs to `owner`
    ///
    /// Fails with `MtError::TransactionNotFound` when nothing was deleted,
    /// whether the row is missing or owned by another user.
    async fn delete_owned_transaction(&self, id: TransactionId, owner: UserId) -> Result<()>;
}
