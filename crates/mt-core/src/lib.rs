//! Money tracker core - domain models, traits, and shared types
//!
//! This crate defines the abstractions shared by the store and API crates:
//! - User and transaction records
//! - Common error types
//! - Repository traits implemented by the storage backends
//! - Configuration management

pub mod config;
pub mod repository;

pub use config::{
    AppConfig, AuthConfig, ConfigError, DatabaseConfig, Environment, LoggingConfig,
    PasswordHashConfig, ServerConfig,
};
pub use repository::{TransactionRepository, UserRepository};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for money tracker operations
#[derive(Error, Debug)]
pub enum MtError {
    #[error("Email already registered")]
    DuplicateEmail,

    #[error("User not found")]
    UserNotFound,

    /// Raised both for missing transactions and for transactions owned by
    /// someone else.
    #[error("Transaction not found")]
    TransactionNotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Password hashing error: {0}")]
    HashingError(String),
}

pub type Result<T> = std::result::Result<T, MtError>;

/// Store-assigned user identifier
pub type UserId = i64;

/// Store-assigned transaction identifier
pub type TransactionId = i64;

// ============================================================================
// Users
// ============================================================================

/// Registered account
///
/// Maps to the `users` table. The password hash is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Transactions
// ============================================================================

/// A single financial movement owned by one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserId,
    /// Amount in the smallest currency unit (e.g. cents)
    pub amount: i64,
    pub category: String,
    pub description: String,
    pub date: DateTime<Utc>,
}

/// Transaction about to be inserted
///
/// The owner comes from the authenticated identity and the date from the
/// server clock; neither is ever taken from client input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub user_id: UserId,
    pub amount: i64,
    pub category: String,
    pub description: String,
    pub date: DateTime<Utc>,
}

impl NewTransaction {
    /// Stamp a transaction for `user_id` with the current time
    pub fn new(
        user_id: UserId,
        amount: i64,
        category: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            amount,
            category: category.into(),
            description: description.into(),
            date: Utc::now(),
        }
    }

    /// Check the fields the schema cannot express
    pub fn validate(&self) -> Result<()> {
        if self.category.trim().is_empty() {
            return Err(MtError::ValidationError(
                "category must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
