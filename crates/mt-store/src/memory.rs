//! In-memory store
//!
//! Mirrors the SQLite semantics (unique email, owner must exist, cascade on
//! user removal, owner-only delete) behind one `RwLock`, so each operation's
//! check and mutation happen under the same write guard.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use mt_core::{
    MtError, NewTransaction, Result, Transaction, TransactionId, TransactionRepository, User,
    UserId, UserRepository,
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    transactions: BTreeMap<TransactionId, Transaction>,
    last_user_id: UserId,
    last_transaction_id: TransactionId,
}

/// Map-backed store for tests and local experiments
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a user and, like `ON DELETE CASCADE`, all of their transactions
    pub async fn delete_user(&self, id: UserId) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.users.remove(&id).ok_or(MtError::UserNotFound)?;
        tables.transactions.retain(|_, tx| tx.user_id != id);
        Ok(())
    }

    /// Number of stored users
    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }

    /// Number of stored transactions
    pub async fn transaction_count(&self) -> usize {
        self.tables.read().await.transactions.len()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<UserId> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.email == email) {
            return Err(MtError::DuplicateEmail);
        }

        tables.last_user_id += 1;
        let id = tables.last_user_id;
        tables.users.insert(
            id,
            User {
                id,
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                created_at: Utc::now(),
            },
        );

        Ok(id)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }
}

#[async_trait]
impl TransactionRepository for InMemoryStore {
    async fn create_transaction(&self, tx: &NewTransaction) -> Result<TransactionId> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&tx.user_id) {
            return Err(MtError::UserNotFound);
        }

        tables.last_transaction_id += 1;
        let id = tables.last_transaction_id;
        tables.transactions.insert(
            id,
            Transaction {
                id,
                user_id: tx.user_id,
                amount: tx.amount,
                category: tx.category.clone(),
                description: tx.description.clone(),
                date: tx.date,
            },
        );

        Ok(id)
    }

    async fn find_transaction(&self, id: TransactionId) -> Result<Option<Transaction>> {
        Ok(self.tables.read().await.transactions.get(&id).cloned())
    }

    async fn delete_owned_transaction(&self, id: TransactionId, owner: UserId) -> Result<()> {
        let mut tables = self.tables.write().await;

        let owned = tables
            .transactions
            .get(&id)
            .is_some_and(|tx| tx.user_id == owner);
        if !owned {
            return Err(MtError::TransactionNotFound);
        }

        tables.transactions.remove(&id);
        Ok(())
    }
}
